use serde::Serialize;
use thiserror::Error;

use crate::domain::{Feature, ModelFamily};

/// Binary-level error: a message plus the process exit code.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

/// Fatal pipeline failures.
///
/// Any of these aborts the run; nothing downstream of the failing stage is
/// produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("Dataset unavailable: {0}")]
    DataUnavailable(String),

    #[error("Dataset malformed: {0}")]
    DataMalformed(String),

    #[error("Degenerate feature data: {0}")]
    DegenerateFeature(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Solver failure: {0}")]
    Solver(String),
}

impl PipelineError {
    /// Exit code used by the `pwr` binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::InvalidInput(_) => 2,
            PipelineError::InsufficientData(_) | PipelineError::DegenerateFeature(_) => 3,
            PipelineError::DataUnavailable(_)
            | PipelineError::DataMalformed(_)
            | PipelineError::Solver(_) => 4,
        }
    }
}

/// Non-fatal conditions collected during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineWarning {
    /// Coordinate descent hit its sweep budget; the last iterate is used.
    NonConvergence {
        family: ModelFamily,
        alpha: f64,
        iterations: usize,
    },
    /// Zero-variance training feature; its scale was taken as 1.
    DegenerateFeature { feature: Feature },
    /// Constant test target; R² was replaced by its sentinel.
    DivisionDegenerate { family: ModelFamily },
    /// A synthetic forecast row was clamped to physical bounds to stay usable.
    ForecastRowClamped { day: u32 },
}

impl std::fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineWarning::NonConvergence {
                family,
                alpha,
                iterations,
            } => write!(
                f,
                "{} (alpha={alpha}) did not converge within {iterations} iterations",
                family.display_name()
            ),
            PipelineWarning::DegenerateFeature { feature } => write!(
                f,
                "'{}' has zero variance in the training set; scale fixed at 1",
                feature.column_name()
            ),
            PipelineWarning::DivisionDegenerate { family } => write!(
                f,
                "{}: test target is constant; R² reported as sentinel",
                family.display_name()
            ),
            PipelineWarning::ForecastRowClamped { day } => {
                write!(f, "forecast day {day} clamped to physical bounds")
            }
        }
    }
}
