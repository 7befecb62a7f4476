//! Penalty grid and related constants.
//!
//! Penalty strength is chosen by an exhaustive search over a small fixed grid.
//! The grid is shared by all three families so their selections are directly
//! comparable.

use crate::error::PipelineError;

/// Candidate penalty strengths, ascending.
pub const PENALTY_GRID: [f64; 6] = [0.001, 0.01, 0.1, 1.0, 10.0, 100.0];

/// L1 share of the mixed (elastic-net) penalty.
pub const MIXING_RATIO: f64 = 0.5;

/// Penalty used by un-tuned estimators.
pub const DEFAULT_ALPHA: f64 = 1.0;

/// Check a penalty grid: non-empty, finite, non-negative, strictly ascending.
///
/// Ascending order matters: tie-breaking picks the first minimum, which must
/// be the smallest penalty.
pub fn validate_grid(grid: &[f64]) -> Result<(), PipelineError> {
    if grid.is_empty() {
        return Err(PipelineError::InvalidInput("penalty grid is empty".into()));
    }
    if grid.iter().any(|a| !(a.is_finite() && *a >= 0.0)) {
        return Err(PipelineError::InvalidInput(format!(
            "penalty grid must be finite and non-negative: {grid:?}"
        )));
    }
    if grid.windows(2).any(|w| w[1] <= w[0]) {
        return Err(PipelineError::InvalidInput(format!(
            "penalty grid must be strictly ascending: {grid:?}"
        )));
    }
    Ok(())
}

/// Check a mixing ratio lies in `[0, 1]`.
pub fn validate_mixing_ratio(ratio: f64) -> Result<(), PipelineError> {
    if !(ratio.is_finite() && (0.0..=1.0).contains(&ratio)) {
        return Err(PipelineError::InvalidInput(format!(
            "mixing ratio must be in [0, 1], got {ratio}"
        )));
    }
    Ok(())
}
