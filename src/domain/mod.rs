//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the fixed feature set (`Feature`, `FeatureVector`) and records (`Observation`, `Dataset`)
//! - fit outputs (`FittedModel`, `CvScore`, `EvaluationResult`)
//! - forecast outputs (`ForecastBatch`) and the run configuration (`PipelineConfig`)

pub mod types;

pub use types::*;
