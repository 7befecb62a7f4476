//! Fitted model evaluation and single-point prediction.
//!
//! Models are plain data (`FittedModel`); prediction is a small set of pure
//! functions so fitting, evaluation and forecasting share one code path.

pub mod model;

pub use model::*;
