//! Model fitting orchestration.
//!
//! Responsibilities:
//!
//! - hold the fixed penalty grid and solver constants
//! - plan k-fold cross-validation splits
//! - fit a single family at a single penalty
//! - select each family's penalty by cross-validated grid search (parallel)

pub mod fitter;
pub mod folds;
pub mod penalty_grid;
pub mod selection;

pub use fitter::*;
pub use folds::*;
pub use penalty_grid::*;
pub use selection::*;
