//! Numerical building blocks: feature scaling and penalized least squares solvers.

pub mod coordinate;
pub mod ridge;
pub mod scaler;

pub use coordinate::*;
pub use ridge::*;
pub use scaler::*;
