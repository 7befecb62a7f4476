//! Output files.
//!
//! - forecast batch as CSV (`export`)
//! - full run as JSON (`json`)

pub mod export;
pub mod json;

pub use export::*;
pub use json::*;
