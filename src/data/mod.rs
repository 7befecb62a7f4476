//! Dataset loading: sources, caching, CSV validation, and splitting.

pub mod dataset;
pub mod source;

pub use dataset::*;
pub use source::*;
