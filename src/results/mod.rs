//! Normalized result records
//!
//! Every provider's extraction strategy produces the same record shape,
//! tagged with the provider it came from.

mod types;

pub use types::*;
