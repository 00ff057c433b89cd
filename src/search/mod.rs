//! Search orchestration module
//!
//! Validates requested providers, runs them concurrently and merges their
//! records in request order.

mod executor;
mod models;

pub use executor::Search;
pub use models::*;
