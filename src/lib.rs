//! multisearch-rs: concurrent multi-provider search aggregation
//!
//! A query is fanned out to several search providers at once. Plain providers
//! are fetched over HTTP and scraped; automated providers are driven through a
//! one-shot headless browser that captures the page's own API call. Results are
//! normalized and merged in request order.

pub mod browser;
pub mod config;
pub mod error;
pub mod extract;
pub mod locales;
pub mod network;
pub mod providers;
pub mod results;
pub mod search;
pub mod web;

pub use config::Settings;
pub use error::SearchError;
pub use providers::{Provider, ProviderName, ProviderRegistry};
pub use results::ResultRecord;
pub use search::{AggregateResult, Search, SearchQuery};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Most records a single provider may contribute to one search
pub const MAX_RESULTS_PER_PROVIDER: usize = 20;
