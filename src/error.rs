//! Request-level errors.
//!
//! Per-provider failures never show up here: adapters absorb them and
//! contribute zero records. These are the conditions that stop a request
//! before anything is dispatched, plus the catch-all for the boundary.

use thiserror::Error;

/// Errors surfaced to the boundary layer.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The keyword was missing or blank.
    #[error("search keyword is empty")]
    EmptyKeyword,

    /// The page index was not an integer >= 1.
    #[error("invalid page: {0}")]
    InvalidPage(String),

    /// None of the requested provider names is registered.
    #[error("no valid providers in request: {requested:?}")]
    NoValidProviders { requested: Vec<String> },

    /// Anything unexpected, such as a serialization failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SearchError {
    /// Whether this is the caller's fault
    pub fn is_client_error(&self) -> bool {
        !matches!(self, SearchError::Internal(_))
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(e: serde_json::Error) -> Self {
        SearchError::Internal(e.to_string())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SearchError>;
