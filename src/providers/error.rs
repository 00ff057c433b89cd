//! Per-provider failure kinds.
//!
//! None of these ever leave a provider adapter: they are logged and the
//! provider contributes zero records.

use crate::browser::BrowserError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("access denied (HTTP 403)")]
    AccessDenied,

    #[error("too many requests (HTTP 429)")]
    TooManyRequests,

    #[error("HTTP error: {0}")]
    HttpStatus(u16),

    #[error("bot challenge page detected (matched {0:?})")]
    Challenge(String),

    #[error("provider API error: {0}")]
    Api(String),

    #[error("no session cookie configured")]
    MissingCredentials,

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    #[error("browser automation failed: {0}")]
    Automation(#[from] BrowserError),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}
