//! Browser error types.

use thiserror::Error;

/// Errors that can occur while driving a browser session.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("failed to create profile directory: {0}")]
    ProfileDir(#[from] std::io::Error),

    #[error("init script injection failed: {0}")]
    InitScript(String),

    #[error("invalid cookie: {0}")]
    InvalidCookie(String),

    #[error("navigation failed: {0}")]
    NavigationFailed(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("interaction failed: {0}")]
    InteractionFailed(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("intercepted response unreadable: {0}")]
    ResponseUnreadable(String),

    #[error("response listener closed before a match")]
    ListenerClosed,

    #[error("invalid response pattern: {0}")]
    InvalidPattern(String),

    #[error("CDP error: {0}")]
    Cdp(String),
}

impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        BrowserError::Cdp(err.to_string())
    }
}
