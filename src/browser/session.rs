//! Browser session seam
//!
//! The runner drives a session through these traits so the protocol can be
//! exercised without a real Chromium binary.

use super::error::BrowserError;
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::oneshot;

/// Everything needed to start one isolated browser process
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Fresh profile directory owned by this run
    pub profile_dir: PathBuf,
    pub chrome_path: Option<PathBuf>,
    pub headless: bool,
    pub user_agent: Option<String>,
    pub window_width: u32,
    pub window_height: u32,
    /// Upper bound on a single CDP round trip
    pub request_timeout: Duration,
    pub extra_args: Vec<String>,
}

/// One cookie scoped to the target site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
}

/// URL predicate identifying the in-page API call to capture
#[derive(Debug, Clone)]
pub struct ResponseMatcher {
    pattern: Regex,
}

impl ResponseMatcher {
    pub fn new(pattern: &str) -> Result<Self, BrowserError> {
        let pattern = Regex::new(pattern)
            .map_err(|e| BrowserError::InvalidPattern(format!("{pattern}: {e}")))?;
        Ok(Self { pattern })
    }

    /// Whether a response URL is the one being waited for
    pub fn matches(&self, url: &str) -> bool {
        self.pattern.is_match(url)
    }

    /// Whether a parsed body is a usable payload; error envelopes are not
    pub fn accepts(&self, body: &Value) -> bool {
        body.as_object()
            .map(|obj| !obj.contains_key("error"))
            .unwrap_or(false)
    }
}

impl fmt::Display for ResponseMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pattern.as_str())
    }
}

/// Simulated user input used when navigation alone does not fire the API call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionScript {
    /// CSS selector of the search input
    pub input_selector: String,
    /// Text typed into the input before submitting
    pub keyword: String,
}

impl InteractionScript {
    pub fn new(input_selector: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self {
            input_selector: input_selector.into(),
            keyword: keyword.into(),
        }
    }
}

/// Starts browser processes
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>, BrowserError>;
}

/// A live browser process with one page, driven step by step
#[async_trait]
pub trait BrowserSession: Send {
    /// Register a script that runs before any page script on every document
    async fn install_init_script(&mut self, script: &str) -> Result<(), BrowserError>;

    async fn set_cookies(&mut self, cookies: &[SessionCookie]) -> Result<(), BrowserError>;

    /// Start watching network responses; the receiver resolves with the first
    /// matching body the matcher accepts
    async fn watch_responses(
        &mut self,
        matcher: ResponseMatcher,
    ) -> Result<oneshot::Receiver<Value>, BrowserError>;

    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), BrowserError>;

    /// Let in-page requests started by navigation complete, waiting at most `max`
    ///
    /// Sessions that cannot observe network activity just wait out `max`.
    async fn settle(&mut self, max: Duration) -> Result<(), BrowserError> {
        tokio::time::sleep(max).await;
        Ok(())
    }

    /// Wait for the input element, focus it, type the keyword and submit
    async fn interact(
        &mut self,
        script: &InteractionScript,
        timeout: Duration,
    ) -> Result<(), BrowserError>;

    /// Shut the browser process down
    async fn close(self: Box<Self>) -> Result<(), BrowserError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_matcher() {
        let matcher = ResponseMatcher::new(r"api/v4/search_v3\?").unwrap();
        assert!(matcher.matches("https://www.zhihu.com/api/v4/search_v3?t=general&q=rust"));
        assert!(!matcher.matches("https://www.zhihu.com/api/v4/search/top_search"));

        assert!(matcher.accepts(&json!({"data": []})));
        assert!(!matcher.accepts(&json!({"error": {"code": 10003}})));
        assert!(!matcher.accepts(&json!([1, 2])));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            ResponseMatcher::new("search_v3("),
            Err(BrowserError::InvalidPattern(_))
        ));
    }
}
