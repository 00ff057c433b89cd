//! Provider traits and types

use super::error::ProviderError;
use crate::results::ResultRecord;
use crate::search::SearchQuery;
use crate::MAX_RESULTS_PER_PROVIDER;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Identifier of a registered search provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderName {
    /// General web search, server-rendered HTML
    Baidu,
    /// Web search with compact HTML markup
    Bing,
    /// JSON search API fetched directly with a session cookie
    Zhihu,
    /// The same JSON search API, only reachable from inside a browser session
    ZhihuWeb,
}

impl ProviderName {
    /// All providers, in registry order
    pub const ALL: [ProviderName; 4] = [
        ProviderName::Baidu,
        ProviderName::Bing,
        ProviderName::Zhihu,
        ProviderName::ZhihuWeb,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Baidu => "baidu",
            Self::Bing => "bing",
            Self::Zhihu => "zhihu",
            Self::ZhihuWeb => "zhihu_web",
        }
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderName {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == wanted)
            .ok_or_else(|| ProviderError::UnknownProvider(s.trim().to_string()))
    }
}

/// How a provider's payload is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// One direct HTTP GET
    Plain,
    /// A scripted headless-browser session
    Automated,
}

/// Request to be issued for one query
///
/// Built fresh per query and never mutated once handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    /// Absolute URL including the query string
    pub url: String,
    /// Provider-specific headers, layered over the default header template
    pub headers: HashMap<String, String>,
    /// Raw `name=value; name=value` cookie string
    pub cookies: Option<String>,
}

impl RequestSpec {
    /// Create a GET request for a URL with query parameters
    pub fn get<I, K, V>(base: &str, params: I) -> Result<Self, ProviderError>
    where
        I: IntoIterator,
        I::Item: std::borrow::Borrow<(K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let url = url::Url::parse_with_params(base, params)
            .map_err(|e| ProviderError::InvalidRequest(format!("{base}: {e}")))?;

        Ok(Self {
            url: url.to_string(),
            headers: HashMap::new(),
            cookies: None,
        })
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Attach a cookie string
    pub fn cookies(mut self, cookies: impl Into<String>) -> Self {
        self.cookies = Some(cookies.into());
        self
    }

    /// Look up a header case-insensitively
    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Zero-based result offset of a 1-based page
///
/// Pages far enough out to overflow the offset are rejected rather than wrapped.
pub fn page_offset(page: u32, per_page: u32) -> Result<u32, ProviderError> {
    page.checked_sub(1)
        .and_then(|index| index.checked_mul(per_page))
        .ok_or_else(|| ProviderError::InvalidRequest(format!("page {page} is out of range")))
}

/// Raw payload handed to an extraction strategy
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Response body text (HTML or JSON) from the plain transport
    Text(String),
    /// Already-parsed JSON intercepted by the browser runner
    Json(serde_json::Value),
}

impl Payload {
    /// Body as text, if this is a text payload
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Json(_) => None,
        }
    }

    /// Payload as JSON, parsing text when needed
    pub fn into_json(self) -> Result<serde_json::Value, ProviderError> {
        match self {
            Self::Json(value) => Ok(value),
            Self::Text(text) => serde_json::from_str(&text)
                .map_err(|e| ProviderError::Parse(format!("invalid JSON payload: {e}"))),
        }
    }
}

/// Provider metadata
#[derive(Debug, Clone, Default)]
pub struct ProviderAbout {
    /// Website URL
    pub website: Option<String>,
    /// Whether a session credential is needed for useful results
    pub requires_session: bool,
    /// Result format (HTML, JSON)
    pub results: String,
}

impl ProviderAbout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn website(mut self, url: impl Into<String>) -> Self {
        self.website = Some(url.into());
        self
    }

    pub fn session_required(mut self, required: bool) -> Self {
        self.requires_session = required;
        self
    }

    pub fn results_format(mut self, format: impl Into<String>) -> Self {
        self.results = format.into();
        self
    }
}

/// A search provider adapter
///
/// Adapters are stateless with respect to queries and are shared across
/// concurrent searches.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name
    fn name(&self) -> ProviderName;

    /// Transport used to obtain the payload
    fn transport(&self) -> TransportMode;

    /// Short description of the provider
    fn about(&self) -> ProviderAbout {
        ProviderAbout::default()
    }

    /// Build the request for a query
    fn request(&self, query: &SearchQuery) -> Result<RequestSpec, ProviderError>;

    /// Obtain the raw payload for a request
    async fn fetch(&self, request: RequestSpec, query: &SearchQuery)
        -> Result<Payload, ProviderError>;

    /// Normalize a raw payload into records
    fn extract(&self, payload: Payload) -> Result<Vec<ResultRecord>, ProviderError>;

    /// Run one search. Never fails: every error is logged and becomes an
    /// empty result list.
    async fn search(&self, query: &SearchQuery) -> Vec<ResultRecord> {
        let name = self.name();
        let start = Instant::now();

        let outcome = async {
            let request = self.request(query)?;
            debug!(provider = %name, url = %request.url, "dispatching provider request");
            let payload = self.fetch(request, query).await?;
            self.extract(payload)
        }
        .await;

        match outcome {
            Ok(mut records) => {
                records.truncate(MAX_RESULTS_PER_PROVIDER);
                info!(
                    provider = %name,
                    count = records.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "provider search finished"
                );
                records
            }
            Err(e) => {
                warn!(
                    provider = %name,
                    error = %e,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "provider search failed, contributing no results"
                );
                Vec::new()
            }
        }
    }
}
