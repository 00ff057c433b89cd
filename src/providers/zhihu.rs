//! Zhihu search API providers
//!
//! `zhihu` calls the JSON search API directly and needs a session cookie.
//! `zhihu_web` loads the search page in a headless browser and captures the
//! same API call made by the page itself.

use super::error::ProviderError;
use super::traits::*;
use crate::browser::{InteractionScript, ResponseMatcher, SessionRunner};
use crate::extract::extract_feed;
use crate::network::{accept_json, generate_user_agent, HttpClient};
use crate::results::ResultRecord;
use crate::search::SearchQuery;
use async_trait::async_trait;
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "https://www.zhihu.com";

/// URL pattern of the in-page search API call
pub const SEARCH_API_PATTERN: &str = r"api/v4/search_v3\?";

/// Search box on the zhihu search page
pub const SEARCH_INPUT_SELECTOR: &str = "input[type='search'], .SearchBar-input input";

const RESULTS_PER_PAGE: u32 = 20;

fn search_page_url(base_url: &str, keyword: &str) -> String {
    format!(
        "{base_url}/search?type=content&q={}",
        urlencoding::encode(keyword)
    )
}

/// Zhihu search through the JSON API
pub struct Zhihu {
    client: HttpClient,
    base_url: String,
    cookie: Option<String>,
}

impl Zhihu {
    pub fn new(client: HttpClient, cookie: Option<String>) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            cookie: cookie.filter(|c| !c.trim().is_empty()),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Provider for Zhihu {
    fn name(&self) -> ProviderName {
        ProviderName::Zhihu
    }

    fn transport(&self) -> TransportMode {
        TransportMode::Plain
    }

    fn about(&self) -> ProviderAbout {
        ProviderAbout::new()
            .website("https://www.zhihu.com")
            .session_required(true)
            .results_format("JSON")
    }

    fn request(&self, query: &SearchQuery) -> Result<RequestSpec, ProviderError> {
        let cookie = self.cookie.as_deref().ok_or(ProviderError::MissingCredentials)?;
        let offset = page_offset(query.page(), RESULTS_PER_PAGE)?.to_string();
        let limit = RESULTS_PER_PAGE.to_string();

        Ok(RequestSpec::get(
            &format!("{}/api/v4/search_v3", self.base_url),
            &[
                ("t", "general"),
                ("q", query.keyword()),
                ("correction", "1"),
                ("offset", offset.as_str()),
                ("limit", limit.as_str()),
            ],
        )?
        .header("Accept", accept_json())
        .header("Referer", search_page_url(&self.base_url, query.keyword()))
        .cookies(cookie))
    }

    async fn fetch(&self, request: RequestSpec, _query: &SearchQuery) -> Result<Payload, ProviderError> {
        self.client.fetch_text(&request).await.map(Payload::Text)
    }

    fn extract(&self, payload: Payload) -> Result<Vec<ResultRecord>, ProviderError> {
        extract_feed(&payload.into_json()?, ProviderName::Zhihu)
    }
}

/// Zhihu search captured from inside a browser session
pub struct ZhihuWeb {
    runner: SessionRunner,
    base_url: String,
    cookie: Option<String>,
    matcher: ResponseMatcher,
}

impl ZhihuWeb {
    pub fn new(runner: SessionRunner, cookie: Option<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            runner,
            base_url: DEFAULT_BASE_URL.to_string(),
            cookie: cookie.filter(|c| !c.trim().is_empty()),
            matcher: ResponseMatcher::new(SEARCH_API_PATTERN)?,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Provider for ZhihuWeb {
    fn name(&self) -> ProviderName {
        ProviderName::ZhihuWeb
    }

    fn transport(&self) -> TransportMode {
        TransportMode::Automated
    }

    fn about(&self) -> ProviderAbout {
        ProviderAbout::new()
            .website("https://www.zhihu.com")
            .results_format("JSON")
    }

    /// The in-page search always loads the first page, so `page` is not used
    fn request(&self, query: &SearchQuery) -> Result<RequestSpec, ProviderError> {
        let mut request = RequestSpec {
            url: search_page_url(&self.base_url, query.keyword()),
            headers: Default::default(),
            cookies: None,
        }
        .header("User-Agent", generate_user_agent());

        match self.cookie.as_deref() {
            Some(cookie) => request = request.cookies(cookie),
            None => warn!(provider = %self.name(), "no session cookie configured, searching anonymously"),
        }
        Ok(request)
    }

    async fn fetch(&self, request: RequestSpec, query: &SearchQuery) -> Result<Payload, ProviderError> {
        let interaction = InteractionScript::new(SEARCH_INPUT_SELECTOR, query.keyword());
        let payload = self
            .runner
            .run(
                &request,
                Some(&interaction),
                &self.matcher,
                self.runner.settings().response_timeout(),
            )
            .await?;
        Ok(Payload::Json(payload))
    }

    fn extract(&self, payload: Payload) -> Result<Vec<ResultRecord>, ProviderError> {
        extract_feed(&payload.into_json()?, ProviderName::ZhihuWeb)
    }
}
