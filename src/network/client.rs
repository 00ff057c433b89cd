//! HTTP client for plain-transport providers

use super::user_agent::{default_headers, generate_user_agent};
use crate::config::OutgoingSettings;
use crate::providers::{ProviderError, RequestSpec};
use anyhow::Result;
use reqwest::{Client, Response};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Phrases that only appear on bot-verification pages
pub const CHALLENGE_MARKERS: &[&str] = &[
    "百度安全验证",
    "安全验证",
    "网络不给力",
    "captcha",
    "CAPTCHA",
    "unusual traffic",
    "automated requests",
    "Verify you are human",
];

/// HTTP client wrapper shared by all plain providers
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
    extra_headers: HashMap<String, String>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(settings.timeout())
            .pool_max_idle_per_host(settings.pool_maxsize)
            .gzip(true)
            .brotli(true);

        // SSL verification
        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        // Proxy settings
        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            default_timeout: settings.timeout(),
            extra_headers: settings.extra_headers.clone(),
        })
    }

    /// Issue a GET for a prepared request
    pub async fn execute(&self, request: &RequestSpec) -> Result<HttpResponse, ProviderError> {
        let mut req_builder = self
            .client
            .get(&request.url)
            .timeout(self.default_timeout);

        // Default header template, then operator extras, then provider headers;
        // later layers replace earlier ones
        let mut headers: Vec<(String, String)> = Vec::new();
        let mut set = |key: &str, value: &str| {
            match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
                Some(slot) => slot.1 = value.to_string(),
                None => headers.push((key.to_string(), value.to_string())),
            }
        };
        set("User-Agent", generate_user_agent().as_str());
        for (key, value) in default_headers() {
            set(*key, *value);
        }
        for (key, value) in &self.extra_headers {
            set(key.as_str(), value.as_str());
        }
        for (key, value) in &request.headers {
            set(key.as_str(), value.as_str());
        }
        for (key, value) in headers {
            req_builder = req_builder.header(key, value);
        }

        if let Some(ref cookies) = request.cookies {
            req_builder = req_builder.header("Cookie", cookies);
        }

        let response = req_builder.send().await?;
        Self::parse_response(response).await
    }

    /// GET a prepared request and return the body of a successful, non-challenge response
    pub async fn fetch_text(&self, request: &RequestSpec) -> Result<String, ProviderError> {
        let response = self.execute(request).await?;
        debug!(
            url = %response.url,
            status = response.status,
            bytes = response.text.len(),
            "received provider response"
        );

        match response.status {
            403 => return Err(ProviderError::AccessDenied),
            429 => return Err(ProviderError::TooManyRequests),
            _ if !response.is_success() => return Err(ProviderError::HttpStatus(response.status)),
            _ => {}
        }

        if let Some(marker) = response.challenge_marker() {
            return Err(ProviderError::Challenge(marker.to_string()));
        }

        Ok(response.text)
    }

    /// Parse response into HttpResponse
    async fn parse_response(response: Response) -> Result<HttpResponse, ProviderError> {
        let status = response.status().as_u16();
        let url = response.url().to_string();

        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(key.to_string(), v.to_string());
            }
        }

        let text = response.text().await?;

        Ok(HttpResponse {
            status,
            headers,
            text,
            url,
        })
    }
}

/// HTTP response from a provider request
#[derive(Debug)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Response body as text
    pub text: String,
    /// Response URL (after redirects)
    pub url: String,
}

impl HttpResponse {
    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First bot-challenge marker found in the body, if any
    pub fn challenge_marker(&self) -> Option<&'static str> {
        CHALLENGE_MARKERS
            .iter()
            .copied()
            .find(|marker| self.text.contains(marker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, text: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            text: text.to_string(),
            url: "https://www.baidu.com/s".to_string(),
        }
    }

    #[tokio::test]
    async fn test_client_creation() {
        let client = HttpClient::new();
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_client_tolerates_unusable_timeout() {
        let settings = OutgoingSettings {
            request_timeout: f64::NAN,
            ..OutgoingSettings::default()
        };
        let client = HttpClient::with_settings(&settings).unwrap();
        assert_eq!(client.default_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_challenge_detection() {
        let page = response(200, "<title>百度安全验证</title>");
        assert_eq!(page.challenge_marker(), Some("百度安全验证"));

        let page = response(200, "<div class=\"result c-container\">ok</div>");
        assert_eq!(page.challenge_marker(), None);
    }

    #[test]
    fn test_success_range() {
        assert!(response(204, "").is_success());
        assert!(!response(302, "").is_success());
        assert!(!response(403, "").is_success());
    }
}
