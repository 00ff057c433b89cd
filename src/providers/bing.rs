//! Bing search provider

use super::error::ProviderError;
use super::traits::*;
use crate::extract::{HtmlExtractor, HtmlRule};
use crate::network::{accept_html, HttpClient};
use crate::results::ResultRecord;
use crate::search::SearchQuery;
use async_trait::async_trait;
use base64::Engine as _;

const RESULTS_PER_PAGE: u32 = 10;

/// Result markup of the Bing results page
pub const BING_RULE: HtmlRule = HtmlRule {
    block: "li.b_algo",
    title: "h2 a",
    link_attr: "href",
    description: &[".b_caption p", "p"],
    meta: &[("site", "cite")],
};

/// Decode Bing click-tracking links
///
/// Bing often returns URLs like `https://cn.bing.com/ck/a?...&u=a1<base64>&...`; the
/// destination is the base64 `u` parameter after its `a1` prefix. Anything else
/// is returned unchanged.
pub fn decode_tracking_link(href: &str) -> String {
    let Ok(parsed) = url::Url::parse(href) else {
        return href.to_string();
    };
    let is_tracking = parsed
        .host_str()
        .map(|host| host == "bing.com" || host.ends_with(".bing.com"))
        .unwrap_or(false)
        && parsed.path() == "/ck/a";
    if !is_tracking {
        return href.to_string();
    }

    let Some(encoded) = parsed
        .query_pairs()
        .find(|(k, _)| k == "u")
        .map(|(_, v)| v.into_owned())
    else {
        return href.to_string();
    };
    let Some(payload) = encoded.strip_prefix("a1") else {
        return href.to_string();
    };

    let trimmed = payload.trim_end_matches('=');
    let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| base64::engine::general_purpose::STANDARD_NO_PAD.decode(trimmed));

    match decoded.ok().and_then(|bytes| String::from_utf8(bytes).ok()) {
        Some(url) if url.starts_with("http://") || url.starts_with("https://") => url,
        _ => href.to_string(),
    }
}

/// Bing web search
pub struct Bing {
    client: HttpClient,
    base_url: String,
    extractor: HtmlExtractor,
}

impl Bing {
    pub const DEFAULT_BASE_URL: &'static str = "https://cn.bing.com";

    pub fn new(client: HttpClient) -> Result<Self, ProviderError> {
        Ok(Self {
            client,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            extractor: HtmlExtractor::new(ProviderName::Bing, BING_RULE)?
                .with_link_rewrite(decode_tracking_link),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Provider for Bing {
    fn name(&self) -> ProviderName {
        ProviderName::Bing
    }

    fn transport(&self) -> TransportMode {
        TransportMode::Plain
    }

    fn about(&self) -> ProviderAbout {
        ProviderAbout::new()
            .website("https://cn.bing.com")
            .results_format("HTML")
    }

    fn request(&self, query: &SearchQuery) -> Result<RequestSpec, ProviderError> {
        let first = page_offset(query.page(), RESULTS_PER_PAGE)?
            .checked_add(1)
            .ok_or_else(|| {
                ProviderError::InvalidRequest(format!("page {} is out of range", query.page()))
            })?
            .to_string();

        Ok(RequestSpec::get(
            &format!("{}/search", self.base_url),
            &[("q", query.keyword()), ("first", first.as_str())],
        )?
        .header("Accept", accept_html()))
    }

    async fn fetch(&self, request: RequestSpec, _query: &SearchQuery) -> Result<Payload, ProviderError> {
        self.client.fetch_text(&request).await.map(Payload::Text)
    }

    fn extract(&self, payload: Payload) -> Result<Vec<ResultRecord>, ProviderError> {
        let html = payload
            .as_text()
            .ok_or_else(|| ProviderError::Parse("expected an HTML page".to_string()))?;
        Ok(self.extractor.extract(html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bing() -> Bing {
        Bing::new(HttpClient::new().unwrap()).unwrap()
    }

    #[test]
    fn test_bing_request() {
        let query = SearchQuery::new("rust", 2, Vec::new()).unwrap();
        let request = bing().request(&query).unwrap();

        assert!(request.url.starts_with("https://cn.bing.com/search?"));
        assert!(request.url.contains("q=rust"));
        assert!(request.url.contains("first=11"));
    }

    #[test]
    fn test_bing_request_rejects_overflowing_page() {
        let query = SearchQuery::new("rust", 500_000_000, Vec::new()).unwrap();
        assert!(matches!(
            bing().request(&query),
            Err(ProviderError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_decode_tracking_link() {
        let encoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .encode("https://www.rust-lang.org/learn");
        let href = format!("https://cn.bing.com/ck/a?!&&p=abc&u=a1{encoded}&ntb=1");
        assert_eq!(decode_tracking_link(&href), "https://www.rust-lang.org/learn");

        assert_eq!(
            decode_tracking_link("https://doc.rust-lang.org/book/"),
            "https://doc.rust-lang.org/book/"
        );
        let broken = "https://www.bing.com/ck/a?u=zz";
        assert_eq!(decode_tracking_link(broken), broken);
    }

    #[test]
    fn test_bing_extract() {
        let encoded = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode("https://www.rust-lang.org/");
        let html = format!(
            r#"<ol id="b_results">
                <li class="b_algo">
                  <h2><a href="https://cn.bing.com/ck/a?!&&u=a1{encoded}&ntb=1">Rust Programming Language</a></h2>
                  <cite>https://www.rust-lang.org</cite>
                  <div class="b_caption"><p>A language empowering everyone.</p></div>
                </li>
                <li class="b_algo"><h2><a href="/search?q=related">Related</a></h2></li>
                <li class="b_ans">not a result</li>
            </ol>"#
        );

        let records = bing().extract(Payload::Text(html)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].link, "https://www.rust-lang.org/");
        assert_eq!(records[0].description, "A language empowering everyone.");
        assert_eq!(
            records[0].meta_value("site"),
            Some(&serde_json::json!("https://www.rust-lang.org"))
        );
        assert_eq!(records[0].source, ProviderName::Bing);
    }
}
