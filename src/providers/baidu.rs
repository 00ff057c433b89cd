//! Baidu web search provider

use super::error::ProviderError;
use super::traits::*;
use crate::extract::{HtmlExtractor, HtmlRule};
use crate::network::{accept_html, HttpClient};
use crate::results::ResultRecord;
use crate::search::SearchQuery;
use async_trait::async_trait;

const RESULTS_PER_PAGE: u32 = 10;

/// Result markup of the classic Baidu results page
pub const BAIDU_RULE: HtmlRule = HtmlRule {
    block: "div.c-container",
    title: "h3 a",
    link_attr: "href",
    description: &[
        "[class*='content-right']",
        ".c-abstract",
        ".c-span-last",
        ".c-row",
    ],
    meta: &[
        ("site", ".c-showurl, [class*='source']"),
        ("published", ".c-color-gray2"),
    ],
};

/// Baidu web search
pub struct Baidu {
    client: HttpClient,
    base_url: String,
    extractor: HtmlExtractor,
}

impl Baidu {
    pub const DEFAULT_BASE_URL: &'static str = "https://www.baidu.com";

    pub fn new(client: HttpClient) -> Result<Self, ProviderError> {
        Ok(Self {
            client,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            extractor: HtmlExtractor::new(ProviderName::Baidu, BAIDU_RULE)?,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Provider for Baidu {
    fn name(&self) -> ProviderName {
        ProviderName::Baidu
    }

    fn transport(&self) -> TransportMode {
        TransportMode::Plain
    }

    fn about(&self) -> ProviderAbout {
        ProviderAbout::new()
            .website("https://www.baidu.com")
            .results_format("HTML")
    }

    fn request(&self, query: &SearchQuery) -> Result<RequestSpec, ProviderError> {
        let offset = page_offset(query.page(), RESULTS_PER_PAGE)?.to_string();
        let per_page = RESULTS_PER_PAGE.to_string();

        Ok(RequestSpec::get(
            &format!("{}/s", self.base_url),
            &[
                ("wd", query.keyword()),
                ("pn", offset.as_str()),
                ("rn", per_page.as_str()),
                ("ie", "utf-8"),
            ],
        )?
        .header("Accept", accept_html())
        .header("Referer", format!("{}/", self.base_url)))
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

    fn baidu() -> Baidu {
        Baidu::new(HttpClient::new().unwrap()).unwrap()
    }

    #[test]
    fn test_baidu_request() {
        let query = SearchQuery::new("rust 教程", 3, Vec::<String>::new()).unwrap();
        let request = baidu().request(&query).unwrap();

        let url = url::Url::parse(&request.url).unwrap();
        assert_eq!(url.host_str(), Some("www.baidu.com"));
        assert_eq!(url.path(), "/s");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("wd".to_string(), "rust 教程".to_string())));
        assert!(pairs.contains(&("pn".to_string(), "20".to_string())));
        assert!(pairs.contains(&("rn".to_string(), "10".to_string())));
    }

    #[tokio::test]
    async fn test_baidu_overflowing_page_yields_no_records() {
        let query = SearchQuery::from_params(Some("rust"), Some("500000000"), Some("baidu")).unwrap();
        assert!(matches!(
            baidu().request(&query),
            Err(ProviderError::InvalidRequest(_))
        ));
        assert!(baidu().search(&query).await.is_empty());
    }

    #[test]
    fn test_baidu_extract() {
        let html = r#"
            <div id="content_left">
              <div class="result c-container" id="1">
                <h3 class="t"><a href="http://www.baidu.com/link?url=aaa">Rust 程序设计语言</a></h3>
                <div class="c-abstract">一门赋予每个人构建可靠且高效软件能力的语言。</div>
                <a class="c-showurl">www.rust-lang.org</a>
              </div>
              <div class="result-op c-container" id="2">
                <h3><a href="http://www.baidu.com/link?url=bbb">Rust 中文社区</a></h3>
                <div class="content-right_8Zs40">社区 论坛</div>
                <span class="c-color-gray2">2024年1月1日</span>
              </div>
              <div class="c-container"><h3><a href="">无链接</a></h3></div>
            </div>
        "#;

        let records = baidu().extract(Payload::Text(html.to_string())).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Rust 程序设计语言");
        assert_eq!(records[0].link, "http://www.baidu.com/link?url=aaa");
        assert_eq!(records[0].description, "一门赋予每个人构建可靠且高效软件能力的语言。");
        assert_eq!(
            records[0].meta_value("site"),
            Some(&serde_json::json!("www.rust-lang.org"))
        );
        assert_eq!(records[1].description, "社区 论坛");
        assert_eq!(
            records[1].meta_value("published"),
            Some(&serde_json::json!("2024年1月1日"))
        );
    }
}
