//! Declarative selector rules for HTML result pages

use super::clean_text;
use crate::providers::{ProviderError, ProviderName};
use crate::results::ResultRecord;
use scraper::{ElementRef, Html, Selector};

/// Selector paths describing one provider's result markup
#[derive(Debug, Clone, Copy)]
pub struct HtmlRule {
    /// One match per result block
    pub block: &'static str,
    /// Element inside a block carrying the title text and the link
    pub title: &'static str,
    /// Attribute of the title element holding the destination URL
    pub link_attr: &'static str,
    /// Description candidates, tried in order until one yields text
    pub description: &'static [&'static str],
    /// `(meta key, selector)` pairs copied into the record's meta
    pub meta: &'static [(&'static str, &'static str)],
}

/// Compiled form of an [`HtmlRule`]
pub struct HtmlExtractor {
    source: ProviderName,
    block: Selector,
    title: Selector,
    link_attr: &'static str,
    description: Vec<Selector>,
    meta: Vec<(&'static str, Selector)>,
    rewrite_link: Option<fn(&str) -> String>,
}

fn compile(selector: &str) -> Result<Selector, ProviderError> {
    Selector::parse(selector)
        .map_err(|e| ProviderError::InvalidSelector(format!("{selector}: {e:?}")))
}

impl HtmlExtractor {
    /// Compile a rule for a provider
    pub fn new(source: ProviderName, rule: HtmlRule) -> Result<Self, ProviderError> {
        let description = rule
            .description
            .iter()
            .map(|s| compile(s))
            .collect::<Result<Vec<_>, _>>()?;
        let meta = rule
            .meta
            .iter()
            .map(|(key, s)| compile(s).map(|sel| (*key, sel)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source,
            block: compile(rule.block)?,
            title: compile(rule.title)?,
            link_attr: rule.link_attr,
            description,
            meta,
            rewrite_link: None,
        })
    }

    /// Map raw hrefs (e.g. click-tracking redirects) before validation
    pub fn with_link_rewrite(mut self, rewrite: fn(&str) -> String) -> Self {
        self.rewrite_link = Some(rewrite);
        self
    }

    /// Extract every complete record from a result page, in document order
    pub fn extract(&self, html: &str) -> Vec<ResultRecord> {
        let document = Html::parse_document(html);
        document
            .select(&self.block)
            .filter_map(|block| self.record(block))
            .collect()
    }

    fn record(&self, block: ElementRef<'_>) -> Option<ResultRecord> {
        let anchor = block.select(&self.title).next()?;
        let title = clean_text(&anchor.text().collect::<String>());

        let href = anchor.value().attr(self.link_attr)?.trim();
        let href = match self.rewrite_link {
            Some(rewrite) => rewrite(href),
            None => href.to_string(),
        };
        let link = absolute_link(&href)?;

        let mut record = ResultRecord::new(title, link, self.source)?;

        if let Some(description) = self
            .description
            .iter()
            .find_map(|selector| first_text(block, selector))
        {
            record = record.with_description(description);
        }

        for (key, selector) in &self.meta {
            if let Some(value) = first_text(block, selector) {
                record = record.with_meta(key, value);
            }
        }

        Some(record)
    }
}

/// Collapsed text of the first non-empty match
fn first_text(block: ElementRef<'_>, selector: &Selector) -> Option<String> {
    block
        .select(selector)
        .map(|el| clean_text(&el.text().collect::<String>()))
        .find(|text| !text.is_empty())
}

/// Accept only absolute http(s) URLs
pub fn absolute_link(href: &str) -> Option<String> {
    let parsed = url::Url::parse(href.trim()).ok()?;
    match parsed.scheme() {
        "http" | "https" => Some(parsed.to_string()),
        _ => None,
    }
}
