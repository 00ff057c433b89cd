//! Search query and aggregate result models

use crate::error::SearchError;
use crate::providers::ProviderName;
use crate::results::ResultRecord;
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// A validated search request
///
/// Immutable once constructed. An empty provider list stands for every
/// registered provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    keyword: String,
    page: u32,
    providers: Vec<String>,
}

impl SearchQuery {
    /// Create a query; the keyword is trimmed and must not be empty, the page starts at 1
    pub fn new(
        keyword: impl Into<String>,
        page: u32,
        providers: Vec<String>,
    ) -> Result<Self, SearchError> {
        let keyword = keyword.into().trim().to_string();
        if keyword.is_empty() {
            return Err(SearchError::EmptyKeyword);
        }
        if page < 1 {
            return Err(SearchError::InvalidPage(page.to_string()));
        }

        Ok(Self {
            keyword,
            page,
            providers,
        })
    }

    /// Build a query from raw boundary parameters
    ///
    /// `page` defaults to `"1"`, `providers` is a comma-separated list and
    /// defaults to every registered provider.
    pub fn from_params(
        keyword: Option<&str>,
        page: Option<&str>,
        providers: Option<&str>,
    ) -> Result<Self, SearchError> {
        let keyword = keyword.unwrap_or_default();
        if keyword.trim().is_empty() {
            return Err(SearchError::EmptyKeyword);
        }
        Self::new(keyword, parse_page(page)?, parse_provider_list(providers))
    }

    /// Search keyword
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Page index, starting at 1
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Requested provider names, as given by the caller
    pub fn providers(&self) -> &[String] {
        &self.providers
    }
}

/// Parse a page parameter; missing or blank means page 1
pub fn parse_page(raw: Option<&str>) -> Result<u32, SearchError> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty()).unwrap_or("1");
    match raw.parse::<u32>() {
        Ok(page) if page >= 1 => Ok(page),
        _ => Err(SearchError::InvalidPage(raw.to_string())),
    }
}

/// Split a comma-separated provider list, dropping blank entries
pub fn parse_provider_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Merged outcome of one search across providers
///
/// Records keep provider dispatch order and `total_found` always equals the
/// number of records.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult {
    keyword: String,
    page: u32,
    providers: Vec<ProviderName>,
    records: Vec<ResultRecord>,
}

impl AggregateResult {
    pub fn new(
        keyword: impl Into<String>,
        page: u32,
        providers: Vec<ProviderName>,
        records: Vec<ResultRecord>,
    ) -> Self {
        Self {
            keyword: keyword.into(),
            page,
            providers,
            records,
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Providers that were dispatched, in request order
    pub fn providers(&self) -> &[ProviderName] {
        &self.providers
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn total_found(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Serialize for AggregateResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AggregateResult", 5)?;
        state.serialize_field("keyword", &self.keyword)?;
        state.serialize_field("page", &self.page)?;
        state.serialize_field("engines", &self.providers)?;
        state.serialize_field("results", &self.records)?;
        state.serialize_field("total_found", &self.total_found())?;
        state.end()
    }
}
