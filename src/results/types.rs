//! Result type definitions

use crate::providers::ProviderName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Provider-specific extra fields attached to a record
pub type ResultMeta = BTreeMap<String, serde_json::Value>;

/// A single normalized search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Result title
    pub title: String,
    /// Destination URL
    pub link: String,
    /// Snippet shown under the title (may be empty)
    #[serde(default)]
    pub description: String,
    /// Provider that produced this record
    pub source: ProviderName,
    /// Provider-specific fields (author, vote counts, publish time, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResultMeta>,
}

impl ResultRecord {
    /// Build a record, returning `None` when the title or link is empty.
    ///
    /// Extraction strategies only ever surface records built through here.
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        source: ProviderName,
    ) -> Option<Self> {
        let title = title.into().trim().to_string();
        let link = link.into().trim().to_string();
        if title.is_empty() || link.is_empty() {
            return None;
        }

        Some(Self {
            title,
            link,
            description: String::new(),
            source,
            meta: None,
        })
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add one meta field; empty strings and nulls are not recorded
    pub fn with_meta(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        let value = value.into();
        let blank = match &value {
            serde_json::Value::Null => true,
            serde_json::Value::String(s) => s.is_empty(),
            _ => false,
        };
        if !blank {
            self.meta
                .get_or_insert_with(ResultMeta::new)
                .insert(key.to_string(), value);
        }
        self
    }

    /// Look up a meta field
    pub fn meta_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.meta.as_ref().and_then(|m| m.get(key))
    }
}
