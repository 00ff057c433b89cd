//! Tagged JSON content feeds
//!
//! The feed is an object whose `data` array holds entries. Each entry either is
//! the content item or wraps it under `object`; the item's `type` tag decides
//! how it maps onto a [`ResultRecord`]. Unknown tags are skipped.

use super::clean_text;
use crate::providers::{ProviderError, ProviderName};
use crate::results::ResultRecord;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Maximum description length, in characters
pub const DESCRIPTION_LIMIT: usize = 200;

/// Appended to descriptions cut at [`DESCRIPTION_LIMIT`]
pub const TRUNCATION_MARKER: &str = "...";

/// Field holding the entry list
pub const FEED_FIELD: &str = "data";

const QUESTION_URL: &str = "https://www.zhihu.com/question";
const ARTICLE_URL: &str = "https://zhuanlan.zhihu.com/p";

static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[a-zA-Z][^>]*>").unwrap());

/// Content item types understood by the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Answer,
    Article,
    Question,
}

impl ContentKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "answer" => Some(Self::Answer),
            "article" => Some(Self::Article),
            "question" => Some(Self::Question),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Answer => "answer",
            Self::Article => "article",
            Self::Question => "question",
        }
    }
}

/// Remove highlight markup such as `<em>` and collapse whitespace
pub fn strip_markup(text: &str) -> String {
    clean_text(&MARKUP.replace_all(text, ""))
}

/// Cut a description to [`DESCRIPTION_LIMIT`] characters, appending the marker
pub fn truncate_description(text: &str) -> String {
    if text.chars().count() <= DESCRIPTION_LIMIT {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(DESCRIPTION_LIMIT).collect();
    cut.push_str(TRUNCATION_MARKER);
    cut
}

/// Normalize a content feed into records
pub fn extract_feed(payload: &Value, source: ProviderName) -> Result<Vec<ResultRecord>, ProviderError> {
    if let Some(error) = payload.get("error").filter(|e| !e.is_null()) {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(ProviderError::Api(message));
    }

    let entries = payload
        .get(FEED_FIELD)
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::Parse(format!("missing `{FEED_FIELD}` array")))?;

    Ok(entries
        .iter()
        .filter_map(|entry| entry_record(entry, source))
        .collect())
}

fn entry_record(entry: &Value, source: ProviderName) -> Option<ResultRecord> {
    let item = entry.get("object").unwrap_or(entry);
    let kind = item.get("type").and_then(Value::as_str).and_then(ContentKind::from_tag)?;

    // Search highlights sit on the wrapping entry, older payloads put them on the item
    let highlight = |field: &str| {
        entry
            .pointer(&format!("/highlight/{field}"))
            .or_else(|| item.pointer(&format!("/highlight/{field}")))
            .and_then(Value::as_str)
    };

    let (title, link) = match kind {
        ContentKind::Answer => {
            let title = first_str(&[
                item.pointer("/question/name").and_then(Value::as_str),
                str_field(item, "title"),
                highlight("title"),
            ]);
            let question = item.get("question").and_then(|q| id_of(q.get("id")));
            let link = question
                .zip(id_of(item.get("id")))
                .map(|(qid, id)| format!("{QUESTION_URL}/{qid}/answer/{id}"));
            (title, link)
        }
        ContentKind::Article => {
            let title = first_str(&[str_field(item, "title"), highlight("title")]);
            let link = id_of(item.get("id")).map(|id| format!("{ARTICLE_URL}/{id}"));
            (title, link)
        }
        ContentKind::Question => {
            let title = first_str(&[
                str_field(item, "name"),
                str_field(item, "title"),
                highlight("title"),
            ]);
            let link = id_of(item.get("id")).map(|id| format!("{QUESTION_URL}/{id}"));
            (title, link)
        }
    };

    let mut record = ResultRecord::new(strip_markup(&title?), link?, source)?;

    let description = first_str(&[str_field(item, "excerpt"), highlight("description")])
        .map(|d| truncate_description(&strip_markup(&d)))
        .unwrap_or_default();
    record = record
        .with_description(description)
        .with_meta("type", kind.as_str());

    match kind {
        ContentKind::Answer | ContentKind::Article => {
            let author = item
                .pointer("/author/name")
                .and_then(Value::as_str)
                .map(strip_markup);
            record = record
                .with_meta("author", author)
                .with_meta("voteup_count", count(item, "voteup_count"))
                .with_meta("comment_count", count(item, "comment_count"))
                .with_meta("created", created(item));
        }
        ContentKind::Question => {
            record = record
                .with_meta("answer_count", count(item, "answer_count"))
                .with_meta("follower_count", count(item, "follower_count"));
        }
    }

    Some(record)
}

fn str_field<'a>(item: &'a Value, field: &str) -> Option<&'a str> {
    item.get(field).and_then(Value::as_str)
}

/// First candidate that is non-empty after markup stripping
fn first_str(candidates: &[Option<&str>]) -> Option<String> {
    candidates
        .iter()
        .flatten()
        .find(|s| !strip_markup(s).is_empty())
        .map(|s| s.to_string())
}

/// Ids arrive as numbers or strings depending on the endpoint
fn id_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn count(item: &Value, field: &str) -> Option<u64> {
    item.get(field).and_then(Value::as_u64)
}

fn created(item: &Value) -> Option<String> {
    let secs = item.get("created_time").and_then(Value::as_i64)?;
    DateTime::<Utc>::from_timestamp(secs, 0).map(|t| t.to_rfc3339())
}
