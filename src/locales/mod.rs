//! Localized boundary messages
//!
//! Chinese is the default; English is served when the caller prefers it.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Supported message languages
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[("zh", "中文"), ("en", "English")];

/// Language served when nothing else matches
pub const FALLBACK_LANGUAGE: &str = "zh";

/// Messages the boundary layer can return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    MissingKeyword,
    InvalidPage,
    NoValidProviders,
    NoResults,
    SearchFailed,
}

static TRANSLATIONS: Lazy<Translations> = Lazy::new(Translations::new);

/// Parse Accept-Language header and return best matching locale
pub fn parse_accept_language(header: &str) -> Option<String> {
    // Parse header like "en-US,en;q=0.9,zh;q=0.8"
    let mut locales: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|part| {
            let mut parts = part.trim().split(';');
            let lang = parts.next()?.trim().to_ascii_lowercase();
            if lang.is_empty() {
                return None;
            }

            let quality = parts
                .next()
                .and_then(|q| q.trim().strip_prefix("q=").and_then(|v| v.parse().ok()))
                .unwrap_or(1.0);

            Some((lang, quality))
        })
        .collect();

    // Sort by quality descending; the sort is stable so header order breaks ties
    locales.sort_by(|a, b| b.1.total_cmp(&a.1));

    locales.into_iter().find_map(|(lang, _)| {
        let base = lang.split('-').next().unwrap_or(&lang);
        SUPPORTED_LANGUAGES
            .iter()
            .find(|(code, _)| *code == base)
            .map(|(code, _)| code.to_string())
    })
}

/// Pick the message language for a request
pub fn negotiate(accept_language: Option<&str>, default_locale: &str) -> String {
    accept_language
        .and_then(parse_accept_language)
        .or_else(|| parse_accept_language(default_locale))
        .unwrap_or_else(|| FALLBACK_LANGUAGE.to_string())
}

/// Look up a message
pub fn message(lang: &str, key: MessageKey) -> &'static str {
    TRANSLATIONS.get(lang, key)
}

/// Message for a failed search, with the error detail appended
pub fn search_failed(lang: &str, detail: &str) -> String {
    format!("{}{}", message(lang, MessageKey::SearchFailed), detail)
}

/// Static translation table
pub struct Translations {
    translations: HashMap<&'static str, HashMap<MessageKey, &'static str>>,
}

impl Translations {
    pub fn new() -> Self {
        let mut translations = HashMap::new();

        let mut zh = HashMap::new();
        zh.insert(MessageKey::MissingKeyword, "请提供搜索关键词(q参数)");
        zh.insert(MessageKey::InvalidPage, "页码必须是大于等于1的整数");
        zh.insert(MessageKey::NoValidProviders, "没有可用的搜索引擎");
        zh.insert(MessageKey::NoResults, "未找到相关结果");
        zh.insert(MessageKey::SearchFailed, "搜索失败: ");
        translations.insert("zh", zh);

        let mut en = HashMap::new();
        en.insert(
            MessageKey::MissingKeyword,
            "Please provide a search keyword (q parameter)",
        );
        en.insert(MessageKey::InvalidPage, "Page must be an integer of at least 1");
        en.insert(MessageKey::NoValidProviders, "No valid search engines requested");
        en.insert(MessageKey::NoResults, "No results found");
        en.insert(MessageKey::SearchFailed, "Search failed: ");
        translations.insert("en", en);

        Self { translations }
    }

    /// Get a translation, falling back to Chinese
    pub fn get(&self, lang: &str, key: MessageKey) -> &'static str {
        let base_lang = lang.split('-').next().unwrap_or(lang);

        self.translations
            .get(base_lang)
            .and_then(|t| t.get(&key))
            .or_else(|| {
                self.translations
                    .get(FALLBACK_LANGUAGE)
                    .and_then(|t| t.get(&key))
            })
            .copied()
            .unwrap_or("")
    }
}

impl Default for Translations {
    fn default() -> Self {
        Self::new()
    }
}
