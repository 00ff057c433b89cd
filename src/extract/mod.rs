//! Extraction strategies
//!
//! Pure functions from one provider's raw payload to normalized records. Records
//! without a title or link never leave this module.

pub mod content;
pub mod html;

pub use content::{extract_feed, strip_markup, truncate_description, DESCRIPTION_LIMIT};
pub use html::{absolute_link, HtmlExtractor, HtmlRule};

/// Collapse runs of whitespace into single spaces and trim the ends
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Rust \n\t 语言 "), "Rust 语言");
        assert_eq!(clean_text("\u{3000}"), "");
    }
}
