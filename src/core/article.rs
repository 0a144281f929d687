//! Saved reading-list article
//!
//! Articles are produced by the retrieval client and stay immutable for the
//! whole prediction pass.

use serde::Serialize;
use std::collections::BTreeSet;

/// Quote character Pocket sometimes leaves around tag names
const TAG_QUOTE: char = '"';

/// Normalize a tag the way every stage compares them: surrounding quotes
/// trimmed, case preserved.
pub fn normalize_tag(tag: &str) -> &str {
    tag.trim_matches(TAG_QUOTE)
}

/// A saved item with its current tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    /// Opaque item identifier (a decimal string on the wire)
    pub item_id: String,
    pub title: String,
    pub url: String,
    /// Existing tags, already normalized
    pub tags: BTreeSet<String>,
}

impl Article {
    /// Create an article, normalizing the given tags
    pub fn new<I, S>(
        item_id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        tags: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            item_id: item_id.into(),
            title: title.into(),
            url: url.into(),
            tags: tags
                .into_iter()
                .map(|t| normalize_tag(t.as_ref()).to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("\"rust\""), "rust");
        assert_eq!(normalize_tag("rust"), "rust");
        assert_eq!(normalize_tag("\"\"Go"), "Go");
        assert_eq!(normalize_tag("\"\""), "");
    }

    #[test]
    fn test_new_normalizes_tags() {
        let article = Article::new(
            "42",
            "Title",
            "https://example.com",
            ["\"a\"", "a", "B", "\"\""],
        );
        assert_eq!(article.tags.len(), 2);
        assert!(article.tags.contains("a"));
        assert!(article.tags.contains("B"));
    }
}
