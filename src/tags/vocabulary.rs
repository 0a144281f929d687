//! Tag vocabulary - the candidate tags for a run
//!
//! Built once from the tags already applied across the retrieved articles
//! and passed by reference to every later stage. It never changes mid-run.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::core::article::{normalize_tag, Article};

/// Deduplicated, normalized set of known tags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Vocabulary {
    tags: BTreeSet<String>,
}

impl Vocabulary {
    /// Collect every tag used by any article in the batch
    pub fn from_articles(articles: &[Article]) -> Self {
        Self::from_tags(articles.iter().flat_map(|a| a.tags.iter()))
    }

    /// Build from arbitrary tag strings (quote-trimmed, empties dropped)
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags = tags
            .into_iter()
            .map(|t| normalize_tag(t.as_ref()).to_string())
            .filter(|t| !t.is_empty())
            .collect();
        Self { tags }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// How many articles carry a given tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagUsage {
    pub tag: String,
    pub count: usize,
}

/// Count tag usage across the batch, most used first
pub fn tag_usage(articles: &[Article]) -> Vec<TagUsage> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for article in articles {
        for tag in &article.tags {
            *counts.entry(normalize_tag(tag)).or_default() += 1;
        }
    }

    let mut usage: Vec<TagUsage> = counts
        .into_iter()
        .filter(|(tag, _)| !tag.is_empty())
        .map(|(tag, count)| TagUsage {
            tag: tag.to_string(),
            count,
        })
        .collect();

    // Stable sort keeps alphabetical order among equal counts
    usage.sort_by(|a, b| b.count.cmp(&a.count));
    usage
}
