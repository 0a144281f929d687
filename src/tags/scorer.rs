//! Tag scorer - relevance of every vocabulary tag against one article
//!
//! Runs one match query per tag against the article's index and keeps the
//! tags that produced a positive score.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::article::normalize_tag;
use crate::search::ArticleIndex;

use super::vocabulary::Vocabulary;

/// A vocabulary tag with its relevance score for one article
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagMatch {
    pub tag: String,
    pub score: f32,
}

impl TagMatch {
    pub fn new(tag: impl Into<String>, score: f32) -> Self {
        Self {
            tag: tag.into(),
            score,
        }
    }
}

/// Scores a fixed vocabulary against article indexes
pub struct TagScorer<'a> {
    vocabulary: &'a Vocabulary,
}

impl<'a> TagScorer<'a> {
    pub fn new(vocabulary: &'a Vocabulary) -> Self {
        Self { vocabulary }
    }

    /// Score every vocabulary tag against `index`.
    ///
    /// Tags with no match (or no searchable tokens) are left out, so every
    /// returned match has a strictly positive score. Order follows the
    /// vocabulary.
    pub fn score(&self, index: &ArticleIndex) -> Result<Vec<TagMatch>> {
        let mut matches = Vec::new();

        for tag in self.vocabulary.iter() {
            let tag = normalize_tag(tag);
            let score = index
                .max_score(tag)
                .with_context(|| format!("Failed to score tag '{}'", tag))?;

            if let Some(score) = score.filter(|s| *s > 0.0) {
                matches.push(TagMatch::new(tag, score));
            }
        }

        Ok(matches)
    }
}
