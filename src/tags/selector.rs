//! Tag selector - turns scored matches into the final tag set
//!
//! Matches at or below the threshold are noise. The survivors are ranked by
//! score and the best `max_new_tags` are added to the article's existing
//! tags. Existing tags are never removed.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::core::config::{TaggingConfig, DEFAULT_MAX_NEW_TAGS, DEFAULT_THRESHOLD};

use super::scorer::TagMatch;

/// Final tag set for one article, ready to sync
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagDecision {
    /// Tags the article already had
    pub existing: BTreeSet<String>,
    /// Selected predictions, best first
    pub predicted: Vec<TagMatch>,
}

impl TagDecision {
    /// Union of existing and predicted tags
    pub fn tags(&self) -> BTreeSet<String> {
        let mut tags = self.existing.clone();
        tags.extend(self.predicted.iter().map(|m| m.tag.clone()));
        tags
    }

    /// Predicted tags the article did not already have
    pub fn new_tags(&self) -> Vec<&str> {
        self.predicted
            .iter()
            .map(|m| m.tag.as_str())
            .filter(|t| !self.existing.contains(*t))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.existing.is_empty() && self.predicted.is_empty()
    }

    /// Comma-joined tag list as the bulk replace action expects it
    pub fn joined(&self) -> String {
        self.tags().into_iter().collect::<Vec<_>>().join(",")
    }
}

/// Threshold and top-K selection policy
#[derive(Debug, Clone)]
pub struct TagSelector {
    /// Matches must score strictly above this
    threshold: f32,
    /// Top-K cutoff for predicted tags
    max_new_tags: usize,
}

impl Default for TagSelector {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_new_tags: DEFAULT_MAX_NEW_TAGS,
        }
    }
}

impl TagSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &TaggingConfig) -> Self {
        Self {
            threshold: config.threshold,
            max_new_tags: config.max_new_tags,
        }
    }

    /// Set minimum relevance threshold
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set top-K cutoff
    pub fn with_max_new_tags(mut self, max_new_tags: usize) -> Self {
        self.max_new_tags = max_new_tags;
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Select the best matches and union them with `existing`
    pub fn select(&self, matches: Vec<TagMatch>, existing: &BTreeSet<String>) -> TagDecision {
        let mut predicted: Vec<TagMatch> = matches
            .into_iter()
            .filter(|m| m.score > self.threshold)
            .collect();

        // Sort by score descending, tag name breaks ties
        predicted.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.tag.cmp(&b.tag)));
        predicted.truncate(self.max_new_tags);

        TagDecision {
            existing: existing.clone(),
            predicted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn existing(tags: &[&str]) -> BTreeSet<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let matches = vec![
            TagMatch::new("at", 0.01),
            TagMatch::new("below", 0.005),
            TagMatch::new("above", 0.011),
        ];
        let decision = TagSelector::new().select(matches, &existing(&[]));

        assert_eq!(decision.new_tags(), vec!["above"]);
    }

    #[test]
    fn test_top_k_cutoff() {
        let matches = vec![
            TagMatch::new("a", 0.3),
            TagMatch::new("b", 0.9),
            TagMatch::new("c", 0.5),
            TagMatch::new("d", 0.7),
        ];
        let decision = TagSelector::new().select(matches, &existing(&[]));

        assert_eq!(decision.new_tags(), vec!["b", "d"]);
        assert_eq!(decision.joined(), "b,d");
    }

    #[test]
    fn test_fewer_matches_than_k() {
        let matches = vec![TagMatch::new("only", 0.4)];
        let decision = TagSelector::new().select(matches, &existing(&[]));
        assert_eq!(decision.predicted.len(), 1);
    }

    #[test]
    fn test_existing_tags_are_kept() {
        let matches = vec![TagMatch::new("go", 0.8), TagMatch::new("web", 0.6)];
        let decision = TagSelector::new().select(matches, &existing(&["archive", "zz"]));

        let tags = decision.tags();
        assert!(tags.contains("archive"));
        assert!(tags.contains("zz"));
        assert_eq!(tags.len(), 4);
    }

    #[test]
    fn test_no_matches_keeps_existing_unchanged() {
        let decision = TagSelector::new().select(vec![], &existing(&["archive"]));

        assert!(decision.predicted.is_empty());
        assert_eq!(decision.tags(), existing(&["archive"]));
        assert_eq!(decision.joined(), "archive");
        assert!(!decision.is_empty());
    }

    #[test]
    fn test_empty_decision() {
        let matches = vec![TagMatch::new("noise", 0.001)];
        let decision = TagSelector::new().select(matches, &existing(&[]));

        assert!(decision.is_empty());
        assert_eq!(decision.joined(), "");
    }

    #[test]
    fn test_predicted_existing_tag_not_reported_as_new() {
        let matches = vec![TagMatch::new("rust", 0.9), TagMatch::new("safety", 0.5)];
        let decision = TagSelector::new().select(matches, &existing(&["rust"]));

        assert_eq!(decision.new_tags(), vec!["safety"]);
        assert_eq!(decision.joined(), "rust,safety");
    }

    #[test]
    fn test_ties_break_by_name() {
        let matches = vec![
            TagMatch::new("c", 0.5),
            TagMatch::new("a", 0.5),
            TagMatch::new("b", 0.5),
        ];
        let decision = TagSelector::new().select(matches, &existing(&[]));
        assert_eq!(decision.new_tags(), vec!["a", "b"]);
    }

    #[test]
    fn test_custom_policy() {
        let matches = vec![
            TagMatch::new("a", 0.3),
            TagMatch::new("b", 0.9),
            TagMatch::new("c", 0.5),
        ];
        let selector = TagSelector::new().with_threshold(0.4).with_max_new_tags(5);
        let decision = selector.select(matches, &existing(&[]));

        assert_eq!(decision.new_tags(), vec!["b", "c"]);
    }

    #[test]
    fn test_from_config() {
        let config = TaggingConfig {
            threshold: 0.2,
            max_new_tags: 1,
        };
        let selector = TagSelector::from_config(&config);
        assert_eq!(selector.threshold(), 0.2);

        let matches = vec![
            TagMatch::new("a", 0.1),
            TagMatch::new("b", 0.9),
            TagMatch::new("c", 0.5),
        ];
        assert_eq!(selector.select(matches, &BTreeSet::new()).new_tags(), vec!["b"]);
    }
}
