use anyhow::Result;
use colored::*;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::core::config::TaggingConfig;
use crate::search::ArticleIndex;
use crate::tags::{TagMatch, TagScorer, TagSelector, Vocabulary};

#[derive(Serialize)]
struct SuggestResult {
    text: String,
    scores: Vec<TagMatch>,
    selected: Vec<String>,
}

/// Score `text` against an explicit vocabulary, offline
pub fn run(
    text: &str,
    tags: &[String],
    tagging: &TaggingConfig,
    max_new_tags: Option<usize>,
    json: bool,
) -> Result<()> {
    let vocabulary = Vocabulary::from_tags(tags);
    let mut selector = TagSelector::from_config(tagging);
    if let Some(max_new_tags) = max_new_tags {
        selector = selector.with_max_new_tags(max_new_tags);
    }

    let index = ArticleIndex::build(text, "")?;
    let mut scores = TagScorer::new(&vocabulary).score(&index)?;
    scores.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.tag.cmp(&b.tag)));

    let decision = selector.select(scores.clone(), &BTreeSet::new());
    let result = SuggestResult {
        text: text.to_string(),
        scores,
        selected: decision.new_tags().into_iter().map(str::to_string).collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("{}", "Tag Suggestions".bold());
    println!("{}", "=".repeat(60));
    println!();

    if result.scores.is_empty() {
        println!("{}", "No vocabulary tag matches this text.".yellow());
        return Ok(());
    }

    for (i, m) in result.scores.iter().enumerate() {
        let picked = result.selected.contains(&m.tag);
        let score = format!("{:.4}", m.score);
        let score_colored = if m.score <= selector.threshold() {
            score.dimmed()
        } else if picked {
            score.green()
        } else {
            score.normal()
        };
        let marker = if picked { "+".green().bold() } else { " ".normal() };
        println!("  {}{}. {} [{}]", marker, i + 1, m.tag.cyan(), score_colored);
    }

    Ok(())
}
