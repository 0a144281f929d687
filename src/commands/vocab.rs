use anyhow::Result;
use colored::*;
use serde::Serialize;

use crate::core::config::RetrieveState;
use crate::core::paths::ConfigPaths;
use crate::tags::{tag_usage, TagUsage};

#[derive(Serialize)]
struct VocabResult {
    total_articles: usize,
    untagged_articles: usize,
    unique_tags: usize,
    tag_usage: Vec<TagUsage>,
}

/// Print the tag vocabulary the predictor would use
pub async fn run(paths: &ConfigPaths, state: Option<RetrieveState>, json: bool) -> Result<()> {
    let client = super::connect(paths).await?;
    let articles = client
        .retrieve(state.unwrap_or(paths.config.retrieve.state))
        .await?;

    let usage = tag_usage(&articles);
    let result = VocabResult {
        total_articles: articles.len(),
        untagged_articles: articles.iter().filter(|a| a.tags.is_empty()).count(),
        unique_tags: usage.len(),
        tag_usage: usage,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_report(&result);
    }

    Ok(())
}

fn print_report(result: &VocabResult) {
    println!("{}", "Tag Vocabulary".bold());
    println!("{}", "=".repeat(60));
    println!();
    println!("Articles:        {}", result.total_articles);
    println!("Without tags:    {}", result.untagged_articles);
    println!("Unique tags:     {}", result.unique_tags);
    println!();

    if result.tag_usage.is_empty() {
        println!("{}", "No tags in use yet. Nothing to predict from.".yellow());
        return;
    }

    for usage in &result.tag_usage {
        let count_colored = if usage.count >= 5 {
            usage.count.to_string().green()
        } else if usage.count >= 2 {
            usage.count.to_string().yellow()
        } else {
            usage.count.to_string().dimmed()
        };
        println!("  {} × {}", count_colored, usage.tag);
    }
}
