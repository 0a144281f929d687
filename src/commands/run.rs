use anyhow::{Context, Result};
use colored::*;
use tracing::info;

use crate::content::HttpContentFetcher;
use crate::core::config::RetrieveState;
use crate::core::paths::ConfigPaths;
use crate::pipeline::{ArticleReport, BatchReport, Outcome, Pipeline};
use crate::tags::{TagSelector, Vocabulary};

/// Flags of the `run` command; `None` keeps the configured value
#[derive(Debug, Default)]
pub struct RunOptions {
    pub state: Option<RetrieveState>,
    pub threshold: Option<f32>,
    pub max_new_tags: Option<usize>,
    pub limit: Option<usize>,
    pub dry_run: bool,
    pub json: bool,
}

pub async fn run(paths: &ConfigPaths, opts: RunOptions) -> Result<()> {
    let config = &paths.config;
    let client = super::connect(paths).await?;

    let state = opts.state.unwrap_or(config.retrieve.state);
    let mut articles = client.retrieve(state).await?;
    info!(count = articles.len(), state = state.as_str(), "Retrieved items");

    // Vocabulary comes from the whole batch, even when only a prefix is processed
    let vocabulary = Vocabulary::from_articles(&articles);
    if let Some(limit) = opts.limit {
        articles.truncate(limit);
    }

    let mut selector = TagSelector::from_config(&config.tagging);
    if let Some(threshold) = opts.threshold {
        selector = selector.with_threshold(threshold);
    }
    if let Some(max_new_tags) = opts.max_new_tags {
        selector = selector.with_max_new_tags(max_new_tags);
    }

    let fetcher = HttpContentFetcher::new(&config.network)
        .context("Failed to set up article fetcher")?;
    let pipeline = Pipeline::new(fetcher, client, selector).with_dry_run(opts.dry_run);

    if !opts.json {
        println!(
            "{} articles, {} known tags{}",
            articles.len().to_string().bold(),
            vocabulary.len().to_string().bold(),
            if opts.dry_run {
                " (dry run)".yellow().to_string()
            } else {
                String::new()
            }
        );
    }

    let json = opts.json;
    let report = pipeline
        .run(&articles, &vocabulary, |i, n, r| {
            if !json {
                print_progress(i, n, r);
            }
        })
        .await;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report, opts.dry_run);
    }

    Ok(())
}

fn print_progress(i: usize, n: usize, report: &ArticleReport) {
    let mut line = format!("{}/{}\t{}:\t", i, n, report.title.bold());
    for tag in &report.existing {
        line.push_str(tag);
        line.push(' ');
    }
    for tag in &report.added {
        line.push_str(&format!("+{} ", tag).green().to_string());
    }
    if !report.body_fetched {
        line.push_str(&"(title only) ".dimmed().to_string());
    }
    if let Outcome::Failed { stage, error } = &report.outcome {
        line.push_str(&format!("[{} failed: {}]", stage, error).red().to_string());
    }
    println!("{}", line.trim_end());
}

fn print_summary(report: &BatchReport, dry_run: bool) {
    println!();
    println!("{}", "=".repeat(60));
    println!(
        "{} {}, {} skipped, {} failed, {} tags added",
        report.synced().to_string().green().bold(),
        if dry_run { "previewed" } else { "synced" },
        report.skipped(),
        if report.failed() > 0 {
            report.failed().to_string().red().bold()
        } else {
            report.failed().to_string().normal()
        },
        report.tags_added()
    );
    if dry_run {
        println!("{}", "Dry run. Run without --dry-run to apply changes.".yellow());
    }
}
