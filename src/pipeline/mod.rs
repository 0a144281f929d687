//! Batch tagging pipeline
//!
//! Articles are processed one at a time: fetch body, build the article
//! index, score the vocabulary, select tags, sync. A failure in any step
//! stays with its article; the batch always runs to the end.

pub mod emitter;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{error, warn};

use crate::content::ContentFetcher;
use crate::core::article::Article;
use crate::core::error::ArticleError;
use crate::pocket::types::ReplaceTagsAction;
use crate::search::ArticleIndex;
use crate::tags::{TagDecision, TagScorer, TagSelector, Vocabulary};

pub use emitter::{SyncEmitter, SyncStatus};

/// Destination for bulk tag-replace actions
#[async_trait]
pub trait TagSink: Send + Sync {
    async fn replace_tags(&self, action: ReplaceTagsAction) -> Result<()>;
}

#[async_trait]
impl<T: TagSink + ?Sized> TagSink for &T {
    async fn replace_tags(&self, action: ReplaceTagsAction) -> Result<()> {
        (**self).replace_tags(action).await
    }
}

// ============================================================================
// Reports
// ============================================================================

/// How processing of one article ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Synced,
    Skipped,
    DryRun,
    Failed { stage: &'static str, error: String },
}

/// Per-article result, printed as progress and collected in the batch report
#[derive(Debug, Clone, Serialize)]
pub struct ArticleReport {
    pub item_id: String,
    pub title: String,
    /// Whether body text was available (false means title-only scoring)
    pub body_fetched: bool,
    pub existing: Vec<String>,
    pub added: Vec<String>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub vocabulary_size: usize,
    pub articles: Vec<ArticleReport>,
}

impl BatchReport {
    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.articles.iter().filter(|a| pred(&a.outcome)).count()
    }

    pub fn synced(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Synced | Outcome::DryRun))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. }))
    }

    pub fn tags_added(&self) -> usize {
        self.articles.iter().map(|a| a.added.len()).sum()
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Index, score and select tags for one article's text.
///
/// The article index lives only for the duration of this call.
pub fn predict_tags(
    title: &str,
    body: &str,
    existing: &BTreeSet<String>,
    vocabulary: &Vocabulary,
    selector: &TagSelector,
) -> Result<TagDecision> {
    let index = ArticleIndex::build(title, body)?;
    let matches = TagScorer::new(vocabulary).score(&index)?;
    Ok(selector.select(matches, existing))
}

/// Turns one article's text into a tag decision
pub trait TagPredictor: Send + Sync {
    fn predict(
        &self,
        title: &str,
        body: &str,
        existing: &BTreeSet<String>,
        vocabulary: &Vocabulary,
    ) -> Result<TagDecision>;
}

impl TagPredictor for TagSelector {
    fn predict(
        &self,
        title: &str,
        body: &str,
        existing: &BTreeSet<String>,
        vocabulary: &Vocabulary,
    ) -> Result<TagDecision> {
        predict_tags(title, body, existing, vocabulary, self)
    }
}

pub struct Pipeline<F, S, P = TagSelector> {
    fetcher: F,
    emitter: SyncEmitter<S>,
    predictor: P,
}

impl<F: ContentFetcher, S: TagSink, P: TagPredictor> Pipeline<F, S, P> {
    pub fn new(fetcher: F, sink: S, predictor: P) -> Self {
        Self {
            fetcher,
            emitter: SyncEmitter::new(sink),
            predictor,
        }
    }

    /// Compute decisions without sending anything
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.emitter = self.emitter.with_dry_run(dry_run);
        self
    }

    /// Run every article through the pipeline in order.
    ///
    /// `on_article` is called after each article with its 1-based position,
    /// the batch size and the article's report.
    pub async fn run<C>(
        &self,
        articles: &[Article],
        vocabulary: &Vocabulary,
        mut on_article: C,
    ) -> BatchReport
    where
        C: FnMut(usize, usize, &ArticleReport),
    {
        let mut report = BatchReport {
            vocabulary_size: vocabulary.len(),
            articles: Vec::with_capacity(articles.len()),
        };

        for (i, article) in articles.iter().enumerate() {
            let article_report = self.process(article, vocabulary).await;
            on_article(i + 1, articles.len(), &article_report);
            report.articles.push(article_report);
        }

        report
    }

    /// Process a single article; never fails the batch
    pub async fn process(&self, article: &Article, vocabulary: &Vocabulary) -> ArticleReport {
        let body = match self.fetcher.fetch(&article.url).await {
            Ok(body) => body,
            Err(e) => {
                warn!(
                    item_id = %article.item_id,
                    url = %article.url,
                    "Fetch failed, scoring title only: {:#}",
                    e
                );
                String::new()
            }
        };

        let mut report = ArticleReport {
            item_id: article.item_id.clone(),
            title: article.title.clone(),
            body_fetched: !body.trim().is_empty(),
            existing: article.tags.iter().cloned().collect(),
            added: Vec::new(),
            outcome: Outcome::Skipped,
        };

        match self.tag_article(article, &body, vocabulary, &mut report).await {
            Ok(status) => {
                report.outcome = match status {
                    SyncStatus::Sent => Outcome::Synced,
                    SyncStatus::Skipped => Outcome::Skipped,
                    SyncStatus::DryRun => Outcome::DryRun,
                };
            }
            Err(e) => {
                error!(item_id = %article.item_id, "{}", e);
                report.outcome = Outcome::Failed {
                    stage: e.kind(),
                    error: format!("{:#}", e),
                };
            }
        }

        report
    }

    async fn tag_article(
        &self,
        article: &Article,
        body: &str,
        vocabulary: &Vocabulary,
        report: &mut ArticleReport,
    ) -> Result<SyncStatus, ArticleError> {
        let decision = self
            .predictor
            .predict(&article.title, body, &article.tags, vocabulary)
            .map_err(ArticleError::Index)?;
        report.added = decision.new_tags().into_iter().map(str::to_string).collect();

        self.emitter
            .emit(&article.item_id, &decision)
            .await
            .map_err(ArticleError::Sync)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned bodies; unknown URLs fail like a dead link
    #[derive(Default)]
    struct FakeFetcher {
        pages: HashMap<String, String>,
    }

    impl FakeFetcher {
        fn with_page(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), body.to_string());
            self
        }
    }

    #[async_trait]
    impl ContentFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("connection refused: {}", url))
        }
    }

    /// Records every action; fails for the listed item ids
    #[derive(Default)]
    struct RecordingSink {
        actions: Mutex<Vec<ReplaceTagsAction>>,
        failing: Vec<String>,
    }

    impl RecordingSink {
        fn failing_for(item_id: &str) -> Self {
            Self {
                failing: vec![item_id.to_string()],
                ..Self::default()
            }
        }

        fn actions(&self) -> Vec<ReplaceTagsAction> {
            self.actions.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TagSink for RecordingSink {
        async fn replace_tags(&self, action: ReplaceTagsAction) -> Result<()> {
            if self.failing.contains(&action.item_id) {
                anyhow::bail!("HTTP 503 Service Unavailable");
            }
            self.actions.lock().unwrap().push(action);
            Ok(())
        }
    }

    fn article(id: &str, title: &str, tags: &[&str]) -> Article {
        Article::new(
            id,
            title,
            format!("https://example.com/{}", id),
            tags.iter().copied(),
        )
    }

    #[tokio::test]
    async fn test_adds_strongly_matching_tag_only() {
        let fetcher = FakeFetcher::default().with_page(
            "https://example.com/1",
            "The go scheduler multiplexes go routines onto threads.",
        );
        let sink = RecordingSink::default();
        let pipeline = Pipeline::new(fetcher, &sink, TagSelector::new());

        let vocab = Vocabulary::from_tags(["go", "cooking"]);
        let report = pipeline
            .process(&article("1", "Understanding Go", &["programming"]), &vocab)
            .await;

        assert_eq!(report.added, vec!["go"]);
        assert_eq!(report.outcome, Outcome::Synced);
        assert!(report.body_fetched);
        assert_eq!(sink.actions(), vec![ReplaceTagsAction::new("1", "go,programming")]);
    }

    #[tokio::test]
    async fn test_fetch_failure_scores_title_only() {
        let sink = RecordingSink::default();
        let pipeline = Pipeline::new(FakeFetcher::default(), &sink, TagSelector::new());

        let vocab = Vocabulary::from_tags(["rust", "safety"]);
        let report = pipeline
            .process(&article("2", "Intro to Rust safety", &[]), &vocab)
            .await;

        assert!(!report.body_fetched);
        assert_eq!(report.added.len(), 2);
        assert!(report.added.contains(&"rust".to_string()));
        assert!(report.added.contains(&"safety".to_string()));
        assert_eq!(sink.actions(), vec![ReplaceTagsAction::new("2", "rust,safety")]);
    }

    #[tokio::test]
    async fn test_empty_decision_sends_nothing() {
        let sink = RecordingSink::default();
        let pipeline = Pipeline::new(FakeFetcher::default(), &sink, TagSelector::new());

        let vocab = Vocabulary::from_tags(["cooking"]);
        let report = pipeline
            .process(&article("3", "Go internals", &[]), &vocab)
            .await;

        assert_eq!(report.outcome, Outcome::Skipped);
        assert!(sink.actions().is_empty());
    }

    #[tokio::test]
    async fn test_existing_tags_still_replaced_without_matches() {
        let sink = RecordingSink::default();
        let pipeline = Pipeline::new(FakeFetcher::default(), &sink, TagSelector::new());

        let vocab = Vocabulary::from_tags(["archive"]);
        let report = pipeline
            .process(&article("4", "Go internals", &["archive"]), &vocab)
            .await;

        assert!(report.added.is_empty());
        assert_eq!(report.outcome, Outcome::Synced);
        assert_eq!(sink.actions(), vec![ReplaceTagsAction::new("4", "archive")]);
    }

    #[tokio::test]
    async fn test_empty_vocabulary_keeps_existing_tags() {
        let sink = RecordingSink::default();
        let pipeline = Pipeline::new(FakeFetcher::default(), &sink, TagSelector::new());

        let report = pipeline
            .process(
                &article("5", "Rust and Go", &["lang", "\"quoted\""]),
                &Vocabulary::default(),
            )
            .await;

        assert!(report.added.is_empty());
        assert_eq!(sink.actions(), vec![ReplaceTagsAction::new("5", "lang,quoted")]);
    }

    #[tokio::test]
    async fn test_at_most_two_new_tags() {
        let fetcher = FakeFetcher::default().with_page(
            "https://example.com/6",
            "rust go python zig rust go python rust go rust",
        );
        let sink = RecordingSink::default();
        let pipeline = Pipeline::new(fetcher, &sink, TagSelector::new());

        let vocab = Vocabulary::from_tags(["rust", "go", "python", "zig"]);
        let report = pipeline
            .process(&article("6", "Languages", &["old"]), &vocab)
            .await;

        assert_eq!(report.added, vec!["rust", "go"]);
        assert_eq!(sink.actions()[0].tags, "go,old,rust");
    }

    #[tokio::test]
    async fn test_sync_failure_does_not_stop_batch() {
        let sink = RecordingSink::failing_for("7");
        let pipeline = Pipeline::new(FakeFetcher::default(), &sink, TagSelector::new());

        let articles = vec![
            article("7", "Rust tips", &["rust"]),
            article("8", "More rust tips", &[]),
        ];
        let vocab = Vocabulary::from_articles(&articles);

        let mut seen = Vec::new();
        let report = pipeline
            .run(&articles, &vocab, |i, n, r| seen.push((i, n, r.item_id.clone())))
            .await;

        assert_eq!(seen, vec![(1, 2, "7".to_string()), (2, 2, "8".to_string())]);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.synced(), 1);
        assert!(matches!(
            report.articles[0].outcome,
            Outcome::Failed { stage: "sync", .. }
        ));
        assert_eq!(sink.actions(), vec![ReplaceTagsAction::new("8", "rust")]);
    }

    /// Fails on articles whose title mentions "corrupt", selects normally otherwise
    struct FlakyPredictor(TagSelector);

    impl TagPredictor for FlakyPredictor {
        fn predict(
            &self,
            title: &str,
            body: &str,
            existing: &BTreeSet<String>,
            vocabulary: &Vocabulary,
        ) -> Result<TagDecision> {
            if title.contains("corrupt") {
                anyhow::bail!("index segment unreadable");
            }
            self.0.predict(title, body, existing, vocabulary)
        }
    }

    #[tokio::test]
    async fn test_index_failure_does_not_stop_batch() {
        let sink = RecordingSink::default();
        let pipeline = Pipeline::new(
            FakeFetcher::default(),
            &sink,
            FlakyPredictor(TagSelector::new()),
        );

        let articles = vec![
            article("11", "corrupt rust page", &["rust"]),
            article("12", "Rust tips", &[]),
        ];
        let vocab = Vocabulary::from_articles(&articles);
        let report = pipeline.run(&articles, &vocab, |_, _, _| {}).await;

        match &report.articles[0].outcome {
            Outcome::Failed { stage, error } => {
                assert_eq!(*stage, "index");
                assert!(error.contains("index segment unreadable"));
            }
            other => panic!("expected index failure, got {:?}", other),
        }
        assert_eq!(report.articles[1].outcome, Outcome::Synced);
        assert_eq!(report.failed(), 1);
        assert_eq!(sink.actions(), vec![ReplaceTagsAction::new("12", "rust")]);
    }

    #[tokio::test]
    async fn test_dry_run_sends_nothing() {
        let sink = RecordingSink::default();
        let pipeline =
            Pipeline::new(FakeFetcher::default(), &sink, TagSelector::new()).with_dry_run(true);

        let vocab = Vocabulary::from_tags(["rust"]);
        let report = pipeline
            .process(&article("9", "Rust", &[]), &vocab)
            .await;

        assert_eq!(report.added, vec!["rust"]);
        assert_eq!(report.outcome, Outcome::DryRun);
        assert!(sink.actions().is_empty());
    }

    #[tokio::test]
    async fn test_rerun_gives_same_decision() {
        let fetcher = FakeFetcher::default()
            .with_page("https://example.com/10", "memory safety without garbage collection");
        let sink = RecordingSink::default();
        let pipeline = Pipeline::new(fetcher, &sink, TagSelector::new());

        let vocab = Vocabulary::from_tags(["memory", "safety", "gc", "web"]);
        let item = article("10", "Rust ownership", &["rust"]);
        let first = pipeline.process(&item, &vocab).await;
        let second = pipeline.process(&item, &vocab).await;

        assert_eq!(first.added, second.added);
        let actions = sink.actions();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0], actions[1]);
    }

    #[test]
    fn test_batch_report_json() {
        let report = BatchReport {
            vocabulary_size: 3,
            articles: vec![ArticleReport {
                item_id: "1".into(),
                title: "T".into(),
                body_fetched: false,
                existing: vec![],
                added: vec!["go".into()],
                outcome: Outcome::Failed {
                    stage: "sync",
                    error: "boom".into(),
                },
            }],
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["articles"][0]["status"], "failed");
        assert_eq!(value["articles"][0]["stage"], "sync");
        assert_eq!(report.tags_added(), 1);
    }
}
