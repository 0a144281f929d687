//! Per-article BM25 index using Tantivy
//!
//! Each article gets a throwaway in-memory index holding a single document
//! (title plus extracted body). Tags are scored by running a match query
//! against it: the tag text goes through the same analyzer as the document
//! and the resulting terms are OR-ed together.

use anyhow::{Context, Result};
use tantivy::collector::TopDocs;
use tantivy::query::BooleanQuery;
use tantivy::schema::{Field, Schema, TEXT};
use tantivy::tokenizer::{Token, TokenStream};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, Term};

/// Writer heap for a single small document, just above tantivy's minimum
const WRITER_HEAP_BYTES: usize = 20_000_000;

// ============================================================================
// Article Index
// ============================================================================

/// Single-document full-text index for one article
pub struct ArticleIndex {
    index: Index,
    reader: IndexReader,
    text_field: Field,
}

impl ArticleIndex {
    /// Build the index from the article title and its fetched body.
    ///
    /// The document text is `title + " " + body`, or the title alone when
    /// the body is empty.
    pub fn build(title: &str, body: &str) -> Result<Self> {
        let (schema, text_field) = Self::build_schema();
        let index = Index::create_in_ram(schema);

        let mut writer: IndexWriter = index
            .writer_with_num_threads(1, WRITER_HEAP_BYTES)
            .context("Failed to create index writer")?;

        writer
            .add_document(doc!(text_field => Self::document_text(title, body)))
            .context("Failed to add article document")?;
        writer.commit().context("Failed to commit index")?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .context("Failed to create index reader")?;

        Ok(Self {
            index,
            reader,
            text_field,
        })
    }

    /// Run a match query for `query` and return the best document score.
    ///
    /// Returns `None` when the query analyzes to no terms or matches nothing.
    pub fn max_score(&self, query: &str) -> Result<Option<f32>> {
        let terms = self.analyze(query)?;
        if terms.is_empty() {
            return Ok(None);
        }

        let query = BooleanQuery::new_multiterms_query(terms);
        let searcher = self.reader.searcher();
        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(1))
            .context("Search execution failed")?;

        Ok(top_docs.first().map(|(score, _)| *score))
    }

    // ------------------------------------------------------------------------
    // Private helpers
    // ------------------------------------------------------------------------

    fn build_schema() -> (Schema, Field) {
        let mut schema_builder = Schema::builder();

        // TEXT: tokenized and indexed with positions, not stored
        let text_field = schema_builder.add_text_field("text", TEXT);

        (schema_builder.build(), text_field)
    }

    fn document_text(title: &str, body: &str) -> String {
        let body = body.trim();
        if body.is_empty() {
            title.to_string()
        } else {
            format!("{} {}", title, body)
        }
    }

    /// Tokenize with the analyzer registered for the document field
    fn analyze(&self, text: &str) -> Result<Vec<Term>> {
        let field = self.text_field;
        let mut analyzer = self
            .index
            .tokenizer_for_field(field)
            .context("No analyzer for text field")?;

        let mut terms = Vec::new();
        let mut stream = analyzer.token_stream(text);
        stream.process(&mut |token: &Token| {
            terms.push(Term::from_field_text(field, &token.text));
        });

        Ok(terms)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_indexes_title_and_body() -> Result<()> {
        let index = ArticleIndex::build("Rust Programming", "Systems language")?;
        assert!(index.max_score("programming")?.is_some());
        assert!(index.max_score("systems")?.is_some());
        Ok(())
    }

    #[test]
    fn test_document_text() {
        assert_eq!(ArticleIndex::document_text("Title", "body"), "Title body");
        assert_eq!(ArticleIndex::document_text("Title", ""), "Title");
        assert_eq!(ArticleIndex::document_text("Title", "  \n"), "Title");
    }

    #[test]
    fn test_match_is_case_insensitive() -> Result<()> {
        let index = ArticleIndex::build("Learning RUST the hard way", "")?;
        let score = index.max_score("rust")?;
        assert!(score.unwrap_or(0.0) > 0.0);
        Ok(())
    }

    #[test]
    fn test_no_match_returns_none() -> Result<()> {
        let index = ArticleIndex::build("Cooking pasta", "Boil water and add salt")?;
        assert_eq!(index.max_score("kubernetes")?, None);
        Ok(())
    }

    #[test]
    fn test_query_without_tokens() -> Result<()> {
        let index = ArticleIndex::build("Anything", "")?;
        assert_eq!(index.max_score("")?, None);
        assert_eq!(index.max_score("!!!")?, None);
        Ok(())
    }

    #[test]
    fn test_body_contributes_to_score() -> Result<()> {
        let index = ArticleIndex::build("Weekly notes", "the go scheduler and go routines")?;
        assert!(index.max_score("go")?.is_some());
        Ok(())
    }

    #[test]
    fn test_multi_word_query_matches_any_term() -> Result<()> {
        let index = ArticleIndex::build("Notes on machine sympathy", "")?;
        assert!(index.max_score("machine learning")?.is_some());
        Ok(())
    }

    #[test]
    fn test_more_occurrences_score_higher() -> Result<()> {
        let index = ArticleIndex::build("rust rust rust and a little go", "")?;
        let rust = index.max_score("rust")?.unwrap_or(0.0);
        let go = index.max_score("go")?.unwrap_or(0.0);
        assert!(rust > go);
        Ok(())
    }

    #[test]
    fn test_scores_are_deterministic() -> Result<()> {
        let first = ArticleIndex::build("Intro to Rust safety", "ownership and borrowing")?;
        let second = ArticleIndex::build("Intro to Rust safety", "ownership and borrowing")?;
        assert_eq!(first.max_score("safety")?, second.max_score("safety")?);
        assert_eq!(first.max_score("safety")?, first.max_score("safety")?);
        Ok(())
    }
}
