//! Relevance indexing for tag prediction
//!
//! Every article is indexed on its own, in memory, and dropped once its tags
//! are scored. Nothing is persisted between articles.

pub mod index;

pub use index::ArticleIndex;
