//! Tag prediction engine
//!
//! # Components
//!
//! - `vocabulary`: known tags, collected once per run
//! - `scorer`: BM25 relevance of each tag against an article index
//! - `selector`: threshold, top-K cutoff and union with existing tags

pub mod scorer;
pub mod selector;
pub mod vocabulary;

pub use scorer::{TagMatch, TagScorer};
pub use selector::{TagDecision, TagSelector};
pub use vocabulary::{tag_usage, TagUsage, Vocabulary};
