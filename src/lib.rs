//! pocket-autotag
//!
//! Proposes tags for saved Pocket articles by scoring each article's text
//! against the vocabulary of tags already in use, then writes the result
//! back with bulk `tags_replace` actions.

pub mod commands;
pub mod content;
pub mod core;
pub mod pipeline;
pub mod pocket;
pub mod search;
pub mod tags;
