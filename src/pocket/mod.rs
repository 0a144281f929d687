//! Pocket reading-list service
//!
//! - `auth`: consumer key, access token and the OAuth handshake
//! - `client`: item retrieval and bulk tag replacement
//! - `types`: v3 wire types

pub mod auth;
pub mod client;
pub mod types;

pub use client::{PocketApi, PocketClient};
pub use types::{Authorization, ReplaceTagsAction};
