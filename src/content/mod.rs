//! Article body retrieval
//!
//! Fetching is best effort: the pipeline treats any error here as an empty
//! body and scores the article on its title alone.

pub mod extract;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::core::config::NetworkConfig;

pub use extract::extract_main_text;

/// Source of article body text
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch `url` and return its extracted plain text
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Downloads pages over HTTP and extracts their main content
pub struct HttpContentFetcher {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl HttpContentFetcher {
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }
}

#[async_trait]
impl ContentFetcher for HttpContentFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        if url.is_empty() {
            anyhow::bail!("Article has no URL");
        }

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .context("HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {} for {}", status, url);
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_ascii_lowercase();

        if !content_type.contains("html") && !content_type.starts_with("text/") {
            anyhow::bail!("Unsupported content type {} for {}", content_type, url);
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .context("Failed to read response body")?
        {
            if !append_capped(&mut bytes, &chunk, self.max_body_bytes) {
                debug!(url, limit = self.max_body_bytes, "Body truncated");
                break;
            }
        }
        let body = String::from_utf8_lossy(&bytes);

        if content_type.contains("html") {
            Ok(extract_main_text(&body))
        } else {
            Ok(body.into_owned())
        }
    }
}

/// Append `chunk` without growing `buf` past `limit`. Returns false once the
/// limit is reached.
fn append_capped(buf: &mut Vec<u8>, chunk: &[u8], limit: usize) -> bool {
    let room = limit.saturating_sub(buf.len());
    buf.extend_from_slice(&chunk[..chunk.len().min(room)]);
    buf.len() < limit
}
