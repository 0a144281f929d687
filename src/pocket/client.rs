//! Pocket v3 API client
//!
//! Covers the two calls the tagger needs: retrieving every saved item with
//! its tags, and submitting bulk `tags_replace` actions.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::core::article::Article;
use crate::core::config::{NetworkConfig, RetrieveState};
use crate::pipeline::TagSink;

use super::types::{
    ModifyRequest, ModifyResponse, ReplaceTagsAction, RetrieveRequest, RetrieveResponse,
};

const RETRIEVE_PATH: &str = "/v3/get";
const SEND_PATH: &str = "/v3/send";

// ============================================================================
// Transport
// ============================================================================

/// JSON-over-POST transport shared by the authorized client and the OAuth
/// handshake
pub struct PocketApi {
    client: reqwest::Client,
    base_url: String,
}

impl PocketApi {
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        // Content-Type comes from RequestBuilder::json
        let mut headers = HeaderMap::new();
        headers.insert("x-accept", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `body` as JSON to `path` and decode the JSON response
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "POST");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", path))?;

        let status = response.status();
        if !status.is_success() {
            let reason = response
                .headers()
                .get("X-Error")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            match reason {
                Some(reason) => anyhow::bail!("Pocket API error {}: {}", status, reason),
                None => {
                    let text = response.text().await.unwrap_or_default();
                    anyhow::bail!("Pocket API error {}: {}", status, text.trim())
                }
            }
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {}", path))
    }
}

// ============================================================================
// Authorized client
// ============================================================================

/// Pocket client bound to one account's credentials
pub struct PocketClient {
    api: PocketApi,
    consumer_key: String,
    access_token: String,
}

impl PocketClient {
    pub fn new(
        config: &NetworkConfig,
        consumer_key: String,
        access_token: String,
    ) -> Result<Self> {
        Ok(Self {
            api: PocketApi::new(config)?,
            consumer_key,
            access_token,
        })
    }

    /// Retrieve every item in `state` with full details (tags included)
    pub async fn retrieve(&self, state: RetrieveState) -> Result<Vec<Article>> {
        let request = RetrieveRequest {
            consumer_key: &self.consumer_key,
            access_token: &self.access_token,
            state: state.as_str(),
            detail_type: "complete",
        };

        let response: RetrieveResponse = self
            .api
            .post_json(RETRIEVE_PATH, &request)
            .await
            .context("Failed to retrieve items")?;

        Ok(response.into_articles())
    }

    /// Submit bulk actions in one `/v3/send` request
    pub async fn send_actions(&self, actions: &[ReplaceTagsAction]) -> Result<()> {
        let request = ModifyRequest {
            consumer_key: &self.consumer_key,
            access_token: &self.access_token,
            actions,
        };

        let response: ModifyResponse = self.api.post_json(SEND_PATH, &request).await?;
        check_modify_response(&response)
    }
}

fn check_modify_response(response: &ModifyResponse) -> Result<()> {
    if response.status != 1 {
        anyhow::bail!("Pocket rejected the batch (status {})", response.status);
    }
    if let Some(pos) = response
        .action_results
        .iter()
        .position(|r| r.as_bool() == Some(false))
    {
        anyhow::bail!("Pocket rejected action {}", pos);
    }
    Ok(())
}

#[async_trait]
impl TagSink for PocketClient {
    async fn replace_tags(&self, action: ReplaceTagsAction) -> Result<()> {
        self.send_actions(std::slice::from_ref(&action)).await
    }
}
