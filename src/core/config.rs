//! pocket-autotag configuration module
//!
//! Config is read from `config.json` inside the config directory. Every
//! section is optional; missing fields fall back to the defaults below.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE: &str = "config.json";
pub const CONFIG_VERSION: u32 = 1;

/// Minimum relevance score a predicted tag must exceed
pub const DEFAULT_THRESHOLD: f32 = 0.01;
/// Maximum number of predicted tags added per article
pub const DEFAULT_MAX_NEW_TAGS: usize = 2;
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;
pub const DEFAULT_API_BASE_URL: &str = "https://getpocket.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub tagging: TaggingConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub retrieve: RetrieveConfig,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

/// Tag selection policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggingConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f32,

    #[serde(default = "default_max_new_tags")]
    pub max_new_tags: usize,
}

fn default_threshold() -> f32 {
    DEFAULT_THRESHOLD
}

fn default_max_new_tags() -> usize {
    DEFAULT_MAX_NEW_TAGS
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            max_new_tags: default_max_new_tags(),
        }
    }
}

/// Endpoints and timeouts for every remote call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Article body download, expiry degrades to title-only scoring
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Pocket API calls (retrieve, send, oauth)
    #[serde(default = "default_api_timeout")]
    pub api_timeout_secs: u64,

    /// How long to wait for the browser to come back during authorization
    #[serde(default = "default_auth_timeout")]
    pub auth_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Article bodies are truncated past this many bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_api_timeout() -> u64 {
    30
}

fn default_auth_timeout() -> u64 {
    300
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

fn default_user_agent() -> String {
    format!("pocket-autotag/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            fetch_timeout_secs: default_fetch_timeout(),
            api_timeout_secs: default_api_timeout(),
            auth_timeout_secs: default_auth_timeout(),
            user_agent: default_user_agent(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Which saved items are retrieved for tagging
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum RetrieveState {
    #[default]
    All,
    Unread,
    Archive,
}

impl RetrieveState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrieveState::All => "all",
            RetrieveState::Unread => "unread",
            RetrieveState::Archive => "archive",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrieveConfig {
    #[serde(default)]
    pub state: RetrieveState,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            tagging: TaggingConfig::default(),
            network: NetworkConfig::default(),
            retrieve: RetrieveConfig::default(),
        }
    }
}

impl Config {
    /// Load config from the config directory, falling back to defaults
    pub fn load(config_dir: &Path) -> Self {
        let path = config_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Self::default();
        }

        match Self::load_from_file(&path) {
            Ok(config) => {
                if config.version > CONFIG_VERSION {
                    tracing::warn!(
                        "Config version {} is newer than supported version {}.",
                        config.version,
                        CONFIG_VERSION
                    );
                }
                config
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to load {}: {:#}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }
}
