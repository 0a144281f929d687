//! Config directory management
//!
//! Handles config directory resolution and the files kept inside it.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::config::Config;

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "POCKET_AUTOTAG_CONFIG_DIR";

pub const CONSUMER_KEY_FILE: &str = "consumer_key";
pub const AUTH_FILE: &str = "auth.json";

/// Config directory wrapper that combines config and resolved file paths
pub struct ConfigPaths {
    pub consumer_key: PathBuf,
    pub auth: PathBuf,
    pub config: Config,
}

impl ConfigPaths {
    /// Resolve the config directory, create it and load the config inside.
    pub fn resolve(override_dir: Option<&Path>) -> Result<Self> {
        let root = match override_dir {
            Some(dir) => dir.to_path_buf(),
            None => get_config_root()?,
        };
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create config directory: {}", root.display()))?;
        Ok(Self::from_root(&root))
    }

    /// Create ConfigPaths from an existing directory
    pub fn from_root(root: &Path) -> Self {
        Self {
            consumer_key: root.join(CONSUMER_KEY_FILE),
            auth: root.join(AUTH_FILE),
            config: Config::load(root),
        }
    }
}

/// Get config directory from environment variable or the home directory.
/// Priority: POCKET_AUTOTAG_CONFIG_DIR env var > $HOME/.config/pocket
pub fn get_config_root() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_DIR_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let home = std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .context("HOME is not set; use --config-dir or POCKET_AUTOTAG_CONFIG_DIR")?;
    Ok(PathBuf::from(home).join(".config").join("pocket"))
}
