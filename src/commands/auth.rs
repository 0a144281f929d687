use anyhow::Result;
use colored::*;

use crate::core::paths::ConfigPaths;
use crate::pocket::auth;

/// Re-run authorization and replace the stored access token
pub async fn run(paths: &ConfigPaths) -> Result<()> {
    let consumer_key = auth::get_consumer_key(paths).await?;
    let authorization = auth::authorize(paths, &consumer_key).await?;

    println!(
        "{} Authorized as {}. Token saved to {}",
        "✓".green().bold(),
        authorization.username.bold(),
        paths.auth.display()
    );
    Ok(())
}
