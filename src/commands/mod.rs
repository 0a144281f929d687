pub mod auth;
pub mod run;
pub mod suggest;
pub mod vocab;

use anyhow::Result;

use crate::core::paths::ConfigPaths;
use crate::pocket::{auth as pocket_auth, PocketClient};

/// Build an authorized client, running the OAuth flow if needed
pub(crate) async fn connect(paths: &ConfigPaths) -> Result<PocketClient> {
    let consumer_key = pocket_auth::get_consumer_key(paths).await?;
    let auth = pocket_auth::restore_authorization(paths, &consumer_key).await?;
    PocketClient::new(&paths.config.network, consumer_key, auth.access_token)
}
