use thiserror::Error;

/// Failure isolated to a single article. The batch driver records it and
/// moves on to the next article.
#[derive(Debug, Error)]
pub enum ArticleError {
    #[error("indexing failed: {0:#}")]
    Index(anyhow::Error),

    #[error("tag sync failed: {0:#}")]
    Sync(anyhow::Error),
}

impl ArticleError {
    pub fn kind(&self) -> &'static str {
        match self {
            ArticleError::Index(_) => "index",
            ArticleError::Sync(_) => "sync",
        }
    }
}
