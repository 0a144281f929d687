pub mod article;
pub mod config;
pub mod error;
pub mod paths;

pub use article::{normalize_tag, Article};
pub use config::{Config, RetrieveState};
pub use error::ArticleError;
pub use paths::ConfigPaths;
