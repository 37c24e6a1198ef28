//! CLI error types.

use smap_config::ConfigError;
use smap_sitemap::{CacheError, InvalidPriority, PatternError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Cache(#[from] CacheError),

    #[error("Invalid route: {0}")]
    Pattern(#[from] PatternError),

    #[error("{0}")]
    Priority(#[from] InvalidPriority),

    #[error("{0}")]
    Server(String),
}
