use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading an installer config.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid installer config: {0}")]
  Parse(#[from] serde_json::Error),
}
