use std::path::PathBuf;

use slimevr_component_registry::RegistryError;
use thiserror::Error;

/// Errors that abort a whole orchestration run.
///
/// Everything component-specific ends up in the run report instead.
#[derive(Debug, Error)]
pub enum OrchestratorError {
  #[error("failed to create directory '{path}': {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error(transparent)]
  Registry(#[from] RegistryError),
}
