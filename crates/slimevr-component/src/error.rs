use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while installing a single component.
///
/// These never abort a whole orchestration run; the orchestrator records them
/// against the component that produced them.
#[derive(Debug, Error)]
pub enum InstallError {
  /// The artifact has not been downloaded, or the file is gone.
  #[error("artifact for '{component}' is not downloaded or missing: {path:?}")]
  Precondition {
    component: String,
    path: Option<PathBuf>,
  },

  /// The archive could not be read or unpacked.
  #[error("failed to extract '{component}': {message}")]
  Extraction { component: String, message: String },

  /// The installer process exited unsuccessfully.
  ///
  /// `exit_code` is `None` when the process was terminated by a signal.
  #[error("installer for '{component}' exited with code {exit_code:?}")]
  ProcessFailed {
    component: String,
    exit_code: Option<i32>,
  },

  /// The installer process could not be started.
  #[error("failed to launch installer for '{component}'")]
  Spawn {
    component: String,
    #[source]
    source: std::io::Error,
  },

  /// The component-specific post-extraction step failed.
  #[error("post-extraction step failed for '{component}': {message}")]
  PostExtract { component: String, message: String },

  /// Filesystem error outside extraction.
  #[error("io error installing '{component}'")]
  Io {
    component: String,
    #[source]
    source: std::io::Error,
  },

  /// Cancellation was observed mid-install.
  #[error("install cancelled")]
  Cancelled,
}

impl InstallError {
  /// Create an extraction error.
  pub fn extraction(component: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Extraction {
      component: component.into(),
      message: message.into(),
    }
  }

  /// Create a post-extraction error.
  pub fn post_extract(component: impl Into<String>, message: impl Into<String>) -> Self {
    Self::PostExtract {
      component: component.into(),
      message: message.into(),
    }
  }

  /// Whether this error represents cooperative cancellation.
  pub fn is_cancelled(&self) -> bool {
    matches!(self, Self::Cancelled)
  }
}
