//! SlimeVR Install Registration
//!
//! Records that the bundle has been installed (the "Programs and Features"
//! style entry) and answers machine-level questions the components' "already installed" checks ask.
//!
//! The [`InstallRegistration`] trait is the capability the installer's
//! finish step talks to. [`ManifestRegistration`] is a portable
//! implementation that keeps the record as `installation.json`.

mod manifest;
pub mod webview;

pub use manifest::{InstallationRecord, ManifestRegistration};

use std::path::Path;

use async_trait::async_trait;

/// Errors returned by registration backends.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("malformed installation record: {0}")]
  Malformed(#[from] serde_json::Error),

  /// `register_install_date` was called before `register_installation`.
  #[error("installation is not registered")]
  NotRegistered,
}

/// Installation registry capability.
#[async_trait]
pub trait InstallRegistration: Send + Sync {
  /// Whether an installation has been registered on this machine.
  async fn is_already_installed(&self) -> Result<bool, RegistrationError>;

  /// Register the installation located at `install_path`.
  async fn register_installation(&self, install_path: &Path) -> Result<(), RegistrationError>;

  /// Stamp the registered installation with today's date.
  async fn register_install_date(&self) -> Result<(), RegistrationError>;
}
