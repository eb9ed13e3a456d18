use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use crate::{InstallRegistration, RegistrationError};

const RECORD_FILE: &str = "installation.json";

/// The registered installation, mirroring the fields of an uninstall entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallationRecord {
  pub install_location: PathBuf,
  pub display_name: String,
  pub uninstall_string: String,
  pub display_icon: String,
  pub help_link: String,
  pub url_info_about: String,
  pub url_update_info: String,
  /// `yyyyMMdd`, set by `register_install_date`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub install_date: Option<String>,
}

impl InstallationRecord {
  pub fn for_location(install_path: &Path) -> Self {
    let uninstaller = install_path.join("uninstall.exe");
    let icon = install_path.join("slimevr.exe");
    Self {
      install_location: install_path.to_path_buf(),
      display_name: "SlimeVR".to_string(),
      uninstall_string: format!("\"{}\"", uninstaller.display()),
      display_icon: icon.display().to_string(),
      help_link: "https://docs.slimevr.dev/".to_string(),
      url_info_about: "https://slimevr.dev/".to_string(),
      url_update_info: "https://github.com/SlimeVR/SlimeVR-Installer/releases".to_string(),
      install_date: None,
    }
  }
}

/// File-backed registration. The record lives at `{root}/installation.json`.
pub struct ManifestRegistration {
  root: PathBuf,
}

impl ManifestRegistration {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn record_path(&self) -> PathBuf {
    self.root.join(RECORD_FILE)
  }

  /// Read the current record, if any.
  pub async fn read(&self) -> Result<Option<InstallationRecord>, RegistrationError> {
    match fs::read_to_string(self.record_path()).await {
      Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  async fn write(&self, record: &InstallationRecord) -> Result<(), RegistrationError> {
    fs::create_dir_all(&self.root).await?;
    let content = serde_json::to_string_pretty(record)?;
    fs::write(self.record_path(), content).await?;
    Ok(())
  }
}

#[async_trait]
impl InstallRegistration for ManifestRegistration {
  async fn is_already_installed(&self) -> Result<bool, RegistrationError> {
    Ok(self.read().await?.is_some())
  }

  async fn register_installation(&self, install_path: &Path) -> Result<(), RegistrationError> {
    // Re-registering keeps the original install date.
    let install_date = self.read().await?.and_then(|r| r.install_date);
    let record = InstallationRecord {
      install_date,
      ..InstallationRecord::for_location(install_path)
    };
    self.write(&record).await?;
    info!(path = %self.record_path().display(), "installation registered");
    Ok(())
  }

  async fn register_install_date(&self) -> Result<(), RegistrationError> {
    let mut record = self.read().await?.ok_or(RegistrationError::NotRegistered)?;
    record.install_date = Some(chrono::Local::now().format("%Y%m%d").to_string());
    self.write(&record).await
  }
}
