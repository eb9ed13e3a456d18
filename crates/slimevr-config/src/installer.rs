use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use slimevr_component::ComponentKind;

use crate::error::ConfigError;

/// Top-level installer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallerConfig {
  /// Directory components are installed into.
  /// Falls back to the platform default when not set.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub install_dir: Option<PathBuf>,

  /// Parent of the per-run working directory. Defaults to the system temp dir.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub temp_root: Option<PathBuf>,

  /// Components to install. Every registered component when not set.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub components: Option<Vec<ComponentKind>>,

  /// Record the installation once every component succeeded.
  #[serde(default = "default_register_installation")]
  pub register_installation: bool,
}

fn default_register_installation() -> bool {
  true
}

impl Default for InstallerConfig {
  fn default() -> Self {
    Self {
      install_dir: None,
      temp_root: None,
      components: None,
      register_installation: default_register_installation(),
    }
  }
}

impl InstallerConfig {
  /// Parse a config from a JSON string.
  pub fn from_json(json: &str) -> Result<Self, ConfigError> {
    Ok(serde_json::from_str(json)?)
  }

  /// Read and parse a JSON config file.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_json(&json)
  }

  /// Requested components, or `all` when none were configured.
  pub fn requested_components(&self, all: &[ComponentKind]) -> Vec<ComponentKind> {
    match &self.components {
      Some(kinds) if !kinds.is_empty() => kinds.clone(),
      _ => all.to_vec(),
    }
  }
}
