//! SlimeVR Installer Config
//!
//! Serializable installer configuration. A config is loaded from a JSON file
//! (via the CLI with `--config=installer.json`) and then overridden by CLI
//! flags before the orchestrator is built.

mod error;
mod installer;

pub use error::ConfigError;
pub use installer::InstallerConfig;
