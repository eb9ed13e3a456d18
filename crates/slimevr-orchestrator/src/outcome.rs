use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use slimevr_component::{ComponentKind, InstallError};
use slimevr_download::DownloadError;

/// Terminal state a component reached in one run.
#[derive(Debug)]
pub enum ComponentOutcome {
  /// The component was already present; nothing was downloaded or installed.
  AlreadySatisfied,
  Installed,
  DownloadFailed(DownloadError),
  InstallFailed(InstallError),
  /// Skipped because these dependencies did not end up installed.
  DependencyFailed(Vec<ComponentKind>),
  Cancelled,
}

impl ComponentOutcome {
  /// Whether the component is present on the machine after the run.
  pub fn is_success(&self) -> bool {
    matches!(self, Self::AlreadySatisfied | Self::Installed)
  }

  pub fn label(&self) -> &'static str {
    match self {
      Self::AlreadySatisfied => "already satisfied",
      Self::Installed => "installed",
      Self::DownloadFailed(_) => "download failed",
      Self::InstallFailed(_) => "install failed",
      Self::DependencyFailed(_) => "dependency failed",
      Self::Cancelled => "cancelled",
    }
  }
}

impl fmt::Display for ComponentOutcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::DownloadFailed(e) => write!(f, "{}: {}", self.label(), e),
      Self::InstallFailed(e) => write!(f, "{}: {}", self.label(), e),
      Self::DependencyFailed(deps) => {
        let names: Vec<&str> = deps.iter().map(|k| k.as_str()).collect();
        write!(f, "{}: {}", self.label(), names.join(", "))
      }
      _ => f.write_str(self.label()),
    }
  }
}

/// Result of a complete orchestration run.
#[derive(Debug)]
pub struct RunReport {
  /// Unique run ID.
  pub run_id: String,
  /// Working directory used by the run. Removed before the report is returned.
  pub working_dir: PathBuf,
  /// Outcome of every component that took part, including pulled-in
  /// dependencies.
  pub outcomes: BTreeMap<ComponentKind, ComponentOutcome>,
}

impl RunReport {
  pub fn outcome(&self, kind: ComponentKind) -> Option<&ComponentOutcome> {
    self.outcomes.get(&kind)
  }

  /// Whether every component is present after the run.
  pub fn is_success(&self) -> bool {
    self.outcomes.values().all(ComponentOutcome::is_success)
  }

  pub fn working_dir(&self) -> &Path {
    &self.working_dir
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn report(outcomes: Vec<(ComponentKind, ComponentOutcome)>) -> RunReport {
    RunReport {
      run_id: "run".to_string(),
      working_dir: PathBuf::from("/tmp/run"),
      outcomes: outcomes.into_iter().collect(),
    }
  }

  #[test]
  fn test_success_requires_every_component() {
    let ok = report(vec![
      (ComponentKind::Server, ComponentOutcome::Installed),
      (ComponentKind::JavaRuntime, ComponentOutcome::AlreadySatisfied),
    ]);
    assert!(ok.is_success());

    let failed = report(vec![
      (ComponentKind::Server, ComponentOutcome::Installed),
      (ComponentKind::Driver, ComponentOutcome::Cancelled),
    ]);
    assert!(!failed.is_success());
    assert!(matches!(
      failed.outcome(ComponentKind::Driver),
      Some(ComponentOutcome::Cancelled)
    ));
    assert!(failed.outcome(ComponentKind::FeederApp).is_none());
  }

  #[test]
  fn test_display() {
    let outcome = ComponentOutcome::DependencyFailed(vec![
      ComponentKind::JavaRuntime,
      ComponentKind::WebViewRuntime,
    ]);
    assert_eq!(
      outcome.to_string(),
      "dependency failed: java-runtime, web-view-runtime"
    );

    let outcome = ComponentOutcome::InstallFailed(InstallError::ProcessFailed {
      component: "Edge WebView2".to_string(),
      exit_code: Some(3),
    });
    assert_eq!(
      outcome.to_string(),
      "install failed: installer for 'Edge WebView2' exited with code Some(3)"
    );
  }
}
