use std::path::Path;

use async_trait::async_trait;
use slimevr_component::{ComponentState, InstallError, InstallHandler};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Runs the downloaded artifact as a child process.
///
/// The child inherits the installer's environment and working directory.
/// Success is exit code 0.
#[derive(Debug, Clone, Default)]
pub struct ExecutableHandler {
  args: Vec<String>,
}

impl ExecutableHandler {
  /// Create a handler that launches the artifact without arguments.
  pub fn new() -> Self {
    Self::default()
  }

  /// Create a handler that passes `args` to the artifact, e.g. silent-install flags.
  pub fn with_args<I, S>(args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      args: args.into_iter().map(Into::into).collect(),
    }
  }
}

#[async_trait]
impl InstallHandler for ExecutableHandler {
  fn name(&self) -> &'static str {
    "executable"
  }

  #[instrument(
    name = "executable_install",
    skip(self, state, cancel),
    fields(component = %state.kind())
  )]
  async fn install(
    &self,
    state: &ComponentState,
    cancel: CancellationToken,
  ) -> Result<(), InstallError> {
    let artifact = state.require_artifact()?;
    let component = state.definition().display_name.clone();

    if cancel.is_cancelled() {
      return Err(InstallError::Cancelled);
    }

    mark_executable(artifact)
      .await
      .map_err(|source| InstallError::Io {
        component: component.clone(),
        source,
      })?;

    info!(artifact = %artifact.display(), args = ?self.args, "launching installer");

    let mut child = Command::new(artifact)
      .args(&self.args)
      .kill_on_drop(true)
      .spawn()
      .map_err(|source| InstallError::Spawn {
        component: component.clone(),
        source,
      })?;

    let status = tokio::select! {
      status = child.wait() => Some(status),
      _ = cancel.cancelled() => None,
    };

    let Some(status) = status else {
      warn!("install cancelled, terminating installer process");
      if let Err(e) = child.kill().await {
        warn!(error = %e, "failed to terminate installer process");
      }
      return Err(InstallError::Cancelled);
    };

    let status = status.map_err(|source| InstallError::Io {
      component: component.clone(),
      source,
    })?;

    if status.success() {
      Ok(())
    } else {
      Err(InstallError::ProcessFailed {
        component,
        exit_code: status.code(),
      })
    }
  }
}

/// Downloaded files carry no execute bit on Unix.
#[cfg(unix)]
async fn mark_executable(path: &Path) -> std::io::Result<()> {
  use std::os::unix::fs::PermissionsExt;

  let mut permissions = tokio::fs::metadata(path).await?.permissions();
  if permissions.mode() & 0o111 == 0 {
    permissions.set_mode(permissions.mode() | 0o755);
    tokio::fs::set_permissions(path, permissions).await?;
  }
  Ok(())
}

#[cfg(not(unix))]
async fn mark_executable(_path: &Path) -> std::io::Result<()> {
  Ok(())
}
