use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::definition::ComponentDefinition;
use crate::error::InstallError;
use crate::kind::ComponentKind;

/// Per-run record binding a [`ComponentDefinition`] to filesystem locations
/// and install status.
///
/// `installed` starts from the definition's "already installed" check and only ever moves from
/// `false` to `true`.
#[derive(Debug)]
pub struct ComponentState {
  definition: Arc<ComponentDefinition>,
  working_dir: PathBuf,
  install_dir: PathBuf,
  artifact: Option<PathBuf>,
  installed: bool,
}

impl ComponentState {
  /// Create the state for one run, probing the machine once.
  pub fn new(
    definition: Arc<ComponentDefinition>,
    working_dir: impl Into<PathBuf>,
    install_dir: impl Into<PathBuf>,
  ) -> Self {
    let installed = definition.is_already_satisfied();
    Self {
      definition,
      working_dir: working_dir.into(),
      install_dir: install_dir.into(),
      artifact: None,
      installed,
    }
  }

  pub fn definition(&self) -> &ComponentDefinition {
    &self.definition
  }

  pub fn kind(&self) -> ComponentKind {
    self.definition.kind
  }

  /// Scratch directory owned by this component for this run.
  pub fn working_dir(&self) -> &Path {
    &self.working_dir
  }

  /// Shared directory every component installs into.
  pub fn install_dir(&self) -> &Path {
    &self.install_dir
  }

  /// Where the artifact is downloaded to. Not necessarily present yet.
  pub fn artifact_destination(&self) -> PathBuf {
    self.working_dir.join(&self.definition.artifact_file_name)
  }

  /// Path of the downloaded artifact, if the download finished.
  pub fn artifact(&self) -> Option<&Path> {
    self.artifact.as_deref()
  }

  /// Record a finished download. The file must exist.
  pub fn set_artifact(&mut self, path: impl Into<PathBuf>) -> Result<(), InstallError> {
    let path = path.into();
    if !path.is_file() {
      return Err(InstallError::Precondition {
        component: self.definition.display_name.clone(),
        path: Some(path),
      });
    }
    self.artifact = Some(path);
    Ok(())
  }

  /// The downloaded artifact, or a precondition failure if there is none.
  pub fn require_artifact(&self) -> Result<&Path, InstallError> {
    match self.artifact.as_deref() {
      Some(path) if path.is_file() => Ok(path),
      other => Err(InstallError::Precondition {
        component: self.definition.display_name.clone(),
        path: other.map(Path::to_path_buf),
      }),
    }
  }

  pub fn is_installed(&self) -> bool {
    self.installed
  }

  pub fn mark_installed(&mut self) {
    self.installed = true;
  }
}
