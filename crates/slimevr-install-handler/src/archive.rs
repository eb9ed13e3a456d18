use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use slimevr_component::{ComponentState, InstallError, InstallHandler};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};
use zip::ZipArchive;

use crate::post_extract::{PostExtract, PostExtractError};

/// Extracts a zip artifact, then hands the extracted tree to a
/// component-specific [`PostExtract`] action.
///
/// Every install attempt extracts into a fresh, randomly named directory
/// under the component's working directory.
#[derive(Clone)]
pub struct ArchiveHandler {
  action: Arc<dyn PostExtract>,
}

impl ArchiveHandler {
  pub fn new(action: impl PostExtract + 'static) -> Self {
    Self {
      action: Arc::new(action),
    }
  }
}

#[async_trait]
impl InstallHandler for ArchiveHandler {
  fn name(&self) -> &'static str {
    "archive"
  }

  #[instrument(
    name = "archive_install",
    skip(self, state, cancel),
    fields(component = %state.kind())
  )]
  async fn install(
    &self,
    state: &ComponentState,
    cancel: CancellationToken,
  ) -> Result<(), InstallError> {
    let artifact = state.require_artifact()?.to_path_buf();
    let component = state.definition().display_name.clone();

    if cancel.is_cancelled() {
      return Err(InstallError::Cancelled);
    }

    let scratch = state
      .working_dir()
      .join(format!("extract-{}", uuid::Uuid::new_v4()));

    info!(artifact = %artifact.display(), scratch = %scratch.display(), "extracting archive");

    let files = {
      let scratch = scratch.clone();
      let cancel = cancel.clone();
      tokio::task::spawn_blocking(move || extract_zip(&artifact, &scratch, &cancel))
        .await
        .map_err(|e| InstallError::extraction(&component, format!("extraction task failed: {}", e)))?
    };

    let files = match files {
      Ok(files) => files,
      Err(ExtractError::Cancelled) => return Err(InstallError::Cancelled),
      Err(ExtractError::Failed(message)) => return Err(InstallError::extraction(&component, message)),
    };

    info!(files, "archive extracted");

    self
      .action
      .run(&scratch, state.install_dir(), &cancel)
      .await
      .map_err(|e| match e {
        PostExtractError::Cancelled => InstallError::Cancelled,
        other => InstallError::post_extract(&component, other.to_string()),
      })
  }
}

enum ExtractError {
  Failed(String),
  Cancelled,
}

impl From<zip::result::ZipError> for ExtractError {
  fn from(e: zip::result::ZipError) -> Self {
    Self::Failed(format!("invalid archive: {}", e))
  }
}

impl From<io::Error> for ExtractError {
  fn from(e: io::Error) -> Self {
    Self::Failed(format!("io error: {}", e))
  }
}

/// Extract each entry of `zip_path` into `out_dir`, returning the number of
/// files written. Entries whose names escape `out_dir` are skipped.
fn extract_zip(
  zip_path: &Path,
  out_dir: &Path,
  cancel: &CancellationToken,
) -> Result<usize, ExtractError> {
  let file = File::open(zip_path)?;
  let mut archive = ZipArchive::new(file)?;
  fs::create_dir_all(out_dir)?;

  let mut files = 0;
  for i in 0..archive.len() {
    if cancel.is_cancelled() {
      return Err(ExtractError::Cancelled);
    }

    let mut entry = archive.by_index(i)?;
    let Some(name) = entry.enclosed_name().map(PathBuf::from) else {
      continue;
    };

    let target = out_dir.join(name);
    if entry.is_dir() {
      fs::create_dir_all(&target)?;
    } else {
      if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
      }
      let mut outfile = File::create(&target)?;
      io::copy(&mut entry, &mut outfile)?;
      files += 1;
    }
  }

  Ok(files)
}
