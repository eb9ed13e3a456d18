use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tokio_util::sync::CancellationToken;

/// Errors returned by a [`PostExtract`] action.
#[derive(Debug, Error)]
pub enum PostExtractError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("{0}")]
  Failed(String),

  #[error("cancelled")]
  Cancelled,
}

/// Component-specific step that runs after an archive has been extracted.
///
/// Called at most once per install attempt, and only after extraction
/// succeeded.
#[async_trait]
pub trait PostExtract: Send + Sync {
  async fn run(
    &self,
    extracted_dir: &Path,
    install_dir: &Path,
    cancel: &CancellationToken,
  ) -> Result<(), PostExtractError>;
}

/// Copies the extracted tree into a subdirectory of the install directory.
///
/// Release archives usually wrap their contents in a single top-level folder
/// (`SlimeVR/`, `jdk-17.0.4.1+1-jre/`); that folder is stripped so the
/// contents land directly in the target.
#[derive(Debug, Clone)]
pub struct CopyTree {
  subdir: PathBuf,
  strip_single_root: bool,
}

impl CopyTree {
  /// Copy into `install_dir/subdir`.
  pub fn new(subdir: impl Into<PathBuf>) -> Self {
    Self {
      subdir: subdir.into(),
      strip_single_root: true,
    }
  }

  /// Copy into the install directory itself.
  pub fn root() -> Self {
    Self::new("")
  }

  /// Keep a single top-level folder instead of stripping it.
  pub fn keep_root(mut self) -> Self {
    self.strip_single_root = false;
    self
  }

  async fn source_root(&self, extracted_dir: &Path) -> std::io::Result<PathBuf> {
    if !self.strip_single_root {
      return Ok(extracted_dir.to_path_buf());
    }

    let mut entries = fs::read_dir(extracted_dir).await?;
    let mut only = None;
    while let Some(entry) = entries.next_entry().await? {
      if only.is_some() {
        return Ok(extracted_dir.to_path_buf());
      }
      only = Some(entry);
    }

    match only {
      Some(entry) if entry.file_type().await?.is_dir() => Ok(entry.path()),
      _ => Ok(extracted_dir.to_path_buf()),
    }
  }
}

#[async_trait]
impl PostExtract for CopyTree {
  async fn run(
    &self,
    extracted_dir: &Path,
    install_dir: &Path,
    cancel: &CancellationToken,
  ) -> Result<(), PostExtractError> {
    let source = self.source_root(extracted_dir).await?;
    let target = install_dir.join(&self.subdir);
    copy_dir_recursive(&source, &target, cancel).await
  }
}

/// Recursively copy a directory, overwriting existing files.
async fn copy_dir_recursive(
  src: &Path,
  dest: &Path,
  cancel: &CancellationToken,
) -> Result<(), PostExtractError> {
  fs::create_dir_all(dest).await?;

  let mut entries = fs::read_dir(src).await?;
  while let Some(entry) = entries.next_entry().await? {
    if cancel.is_cancelled() {
      return Err(PostExtractError::Cancelled);
    }

    let src_path = entry.path();
    let dest_path = dest.join(entry.file_name());

    if entry.file_type().await?.is_dir() {
      Box::pin(copy_dir_recursive(&src_path, &dest_path, cancel)).await?;
    } else {
      fs::copy(&src_path, &dest_path).await?;
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn write(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
  }

  #[tokio::test]
  async fn test_strips_single_root_folder() {
    let extracted = tempfile::tempdir().unwrap();
    let install = tempfile::tempdir().unwrap();
    write(&extracted.path().join("jdk-17-jre/bin/java"), "jvm");
    write(&extracted.path().join("jdk-17-jre/release"), "17");

    CopyTree::new("jre")
      .run(extracted.path(), install.path(), &CancellationToken::new())
      .await
      .unwrap();

    assert!(install.path().join("jre/bin/java").is_file());
    assert!(install.path().join("jre/release").is_file());
    assert!(!install.path().join("jre/jdk-17-jre").exists());
  }

  #[tokio::test]
  async fn test_keeps_multiple_top_level_entries() {
    let extracted = tempfile::tempdir().unwrap();
    let install = tempfile::tempdir().unwrap();
    write(&extracted.path().join("a/one.txt"), "1");
    write(&extracted.path().join("b.txt"), "2");

    CopyTree::root()
      .run(extracted.path(), install.path(), &CancellationToken::new())
      .await
      .unwrap();

    assert!(install.path().join("a/one.txt").is_file());
    assert!(install.path().join("b.txt").is_file());
  }

  #[tokio::test]
  async fn test_keep_root() {
    let extracted = tempfile::tempdir().unwrap();
    let install = tempfile::tempdir().unwrap();
    write(&extracted.path().join("slimevr/driver.dll"), "dll");

    CopyTree::new("drivers")
      .keep_root()
      .run(extracted.path(), install.path(), &CancellationToken::new())
      .await
      .unwrap();

    assert!(install.path().join("drivers/slimevr/driver.dll").is_file());
  }

  #[tokio::test]
  async fn test_cancelled_copy() {
    let extracted = tempfile::tempdir().unwrap();
    let install = tempfile::tempdir().unwrap();
    write(&extracted.path().join("file.txt"), "x");

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = CopyTree::root()
      .keep_root()
      .run(extracted.path(), install.path(), &cancel)
      .await
      .unwrap_err();
    assert!(matches!(err, PostExtractError::Cancelled));
  }
}
