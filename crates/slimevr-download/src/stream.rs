use std::fmt::Display;
use std::path::Path;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::error::DownloadError;
use crate::progress::{DownloadProgress, ProgressSink};

/// Write a byte stream to `dest`, reporting progress after every chunk.
///
/// `total_bytes` is the announced length, if any. When it is known and the
/// stream ends short, the transfer is treated as interrupted. On success the
/// final event has `bytes_transferred == total_bytes`, so its fraction is
/// exactly 1.0 (an unknown length is replaced by the transferred count).
///
/// The parent of `dest` must already exist; it is never created here. The
/// destination file is removed on every failure path, including
/// cancellation.
pub async fn write_stream<S, E>(
  stream: S,
  dest: &Path,
  total_bytes: Option<u64>,
  progress: &dyn ProgressSink,
  cancel: &CancellationToken,
) -> Result<u64, DownloadError>
where
  S: Stream<Item = Result<Bytes, E>>,
  E: Display,
{
  let result = write_inner(stream, dest, total_bytes, progress, cancel).await;
  if result.is_err() {
    // The file may not have been created yet.
    let _ = fs::remove_file(dest).await;
  }
  result
}

async fn write_inner<S, E>(
  stream: S,
  dest: &Path,
  total_bytes: Option<u64>,
  progress: &dyn ProgressSink,
  cancel: &CancellationToken,
) -> Result<u64, DownloadError>
where
  S: Stream<Item = Result<Bytes, E>>,
  E: Display,
{
  if cancel.is_cancelled() {
    return Err(DownloadError::Cancelled);
  }

  let mut file = File::create(dest).await?;
  let mut stream = std::pin::pin!(stream);
  let mut transferred = 0u64;

  progress.report(DownloadProgress::new(0, total_bytes));

  loop {
    let chunk = tokio::select! {
      chunk = stream.next() => chunk,
      _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
    };

    let Some(chunk) = chunk else {
      break;
    };

    let bytes = chunk.map_err(|e| DownloadError::Interrupted {
      message: e.to_string(),
    })?;
    file.write_all(&bytes).await?;
    transferred += bytes.len() as u64;

    progress.report(DownloadProgress::new(transferred, total_bytes));
  }

  file.flush().await?;

  if let Some(total) = total_bytes
    && transferred < total
  {
    return Err(DownloadError::Interrupted {
      message: format!("expected {} bytes, received {}", total, transferred),
    });
  }

  progress.report(DownloadProgress::new(
    transferred,
    Some(total_bytes.unwrap_or(transferred)),
  ));

  Ok(transferred)
}
