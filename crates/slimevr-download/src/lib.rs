//! SlimeVR Download
//!
//! The download capability used by the installer orchestrator.
//!
//! The [`Downloader`] trait fetches a URL into a local file, reporting
//! [`DownloadProgress`] to a [`ProgressSink`] as bytes arrive. Implementations
//! honour a cancellation token and never leave a partial file behind on
//! failure or cancellation.
//!
//! [`HttpDownloader`] is the reqwest-backed implementation; [`write_stream`]
//! is the transport-independent core it is built on.

mod error;
mod http;
mod progress;
mod stream;

pub use error::DownloadError;
pub use http::HttpDownloader;
pub use progress::{DownloadProgress, ProgressSink};
pub use stream::write_stream;

use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Fetches a remote artifact to a local path.
#[async_trait]
pub trait Downloader: Send + Sync {
  /// Download `url` to `dest`, returning the number of bytes written.
  ///
  /// Progress events are monotonic. On success the last event reports a
  /// fraction of exactly 1.0.
  async fn download(
    &self,
    url: &str,
    dest: &Path,
    progress: &dyn ProgressSink,
    cancel: CancellationToken,
  ) -> Result<u64, DownloadError>;
}
