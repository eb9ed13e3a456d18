use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::Downloader;
use crate::error::DownloadError;
use crate::progress::ProgressSink;
use crate::stream::write_stream;

/// Time allowed to establish a connection. The transfer itself is unbounded,
/// since artifacts run to hundreds of megabytes.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("slimevr-installer/", env!("CARGO_PKG_VERSION"));

/// reqwest-backed [`Downloader`].
///
/// Only the response headers are awaited up front; the body is streamed to
/// disk chunk by chunk.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
  client: reqwest::Client,
}

impl HttpDownloader {
  /// Create a downloader with default client settings.
  pub fn new() -> Result<Self, DownloadError> {
    let client = build_client(USER_AGENT)?;
    Ok(Self { client })
  }

  /// Create a downloader around an existing client.
  pub fn with_client(client: reqwest::Client) -> Self {
    Self { client }
  }
}

#[async_trait]
impl Downloader for HttpDownloader {
  #[instrument(name = "http_download", skip(self, progress, cancel), fields(dest = %dest.display()))]
  async fn download(
    &self,
    url: &str,
    dest: &Path,
    progress: &dyn ProgressSink,
    cancel: CancellationToken,
  ) -> Result<u64, DownloadError> {
    let request = self.client.get(url).send();
    let response = tokio::select! {
      response = request => response.map_err(|source| DownloadError::Request {
        url: url.to_string(),
        source,
      })?,
      _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
    };

    let status = response.status();
    if !status.is_success() {
      return Err(DownloadError::Status {
        url: url.to_string(),
        status: status.as_u16(),
      });
    }

    let total_bytes = response.content_length().filter(|len| *len > 0);
    info!(total_bytes = ?total_bytes, "download response received");

    let written = write_stream(
      response.bytes_stream(),
      dest,
      total_bytes,
      progress,
      &cancel,
    )
    .await?;

    info!(bytes = written, "download finished");
    Ok(written)
  }
}

fn build_client(user_agent: &str) -> Result<reqwest::Client, DownloadError> {
  reqwest::Client::builder()
    .connect_timeout(CONNECT_TIMEOUT)
    .user_agent(user_agent)
    .build()
    .map_err(DownloadError::Client)
}
