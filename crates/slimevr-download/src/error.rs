use thiserror::Error;

/// Errors that can occur while downloading an artifact.
#[derive(Debug, Error)]
pub enum DownloadError {
  /// The request could not be sent (DNS, connect, TLS, ...).
  #[error("request to {url} failed")]
  Request {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  /// The HTTP client could not be constructed.
  #[error("failed to build HTTP client")]
  Client(#[source] reqwest::Error),

  /// The server answered with a non-success status.
  #[error("{url} returned HTTP {status}")]
  Status { url: String, status: u16 },

  /// The body stream failed part-way through.
  #[error("transfer interrupted: {message}")]
  Interrupted { message: String },

  /// Writing the destination file failed.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// Cancellation was observed mid-transfer.
  #[error("download cancelled")]
  Cancelled,
}

impl DownloadError {
  /// Whether this error represents cooperative cancellation.
  pub fn is_cancelled(&self) -> bool {
    matches!(self, Self::Cancelled)
  }
}
