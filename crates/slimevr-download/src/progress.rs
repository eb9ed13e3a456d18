use serde::{Deserialize, Serialize};

const MIB: f64 = 1024.0 * 1024.0;

/// A progress snapshot for one download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadProgress {
  pub bytes_transferred: u64,
  /// `None` when the server did not announce a length.
  pub total_bytes: Option<u64>,
}

impl DownloadProgress {
  pub fn new(bytes_transferred: u64, total_bytes: Option<u64>) -> Self {
    Self {
      bytes_transferred,
      total_bytes,
    }
  }

  /// Completed fraction in `[0, 1]`; 0 when the total is unknown or zero.
  pub fn fraction(&self) -> f64 {
    match self.total_bytes {
      Some(total) if total > 0 => (self.bytes_transferred as f64 / total as f64).min(1.0),
      _ => 0.0,
    }
  }

  pub fn transferred_mib(&self) -> f64 {
    self.bytes_transferred as f64 / MIB
  }

  pub fn total_mib(&self) -> Option<f64> {
    self.total_bytes.map(|total| total as f64 / MIB)
  }
}

/// Receives progress events.
///
/// Reporting must not block the download. Closures implement this trait.
pub trait ProgressSink: Send + Sync {
  fn report(&self, progress: DownloadProgress);
}

impl<F> ProgressSink for F
where
  F: Fn(DownloadProgress) + Send + Sync,
{
  fn report(&self, progress: DownloadProgress) {
    self(progress)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_fraction_known_total() {
    assert_eq!(DownloadProgress::new(50, Some(200)).fraction(), 0.25);
    assert_eq!(DownloadProgress::new(200, Some(200)).fraction(), 1.0);
  }

  #[test]
  fn test_fraction_is_clamped() {
    assert_eq!(DownloadProgress::new(300, Some(200)).fraction(), 1.0);
  }

  #[test]
  fn test_fraction_unknown_or_zero_total() {
    assert_eq!(DownloadProgress::new(1234, None).fraction(), 0.0);
    assert_eq!(DownloadProgress::new(0, Some(0)).fraction(), 0.0);
  }

  #[test]
  fn test_mib() {
    let progress = DownloadProgress::new(3 * 1024 * 1024, Some(6 * 1024 * 1024));
    assert_eq!(progress.transferred_mib(), 3.0);
    assert_eq!(progress.total_mib(), Some(6.0));
  }
}
