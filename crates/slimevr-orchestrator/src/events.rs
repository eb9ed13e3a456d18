//! Install events and notifiers for observability.
//!
//! Events are emitted on every component state transition so that consumers
//! can render progress, persist a log, stream to a UI, etc.

use serde::{Deserialize, Serialize};
use slimevr_component::ComponentKind;
use slimevr_download::DownloadProgress;
use tokio::sync::mpsc;

/// Events emitted during an orchestration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InstallEvent {
  /// The run has started with these components.
  RunStarted {
    run_id: String,
    components: Vec<ComponentKind>,
  },

  /// The component is already present on this machine.
  ComponentSkipped { component: ComponentKind },

  DownloadStarted {
    component: ComponentKind,
    url: String,
  },

  /// Bytes arrived for a component's artifact.
  DownloadProgress {
    component: ComponentKind,
    progress: DownloadProgress,
  },

  DownloadFinished { component: ComponentKind, bytes: u64 },

  DownloadFailed {
    component: ComponentKind,
    error: String,
  },

  InstallStarted { component: ComponentKind },

  InstallCompleted { component: ComponentKind },

  InstallFailed {
    component: ComponentKind,
    error: String,
  },

  /// The component was skipped because a dependency is not installed.
  DependencyFailed {
    component: ComponentKind,
    dependencies: Vec<ComponentKind>,
  },

  /// Cancellation was observed before the component finished.
  Cancelled { component: ComponentKind },

  /// The run has finished. The working directory is already gone.
  RunCompleted { run_id: String, success: bool },
}

/// Trait for receiving install events.
///
/// The orchestrator calls `notify` for each event, possibly from several
/// download tasks at once.
pub trait InstallNotifier: Send + Sync {
  fn notify(&self, event: InstallEvent);
}

/// A no-op notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl InstallNotifier for NoopNotifier {
  fn notify(&self, _event: InstallEvent) {}
}

/// A notifier that sends events to an unbounded channel.
///
/// Progress events arrive once per received chunk, so a slow consumer grows
/// the queue rather than stalling downloads.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<InstallEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<InstallEvent>) -> Self {
    Self { sender }
  }
}

impl InstallNotifier for ChannelNotifier {
  fn notify(&self, event: InstallEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_channel_notifier_delivers_in_order() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let notifier = ChannelNotifier::new(tx);

    notifier.notify(InstallEvent::InstallStarted {
      component: ComponentKind::Driver,
    });
    notifier.notify(InstallEvent::InstallCompleted {
      component: ComponentKind::Driver,
    });

    assert_eq!(
      rx.try_recv().unwrap(),
      InstallEvent::InstallStarted {
        component: ComponentKind::Driver
      }
    );
    assert_eq!(
      rx.try_recv().unwrap(),
      InstallEvent::InstallCompleted {
        component: ComponentKind::Driver
      }
    );
  }

  #[test]
  fn test_channel_notifier_ignores_dropped_receiver() {
    let (tx, rx) = mpsc::unbounded_channel();
    drop(rx);
    ChannelNotifier::new(tx).notify(InstallEvent::Cancelled {
      component: ComponentKind::Server,
    });
  }

  #[test]
  fn test_event_serialization() {
    let event = InstallEvent::DependencyFailed {
      component: ComponentKind::Server,
      dependencies: vec![ComponentKind::JavaRuntime],
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(
      json,
      serde_json::json!({
        "event": "dependency_failed",
        "component": "server",
        "dependencies": ["java-runtime"],
      })
    );
  }
}
