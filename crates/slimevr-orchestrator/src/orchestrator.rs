//! Orchestration of one installation run.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use slimevr_component::{ComponentKind, ComponentState};
use slimevr_component_registry::ComponentRegistry;
use slimevr_download::{DownloadError, DownloadProgress, Downloader};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::error::OrchestratorError;
use crate::events::{InstallEvent, InstallNotifier, NoopNotifier};
use crate::graph::InstallGraph;
use crate::outcome::{ComponentOutcome, RunReport};

/// Name prefix of the per-run working directory.
pub const WORKING_DIR_PREFIX: &str = "SlimeVR-Installer-";

type Outcomes = BTreeMap<ComponentKind, ComponentOutcome>;
type States = BTreeMap<ComponentKind, ComponentState>;

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
  /// Shared directory every component installs into. Created if absent,
  /// never removed.
  pub install_dir: PathBuf,
  /// Parent of the per-run working directory. System temp dir when `None`.
  pub temp_root: Option<PathBuf>,
}

/// Runs installations against a component registry.
///
/// Downloads fan out concurrently; installs run strictly one at a time, each
/// only after all of its dependencies are installed.
pub struct Orchestrator {
  registry: Arc<ComponentRegistry>,
  downloader: Arc<dyn Downloader>,
  notifier: Arc<dyn InstallNotifier>,
  config: OrchestratorConfig,
}

impl Orchestrator {
  pub fn new(
    registry: Arc<ComponentRegistry>,
    downloader: Arc<dyn Downloader>,
    config: OrchestratorConfig,
  ) -> Self {
    Self {
      registry,
      downloader,
      notifier: Arc::new(NoopNotifier),
      config,
    }
  }

  /// Send install events to `notifier`.
  pub fn with_notifier(mut self, notifier: impl InstallNotifier + 'static) -> Self {
    self.notifier = Arc::new(notifier);
    self
  }

  /// Install `requested` and everything it depends on.
  ///
  /// Fails only when the registry does not know a requested kind or a
  /// directory cannot be created. Every component failure is reported in the
  /// returned [`RunReport`]. The working directory is removed before this
  /// returns, on every path.
  #[instrument(name = "install_run", skip_all, fields(requested = ?requested))]
  pub async fn run(
    &self,
    requested: &[ComponentKind],
    cancel: CancellationToken,
  ) -> Result<RunReport, OrchestratorError> {
    let run_id = uuid::Uuid::new_v4().to_string();
    let kinds = self.registry.with_dependencies(requested)?;
    let graph = InstallGraph::new(&self.registry, &kinds)?;

    let working = self.create_working_dir().await?;
    let working_dir = working.path().to_path_buf();

    info!(
      run_id = %run_id,
      components = ?kinds,
      working_dir = %working_dir.display(),
      install_dir = %self.config.install_dir.display(),
      "run_started"
    );
    self.notifier.notify(InstallEvent::RunStarted {
      run_id: run_id.clone(),
      components: kinds.iter().copied().collect(),
    });

    let outcomes = self
      .execute(&run_id, &kinds, &graph, &working_dir, &cancel)
      .await;

    if let Err(e) = working.close() {
      warn!(
        run_id = %run_id,
        working_dir = %working_dir.display(),
        error = %e,
        "failed to remove working directory"
      );
    }

    let report = RunReport {
      run_id,
      working_dir,
      outcomes: outcomes?,
    };

    info!(
      run_id = %report.run_id,
      success = report.is_success(),
      "run_completed"
    );
    self.notifier.notify(InstallEvent::RunCompleted {
      run_id: report.run_id.clone(),
      success: report.is_success(),
    });

    Ok(report)
  }

  async fn create_working_dir(&self) -> Result<TempDir, OrchestratorError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(WORKING_DIR_PREFIX);

    match &self.config.temp_root {
      Some(root) => {
        create_dir(root).await?;
        builder
          .tempdir_in(root)
          .map_err(|source| OrchestratorError::CreateDir {
            path: root.clone(),
            source,
          })
      }
      None => builder
        .tempdir()
        .map_err(|source| OrchestratorError::CreateDir {
          path: std::env::temp_dir(),
          source,
        }),
    }
  }

  /// Build states, download, then install.
  async fn execute(
    &self,
    run_id: &str,
    kinds: &BTreeSet<ComponentKind>,
    graph: &InstallGraph,
    working_dir: &Path,
    cancel: &CancellationToken,
  ) -> Result<Outcomes, OrchestratorError> {
    create_dir(&self.config.install_dir).await?;

    let mut states = States::new();
    let mut outcomes = Outcomes::new();

    for kind in kinds {
      let definition = Arc::clone(self.registry.get(*kind)?);
      let component_dir = working_dir.join(kind.as_str());
      create_dir(&component_dir).await?;

      let state = ComponentState::new(definition, component_dir, self.config.install_dir.clone());
      if state.is_installed() {
        info!(run_id = %run_id, component = %kind, "component_skipped");
        self
          .notifier
          .notify(InstallEvent::ComponentSkipped { component: *kind });
        outcomes.insert(*kind, ComponentOutcome::AlreadySatisfied);
      }
      states.insert(*kind, state);
    }

    self
      .download_all(run_id, &mut states, &mut outcomes, cancel)
      .await;
    self
      .install_all(run_id, graph, &mut states, &mut outcomes, cancel)
      .await;

    Ok(outcomes)
  }

  /// Download every component that is not installed yet, all at once.
  ///
  /// Waits for every download to settle. A failure is recorded for its own
  /// component only. The downloads are owned by this future, so dropping
  /// `run` stops them before the working directory is removed.
  async fn download_all(
    &self,
    run_id: &str,
    states: &mut States,
    outcomes: &mut Outcomes,
    cancel: &CancellationToken,
  ) {
    let pending: Vec<ComponentKind> = states
      .iter()
      .filter(|(_, state)| !state.is_installed())
      .map(|(kind, _)| *kind)
      .collect();

    let downloads: Vec<_> = pending
      .iter()
      .map(|kind| {
        let kind = *kind;
        let state = &states[&kind];
        let url = state.definition().source_uri.clone();
        let dest = state.artifact_destination();
        let notifier = Arc::clone(&self.notifier);
        let cancel = cancel.clone();

        info!(run_id = %run_id, component = %kind, url = %url, "download_started");
        self.notifier.notify(InstallEvent::DownloadStarted {
          component: kind,
          url: url.clone(),
        });

        async move {
          let progress = move |progress: DownloadProgress| {
            notifier.notify(InstallEvent::DownloadProgress {
              component: kind,
              progress,
            })
          };
          let bytes = self
            .downloader
            .download(&url, &dest, &progress, cancel)
            .await?;
          Ok::<_, DownloadError>((dest, bytes))
        }
      })
      .collect();

    let results = join_all(downloads).await;

    for (kind, result) in pending.into_iter().zip(results) {
      match result {
        Ok((dest, bytes)) => {
          info!(run_id = %run_id, component = %kind, bytes, "download_finished");
          self.notifier.notify(InstallEvent::DownloadFinished {
            component: kind,
            bytes,
          });
          // A missing file surfaces as a precondition failure at install time
          if let Some(state) = states.get_mut(&kind)
            && let Err(e) = state.set_artifact(dest)
          {
            warn!(run_id = %run_id, component = %kind, error = %e, "downloaded artifact missing");
          }
        }
        Err(e) if e.is_cancelled() => {
          self.record_cancelled(run_id, kind, outcomes);
        }
        Err(e) => {
          error!(run_id = %run_id, component = %kind, error = %e, "download_failed");
          self.notifier.notify(InstallEvent::DownloadFailed {
            component: kind,
            error: e.to_string(),
          });
          outcomes.insert(kind, ComponentOutcome::DownloadFailed(e));
        }
      }
    }
  }

  /// Install the remaining components layer by layer, one at a time.
  async fn install_all(
    &self,
    run_id: &str,
    graph: &InstallGraph,
    states: &mut States,
    outcomes: &mut Outcomes,
    cancel: &CancellationToken,
  ) {
    for layer in graph.layers() {
      for kind in layer {
        if outcomes.contains_key(&kind) {
          continue;
        }
        if cancel.is_cancelled() {
          self.record_cancelled(run_id, kind, outcomes);
          continue;
        }

        let failed: Vec<ComponentKind> = graph
          .upstream(kind)
          .iter()
          .copied()
          .filter(|dep| !states.get(dep).is_some_and(|s| s.is_installed()))
          .collect();
        if !failed.is_empty() {
          warn!(
            run_id = %run_id,
            component = %kind,
            dependencies = ?failed,
            "dependency_failed"
          );
          self.notifier.notify(InstallEvent::DependencyFailed {
            component: kind,
            dependencies: failed.clone(),
          });
          outcomes.insert(kind, ComponentOutcome::DependencyFailed(failed));
          continue;
        }

        if let Some(state) = states.get_mut(&kind) {
          let outcome = self.install_one(run_id, state, cancel).await;
          outcomes.insert(kind, outcome);
        }
      }
    }
  }

  #[instrument(name = "install", skip_all, fields(run_id = %run_id, component = %state.kind()))]
  async fn install_one(
    &self,
    run_id: &str,
    state: &mut ComponentState,
    cancel: &CancellationToken,
  ) -> ComponentOutcome {
    let kind = state.kind();
    let handler = Arc::clone(state.definition().install_handler());

    info!(handler = handler.name(), "install_started");
    self
      .notifier
      .notify(InstallEvent::InstallStarted { component: kind });

    match handler.install(state, cancel.clone()).await {
      Ok(()) => {
        state.mark_installed();
        info!("install_completed");
        self
          .notifier
          .notify(InstallEvent::InstallCompleted { component: kind });
        ComponentOutcome::Installed
      }
      Err(e) if e.is_cancelled() => {
        warn!("install cancelled");
        self
          .notifier
          .notify(InstallEvent::Cancelled { component: kind });
        ComponentOutcome::Cancelled
      }
      Err(e) => {
        error!(error = %e, "install_failed");
        self.notifier.notify(InstallEvent::InstallFailed {
          component: kind,
          error: e.to_string(),
        });
        ComponentOutcome::InstallFailed(e)
      }
    }
  }

  fn record_cancelled(&self, run_id: &str, kind: ComponentKind, outcomes: &mut Outcomes) {
    warn!(run_id = %run_id, component = %kind, "component cancelled");
    self
      .notifier
      .notify(InstallEvent::Cancelled { component: kind });
    outcomes.insert(kind, ComponentOutcome::Cancelled);
  }
}

async fn create_dir(path: &Path) -> Result<(), OrchestratorError> {
  tokio::fs::create_dir_all(path)
    .await
    .map_err(|source| OrchestratorError::CreateDir {
      path: path.to_path_buf(),
      source,
    })
}
