use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use slimevr_component::ComponentKind;
use slimevr_component_registry::ComponentRegistry;
use slimevr_config::InstallerConfig;
use slimevr_download::HttpDownloader;
use slimevr_install_registration::{InstallRegistration, ManifestRegistration};
use slimevr_orchestrator::{
  InstallEvent, InstallNotifier, Orchestrator, OrchestratorConfig, RunReport,
};

const INSTALL_DIR_NAME: &str = "SlimeVR Server";

/// SlimeVR Installer - downloads and installs the SlimeVR server and its runtimes
#[derive(Parser)]
#[command(name = "slimevr-installer")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to an installer config file (JSON)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Directory to install into (overrides the config file)
  #[arg(long, global = true)]
  install_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Install components and their dependencies
  Install {
    /// Components to install (all when omitted)
    components: Vec<ComponentKind>,
  },

  /// List known components and whether they are already present
  List,
}

fn main() -> Result<()> {
  // Respects RUST_LOG
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))?,
    )
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();

  let mut config = match &cli.config {
    Some(path) => InstallerConfig::load(path)
      .with_context(|| format!("failed to load config: {}", path.display()))?,
    None => InstallerConfig::default(),
  };
  if let Some(dir) = cli.install_dir {
    config.install_dir = Some(dir);
  }

  let install_dir = match config.install_dir.clone() {
    Some(dir) => dir,
    None => default_install_dir()?,
  };
  let registry = ComponentRegistry::builtin(&install_dir)
    .context("failed to build component registry")?;

  match cli.command {
    Some(Commands::Install { components }) => {
      if !components.is_empty() {
        config.components = Some(components);
      }
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(async { install(config, install_dir, registry).await })
    }
    Some(Commands::List) => {
      list(&registry);
      Ok(())
    }
    None => {
      println!("slimevr-installer - use --help to see available commands");
      Ok(())
    }
  }
}

fn default_install_dir() -> Result<PathBuf> {
  if cfg!(windows)
    && let Some(program_files) = std::env::var_os("ProgramFiles(x86)")
  {
    return Ok(PathBuf::from(program_files).join(INSTALL_DIR_NAME));
  }

  dirs::data_dir()
    .map(|dir| dir.join(INSTALL_DIR_NAME))
    .context("could not determine a data directory")
}

fn list(registry: &ComponentRegistry) {
  for definition in registry.all() {
    let deps: Vec<&str> = definition.depends_on.iter().map(|k| k.as_str()).collect();
    let status = if definition.is_already_satisfied() {
      "present"
    } else {
      "missing"
    };
    println!(
      "{:<18} {:<20} {:<8} depends on: {}",
      definition.kind.as_str(),
      definition.display_name,
      status,
      if deps.is_empty() {
        "-".to_string()
      } else {
        deps.join(", ")
      }
    );
  }
}

async fn install(
  config: InstallerConfig,
  install_dir: PathBuf,
  registry: ComponentRegistry,
) -> Result<()> {
  let requested = config.requested_components(&registry.kinds());
  let notifier = ConsoleNotifier::new(&registry);
  let downloader = HttpDownloader::new().context("failed to create HTTP client")?;

  let orchestrator = Orchestrator::new(
    Arc::new(registry),
    Arc::new(downloader),
    OrchestratorConfig {
      install_dir: install_dir.clone(),
      temp_root: config.temp_root.clone(),
    },
  )
  .with_notifier(notifier);

  let cancel = CancellationToken::new();
  {
    let cancel = cancel.clone();
    tokio::spawn(async move {
      if tokio::signal::ctrl_c().await.is_ok() {
        warn!("interrupt received, cancelling installation");
        cancel.cancel();
      }
    });
  }

  eprintln!("Installing into {}", install_dir.display());
  let report = orchestrator
    .run(&requested, cancel)
    .await
    .context("installation failed")?;

  print_report(&report);

  if !report.is_success() {
    bail!("installation incomplete");
  }

  if config.register_installation {
    finish_install(&install_dir).await?;
  }

  Ok(())
}

/// Record the installation once every component is in place.
async fn finish_install(install_dir: &Path) -> Result<()> {
  let registration = ManifestRegistration::new(install_dir);
  let already = registration
    .is_already_installed()
    .await
    .context("failed to read installation record")?;

  registration
    .register_installation(install_dir)
    .await
    .context("failed to register installation")?;
  registration
    .register_install_date()
    .await
    .context("failed to record install date")?;

  info!(
    record = %registration.record_path().display(),
    reinstall = already,
    "installation registered"
  );
  Ok(())
}

fn print_report(report: &RunReport) {
  println!("Run {}", report.run_id);
  for (kind, outcome) in &report.outcomes {
    println!("  {:<18} {}", kind.as_str(), outcome);
  }
}

/// Prints install events to stderr.
struct ConsoleNotifier {
  names: BTreeMap<ComponentKind, String>,
  /// Last whole percentage printed per component.
  last_percent: Mutex<BTreeMap<ComponentKind, u64>>,
}

impl ConsoleNotifier {
  fn new(registry: &ComponentRegistry) -> Self {
    Self {
      names: registry
        .all()
        .map(|d| (d.kind, d.display_name.clone()))
        .collect(),
      last_percent: Mutex::new(BTreeMap::new()),
    }
  }

  fn name(&self, kind: ComponentKind) -> &str {
    self
      .names
      .get(&kind)
      .map(String::as_str)
      .unwrap_or(kind.as_str())
  }
}

impl InstallNotifier for ConsoleNotifier {
  fn notify(&self, event: InstallEvent) {
    match event {
      InstallEvent::ComponentSkipped { component } => {
        eprintln!("{} is already installed", self.name(component));
      }
      InstallEvent::DownloadStarted { component, .. } => {
        eprintln!("Downloading {}", self.name(component));
      }
      InstallEvent::DownloadProgress {
        component,
        progress,
      } => {
        let percent = (progress.fraction() * 100.0) as u64;
        let changed = match self.last_percent.lock() {
          Ok(mut last) => last.insert(component, percent) != Some(percent),
          Err(_) => true,
        };
        if !changed {
          return;
        }
        let total = progress
          .total_mib()
          .map(|total| format!("{:.2} MiB", total))
          .unwrap_or_else(|| "?".to_string());
        eprintln!(
          "{} [{:.2} MiB / {}] ({}%)",
          self.name(component),
          progress.transferred_mib(),
          total,
          percent
        );
      }
      InstallEvent::DownloadFailed { component, error } => {
        eprintln!("Download of {} failed: {}", self.name(component), error);
      }
      InstallEvent::InstallStarted { component } => {
        eprintln!("Installing {}", self.name(component));
      }
      InstallEvent::InstallCompleted { component } => {
        eprintln!("{} installed", self.name(component));
      }
      InstallEvent::InstallFailed { component, error } => {
        eprintln!("Installing {} failed: {}", self.name(component), error);
      }
      InstallEvent::DependencyFailed {
        component,
        dependencies,
      } => {
        let names: Vec<&str> = dependencies.iter().map(|k| self.name(*k)).collect();
        eprintln!(
          "Skipping {}: {} not installed",
          self.name(component),
          names.join(", ")
        );
      }
      InstallEvent::Cancelled { component } => {
        eprintln!("{} cancelled", self.name(component));
      }
      InstallEvent::RunStarted { .. }
      | InstallEvent::DownloadFinished { .. }
      | InstallEvent::RunCompleted { .. } => {}
    }
  }
}
