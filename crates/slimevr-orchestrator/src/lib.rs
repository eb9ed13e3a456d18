//! SlimeVR Orchestrator
//!
//! Runs one end-to-end installation for a set of requested components:
//!
//! 1. every component not already present is downloaded, all concurrently
//! 2. components are installed one at a time, in dependency order
//! 3. the per-run working directory is removed on every exit path
//!
//! Per-component failures never abort the run. They are collected into the
//! [`RunReport`] and propagate to dependents only as
//! [`ComponentOutcome::DependencyFailed`].

mod error;
mod events;
mod graph;
mod orchestrator;
mod outcome;

pub use error::OrchestratorError;
pub use events::{ChannelNotifier, InstallEvent, InstallNotifier, NoopNotifier};
pub use graph::InstallGraph;
pub use orchestrator::{Orchestrator, OrchestratorConfig, WORKING_DIR_PREFIX};
pub use outcome::{ComponentOutcome, RunReport};
