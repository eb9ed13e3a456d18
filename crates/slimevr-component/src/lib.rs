//! SlimeVR Component
//!
//! This crate contains the component model shared by the installer crates:
//!
//! - [`ComponentKind`] - the identity of each installable component
//! - [`ComponentDefinition`] - the immutable description of a component
//!   (where to fetch it, what it depends on, how to install it)
//! - [`ComponentState`] - the mutable record of one component during one
//!   orchestration run
//! - [`InstallHandler`] - the capability that turns a downloaded artifact into
//!   an installed component
//!
//! The orchestrator only ever talks to [`InstallHandler`]; concrete handler
//! variants live in `slimevr-install-handler`.

mod definition;
mod error;
mod handler;
mod kind;
mod state;

pub use definition::{ComponentDefinition, SatisfiedCheck};
pub use error::InstallError;
pub use handler::InstallHandler;
pub use kind::{ComponentKind, ParseKindError};
pub use state::ComponentState;
