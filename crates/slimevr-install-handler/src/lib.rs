//! SlimeVR Install Handler
//!
//! Concrete [`InstallHandler`](slimevr_component::InstallHandler) variants:
//!
//! - [`ExecutableHandler`] launches the downloaded artifact and treats exit
//!   code 0 as success
//! - [`ArchiveHandler`] extracts a zip artifact into a private scratch
//!   directory and then runs a component-specific [`PostExtract`] action
//!
//! Both variants check that the artifact exists before touching the machine
//! and honour the cancellation token passed to `install`.

mod archive;
mod executable;
mod post_extract;

pub use archive::ArchiveHandler;
pub use executable::ExecutableHandler;
pub use post_extract::{CopyTree, PostExtract, PostExtractError};
