mod builtin;
mod error;
mod registry;

pub use builtin::{DRIVER_DIR, FEEDER_DIR, JRE_DIR, SERVER_MARKER, builtin_definitions};
pub use error::RegistryError;
pub use registry::ComponentRegistry;
