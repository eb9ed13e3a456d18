use slimevr_component::ComponentKind;
use thiserror::Error;

/// Errors that can occur while building or querying the registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
  /// The kind was never registered.
  #[error("unknown component: {0}")]
  UnknownComponent(ComponentKind),

  /// Two definitions share a kind.
  #[error("component registered twice: {0}")]
  DuplicateComponent(ComponentKind),

  /// A definition depends on a kind that is not registered.
  #[error("component '{component}' depends on unregistered component '{dependency}'")]
  UnknownDependency {
    component: ComponentKind,
    dependency: ComponentKind,
  },

  /// The dependency graph contains a cycle through this component.
  #[error("dependency cycle detected at component '{0}'")]
  CycleDetected(ComponentKind),
}
