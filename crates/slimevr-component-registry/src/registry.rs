use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use slimevr_component::{ComponentDefinition, ComponentKind};

use crate::builtin::builtin_definitions;
use crate::error::RegistryError;

/// The statically-known set of component definitions.
///
/// Constructed once and passed by reference to whoever needs it. Construction
/// guarantees unique kinds, dependencies that refer to registered kinds, and
/// an acyclic dependency graph.
#[derive(Debug, Clone)]
pub struct ComponentRegistry {
  components: BTreeMap<ComponentKind, Arc<ComponentDefinition>>,
}

impl ComponentRegistry {
  /// Build a registry from definitions, validating the dependency graph.
  pub fn new(
    definitions: impl IntoIterator<Item = ComponentDefinition>,
  ) -> Result<Self, RegistryError> {
    let mut components = BTreeMap::new();
    for definition in definitions {
      let kind = definition.kind;
      if components.insert(kind, Arc::new(definition)).is_some() {
        return Err(RegistryError::DuplicateComponent(kind));
      }
    }

    let registry = Self { components };
    registry.validate_dependencies()?;
    registry.detect_cycle()?;
    Ok(registry)
  }

  /// The built-in SlimeVR bundle, probing and installing into `install_dir`.
  pub fn builtin(install_dir: &Path) -> Result<Self, RegistryError> {
    Self::new(builtin_definitions(install_dir))
  }

  /// Look up a definition by kind.
  pub fn get(&self, kind: ComponentKind) -> Result<&Arc<ComponentDefinition>, RegistryError> {
    self
      .components
      .get(&kind)
      .ok_or(RegistryError::UnknownComponent(kind))
  }

  /// Every registered definition, ordered by kind.
  pub fn all(&self) -> impl Iterator<Item = &Arc<ComponentDefinition>> {
    self.components.values()
  }

  /// Every registered kind, in order.
  pub fn kinds(&self) -> Vec<ComponentKind> {
    self.components.keys().copied().collect()
  }

  /// `requested` plus everything it transitively depends on.
  pub fn with_dependencies(
    &self,
    requested: &[ComponentKind],
  ) -> Result<BTreeSet<ComponentKind>, RegistryError> {
    let mut closure = BTreeSet::new();
    let mut stack: Vec<ComponentKind> = requested.to_vec();

    while let Some(kind) = stack.pop() {
      if !closure.insert(kind) {
        continue;
      }
      stack.extend(self.get(kind)?.depends_on.iter().copied());
    }

    Ok(closure)
  }

  fn validate_dependencies(&self) -> Result<(), RegistryError> {
    for (kind, definition) in &self.components {
      if let Some(missing) = definition
        .depends_on
        .iter()
        .find(|dep| !self.components.contains_key(*dep))
      {
        return Err(RegistryError::UnknownDependency {
          component: *kind,
          dependency: *missing,
        });
      }
    }
    Ok(())
  }

  /// Check for cycles using DFS.
  fn detect_cycle(&self) -> Result<(), RegistryError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
      White,
      Gray,
      Black,
    }

    fn dfs(
      kind: ComponentKind,
      components: &BTreeMap<ComponentKind, Arc<ComponentDefinition>>,
      color: &mut HashMap<ComponentKind, Color>,
    ) -> Option<ComponentKind> {
      color.insert(kind, Color::Gray);

      if let Some(definition) = components.get(&kind) {
        for &dep in &definition.depends_on {
          match color.get(&dep) {
            Some(Color::Gray) => return Some(dep), // Back edge = cycle
            Some(Color::White) => {
              if let Some(found) = dfs(dep, components, color) {
                return Some(found);
              }
            }
            _ => {}
          }
        }
      }

      color.insert(kind, Color::Black);
      None
    }

    let mut color: HashMap<ComponentKind, Color> = self
      .components
      .keys()
      .map(|kind| (*kind, Color::White))
      .collect();

    for kind in self.components.keys() {
      if color.get(kind) == Some(&Color::White)
        && let Some(found) = dfs(*kind, &self.components, &mut color)
      {
        return Err(RegistryError::CycleDetected(found));
      }
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use async_trait::async_trait;
  use slimevr_component::{ComponentState, InstallError, InstallHandler};
  use tokio_util::sync::CancellationToken;

  use super::*;

  struct NoopHandler;

  #[async_trait]
  impl InstallHandler for NoopHandler {
    fn name(&self) -> &'static str {
      "noop"
    }

    async fn install(
      &self,
      _state: &ComponentState,
      _cancel: CancellationToken,
    ) -> Result<(), InstallError> {
      Ok(())
    }
  }

  fn def(kind: ComponentKind, deps: &[ComponentKind]) -> ComponentDefinition {
    ComponentDefinition::new(
      kind,
      kind.to_string(),
      format!("https://example.invalid/{}", kind),
      format!("{}.zip", kind),
      Arc::new(NoopHandler),
    )
    .depends_on(deps.iter().copied())
  }

  #[test]
  fn test_get_registered_and_unknown() {
    let registry = ComponentRegistry::new([def(ComponentKind::Driver, &[])]).unwrap();

    assert_eq!(registry.get(ComponentKind::Driver).unwrap().kind, ComponentKind::Driver);
    assert_eq!(
      registry.get(ComponentKind::Server).unwrap_err(),
      RegistryError::UnknownComponent(ComponentKind::Server)
    );
  }

  #[test]
  fn test_duplicate_kind_rejected() {
    let err = ComponentRegistry::new([
      def(ComponentKind::Driver, &[]),
      def(ComponentKind::Driver, &[]),
    ])
    .unwrap_err();
    assert_eq!(err, RegistryError::DuplicateComponent(ComponentKind::Driver));
  }

  #[test]
  fn test_unknown_dependency_rejected() {
    let err =
      ComponentRegistry::new([def(ComponentKind::Server, &[ComponentKind::JavaRuntime])])
        .unwrap_err();
    assert_eq!(
      err,
      RegistryError::UnknownDependency {
        component: ComponentKind::Server,
        dependency: ComponentKind::JavaRuntime,
      }
    );
  }

  #[test]
  fn test_cycle_rejected() {
    let err = ComponentRegistry::new([
      def(ComponentKind::Server, &[ComponentKind::JavaRuntime]),
      def(ComponentKind::JavaRuntime, &[ComponentKind::Driver]),
      def(ComponentKind::Driver, &[ComponentKind::Server]),
    ])
    .unwrap_err();
    assert!(matches!(err, RegistryError::CycleDetected(_)));
  }

  #[test]
  fn test_self_dependency_rejected() {
    let err = ComponentRegistry::new([def(ComponentKind::Driver, &[ComponentKind::Driver])])
      .unwrap_err();
    assert_eq!(err, RegistryError::CycleDetected(ComponentKind::Driver));
  }

  #[test]
  fn test_with_dependencies_is_transitive() {
    let registry = ComponentRegistry::new([
      def(ComponentKind::Server, &[ComponentKind::JavaRuntime]),
      def(ComponentKind::JavaRuntime, &[ComponentKind::WebViewRuntime]),
      def(ComponentKind::WebViewRuntime, &[]),
      def(ComponentKind::Driver, &[]),
    ])
    .unwrap();

    let closure = registry.with_dependencies(&[ComponentKind::Server]).unwrap();
    assert_eq!(
      closure.into_iter().collect::<Vec<_>>(),
      vec![
        ComponentKind::Server,
        ComponentKind::JavaRuntime,
        ComponentKind::WebViewRuntime,
      ]
    );
  }

  #[test]
  fn test_builtin_registry() {
    let dir = tempfile::tempdir().unwrap();
    let registry = ComponentRegistry::builtin(dir.path()).unwrap();

    assert_eq!(registry.kinds(), ComponentKind::ALL.to_vec());
    assert_eq!(registry.all().count(), 5);

    let server = registry.get(ComponentKind::Server).unwrap();
    assert!(server.depends_on.contains(&ComponentKind::JavaRuntime));
    assert!(server.depends_on.contains(&ComponentKind::WebViewRuntime));
  }
}
