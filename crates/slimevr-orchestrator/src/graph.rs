use std::collections::{BTreeMap, BTreeSet};

use slimevr_component::ComponentKind;
use slimevr_component_registry::{ComponentRegistry, RegistryError};

/// Dependency graph of the components taking part in one run.
///
/// Edges point from a dependency to its dependents. Dependencies on kinds
/// outside the run are ignored.
#[derive(Debug, Clone)]
pub struct InstallGraph {
  /// kind -> kinds that depend on it.
  downstream: BTreeMap<ComponentKind, Vec<ComponentKind>>,
  /// kind -> kinds it depends on.
  upstream: BTreeMap<ComponentKind, Vec<ComponentKind>>,
}

impl InstallGraph {
  /// Build the graph for `kinds` from their registered definitions.
  pub fn new(
    registry: &ComponentRegistry,
    kinds: &BTreeSet<ComponentKind>,
  ) -> Result<Self, RegistryError> {
    let mut downstream: BTreeMap<ComponentKind, Vec<ComponentKind>> = BTreeMap::new();
    let mut upstream: BTreeMap<ComponentKind, Vec<ComponentKind>> = BTreeMap::new();

    for kind in kinds {
      downstream.entry(*kind).or_default();
      upstream.entry(*kind).or_default();
    }

    for kind in kinds {
      let definition = registry.get(*kind)?;
      for dep in definition.depends_on.iter().filter(|dep| kinds.contains(*dep)) {
        downstream.entry(*dep).or_default().push(*kind);
        upstream.entry(*kind).or_default().push(*dep);
      }
    }

    Ok(Self {
      downstream,
      upstream,
    })
  }

  /// Kinds `kind` depends on.
  pub fn upstream(&self, kind: ComponentKind) -> &[ComponentKind] {
    self
      .upstream
      .get(&kind)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Kinds that depend on `kind`.
  pub fn downstream(&self, kind: ComponentKind) -> &[ComponentKind] {
    self
      .downstream
      .get(&kind)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Dependency layers, in install order.
  ///
  /// Every component appears in a later layer than all of its dependencies.
  /// Within a layer components are ordered by kind.
  pub fn layers(&self) -> Vec<Vec<ComponentKind>> {
    let mut remaining: BTreeMap<ComponentKind, usize> = self
      .upstream
      .iter()
      .map(|(kind, deps)| (*kind, deps.len()))
      .collect();
    let mut layers = Vec::new();

    loop {
      let ready: Vec<ComponentKind> = remaining
        .iter()
        .filter(|(_, pending)| **pending == 0)
        .map(|(kind, _)| *kind)
        .collect();
      if ready.is_empty() {
        break;
      }

      for kind in &ready {
        remaining.remove(kind);
        for dependent in self.downstream(*kind) {
          if let Some(pending) = remaining.get_mut(dependent) {
            *pending -= 1;
          }
        }
      }
      layers.push(ready);
    }

    layers
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use slimevr_component::{ComponentDefinition, ComponentState, InstallError, InstallHandler};
  use tokio_util::sync::CancellationToken;

  use super::*;

  struct NoopHandler;

  #[async_trait::async_trait]
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

  fn registry(edges: &[(ComponentKind, &[ComponentKind])]) -> ComponentRegistry {
    ComponentRegistry::new(edges.iter().map(|(kind, deps)| {
      ComponentDefinition::new(
        *kind,
        kind.to_string(),
        "https://example.invalid/artifact",
        "artifact.zip",
        Arc::new(NoopHandler),
      )
      .depends_on(deps.iter().copied())
    }))
    .unwrap()
  }

  #[test]
  fn test_builtin_shape_layers() {
    use ComponentKind::*;
    let registry = registry(&[
      (Server, &[JavaRuntime, WebViewRuntime]),
      (JavaRuntime, &[]),
      (WebViewRuntime, &[]),
      (Driver, &[]),
      (FeederApp, &[]),
    ]);
    let kinds = registry.kinds().into_iter().collect();
    let graph = InstallGraph::new(&registry, &kinds).unwrap();

    assert_eq!(
      graph.layers(),
      vec![vec![JavaRuntime, WebViewRuntime, Driver, FeederApp], vec![Server]]
    );
    assert_eq!(graph.upstream(Server), &[JavaRuntime, WebViewRuntime]);
    assert_eq!(graph.downstream(JavaRuntime), &[Server]);
  }

  #[test]
  fn test_chain_layers() {
    use ComponentKind::*;
    let registry = registry(&[
      (Server, &[JavaRuntime]),
      (JavaRuntime, &[Driver]),
      (Driver, &[]),
    ]);
    let kinds = registry.kinds().into_iter().collect();
    let graph = InstallGraph::new(&registry, &kinds).unwrap();

    assert!(graph.upstream(Driver).is_empty());
    assert_eq!(graph.upstream(JavaRuntime), &[Driver]);
    assert_eq!(
      graph.layers(),
      vec![vec![Driver], vec![JavaRuntime], vec![Server]]
    );
  }

  #[test]
  fn test_dependencies_outside_run_ignored() {
    use ComponentKind::*;
    let registry = registry(&[(Server, &[JavaRuntime]), (JavaRuntime, &[])]);
    let kinds = BTreeSet::from([Server]);
    let graph = InstallGraph::new(&registry, &kinds).unwrap();

    assert!(graph.upstream(Server).is_empty());
    assert_eq!(graph.layers(), vec![vec![Server]]);
  }

  #[test]
  fn test_unknown_kind() {
    let registry = registry(&[(ComponentKind::Driver, &[])]);
    let kinds = BTreeSet::from([ComponentKind::FeederApp]);
    assert_eq!(
      InstallGraph::new(&registry, &kinds).unwrap_err(),
      RegistryError::UnknownComponent(ComponentKind::FeederApp)
    );
  }
}
