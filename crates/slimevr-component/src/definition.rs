use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::handler::InstallHandler;
use crate::kind::ComponentKind;

/// Check reporting whether the machine already has a component at an
/// acceptable version. Depends only on machine state, never on the current run.
pub type SatisfiedCheck = Arc<dyn Fn() -> bool + Send + Sync>;

/// Immutable description of one installable component.
#[derive(Clone)]
pub struct ComponentDefinition {
  pub kind: ComponentKind,
  /// Human-readable label, e.g. "Java JRE".
  pub display_name: String,
  /// Remote artifact location.
  pub source_uri: String,
  /// File name the artifact is stored under once downloaded.
  pub artifact_file_name: String,
  /// Kinds that must be installed before this one.
  pub depends_on: BTreeSet<ComponentKind>,
  satisfied: SatisfiedCheck,
  handler: Arc<dyn InstallHandler>,
}

impl ComponentDefinition {
  /// Create a definition with no dependencies whose check always reports
  /// "not installed".
  pub fn new(
    kind: ComponentKind,
    display_name: impl Into<String>,
    source_uri: impl Into<String>,
    artifact_file_name: impl Into<String>,
    handler: Arc<dyn InstallHandler>,
  ) -> Self {
    Self {
      kind,
      display_name: display_name.into(),
      source_uri: source_uri.into(),
      artifact_file_name: artifact_file_name.into(),
      depends_on: BTreeSet::new(),
      satisfied: Arc::new(|| false),
      handler,
    }
  }

  /// Declare the kinds this component depends on.
  pub fn depends_on(mut self, kinds: impl IntoIterator<Item = ComponentKind>) -> Self {
    self.depends_on.extend(kinds);
    self
  }

  /// Set the "already installed" check.
  pub fn satisfied_when(mut self, check: impl Fn() -> bool + Send + Sync + 'static) -> Self {
    self.satisfied = Arc::new(check);
    self
  }

  /// Run the "already installed" check.
  pub fn is_already_satisfied(&self) -> bool {
    (self.satisfied)()
  }

  /// The strategy used to install this component.
  pub fn install_handler(&self) -> &Arc<dyn InstallHandler> {
    &self.handler
  }
}

impl fmt::Debug for ComponentDefinition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ComponentDefinition")
      .field("kind", &self.kind)
      .field("display_name", &self.display_name)
      .field("source_uri", &self.source_uri)
      .field("artifact_file_name", &self.artifact_file_name)
      .field("depends_on", &self.depends_on)
      .field("handler", &self.handler.name())
      .finish()
  }
}
