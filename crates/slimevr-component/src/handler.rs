use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::InstallError;
use crate::state::ComponentState;

/// Turns a downloaded artifact into an installed component.
///
/// Implementations must check [`ComponentState::artifact`] before touching the
/// machine and fail with [`InstallError::Precondition`] when it is missing.
/// When `cancel` fires mid-install they stop what they are doing and return
/// [`InstallError::Cancelled`].
#[async_trait]
pub trait InstallHandler: Send + Sync {
  /// Short name of the strategy, used in logs.
  fn name(&self) -> &'static str;

  /// Install the component described by `state`.
  async fn install(
    &self,
    state: &ComponentState,
    cancel: CancellationToken,
  ) -> Result<(), InstallError>;
}
