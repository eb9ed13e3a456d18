use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identity of an installable component.
///
/// The declaration order is the tie-break order used when several components
/// are eligible at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentKind {
  Server,
  JavaRuntime,
  WebViewRuntime,
  Driver,
  FeederApp,
}

impl ComponentKind {
  /// Every kind, in declaration order.
  pub const ALL: [ComponentKind; 5] = [
    ComponentKind::Server,
    ComponentKind::JavaRuntime,
    ComponentKind::WebViewRuntime,
    ComponentKind::Driver,
    ComponentKind::FeederApp,
  ];

  /// Stable kebab-case name, matching the serde representation.
  pub fn as_str(&self) -> &'static str {
    match self {
      ComponentKind::Server => "server",
      ComponentKind::JavaRuntime => "java-runtime",
      ComponentKind::WebViewRuntime => "web-view-runtime",
      ComponentKind::Driver => "driver",
      ComponentKind::FeederApp => "feeder-app",
    }
  }
}

impl fmt::Display for ComponentKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Returned when a string does not name a known component kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown component kind '{0}' (expected one of: server, java-runtime, web-view-runtime, driver, feeder-app)")]
pub struct ParseKindError(pub String);

impl FromStr for ComponentKind {
  type Err = ParseKindError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    ComponentKind::ALL
      .into_iter()
      .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| ParseKindError(s.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_round_trips_display() {
    for kind in ComponentKind::ALL {
      assert_eq!(kind.to_string().parse::<ComponentKind>(), Ok(kind));
    }
  }

  #[test]
  fn test_parse_is_case_insensitive() {
    assert_eq!("Java-Runtime".parse(), Ok(ComponentKind::JavaRuntime));
  }

  #[test]
  fn test_parse_unknown() {
    let err = "steamvr".parse::<ComponentKind>().unwrap_err();
    assert_eq!(err, ParseKindError("steamvr".to_string()));
  }

  #[test]
  fn test_serde_uses_kebab_case() {
    let json = serde_json::to_string(&ComponentKind::WebViewRuntime).unwrap();
    assert_eq!(json, "\"web-view-runtime\"");
  }
}
