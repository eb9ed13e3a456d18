//! Edge WebView2 runtime detection.
//!
//! The runtime registers its version as the `pv` value of the EdgeUpdate
//! client key, either machine-wide or per-user. A missing key, an empty value
//! or `0.0.0.0` all mean "not installed".

/// EdgeUpdate client id of the WebView2 runtime.
const CLIENT_ID: &str = "{F3017226-FE2A-4295-8BDF-00C3A9A7E4C5}";

/// Registry keys to consult, in order.
fn candidate_keys() -> [String; 2] {
  let machine = if cfg!(target_pointer_width = "64") {
    "HKLM\\SOFTWARE\\WOW6432Node\\Microsoft\\EdgeUpdate\\Clients"
  } else {
    "HKLM\\SOFTWARE\\Microsoft\\EdgeUpdate\\Clients"
  };
  [
    format!("{}\\{}", machine, CLIENT_ID),
    format!("HKCU\\Software\\Microsoft\\EdgeUpdate\\Clients\\{}", CLIENT_ID),
  ]
}

/// Installed WebView2 version, if any.
///
/// Always `None` off Windows.
pub fn installed_version() -> Option<String> {
  if !cfg!(windows) {
    return None;
  }

  candidate_keys().iter().find_map(|key| {
    let output = std::process::Command::new("reg")
      .args(["query", key, "/v", "pv"])
      .output()
      .ok()?;
    if !output.status.success() {
      return None;
    }
    parse_pv(&String::from_utf8_lossy(&output.stdout))
  })
}

/// Whether this host needs the WebView2 runtime installed.
///
/// Only Windows hosts use it; elsewhere it is never required.
pub fn is_required() -> bool {
  cfg!(windows)
}

/// Extract the `pv` value from `reg query ... /v pv` output.
pub fn parse_pv(output: &str) -> Option<String> {
  output.lines().find_map(|line| {
    let mut fields = line.split_whitespace();
    if !fields.next()?.eq_ignore_ascii_case("pv") {
      return None;
    }
    let _kind = fields.next()?;
    let version = fields.next()?;
    (version != "0.0.0.0").then(|| version.to_string())
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_pv() {
    let output = "\r\nHKEY_LOCAL_MACHINE\\SOFTWARE\\WOW6432Node\\Microsoft\\EdgeUpdate\\Clients\\{F3017226-FE2A-4295-8BDF-00C3A9A7E4C5}\r\n    pv    REG_SZ    120.0.2210.91\r\n\r\n";
    assert_eq!(parse_pv(output), Some("120.0.2210.91".to_string()));
  }

  #[test]
  fn test_parse_pv_placeholder_version() {
    assert_eq!(parse_pv("    pv    REG_SZ    0.0.0.0\n"), None);
  }

  #[test]
  fn test_parse_pv_missing_value() {
    assert_eq!(parse_pv("    pv    REG_SZ\n"), None);
    assert_eq!(parse_pv("ERROR: The system was unable to find the specified registry key or value.\n"), None);
  }

  #[test]
  fn test_keys_cover_machine_and_user() {
    let keys = candidate_keys();
    assert!(keys[0].starts_with("HKLM\\"));
    assert!(keys[1].starts_with("HKCU\\"));
    assert!(keys.iter().all(|k| k.ends_with(CLIENT_ID)));
  }

  #[cfg(not(windows))]
  #[test]
  fn test_not_required_off_windows() {
    assert!(!is_required());
    assert_eq!(installed_version(), None);
  }
}
