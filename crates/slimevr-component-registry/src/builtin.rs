use std::path::{Path, PathBuf};
use std::sync::Arc;

use semver::Version;
use slimevr_component::{ComponentDefinition, ComponentKind};
use slimevr_install_handler::{ArchiveHandler, CopyTree, ExecutableHandler};
use slimevr_install_registration::webview;

/// File whose presence marks the server as installed.
pub const SERVER_MARKER: &str = "slimevr.jar";
/// Install subdirectory of the bundled Java runtime.
pub const JRE_DIR: &str = "jre";
/// Oldest Java runtime the server runs on.
const MIN_JAVA_VERSION: Version = Version::new(17, 0, 0);
/// Install subdirectory of the SteamVR driver.
pub const DRIVER_DIR: &str = "driver";
/// Install subdirectory of the feeder app.
pub const FEEDER_DIR: &str = "feeder";

const SERVER_URL: &str =
  "https://github.com/SlimeVR/SlimeVR-Server/releases/latest/download/SlimeVR-win64.zip";
const JAVA_URL: &str = "https://github.com/adoptium/temurin17-binaries/releases/download/jdk-17.0.4.1%2B1/OpenJDK17U-jre_x64_windows_hotspot_17.0.4.1_1.zip";
const WEBVIEW_URL: &str = "https://go.microsoft.com/fwlink/p/?LinkId=2124703";
const DRIVER_URL: &str = "https://github.com/SlimeVR/SlimeVR-OpenVR-Driver/releases/latest/download/slimevr-openvr-driver-win64.zip";
const FEEDER_URL: &str = "https://github.com/SlimeVR/SlimeVR-Feeder-App/releases/latest/download/SlimeVR-Feeder-App-win64.zip";

/// Definitions of the five bundled components, installing into `install_dir`.
pub fn builtin_definitions(install_dir: &Path) -> Vec<ComponentDefinition> {
  let server_marker = install_dir.join(SERVER_MARKER);
  let jre = install_dir.join(JRE_DIR);
  let driver = install_dir.join(DRIVER_DIR);
  let feeder = install_dir.join(FEEDER_DIR);

  vec![
    ComponentDefinition::new(
      ComponentKind::Server,
      "SlimeVR Server",
      SERVER_URL,
      "SlimeVR-win64.zip",
      Arc::new(ArchiveHandler::new(CopyTree::root())),
    )
    .depends_on([ComponentKind::JavaRuntime, ComponentKind::WebViewRuntime])
    .satisfied_when(move || server_marker.is_file()),
    ComponentDefinition::new(
      ComponentKind::JavaRuntime,
      "Java JRE",
      JAVA_URL,
      "OpenJDK17U-jre_x64_windows_hotspot_17.0.4.1_1.zip",
      Arc::new(ArchiveHandler::new(CopyTree::new(JRE_DIR))),
    )
    .satisfied_when(move || {
      java_binary(&jre).is_file() && java_version(&jre).is_some_and(|v| v >= MIN_JAVA_VERSION)
    }),
    ComponentDefinition::new(
      ComponentKind::WebViewRuntime,
      "Edge WebView2",
      WEBVIEW_URL,
      "MicrosoftEdgeWebView2RuntimeInstaller.exe",
      Arc::new(ExecutableHandler::with_args(["/silent", "/install"])),
    )
    .satisfied_when(|| !webview::is_required() || webview::installed_version().is_some()),
    ComponentDefinition::new(
      ComponentKind::Driver,
      "SteamVR Driver",
      DRIVER_URL,
      "slimevr-openvr-driver-win64.zip",
      Arc::new(ArchiveHandler::new(CopyTree::new(DRIVER_DIR))),
    )
    .satisfied_when(move || has_entries(&driver)),
    ComponentDefinition::new(
      ComponentKind::FeederApp,
      "SlimeVR Feeder App",
      FEEDER_URL,
      "SlimeVR-Feeder-App-win64.zip",
      Arc::new(ArchiveHandler::new(CopyTree::new(FEEDER_DIR))),
    )
    .satisfied_when(move || has_entries(&feeder)),
  ]
}

fn java_binary(jre: &Path) -> PathBuf {
  let name = if cfg!(windows) { "java.exe" } else { "java" };
  jre.join("bin").join(name)
}

/// `JAVA_VERSION` from a runtime's `release` file.
fn java_version(jre: &Path) -> Option<Version> {
  let release = std::fs::read_to_string(jre.join("release")).ok()?;
  release.lines().find_map(|line| {
    let value = line.strip_prefix("JAVA_VERSION=")?.trim().trim_matches('"');
    parse_java_version(value)
  })
}

/// Parse `17.0.4.1`, `21` or the legacy `1.8.0_345` into major.minor.patch.
fn parse_java_version(value: &str) -> Option<Version> {
  let numbers: Vec<u64> = value
    .split(|c: char| !c.is_ascii_digit())
    .filter(|part| !part.is_empty())
    .map(str::parse)
    .collect::<Result<_, _>>()
    .ok()?;
  let numbers = match numbers.as_slice() {
    [1, rest @ ..] if !rest.is_empty() => rest,
    all => all,
  };
  let major = *numbers.first()?;
  let minor = numbers.get(1).copied().unwrap_or(0);
  let patch = numbers.get(2).copied().unwrap_or(0);
  Some(Version::new(major, minor, patch))
}

fn has_entries(dir: &Path) -> bool {
  std::fs::read_dir(dir)
    .map(|mut entries| entries.next().is_some())
    .unwrap_or(false)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn definition(install_dir: &Path, kind: ComponentKind) -> ComponentDefinition {
    builtin_definitions(install_dir)
      .into_iter()
      .find(|d| d.kind == kind)
      .unwrap()
  }

  fn install_jre(install_dir: &Path, version: &str) {
    let jre = install_dir.join(JRE_DIR);
    std::fs::create_dir_all(jre.join("bin")).unwrap();
    std::fs::write(java_binary(&jre), b"jvm").unwrap();
    std::fs::write(
      jre.join("release"),
      format!("IMPLEMENTOR=\"Eclipse Adoptium\"\nJAVA_VERSION=\"{}\"\n", version),
    )
    .unwrap();
  }

  #[test]
  fn test_nothing_satisfied_in_empty_install_dir() {
    let dir = tempfile::tempdir().unwrap();
    for kind in [
      ComponentKind::Server,
      ComponentKind::JavaRuntime,
      ComponentKind::Driver,
      ComponentKind::FeederApp,
    ] {
      assert!(!definition(dir.path(), kind).is_already_satisfied(), "{kind}");
    }
  }

  #[test]
  fn test_satisfied_follows_install_dir_contents() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(SERVER_MARKER), b"jar").unwrap();
    install_jre(dir.path(), "17.0.4.1");
    std::fs::create_dir_all(dir.path().join(DRIVER_DIR).join("slimevr")).unwrap();

    assert!(definition(dir.path(), ComponentKind::Server).is_already_satisfied());
    assert!(definition(dir.path(), ComponentKind::JavaRuntime).is_already_satisfied());
    assert!(definition(dir.path(), ComponentKind::Driver).is_already_satisfied());
    assert!(!definition(dir.path(), ComponentKind::FeederApp).is_already_satisfied());
  }

  #[cfg(not(windows))]
  #[test]
  fn test_webview_not_required_off_windows() {
    let dir = tempfile::tempdir().unwrap();
    assert!(definition(dir.path(), ComponentKind::WebViewRuntime).is_already_satisfied());
  }

  #[test]
  fn test_handler_variants() {
    let dir = tempfile::tempdir().unwrap();
    for definition in builtin_definitions(dir.path()) {
      let expected = match definition.kind {
        ComponentKind::WebViewRuntime => "executable",
        _ => "archive",
      };
      assert_eq!(definition.install_handler().name(), expected);
    }
  }

  #[test]
  fn test_outdated_java_not_satisfied() {
    let dir = tempfile::tempdir().unwrap();
    install_jre(dir.path(), "11.0.16");
    assert!(!definition(dir.path(), ComponentKind::JavaRuntime).is_already_satisfied());
  }

  #[test]
  fn test_java_without_release_file_not_satisfied() {
    let dir = tempfile::tempdir().unwrap();
    let jre = dir.path().join(JRE_DIR);
    std::fs::create_dir_all(jre.join("bin")).unwrap();
    std::fs::write(java_binary(&jre), b"jvm").unwrap();
    assert!(!definition(dir.path(), ComponentKind::JavaRuntime).is_already_satisfied());
  }

  #[test]
  fn test_parse_java_version() {
    assert_eq!(parse_java_version("17.0.4.1"), Some(Version::new(17, 0, 4)));
    assert_eq!(parse_java_version("21"), Some(Version::new(21, 0, 0)));
    assert_eq!(parse_java_version("1.8.0_345"), Some(Version::new(8, 0, 345)));
    assert_eq!(parse_java_version(""), None);
  }
}
