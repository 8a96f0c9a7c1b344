//! Host-specific build directory overrides

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// `BUILD_DIR` / `CORE_DIR` values handed to the firmware build system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildDirs {
    pub build_dir: PathBuf,
    pub core_dir: PathBuf,
}

impl BuildDirs {
    /// `KEY=VALUE` pairs in the order the build system expects them.
    pub fn env_pairs(&self) -> [(&'static str, String); 2] {
        [
            ("BUILD_DIR", self.build_dir.display().to_string()),
            ("CORE_DIR", self.core_dir.display().to_string()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlatformSettings {
    /// Short build paths for Windows hosts, which choke on the default deep ones.
    pub windows: BuildDirs,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            windows: BuildDirs {
                build_dir: PathBuf::from(r"C:\build\pawcounter"),
                core_dir: PathBuf::from(r"C:\platformio\pawcounter"),
            },
        }
    }
}

/// Overrides for the host identified by `os` (a `std::env::consts::OS` value).
///
/// `None` means the build system keeps its own defaults.
pub fn build_dir_overrides(os: &str, settings: &PlatformSettings) -> Option<BuildDirs> {
    if os.eq_ignore_ascii_case("windows") {
        Some(settings.windows.clone())
    } else {
        None
    }
}

pub fn host_overrides(settings: &PlatformSettings) -> Option<BuildDirs> {
    build_dir_overrides(std::env::consts::OS, settings)
}
