//! Read-only scan of expected build artifacts

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A file the build is expected to produce, under a logical name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedArtifact {
    pub name: String,
    pub path: PathBuf,
}

impl ExpectedArtifact {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Use the path itself as the logical name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: path.display().to_string(),
            path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub name: String,
    pub path: PathBuf,
    pub exists: bool,
    pub size_bytes: Option<u64>,
    /// `lv_font_t` symbol defined in the file, if one was found.
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactReport {
    pub entries: Vec<ArtifactEntry>,
}

impl ArtifactReport {
    pub fn get(&self, name: &str) -> Option<&ArtifactEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Name → size map; absent artifacts map to `None`.
    pub fn sizes(&self) -> BTreeMap<String, Option<u64>> {
        self.entries
            .iter()
            .map(|e| (e.name.clone(), e.size_bytes))
            .collect()
    }

    pub fn present(&self) -> usize {
        self.entries.iter().filter(|e| e.exists).count()
    }
}

/// Record existence and size of every artifact, resolved against `base_dir`.
///
/// Never fails: an entry that cannot be stat'ed (missing, permission
/// denied, not a regular file) is reported as absent.
pub fn inspect(artifacts: &[ExpectedArtifact], base_dir: &Path) -> ArtifactReport {
    let entries = artifacts
        .iter()
        .map(|artifact| {
            let path = base_dir.join(&artifact.path);
            let (exists, size_bytes) = match fs::metadata(&path) {
                Ok(meta) if meta.is_file() => (true, Some(meta.len())),
                Ok(_) => {
                    debug!("{} is not a regular file", path.display());
                    (false, None)
                }
                Err(err) => {
                    debug!("{}: {err}", path.display());
                    (false, None)
                }
            };
            let symbol = if exists { read_symbol(&path) } else { None };

            ArtifactEntry {
                name: artifact.name.clone(),
                path,
                exists,
                size_bytes,
                symbol,
            }
        })
        .collect();

    ArtifactReport { entries }
}

fn read_symbol(path: &Path) -> Option<String> {
    let bytes = fs::read(path).ok()?;
    declared_font_symbol(&String::from_utf8_lossy(&bytes))
}

/// Find the first `lv_font_t <name> = {` definition in generated C source.
pub fn declared_font_symbol(source: &str) -> Option<String> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| {
        Regex::new(r"(?m)^\s*(?:const\s+)?lv_font_t\s+([A-Za-z_][A-Za-z0-9_]*)\s*=")
            .expect("static regex")
    });
    re.captures(source).map(|caps| caps[1].to_string())
}
