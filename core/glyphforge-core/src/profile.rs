//! Reproducible generation profile, loaded from `glyphforge.toml`

use std::collections::HashSet;
use std::env;
use std::fs;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::budget::DeviceBudget;
use crate::header::guard_for;
use crate::inspect::ExpectedArtifact;
use crate::platform::PlatformSettings;
use crate::range::CharacterRangeSpec;
use crate::raster::{BitDepth, OutputFormat, RasterizationRequest, ToolSettings};

/// Profile file looked up in the working directory when none is given.
pub const DEFAULT_PROFILE_FILE: &str = "glyphforge.toml";

/// Replaces `tool.command` (whitespace separated).
pub const TOOL_ENV: &str = "GLYPHFORGE_TOOL";

/// Calculator glyph set: digits, operators, error/readout letters, space, comma, currency.
pub const DEFAULT_RANGE: &str = "0x30-0x39,0x2B,0x2D,0x2A,0x2F,0x3D,0x2E,0x25,0x28,0x29,0x43,0x45,0x49,0x4E,0x4F,0x52,0x72,0x6F,0x65,0x74,0x61,0x6E,0x20,0x2C,0xA5,0x24";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontSettings {
    pub source: PathBuf,
    pub bpp: BitDepth,
    pub format: OutputFormat,
    pub compress: bool,
    pub range: CharacterRangeSpec,
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            source: PathBuf::from("zpix.ttf"),
            bpp: BitDepth::default(),
            format: OutputFormat::Lvgl,
            compress: false,
            range: CharacterRangeSpec::parse(DEFAULT_RANGE).expect("default range is well-formed"),
        }
    }
}

/// One point size and where its glyph table goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSpec {
    pub size: NonZeroU32,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeaderSettings {
    pub path: PathBuf,
    #[serde(default)]
    pub guard: Option<String>,
}

impl HeaderSettings {
    pub fn guard(&self) -> String {
        self.guard
            .clone()
            .unwrap_or_else(|| guard_for(&self.path))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Profile {
    /// Root for every relative path below. Relative values resolve against
    /// the directory holding the profile file.
    pub base_dir: PathBuf,
    pub tool: ToolSettings,
    pub font: FontSettings,
    pub outputs: Vec<OutputSpec>,
    pub header: Option<HeaderSettings>,
    pub device: DeviceBudget,
    pub platform: PlatformSettings,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            tool: ToolSettings::default(),
            font: FontSettings::default(),
            outputs: vec![
                output(20, "src/fonts/lv_font_zpix_20.c"),
                output(60, "src/fonts/lv_font_zpix_60.c"),
            ],
            header: Some(HeaderSettings {
                path: PathBuf::from("src/fonts/lv_font_zpix.h"),
                guard: None,
            }),
            device: DeviceBudget::esp32_s3(),
            platform: PlatformSettings::default(),
        }
    }
}

fn output(size: u32, path: &str) -> OutputSpec {
    OutputSpec {
        size: NonZeroU32::new(size).expect("built-in output sizes are nonzero"),
        path: PathBuf::from(path),
    }
}

impl Profile {
    /// Parse profile text; relative `base_dir` resolves against `origin`.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self> {
        let mut profile: Profile = toml::from_str(text).context("parsing profile")?;
        profile.base_dir = origin.join(&profile.base_dir);
        profile.validate()?;
        Ok(profile)
    }

    /// Load a profile file. A relative `path` resolves against the process
    /// working directory, so `base_dir` always comes out absolute.
    pub fn load(path: &Path) -> Result<Self> {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            env::current_dir()
                .context("resolving working directory")?
                .join(path)
        };
        let path = path.as_path();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading profile {}", path.display()))?;
        let origin = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_toml_str(&text, origin)
            .with_context(|| format!("loading profile {}", path.display()))
    }

    /// Pick the profile for a run: an explicit file, else `glyphforge.toml`
    /// in `cwd`, else the built-in defaults rooted at `cwd`. Environment
    /// overrides are applied last.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        let mut profile = match explicit {
            Some(path) => Self::load(&cwd.join(path))?,
            None => {
                let candidate = cwd.join(DEFAULT_PROFILE_FILE);
                if candidate.is_file() {
                    Self::load(&candidate)?
                } else {
                    debug!("no {DEFAULT_PROFILE_FILE} in {}, using defaults", cwd.display());
                    Self::default().with_base_dir(cwd)
                }
            }
        };
        profile.apply_env_overrides();
        profile.validate()?;
        Ok(profile)
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(raw) = env::var(TOOL_ENV) {
            let command: Vec<String> = raw.split_whitespace().map(str::to_string).collect();
            if !command.is_empty() {
                debug!("{TOOL_ENV} overrides tool command: {raw}");
                self.tool.command = command;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.tool.command.is_empty() {
            bail!("tool.command must name the rasterizer");
        }
        if self.device.flash_bytes == 0 || self.device.ram_bytes == 0 {
            bail!("device {} must have nonzero flash and RAM capacity", self.device.name);
        }

        let mut seen_paths = HashSet::new();
        let mut seen_sizes = HashSet::new();
        for out in &self.outputs {
            if !seen_paths.insert(&out.path) {
                bail!("output path {} is used by more than one size", out.path.display());
            }
            if !seen_sizes.insert(out.size) {
                bail!("size {}px is configured more than once", out.size);
            }
        }
        Ok(())
    }

    /// Requests for the given sizes, or every configured size when `sizes` is empty.
    pub fn requests(&self, sizes: &[u32]) -> Result<Vec<RasterizationRequest>> {
        let selected: Vec<&OutputSpec> = if sizes.is_empty() {
            self.outputs.iter().collect()
        } else {
            sizes
                .iter()
                .map(|size| {
                    self.outputs
                        .iter()
                        .find(|o| o.size.get() == *size)
                        .ok_or_else(|| anyhow!("no output configured for {size}px"))
                })
                .collect::<Result<_>>()?
        };

        Ok(selected
            .into_iter()
            .map(|out| RasterizationRequest {
                font: self.font.source.clone(),
                size: out.size,
                bpp: self.font.bpp,
                format: self.font.format,
                compress: self.font.compress,
                output: out.path.clone(),
                range: self.font.range.clone(),
            })
            .collect())
    }

    /// Glyph tables keyed `<size>px`, plus the declaration header when configured.
    pub fn artifacts(&self) -> Vec<ExpectedArtifact> {
        let mut artifacts: Vec<ExpectedArtifact> = self
            .outputs
            .iter()
            .map(|o| ExpectedArtifact::new(format!("{}px", o.size), &o.path))
            .collect();
        if let Some(header) = &self.header {
            artifacts.push(ExpectedArtifact::new("header", &header.path));
        }
        artifacts
    }
}
