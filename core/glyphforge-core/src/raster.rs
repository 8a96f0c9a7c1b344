//! Driving the external glyph rasterizer (`lv_font_conv`)

use std::fmt;
use std::fs;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::probe;
use crate::process::{ToolCommand, ToolRun, ToolRunner};
use crate::range::CharacterRangeSpec;

/// Bits per pixel the rasterizer can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct BitDepth(u8);

impl BitDepth {
    pub const SUPPORTED: [u8; 5] = [1, 2, 3, 4, 8];

    pub fn new(bits: u8) -> Option<Self> {
        Self::SUPPORTED.contains(&bits).then_some(Self(bits))
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl Default for BitDepth {
    fn default() -> Self {
        Self(4)
    }
}

impl TryFrom<u8> for BitDepth {
    type Error = String;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        Self::new(bits).ok_or_else(|| {
            format!(
                "unsupported bit depth {bits} (expected one of {:?})",
                Self::SUPPORTED
            )
        })
    }
}

impl From<BitDepth> for u8 {
    fn from(depth: BitDepth) -> u8 {
        depth.0
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Output encodings understood by the rasterizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Lvgl,
    Bin,
    Dump,
}

impl OutputFormat {
    pub fn tag(self) -> &'static str {
        match self {
            OutputFormat::Lvgl => "lvgl",
            OutputFormat::Bin => "bin",
            OutputFormat::Dump => "dump",
        }
    }
}

/// One font size to generate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RasterizationRequest {
    pub font: PathBuf,
    pub size: NonZeroU32,
    pub bpp: BitDepth,
    pub format: OutputFormat,
    pub compress: bool,
    pub output: PathBuf,
    pub range: CharacterRangeSpec,
}

/// How a single request ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RasterizationOutcome {
    Success { output: PathBuf, size_bytes: u64 },
    MissingInput { path: PathBuf },
    ToolError { diagnostic: String },
    Timeout { seconds: u64 },
    ExecutionError { cause: String },
}

impl RasterizationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RasterizationOutcome::Success { .. })
    }
}

impl fmt::Display for RasterizationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RasterizationOutcome::Success { output, size_bytes } => write!(
                f,
                "generated {} ({:.1} KB)",
                output.display(),
                *size_bytes as f64 / 1024.0
            ),
            RasterizationOutcome::MissingInput { path } => {
                write!(f, "font source not found: {}", path.display())
            }
            RasterizationOutcome::ToolError { diagnostic } => {
                write!(f, "rasterizer failed: {}", diagnostic.trim())
            }
            RasterizationOutcome::Timeout { seconds } => {
                write!(f, "rasterizer timed out after {seconds}s")
            }
            RasterizationOutcome::ExecutionError { cause } => {
                write!(f, "could not run rasterizer: {cause}")
            }
        }
    }
}

/// Tool command prefix plus the two timeouts the pipeline uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolSettings {
    pub command: Vec<String>,
    pub probe_args: Vec<String>,
    pub timeout_secs: u64,
    pub probe_timeout_secs: u64,
}

impl ToolSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            command: vec!["npx".to_string(), "lv_font_conv".to_string()],
            probe_args: vec!["--help".to_string()],
            timeout_secs: 60,
            probe_timeout_secs: 10,
        }
    }
}

/// Turns requests into tool invocations rooted at a base directory.
#[derive(Debug, Clone)]
pub struct Rasterizer<R> {
    runner: R,
    tool: ToolSettings,
    base_dir: PathBuf,
}

impl<R: ToolRunner> Rasterizer<R> {
    pub fn new(runner: R, tool: ToolSettings, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            tool,
            base_dir: base_dir.into(),
        }
    }

    pub fn tool(&self) -> &ToolSettings {
        &self.tool
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Check that the configured tool answers within the probe timeout.
    pub fn probe(&self) -> bool {
        probe::probe(
            &self.runner,
            &self.tool.command,
            &self.tool.probe_args,
            self.tool.probe_timeout(),
        )
    }

    /// The exact command line `invoke` would run, or `None` for an empty tool prefix.
    pub fn command_for(&self, request: &RasterizationRequest) -> Option<ToolCommand> {
        let font = self.base_dir.join(&request.font);
        let output = self.base_dir.join(&request.output);

        let mut args = vec![
            "--font".to_string(),
            font.display().to_string(),
            "--size".to_string(),
            request.size.to_string(),
            "--bpp".to_string(),
            request.bpp.to_string(),
            "--format".to_string(),
            request.format.tag().to_string(),
        ];
        if !request.compress {
            args.push("--no-compress".to_string());
        }
        args.extend([
            "--output".to_string(),
            output.display().to_string(),
            "--range".to_string(),
            request.range.to_string(),
        ]);

        ToolCommand::from_prefix(&self.tool.command, args).map(|cmd| cmd.in_dir(&self.base_dir))
    }

    /// Run the rasterizer once for `request`. Never retries.
    pub fn invoke(&self, request: &RasterizationRequest, timeout: Duration) -> RasterizationOutcome {
        let font = self.base_dir.join(&request.font);
        if !font.is_file() {
            warn!("font source missing: {}", font.display());
            return RasterizationOutcome::MissingInput { path: font };
        }

        let Some(command) = self.command_for(request) else {
            return RasterizationOutcome::ExecutionError {
                cause: "no rasterizer command configured".to_string(),
            };
        };

        info!("generating {}px font -> {}", request.size, request.output.display());
        debug!("command: {}", command.display_line());

        let output = self.base_dir.join(&request.output);
        let outcome = match self.runner.run(&command, timeout) {
            ToolRun::Completed { success: true, .. } => match fs::metadata(&output) {
                Ok(meta) if meta.is_file() => RasterizationOutcome::Success {
                    output,
                    size_bytes: meta.len(),
                },
                _ => RasterizationOutcome::ToolError {
                    diagnostic: format!(
                        "tool completed without writing {}",
                        output.display()
                    ),
                },
            },
            ToolRun::Completed {
                code,
                stdout,
                stderr,
                ..
            } => RasterizationOutcome::ToolError {
                diagnostic: diagnostic_text(code, &stdout, &stderr),
            },
            ToolRun::TimedOut => RasterizationOutcome::Timeout {
                seconds: timeout.as_secs(),
            },
            ToolRun::SpawnFailed(cause) => RasterizationOutcome::ExecutionError { cause },
        };

        match &outcome {
            RasterizationOutcome::Success { .. } => info!("{}px: {outcome}", request.size),
            _ => warn!("{}px: {outcome}", request.size),
        }
        outcome
    }
}

fn diagnostic_text(code: Option<i32>, stdout: &str, stderr: &str) -> String {
    let text = if stderr.trim().is_empty() {
        stdout.trim()
    } else {
        stderr.trim()
    };
    match (code, text.is_empty()) {
        (Some(code), true) => format!("exit status {code}"),
        (None, true) => "terminated by signal".to_string(),
        (_, false) => text.to_string(),
    }
}
