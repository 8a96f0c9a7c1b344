//! glyphforge CLI

use std::env;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};
use log::{info, warn};
use serde::Serialize;

use glyphforge_core::header::profile_header;
use glyphforge_core::inspect::ArtifactReport;
use glyphforge_core::output::{write_json_pretty, write_ndjson};
use glyphforge_core::pipeline::{run_batch, verify, BatchSummary, ToolUnavailable, Verification};
use glyphforge_core::platform::build_dir_overrides;
use glyphforge_core::probe::INSTALL_HINT;
use glyphforge_core::process::ProcessRunner;
use glyphforge_core::profile::Profile;
use glyphforge_core::range::CharacterRangeSpec;
use glyphforge_core::raster::Rasterizer;

/// CLI entrypoint for glyphforge.
#[derive(Debug, Parser)]
#[command(
    name = "glyphforge",
    version,
    about = "Generate LVGL glyph tables with lv_font_conv and check their flash footprint"
)]
pub struct Cli {
    /// Profile file (default: ./glyphforge.toml, else built-in defaults)
    #[arg(long = "profile", global = true, value_hint = ValueHint::FilePath)]
    profile: Option<PathBuf>,

    /// Root for relative profile paths (overrides the profile's base_dir)
    #[arg(long = "base-dir", global = true, value_hint = ValueHint::DirPath)]
    base_dir: Option<PathBuf>,

    /// Control colorized output (auto|always|never)
    #[arg(long = "color", global = true, default_value_t = ColorChoice::Auto, value_enum)]
    color: ColorChoice,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check that the rasterizer can be started
    Probe,
    /// Decode a character range expression (default: the profile's range)
    Range(RangeArgs),
    /// Generate glyph tables, then report artifacts and flash budget
    Generate(GenerateArgs),
    /// Report existence and size of the expected artifacts
    Inspect(InspectArgs),
    /// Estimate flash/RAM footprint of the current artifacts
    Budget(JsonArgs),
    /// Check that the source font has a glyph for every requested character
    #[cfg(feature = "fontations")]
    Coverage(JsonArgs),
    /// Render the C header declaring the generated fonts
    Header(HeaderArgs),
    /// Print BUILD_DIR/CORE_DIR overrides for this host
    BuildEnv(BuildEnvArgs),
}

#[derive(Debug, Args)]
struct RangeArgs {
    /// Range expression such as 0x30-0x39,0x2B
    expr: Option<String>,

    /// Emit JSON
    #[arg(long = "json", action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Debug, Args)]
struct GenerateArgs {
    /// Only generate these point sizes (must be configured in the profile)
    #[arg(long = "sizes", value_delimiter = ',')]
    sizes: Vec<u32>,

    /// Emit JSON
    #[arg(long = "json", action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Debug, Args)]
struct InspectArgs {
    /// Emit a single JSON array
    #[arg(long = "json", action = ArgAction::SetTrue, conflicts_with = "ndjson")]
    json: bool,

    /// Emit newline-delimited JSON
    #[arg(long = "ndjson", action = ArgAction::SetTrue)]
    ndjson: bool,
}

#[derive(Debug, Args)]
struct JsonArgs {
    /// Emit JSON
    #[arg(long = "json", action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Debug, Args)]
struct HeaderArgs {
    /// Write the header to its configured path instead of stdout
    #[arg(long = "write", action = ArgAction::SetTrue)]
    write: bool,
}

#[derive(Debug, Args)]
struct BuildEnvArgs {
    /// Host OS to evaluate (default: the current host)
    #[arg(long = "os")]
    os: Option<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

/// Parse CLI args and execute the selected command.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => handle.is_terminal(),
    };
    execute(cli, &mut handle, color)
}

fn execute(cli: Cli, mut w: impl Write, color: bool) -> Result<()> {
    let profile = load_profile(&cli)?;

    match cli.command {
        Command::Probe => run_probe(&profile, &mut w),
        Command::Range(args) => run_range(&args, &profile, &mut w),
        Command::Generate(args) => run_generate(&args, &profile, &mut w, color),
        Command::Inspect(args) => run_inspect(&args, &profile, &mut w, color),
        Command::Budget(args) => run_budget(&args, &profile, &mut w),
        #[cfg(feature = "fontations")]
        Command::Coverage(args) => run_coverage(&args, &profile, &mut w),
        Command::Header(args) => run_header(&args, &profile, &mut w),
        Command::BuildEnv(args) => run_build_env(&args, &profile, &mut w),
    }
}

fn load_profile(cli: &Cli) -> Result<Profile> {
    let cwd = env::current_dir().context("resolving working directory")?;
    let profile = Profile::discover(cli.profile.as_deref(), &cwd)?;
    Ok(match &cli.base_dir {
        Some(dir) => profile.with_base_dir(cwd.join(dir)),
        None => profile,
    })
}

fn rasterizer(profile: &Profile) -> Rasterizer<ProcessRunner> {
    Rasterizer::new(ProcessRunner, profile.tool.clone(), profile.base_dir())
}

fn run_probe(profile: &Profile, mut w: impl Write) -> Result<()> {
    if rasterizer(profile).probe() {
        writeln!(w, "{} is available", profile.tool.command_line())?;
        Ok(())
    } else {
        Err(ToolUnavailable {
            command: profile.tool.command_line(),
            hint: INSTALL_HINT,
        }
        .into())
    }
}

#[derive(Debug, Serialize)]
struct RangeSummary {
    expression: String,
    chars: String,
    count: usize,
}

fn summarize_range(expr: Option<&str>, profile: &Profile) -> Result<RangeSummary> {
    let spec = match expr {
        Some(raw) => {
            CharacterRangeSpec::parse(raw).with_context(|| format!("invalid range {raw:?}"))?
        }
        None => profile.font.range.clone(),
    };
    Ok(RangeSummary {
        expression: spec.to_string(),
        chars: spec.decode().into_iter().collect(),
        count: spec.len(),
    })
}

fn run_range(args: &RangeArgs, profile: &Profile, mut w: impl Write) -> Result<()> {
    let summary = summarize_range(args.expr.as_deref(), profile)?;
    if args.json {
        return write_json_pretty(&summary, w);
    }
    writeln!(w, "range: {}", summary.expression)?;
    writeln!(w, "chars: {}", summary.chars)?;
    writeln!(w, "count: {}", summary.count)?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct GenerateReport<'a> {
    summary: &'a BatchSummary,
    verification: &'a Verification,
}

fn run_generate(args: &GenerateArgs, profile: &Profile, mut w: impl Write, color: bool) -> Result<()> {
    let requests = profile.requests(&args.sizes)?;
    let summary = run_batch(&rasterizer(profile), &requests)?;
    let verification = verify(profile);

    if args.json {
        write_json_pretty(
            &GenerateReport {
                summary: &summary,
                verification: &verification,
            },
            &mut w,
        )?;
    } else {
        write_batch(&summary, &mut w, color)?;
        writeln!(w)?;
        write_artifacts(&verification.artifacts, &mut w, color)?;
        writeln!(w)?;
        writeln!(w, "{}", verification.budget)?;
    }

    if !summary.all_succeeded() {
        bail!("{summary}");
    }
    Ok(())
}

fn run_inspect(args: &InspectArgs, profile: &Profile, mut w: impl Write, color: bool) -> Result<()> {
    let report = verify(profile).artifacts;
    if args.ndjson {
        write_ndjson(&report.entries, &mut w)
    } else if args.json {
        write_json_pretty(&report.entries, &mut w)
    } else {
        write_artifacts(&report, &mut w, color)
    }
}

fn run_budget(args: &JsonArgs, profile: &Profile, mut w: impl Write) -> Result<()> {
    let verification = verify(profile);
    let missing: Vec<&str> = verification
        .artifacts
        .entries
        .iter()
        .filter(|e| !e.exists && e.name != "header")
        .map(|e| e.name.as_str())
        .collect();
    if !missing.is_empty() {
        warn!("not generated yet (counted as 0 bytes): {}", missing.join(", "));
    }

    if args.json {
        write_json_pretty(&verification.budget, w)
    } else {
        writeln!(w, "{}", verification.budget)?;
        Ok(())
    }
}

#[cfg(feature = "fontations")]
fn run_coverage(args: &JsonArgs, profile: &Profile, mut w: impl Write) -> Result<()> {
    use glyphforge_core::coverage::check_coverage;

    let font = profile.base_dir().join(&profile.font.source);
    let report = check_coverage(&font, &profile.font.range)?;
    if !report.is_complete() {
        warn!(
            "{} of {} characters have no glyph in {}",
            report.missing.len(),
            report.requested,
            font.display()
        );
    }

    if args.json {
        return write_json_pretty(&report, w);
    }
    writeln!(
        w,
        "font: {} ({})",
        font.display(),
        report.family.as_deref().unwrap_or("(unnamed)")
    )?;
    writeln!(w, "requested: {}", report.requested)?;
    if report.is_complete() {
        writeln!(w, "missing: none")?;
    } else {
        for ch in &report.missing {
            writeln!(w, "missing: U+{:04X} {ch:?}", *ch as u32)?;
        }
    }
    Ok(())
}

fn run_header(args: &HeaderArgs, profile: &Profile, mut w: impl Write) -> Result<()> {
    let (path, text) =
        profile_header(profile).ok_or_else(|| anyhow!("profile has no [header] section"))?;
    if args.write {
        fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
        info!("wrote {}", path.display());
    } else {
        w.write_all(text.as_bytes())?;
    }
    Ok(())
}

fn run_build_env(args: &BuildEnvArgs, profile: &Profile, mut w: impl Write) -> Result<()> {
    let os = args.os.as_deref().unwrap_or(env::consts::OS);
    match build_dir_overrides(os, &profile.platform) {
        Some(dirs) => {
            info!("detected {os}: overriding BUILD_DIR and CORE_DIR");
            for (key, value) in dirs.env_pairs() {
                writeln!(w, "{key}={value}")?;
            }
        }
        None => info!("detected {os}: using default build/core dirs"),
    }
    Ok(())
}

fn write_batch(summary: &BatchSummary, mut w: impl Write, color: bool) -> Result<()> {
    for result in &summary.results {
        let (status, tint) = if result.outcome.is_success() {
            ("ok", AnsiColor::Green)
        } else {
            ("FAILED", AnsiColor::Red)
        };
        let size = format!("{:>4}px", result.size);
        let status = apply_color(&format!("{status:<6}"), color, tint);
        writeln!(w, "{size}  {status}  {}", result.outcome)?;
    }
    writeln!(w, "{summary}")?;
    Ok(())
}

fn write_artifacts(report: &ArtifactReport, mut w: impl Write, color: bool) -> Result<()> {
    let name_width = report
        .entries
        .iter()
        .map(|e| e.name.len())
        .max()
        .unwrap_or(0)
        .clamp(0, 40);

    for entry in &report.entries {
        let padded_name = format!("{:<name_width$}", entry.name);
        let (status, tint) = if entry.exists {
            ("present", AnsiColor::Green)
        } else {
            ("missing", AnsiColor::Yellow)
        };
        let size = entry
            .size_bytes
            .map(|bytes| format!("{bytes} bytes"))
            .unwrap_or_else(|| "-".to_string());
        let symbol = entry
            .symbol
            .as_deref()
            .map(|s| format!("  [{s}]"))
            .unwrap_or_default();

        writeln!(
            w,
            "{}  {}  {:>14}  {}{}",
            apply_color(&padded_name, color, AnsiColor::Cyan),
            apply_color(status, color, tint),
            size,
            entry.path.display(),
            symbol
        )?;
    }
    Ok(())
}

#[derive(Copy, Clone)]
enum AnsiColor {
    Cyan,
    Yellow,
    Green,
    Red,
}

fn apply_color(text: &str, color: bool, code: AnsiColor) -> String {
    if !color {
        return text.to_string();
    }

    let code_str = match code {
        AnsiColor::Cyan => "36",
        AnsiColor::Yellow => "33",
        AnsiColor::Green => "32",
        AnsiColor::Red => "31",
    };

    format!("\u{1b}[{}m{}\u{1b}[0m", code_str, text)
}

#[cfg(test)]
mod tests;
