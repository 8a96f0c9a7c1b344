#![cfg(unix)]

use std::fs;
use std::path::Path;

use tempfile::tempdir;

use glyphforge_core::pipeline::{run_batch, verify};
use glyphforge_core::process::ProcessRunner;
use glyphforge_core::profile::Profile;
use glyphforge_core::raster::{RasterizationOutcome, Rasterizer};

/// Stands in for `lv_font_conv`: answers `--help`, and writes a glyph table
/// of `size * 64` bytes to `--output`.
const FAKE_RASTERIZER: &str = r#"#!/bin/sh
out=""
size=0
while [ $# -gt 0 ]; do
  case "$1" in
    --help) echo "usage: fake"; exit 0 ;;
    --output) out="$2"; shift ;;
    --size) size="$2"; shift ;;
  esac
  shift
done
[ -n "$out" ] || { echo "no output" >&2; exit 1; }
name=$(basename "$out" .c)
printf 'const lv_font_t %s = {\n' "$name" > "$out"
head -c $((size * 64)) /dev/zero | tr '\0' 'x' >> "$out"
"#;

fn write_fake_tool(dir: &Path) -> String {
    let script = dir.join("fake_lv_font_conv.sh");
    fs::write(&script, FAKE_RASTERIZER).expect("write fake tool");
    script.display().to_string()
}

fn profile_in(dir: &Path, tool: &str) -> Profile {
    let text = format!(
        r#"
[tool]
command = ["sh", "{tool}"]
timeout_secs = 30

[font]
source = "zpix.ttf"

[[outputs]]
size = 20
path = "src/fonts/lv_font_zpix_20.c"

[[outputs]]
size = 60
path = "src/fonts/lv_font_zpix_60.c"
"#
    );
    Profile::from_toml_str(&text, dir).expect("profile")
}

#[test]
fn generates_inspects_and_assesses_two_sizes() {
    let tmp = tempdir().expect("tempdir");
    let tool = write_fake_tool(tmp.path());
    fs::write(tmp.path().join("zpix.ttf"), b"font").expect("font");
    fs::create_dir_all(tmp.path().join("src/fonts")).expect("mkdir");

    let profile = profile_in(tmp.path(), &tool);
    let rasterizer = Rasterizer::new(ProcessRunner, profile.tool.clone(), profile.base_dir());
    let requests = profile.requests(&[20, 60]).expect("requests");

    let summary = run_batch(&rasterizer, &requests).expect("fake tool is available");
    assert_eq!(summary.to_string(), "2 of 2 succeeded");
    for result in &summary.results {
        assert!(
            matches!(result.outcome, RasterizationOutcome::Success { size_bytes, .. } if size_bytes > 0),
            "{}px: {:?}",
            result.size,
            result.outcome
        );
    }

    let verification = verify(&profile);
    let small = verification.artifacts.get("20px").expect("20px entry");
    let large = verification.artifacts.get("60px").expect("60px entry");
    assert!(small.exists && large.exists);
    assert!(large.size_bytes > small.size_bytes);
    assert_eq!(small.symbol.as_deref(), Some("lv_font_zpix_20"));

    let header = verification.artifacts.get("header").expect("header entry");
    assert!(!header.exists, "header is not generated by the rasterizer");

    let pct = verification.budget.flash_occupancy_percent;
    assert!(pct > 0.0 && pct < 100.0, "occupancy {pct}");
}

#[test]
fn missing_font_fails_each_size_independently() {
    let tmp = tempdir().expect("tempdir");
    let tool = write_fake_tool(tmp.path());

    let profile = profile_in(tmp.path(), &tool);
    let rasterizer = Rasterizer::new(ProcessRunner, profile.tool.clone(), profile.base_dir());
    let summary = run_batch(&rasterizer, &profile.requests(&[]).expect("requests"))
        .expect("fake tool is available");

    assert_eq!(summary.succeeded(), 0);
    assert_eq!(summary.failures().count(), 2);
    assert!(summary
        .results
        .iter()
        .all(|r| matches!(r.outcome, RasterizationOutcome::MissingInput { .. })));
}

#[test]
fn missing_output_directory_is_a_tool_error() {
    let tmp = tempdir().expect("tempdir");
    let tool = write_fake_tool(tmp.path());
    fs::write(tmp.path().join("zpix.ttf"), b"font").expect("font");

    let profile = profile_in(tmp.path(), &tool);
    let rasterizer = Rasterizer::new(ProcessRunner, profile.tool.clone(), profile.base_dir());
    let summary = run_batch(&rasterizer, &profile.requests(&[20]).expect("requests"))
        .expect("fake tool is available");

    assert!(matches!(
        summary.results[0].outcome,
        RasterizationOutcome::ToolError { .. }
    ));
}

#[test]
fn unavailable_tool_aborts_batch() {
    let tmp = tempdir().expect("tempdir");
    let mut profile = Profile::default().with_base_dir(tmp.path());
    profile.tool.command = vec!["glyphforge-no-such-rasterizer".to_string()];

    let rasterizer = Rasterizer::new(ProcessRunner, profile.tool.clone(), profile.base_dir());
    let err = run_batch(&rasterizer, &profile.requests(&[]).expect("requests")).unwrap_err();
    assert!(err.command.contains("glyphforge-no-such-rasterizer"));
}

