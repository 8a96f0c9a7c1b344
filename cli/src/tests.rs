use super::*;
use clap::CommandFactory;
use std::io::Cursor;
use std::path::Path;
use tempfile::tempdir;

use glyphforge_core::inspect::ArtifactEntry;
use glyphforge_core::pipeline::SizeResult;
use glyphforge_core::raster::RasterizationOutcome;

fn output_of(f: impl FnOnce(&mut Cursor<Vec<u8>>) -> Result<()>) -> String {
    let mut buf = Cursor::new(Vec::new());
    f(&mut buf).expect("command output");
    String::from_utf8(buf.into_inner()).expect("utf8")
}

fn entry(name: &str, size: Option<u64>, symbol: Option<&str>) -> ArtifactEntry {
    ArtifactEntry {
        name: name.to_string(),
        path: PathBuf::from(format!("/fw/{name}.c")),
        exists: size.is_some(),
        size_bytes: size,
        symbol: symbol.map(str::to_string),
    }
}

#[test]
fn parses_generate_sizes_and_global_flags() {
    let cli = Cli::try_parse_from([
        "glyphforge",
        "generate",
        "--sizes",
        "20,60",
        "--profile",
        "fw/glyphforge.toml",
        "--color",
        "never",
    ])
    .expect("parse cli");

    assert_eq!(cli.profile, Some(PathBuf::from("fw/glyphforge.toml")));
    assert_eq!(cli.color, ColorChoice::Never);
    let Command::Generate(args) = cli.command else {
        panic!("expected generate");
    };
    assert_eq!(args.sizes, vec![20, 60]);
    assert!(!args.json);
}

#[test]
fn inspect_json_and_ndjson_conflict() {
    let parse = Cli::try_parse_from(["glyphforge", "inspect", "--json", "--ndjson"]);
    assert!(parse.is_err());
}

#[test]
fn range_defaults_to_profile_expression() {
    let profile = Profile::default();
    let args = RangeArgs {
        expr: None,
        json: false,
    };

    let text = output_of(|w| run_range(&args, &profile, w));
    assert!(text.contains("chars: 0123456789+-*/=.%()"));
    assert!(text.contains("count: 35"));
}

#[test]
fn range_json_reports_explicit_expression() {
    let args = RangeArgs {
        expr: Some("0x30-0x33,0x2B".to_string()),
        json: true,
    };

    let text = output_of(|w| run_range(&args, &Profile::default(), w));
    let parsed: serde_json::Value = serde_json::from_str(&text).expect("json");
    assert_eq!(parsed["chars"], "0123+");
    assert_eq!(parsed["count"], 5);
}

#[test]
fn malformed_range_is_an_error() {
    let args = RangeArgs {
        expr: Some("0x39-0x30".to_string()),
        json: false,
    };
    let mut buf = Cursor::new(Vec::new());
    let err = run_range(&args, &Profile::default(), &mut buf).unwrap_err();
    assert!(format!("{err:#}").contains("0x39-0x30"));
}

#[test]
fn build_env_prints_overrides_only_for_windows() {
    let profile = Profile::default();

    let windows = output_of(|w| {
        run_build_env(
            &BuildEnvArgs {
                os: Some("windows".to_string()),
            },
            &profile,
            w,
        )
    });
    assert_eq!(
        windows,
        "BUILD_DIR=C:\\build\\pawcounter\nCORE_DIR=C:\\platformio\\pawcounter\n"
    );

    let linux = output_of(|w| {
        run_build_env(
            &BuildEnvArgs {
                os: Some("linux".to_string()),
            },
            &profile,
            w,
        )
    });
    assert!(linux.is_empty());
}

#[test]
fn header_is_printed_or_written() {
    let tmp = tempdir().expect("tempdir");
    std::fs::create_dir_all(tmp.path().join("src/fonts")).expect("mkdir");
    let profile = Profile::default().with_base_dir(tmp.path());

    let printed = output_of(|w| run_header(&HeaderArgs { write: false }, &profile, w));
    assert!(printed.contains("extern const lv_font_t lv_font_zpix_20;"));

    let quiet = output_of(|w| run_header(&HeaderArgs { write: true }, &profile, w));
    assert!(quiet.is_empty());
    let written =
        std::fs::read_to_string(tmp.path().join("src/fonts/lv_font_zpix.h")).expect("header");
    assert_eq!(written, printed);
}

#[test]
fn budget_counts_only_glyph_tables() {
    let tmp = tempdir().expect("tempdir");
    let fonts = tmp.path().join("src/fonts");
    std::fs::create_dir_all(&fonts).expect("mkdir");
    std::fs::write(fonts.join("lv_font_zpix_20.c"), vec![b'x'; 1024]).expect("write");
    std::fs::write(fonts.join("lv_font_zpix.h"), vec![b'x'; 4096]).expect("write");
    let profile = Profile::default().with_base_dir(tmp.path());

    let text = output_of(|w| run_budget(&JsonArgs { json: true }, &profile, w));
    let parsed: serde_json::Value = serde_json::from_str(&text).expect("json");
    assert_eq!(parsed["total_artifact_bytes"], 1024);
    assert_eq!(parsed["device"], "esp32-s3");
}

#[test]
fn artifact_columns_align_and_show_symbols() {
    let report = ArtifactReport {
        entries: vec![
            entry("20px", Some(19_456), Some("lv_font_zpix_20")),
            entry("header", None, None),
        ],
    };

    let text = output_of(|w| write_artifacts(&report, w, false));
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].find("present"), lines[1].find("missing"));
    assert!(lines[0].contains("19456 bytes"));
    assert!(lines[0].ends_with("[lv_font_zpix_20]"));
}

#[test]
fn batch_lines_end_with_summary() {
    let summary = BatchSummary {
        results: vec![
            SizeResult {
                size: 20,
                output: PathBuf::from("a.c"),
                outcome: RasterizationOutcome::Success {
                    output: PathBuf::from("/fw/a.c"),
                    size_bytes: 2048,
                },
            },
            SizeResult {
                size: 60,
                output: PathBuf::from("b.c"),
                outcome: RasterizationOutcome::Timeout { seconds: 60 },
            },
        ],
    };

    let text = output_of(|w| write_batch(&summary, w, true));
    assert!(text.contains("\u{1b}[32m"));
    assert!(text.contains("timed out after 60s"));
    assert!(text.trim_end().ends_with("1 of 2 succeeded"));
}

#[test]
fn base_dir_flag_overrides_profile_root() {
    let cli = Cli::try_parse_from(["glyphforge", "--base-dir", "/tmp", "probe"]).expect("parse");
    let profile = load_profile(&cli).expect("profile");
    assert_eq!(profile.base_dir(), Path::new("/tmp"));
}

#[test]
fn help_lists_every_subcommand() {
    let mut root = Cli::command();
    let help = root.render_long_help().to_string();
    for name in ["probe", "range", "generate", "inspect", "budget", "header", "build-env"] {
        assert!(help.contains(name), "help should mention {name}");
    }
}
