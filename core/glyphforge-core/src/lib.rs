//! glyphforge-core: LVGL font asset generation and flash budget checks
//!
//! Firmware with a small display ships its fonts as C glyph tables produced
//! by an external rasterizer (`lv_font_conv`). This crate wraps that step in
//! a reproducible pipeline:
//!
//! - [`range`] parses the hex glyph-selection syntax (`0x30-0x39,0x2B`).
//! - [`probe`] checks that the rasterizer can be started at all.
//! - [`raster`] turns a [`raster::RasterizationRequest`] into one tool run and
//!   classifies what happened.
//! - [`inspect`] reports which expected artifacts exist and how big they are.
//! - [`budget`] relates those sizes to a device's flash and RAM.
//! - [`pipeline`] strings the stages together for a batch of sizes.
//!
//! Everything is driven by a [`profile::Profile`], usually read from
//! `glyphforge.toml`, so the same parameters are used on every machine.
//!
//! ```rust,no_run
//! use glyphforge_core::pipeline::{run_batch, verify};
//! use glyphforge_core::process::ProcessRunner;
//! use glyphforge_core::profile::Profile;
//! use glyphforge_core::raster::Rasterizer;
//!
//! let profile = Profile::discover(None, &std::env::current_dir()?)?;
//! let rasterizer = Rasterizer::new(ProcessRunner, profile.tool.clone(), profile.base_dir());
//! let summary = run_batch(&rasterizer, &profile.requests(&[])?)?;
//! println!("{summary}");
//! println!("{}", verify(&profile).budget);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod budget;
#[cfg(feature = "fontations")]
pub mod coverage;
pub mod header;
pub mod inspect;
pub mod output;
pub mod pipeline;
pub mod platform;
pub mod probe;
pub mod process;
pub mod profile;
pub mod range;
pub mod raster;
