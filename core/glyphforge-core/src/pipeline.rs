//! Probe → generate → inspect → assess

use std::fmt;
use std::path::PathBuf;

use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::budget::{assess, BudgetAssessment};
use crate::inspect::{inspect, ArtifactReport};
use crate::probe::INSTALL_HINT;
use crate::process::ToolRunner;
use crate::profile::Profile;
use crate::raster::{RasterizationOutcome, RasterizationRequest, Rasterizer};

/// The rasterizer did not answer the probe, so no size can be generated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("rasterizer `{command}` is not available; {hint}")]
pub struct ToolUnavailable {
    pub command: String,
    pub hint: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeResult {
    pub size: u32,
    pub output: PathBuf,
    pub outcome: RasterizationOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub results: Vec<SizeResult>,
}

impl BatchSummary {
    pub fn attempted(&self) -> usize {
        self.results.len()
    }

    pub fn succeeded(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome.is_success())
            .count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.succeeded() == self.attempted()
    }

    pub fn failures(&self) -> impl Iterator<Item = &SizeResult> {
        self.results.iter().filter(|r| !r.outcome.is_success())
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} succeeded", self.succeeded(), self.attempted())
    }
}

/// Probe once, then run every request in order.
///
/// A failing size never stops the ones after it.
pub fn run_batch<R: ToolRunner>(
    rasterizer: &Rasterizer<R>,
    requests: &[RasterizationRequest],
) -> Result<BatchSummary, ToolUnavailable> {
    if !rasterizer.probe() {
        return Err(ToolUnavailable {
            command: rasterizer.tool().command_line(),
            hint: INSTALL_HINT,
        });
    }

    let timeout = rasterizer.tool().timeout();
    let results: Vec<SizeResult> = requests
        .iter()
        .map(|request| SizeResult {
            size: request.size.get(),
            output: request.output.clone(),
            outcome: rasterizer.invoke(request, timeout),
        })
        .collect();

    let summary = BatchSummary { results };
    if summary.all_succeeded() {
        info!("{summary}");
    } else {
        warn!("{summary}");
    }
    Ok(summary)
}

/// Inspection plus budget assessment over a profile's artifacts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verification {
    pub artifacts: ArtifactReport,
    pub budget: BudgetAssessment,
}

/// Only glyph tables count against flash; the header is inspected but not summed.
pub fn verify(profile: &Profile) -> Verification {
    let artifacts = inspect(&profile.artifacts(), profile.base_dir());
    let mut sizes = artifacts.sizes();
    sizes.remove("header");
    let budget = assess(&sizes, &profile.device);
    Verification { artifacts, budget }
}
