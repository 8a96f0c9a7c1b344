//! Does the source font actually contain the requested glyphs?

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use skrifa::string::StringId;
use skrifa::{FontRef, MetadataProvider};

use crate::range::CharacterRangeSpec;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageReport {
    pub family: Option<String>,
    pub requested: usize,
    pub missing: Vec<char>,
}

impl CoverageReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Check the font's character map against every character of `range`.
///
/// Collections are checked through their first face.
pub fn check_coverage(font_path: &Path, range: &CharacterRangeSpec) -> Result<CoverageReport> {
    let data =
        fs::read(font_path).with_context(|| format!("reading font {}", font_path.display()))?;
    let font = FontRef::from_index(&data, 0)
        .map_err(|err| anyhow!("parsing font {}: {err}", font_path.display()))?;

    let charmap = font.charmap();
    let mut requested = range.decode();
    requested.sort_unstable();
    requested.dedup();

    let missing = requested
        .iter()
        .copied()
        .filter(|ch| charmap.map(*ch).is_none())
        .collect();

    let family = font
        .localized_strings(StringId::FAMILY_NAME)
        .english_or_first()
        .map(|name| name.to_string());

    Ok(CoverageReport {
        family,
        requested: requested.len(),
        missing,
    })
}
