//! Flash/RAM footprint estimates against a target device

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Static capacities of a target board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceBudget {
    pub name: String,
    pub flash_bytes: u64,
    pub ram_bytes: u64,
    /// Fixed heap the UI framework reserves at runtime.
    #[serde(default)]
    pub ui_pool_bytes: u64,
}

impl DeviceBudget {
    /// ESP32-S3 module with 2 MiB flash and 320 KiB usable RAM.
    pub fn esp32_s3() -> Self {
        Self {
            name: "esp32-s3".to_string(),
            flash_bytes: 2 * 1024 * 1024,
            ram_bytes: 320 * 1024,
            ui_pool_bytes: 32 * 1024,
        }
    }

    /// Look up a built-in preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "esp32-s3" | "esp32s3" => Some(Self::esp32_s3()),
            _ => None,
        }
    }
}

impl Default for DeviceBudget {
    fn default() -> Self {
        Self::esp32_s3()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetAssessment {
    pub device: String,
    pub total_artifact_bytes: u64,
    pub flash_bytes: u64,
    pub flash_occupancy_percent: f64,
    pub ram_note: String,
}

impl BudgetAssessment {
    /// Informational only; nothing in the pipeline gates on it.
    pub fn exceeds_flash(&self) -> bool {
        self.total_artifact_bytes > self.flash_bytes
    }

    pub fn total_kib(&self) -> f64 {
        self.total_artifact_bytes as f64 / 1024.0
    }
}

impl fmt::Display for BudgetAssessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "total: {} bytes ({:.1} KB)",
            self.total_artifact_bytes,
            self.total_kib()
        )?;
        writeln!(
            f,
            "{} flash: {:.2}% ({}/{} bytes)",
            self.device, self.flash_occupancy_percent, self.total_artifact_bytes, self.flash_bytes
        )?;
        write!(f, "{} RAM: {}", self.device, self.ram_note)
    }
}

/// Sum the artifact sizes and relate them to the device's flash.
///
/// Missing artifacts count as zero bytes.
pub fn assess(sizes: &BTreeMap<String, Option<u64>>, budget: &DeviceBudget) -> BudgetAssessment {
    let total: u64 = sizes.values().map(|size| size.unwrap_or(0)).sum();
    let flash_occupancy_percent = if budget.flash_bytes == 0 {
        f64::INFINITY
    } else {
        total as f64 / budget.flash_bytes as f64 * 100.0
    };

    let ram_note = format!(
        "UI framework needs an extra {} KB memory pool ({} KB RAM available); glyph tables stay in flash",
        budget.ui_pool_bytes / 1024,
        budget.ram_bytes / 1024
    );

    BudgetAssessment {
        device: budget.name.clone(),
        total_artifact_bytes: total,
        flash_bytes: budget.flash_bytes,
        flash_occupancy_percent,
        ram_note,
    }
}
