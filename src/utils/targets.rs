//! Metric Targets and Plausibility Ranges
//!
//! Farm-level configuration for scoring and aggregation. Every field has a
//! built-in default so a partial JSON file only overrides what it names.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Open plausibility interval `(min, max)` for a per-animal metric
///
/// Values on or outside the bounds are treated as recording noise and
/// dropped before herd averaging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidRange {
    pub min: f64,
    pub max: f64,
}

impl ValidRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Strict containment: both bounds are excluded
    pub fn contains(&self, value: f64) -> bool {
        value > self.min && value < self.max
    }
}

/// Target value per KPI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Targets {
    pub dlwg_kg_per_day: f64,
    pub adg_kg_per_day: f64,
    pub wgm: f64,
    pub fcr: f64,
    pub calf_adg_kg_per_day: f64,
    pub conception_rate_pct: f64,
    pub in_calf_42_day_pct: f64,
    pub in_calf_100_day_pct: f64,
    pub calving_interval_days: f64,
    pub calf_crop_pct: f64,
    pub weaning_rate_pct: f64,
    pub mortality_pct: f64,
}

impl Default for Targets {
    fn default() -> Self {
        Self {
            dlwg_kg_per_day: 0.8,
            adg_kg_per_day: 0.9,
            wgm: 1.0,
            fcr: 6.0,
            calf_adg_kg_per_day: 0.9,
            conception_rate_pct: 65.0,
            in_calf_42_day_pct: 60.0,
            in_calf_100_day_pct: 85.0,
            calving_interval_days: 365.0,
            calf_crop_pct: 90.0,
            weaning_rate_pct: 90.0,
            mortality_pct: 2.0,
        }
    }
}

/// Plausibility range per aggregated metric
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidRanges {
    pub dlwg: ValidRange,
    pub adg: ValidRange,
    pub wgm: ValidRange,
    pub fcr: ValidRange,
}

impl Default for ValidRanges {
    fn default() -> Self {
        Self {
            dlwg: ValidRange::new(0.0, 3.0),
            adg: ValidRange::new(0.0, 5.0),
            wgm: ValidRange::new(0.0, 10.0),
            fcr: ValidRange::new(0.0, 50.0),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub targets: Targets,
    pub ranges: ValidRanges,
    /// Per-head daily gain assumed when no animal has usable weighings
    pub default_daily_gain_kg: f64,
    /// Placeholder interval when fewer than two calvings are on record
    pub default_calving_interval_days: f64,
    pub in_calf_short_window_days: i64,
    pub in_calf_long_window_days: i64,
    /// Females younger than this are not counted as breeding females
    pub min_breeding_age_months: u32,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            targets: Targets::default(),
            ranges: ValidRanges::default(),
            default_daily_gain_kg: 0.5,
            default_calving_interval_days: 365.0,
            in_calf_short_window_days: 42,
            in_calf_long_window_days: 100,
            min_breeding_age_months: 15,
        }
    }
}

impl MetricsConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read metrics config: {:?}", path))?;

        Self::from_json(&contents)
    }

    /// Parse and validate configuration JSON
    pub fn from_json(contents: &str) -> Result<Self> {
        let config: MetricsConfig = serde_json::from_str(contents)
            .with_context(|| "Failed to parse metrics config JSON")?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let ranges = [
            ("dlwg", &self.ranges.dlwg),
            ("adg", &self.ranges.adg),
            ("wgm", &self.ranges.wgm),
            ("fcr", &self.ranges.fcr),
        ];
        for (name, range) in ranges {
            if range.min >= range.max || range.min.is_nan() || range.max.is_nan() {
                anyhow::bail!(
                    "Invalid range for '{}': min {} must be below max {}",
                    name,
                    range.min,
                    range.max
                );
            }
        }

        if self.in_calf_short_window_days <= 0 || self.in_calf_long_window_days <= 0 {
            anyhow::bail!("In-calf windows must be positive day counts");
        }
        if self.default_daily_gain_kg < 0.0 {
            anyhow::bail!("default_daily_gain_kg cannot be negative");
        }

        Ok(())
    }
}
