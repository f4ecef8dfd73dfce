//! Performance Scoring
//!
//! Maps a metric value against its target onto a normalized percentage and
//! a three-band rating (good / warning / poor). Used uniformly for every
//! KPI, with a stricter banding for mortality.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Direction, Reading};

/// Percentage at or above which a metric rates `Good`
pub const GOOD_THRESHOLD: f64 = 90.0;
/// Percentage at or above which a metric rates `Warning`
pub const WARNING_THRESHOLD: f64 = 70.0;

/// Mortality above this share of target (%) is `Poor`
pub const MORTALITY_POOR_PCT_OF_TARGET: f64 = 150.0;
/// Mortality above this share of target (%) is `Warning`
pub const MORTALITY_WARNING_PCT_OF_TARGET: f64 = 100.0;

/// Qualitative rating band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Good,
    Warning,
    Poor,
}

impl Band {
    pub fn as_str(&self) -> &'static str {
        match self {
            Band::Good => "good",
            Band::Warning => "warning",
            Band::Poor => "poor",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scored metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    /// Normalized performance (100 = on target). Uncapped above 100.
    pub percentage: f64,
    pub band: Band,
}

/// Convert a percentage to a band
///
/// - [90, ∞) → Good
/// - [70, 90) → Warning
/// - below 70 (or NaN) → Poor
pub fn band_for_percentage(percentage: f64) -> Band {
    if percentage >= GOOD_THRESHOLD {
        Band::Good
    } else if percentage >= WARNING_THRESHOLD {
        Band::Warning
    } else {
        Band::Poor
    }
}

/// Score a value against its target
///
/// Higher-is-better: `value / target × 100`, uncapped.
///
/// Lower-is-better: `100 − value / target × 100`, floored at 0, with two
/// special cases checked in order:
/// 1. `value == 0` → 100 (nothing consumed, nothing lost)
/// 2. `target == 0` → 0 (a zero target can never be met)
///
/// A zero target under higher-is-better also scores 0.
pub fn score(value: f64, target: f64, direction: Direction) -> Score {
    let percentage = match direction {
        Direction::HigherIsBetter => {
            if target == 0.0 {
                0.0
            } else {
                value / target * 100.0
            }
        }
        Direction::LowerIsBetter => {
            if value == 0.0 {
                100.0
            } else if target == 0.0 {
                0.0
            } else {
                (100.0 - value / target * 100.0).max(0.0)
            }
        }
    };

    Score {
        percentage,
        band: band_for_percentage(percentage),
    }
}

/// Score a calculator result; `Insufficient` readings are not scored
pub fn score_reading(reading: &Reading, target: f64, direction: Direction) -> Option<Score> {
    reading.value().map(|value| score(value, target, direction))
}

/// Score a mortality rate against its target
///
/// Mortality tolerance is stricter than the generic bands: the returned
/// percentage is the rate as a share of target, and
/// - above 150 % of target → Poor
/// - above 100 % of target → Warning
/// - otherwise → Good
///
/// With a zero target any death at all is Poor, with the percentage
/// saturated at `f64::MAX` so it stays a finite JSON number.
pub fn score_mortality(rate: f64, target: f64) -> Score {
    if target <= 0.0 {
        let band = if rate > 0.0 { Band::Poor } else { Band::Good };
        let percentage = if rate > 0.0 { f64::MAX } else { 0.0 };
        return Score { percentage, band };
    }

    let percentage = rate / target * 100.0;
    let band = if percentage > MORTALITY_POOR_PCT_OF_TARGET {
        Band::Poor
    } else if percentage > MORTALITY_WARNING_PCT_OF_TARGET {
        Band::Warning
    } else {
        Band::Good
    };

    Score { percentage, band }
}
