//! Record and Result Types
//!
//! Typed records supplied by the farm record store, plus the result types
//! every calculator returns. Records are plain data: they are read, never
//! mutated, by the metric calculators.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::performance::Score;

/// Animal sex as recorded on the herd roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    Unknown,
}

impl Sex {
    /// Parse a roster sex value
    ///
    /// Accepts the abbreviations and stock-class names used on farm records.
    /// Anything unrecognised maps to `Unknown` rather than failing the row.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "m" | "male" | "bull" | "steer" | "bullock" => Sex::Male,
            "f" | "female" | "cow" | "heifer" => Sex::Female,
            _ => Sex::Unknown,
        }
    }
}

/// Herd roster entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
    pub animal_id: String,
    pub breed: String,
    pub sex: Sex,
    pub date_of_birth: NaiveDate,
}

impl Animal {
    /// Age in days on `today` (negative if `today` precedes the birth date)
    pub fn age_days(&self, today: NaiveDate) -> i64 {
        (today - self.date_of_birth).num_days()
    }

    /// Age in whole calendar months on `today`, `None` before birth
    pub fn age_months(&self, today: NaiveDate) -> Option<u32> {
        crate::utils::dates::whole_months_between(self.date_of_birth, today)
    }
}

/// A single weigh-scale reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightObservation {
    pub animal_id: String,
    pub observation_date: NaiveDate,
    pub weight_kg: f64,
    /// Feed consumed over the period this weighing closes, when recorded on the weight sheet
    pub feed_consumed_kg: Option<f64>,
}

impl WeightObservation {
    /// Weights must be positive and finite to take part in any calculation
    pub fn is_plausible(&self) -> bool {
        self.weight_kg.is_finite() && self.weight_kg > 0.0
    }
}

/// Feed intake recorded separately from the weight sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedIntakeObservation {
    pub animal_id: String,
    pub intake_date: NaiveDate,
    pub feed_type: String,
    pub amount_consumed_kg: f64,
}

/// One breeding cycle for a female
///
/// PD = pregnancy diagnosis. Up to three PD checkpoints are recorded per cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BreedingEvent {
    pub animal_id: String,
    pub last_service_date: Option<NaiveDate>,
    pub first_pd_date: Option<NaiveDate>,
    pub second_pd_date: Option<NaiveDate>,
    pub third_pd_date: Option<NaiveDate>,
    pub actual_calving_date: Option<NaiveDate>,
}

impl BreedingEvent {
    /// Earliest PD checkpoint that was recorded for this cycle
    pub fn confirming_pd_date(&self) -> Option<NaiveDate> {
        [self.first_pd_date, self.second_pd_date, self.third_pd_date]
            .into_iter()
            .flatten()
            .min()
    }

    /// Year the cycle is reported under: service year, else calving year
    pub fn reporting_year(&self) -> Option<i32> {
        self.last_service_date
            .or(self.actual_calving_date)
            .map(|date| date.year())
    }
}

/// Calf birth and weaning record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalfRecord {
    pub calf_id: String,
    pub dam_id: Option<String>,
    pub date_of_birth: NaiveDate,
    pub birth_weight_kg: Option<f64>,
    pub weaning_weight_kg: Option<f64>,
    pub weaning_date: Option<NaiveDate>,
}

impl CalfRecord {
    pub fn is_weaned(&self) -> bool {
        self.weaning_date.is_some()
    }

    /// Whole calendar months from birth to weaning
    pub fn age_months_at_weaning(&self) -> Option<u32> {
        let weaned = self.weaning_date?;
        crate::utils::dates::whole_months_between(self.date_of_birth, weaned)
    }
}

/// A recorded death
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortalityEvent {
    pub animal_id: String,
    pub death_date: NaiveDate,
    pub cause: Option<String>,
}

/// Outcome of a metric calculation
///
/// `Insufficient` replaces the bare `0` that used to stand for both
/// "measured zero" and "no data". `Estimated` marks fallbacks and
/// placeholders that were not measured from the herd's own records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Reading {
    Measured(f64),
    Estimated(f64),
    Insufficient,
}

impl Reading {
    /// Carried value, `None` when there was not enough data
    pub fn value(&self) -> Option<f64> {
        match *self {
            Reading::Measured(v) | Reading::Estimated(v) => Some(v),
            Reading::Insufficient => None,
        }
    }

    /// Legacy numeric form: `Insufficient` collapses to the `0` sentinel
    pub fn or_sentinel(&self) -> f64 {
        self.value().unwrap_or(0.0)
    }

    pub fn is_measured(&self) -> bool {
        matches!(self, Reading::Measured(_))
    }

    pub fn is_estimated(&self) -> bool {
        matches!(self, Reading::Estimated(_))
    }

    pub fn is_insufficient(&self) -> bool {
        matches!(self, Reading::Insufficient)
    }

    /// `numerator / denominator × 100`, `Insufficient` when the denominator is zero
    pub fn percentage(numerator: usize, denominator: usize) -> Self {
        if denominator == 0 {
            return Reading::Insufficient;
        }
        Reading::Measured(numerator as f64 / denominator as f64 * 100.0)
    }
}

/// Whether larger values of a metric are an improvement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

/// A computed KPI ready for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetric {
    pub metric_name: String,
    pub value: Reading,
    pub unit: String,
    pub target: f64,
    pub direction: Direction,
    /// `None` when the value is `Insufficient`
    pub score: Option<Score>,
}

/// Row-level conversion failures at the record store boundary
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("{table}: missing column '{column}'")]
    MissingColumn { table: &'static str, column: String },

    #[error("{table} row {row}: missing value for '{column}'")]
    MissingValue {
        table: &'static str,
        row: usize,
        column: &'static str,
    },

    #[error("{table} row {row}: cannot parse date '{value}' in '{column}'")]
    BadDate {
        table: &'static str,
        row: usize,
        column: &'static str,
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_sex_parse() {
        assert_eq!(Sex::parse("F"), Sex::Female);
        assert_eq!(Sex::parse(" Heifer "), Sex::Female);
        assert_eq!(Sex::parse("steer"), Sex::Male);
        assert_eq!(Sex::parse("?"), Sex::Unknown);
    }

    #[test]
    fn test_reading_sentinel() {
        assert_eq!(Reading::Insufficient.or_sentinel(), 0.0);
        assert_eq!(Reading::Measured(2.5).or_sentinel(), 2.5);
        assert_eq!(Reading::Estimated(365.0).value(), Some(365.0));
        assert!(Reading::percentage(3, 0).is_insufficient());
        assert_eq!(Reading::percentage(1, 4), Reading::Measured(25.0));
    }

    #[test]
    fn test_reading_serializes_with_status_tag() {
        let json = serde_json::to_string(&Reading::Estimated(12.0)).unwrap();
        assert_eq!(json, r#"{"status":"estimated","value":12.0}"#);

        let json = serde_json::to_string(&Reading::Insufficient).unwrap();
        assert_eq!(json, r#"{"status":"insufficient"}"#);
    }

    #[test]
    fn test_confirming_pd_is_earliest_recorded() {
        let event = BreedingEvent {
            animal_id: "c1".to_string(),
            last_service_date: Some(date("2024-03-01")),
            first_pd_date: None,
            second_pd_date: Some(date("2024-05-20")),
            third_pd_date: Some(date("2024-04-10")),
            actual_calving_date: None,
        };
        assert_eq!(event.confirming_pd_date(), Some(date("2024-04-10")));
        assert_eq!(event.reporting_year(), Some(2024));
    }

    #[test]
    fn test_calf_age_at_weaning() {
        let calf = CalfRecord {
            calf_id: "k1".to_string(),
            dam_id: None,
            date_of_birth: date("2024-02-15"),
            birth_weight_kg: Some(35.0),
            weaning_weight_kg: Some(215.0),
            weaning_date: Some(date("2024-08-14")),
        };
        // 14th precedes the 15th, so the sixth month is not complete
        assert_eq!(calf.age_months_at_weaning(), Some(5));
        assert!(calf.is_weaned());
    }
}
