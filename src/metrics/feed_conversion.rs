//! Feed Conversion Ratio (FCR)
//!
//! kg of feed consumed per kg of live weight gained over a window.
//! Lower is better.
//!
//! FCR is only defined when the animal gained weight in the window. Weight
//! loss, no change, or fewer than two weighings give `Insufficient`, which
//! the legacy sentinel renders as 0. A 0 FCR never means perfect conversion.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::metrics::growth::weighing_endpoints;
use crate::types::{FeedIntakeObservation, Reading, WeightObservation};
use crate::utils::dates::HerdPeriod;

/// Where the feed total came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedSource {
    /// Separate feed intake records
    IntakeRecords,
    /// `feed_consumed_kg` on the weight sheet
    WeightRecords,
    None,
}

/// FCR calculation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FcrResult {
    pub induction_weight_kg: Option<f64>,
    pub final_weight_kg: Option<f64>,
    /// `final − induction`, 0 with fewer than two weighings
    pub weight_gain_kg: f64,
    pub total_feed_kg: f64,
    pub feed_source: FeedSource,
    pub fcr: Reading,
}

/// Calculate FCR with its working
///
/// Algorithm:
/// 1. Keep the animal's weighings inside `[period_start, period_end]`
/// 2. Induction weight = first, final weight = last
/// 3. Total feed = sum of the animal's intake records in the window; when
///    there are none, the in-window weight records' own `feed_consumed_kg`
/// 4. `FCR = total_feed / (final − induction)` when the gain is positive
///    and some feed was recorded
pub fn calculate_fcr(
    animal_id: &str,
    period_start: NaiveDate,
    period_end: NaiveDate,
    weight_observations: &[WeightObservation],
    feed_intake_observations: &[FeedIntakeObservation],
) -> FcrResult {
    let period = HerdPeriod::new(period_start, period_end);

    let endpoints = weighing_endpoints(animal_id, weight_observations, |obs| {
        period.contains(obs.observation_date)
    });
    let (induction_weight_kg, final_weight_kg, weight_gain_kg) = match endpoints {
        Some((first, last)) => (
            Some(first.weight_kg),
            Some(last.weight_kg),
            last.weight_kg - first.weight_kg,
        ),
        None => (None, None, 0.0),
    };

    let (total_feed_kg, feed_source) =
        window_feed_total(animal_id, &period, weight_observations, feed_intake_observations);

    // No feed on record at all is missing data, not a zero ratio
    let fcr = if weight_gain_kg > 0.0 && feed_source != FeedSource::None {
        Reading::Measured(total_feed_kg / weight_gain_kg)
    } else {
        Reading::Insufficient
    };

    FcrResult {
        induction_weight_kg,
        final_weight_kg,
        weight_gain_kg,
        total_feed_kg,
        feed_source,
        fcr,
    }
}

/// Feed conversion ratio of one animal over a window
pub fn feed_conversion_ratio(
    animal_id: &str,
    period_start: NaiveDate,
    period_end: NaiveDate,
    weight_observations: &[WeightObservation],
    feed_intake_observations: &[FeedIntakeObservation],
) -> Reading {
    calculate_fcr(
        animal_id,
        period_start,
        period_end,
        weight_observations,
        feed_intake_observations,
    )
    .fcr
}

fn window_feed_total(
    animal_id: &str,
    period: &HerdPeriod,
    weight_observations: &[WeightObservation],
    feed_intake_observations: &[FeedIntakeObservation],
) -> (f64, FeedSource) {
    let intake: Vec<f64> = feed_intake_observations
        .iter()
        .filter(|obs| obs.animal_id == animal_id && period.contains(obs.intake_date))
        .map(|obs| obs.amount_consumed_kg)
        .filter(|kg| kg.is_finite() && *kg >= 0.0)
        .collect();

    if !intake.is_empty() {
        return (intake.iter().sum(), FeedSource::IntakeRecords);
    }

    let on_weight_sheet: Vec<f64> = weight_observations
        .iter()
        .filter(|obs| obs.animal_id == animal_id && period.contains(obs.observation_date))
        .filter_map(|obs| obs.feed_consumed_kg)
        .filter(|kg| kg.is_finite() && *kg >= 0.0)
        .collect();

    if !on_weight_sheet.is_empty() {
        return (on_weight_sheet.iter().sum(), FeedSource::WeightRecords);
    }

    (0.0, FeedSource::None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn weigh(id: &str, day: &str, kg: f64, feed: Option<f64>) -> WeightObservation {
        WeightObservation {
            animal_id: id.to_string(),
            observation_date: date(day),
            weight_kg: kg,
            feed_consumed_kg: feed,
        }
    }

    fn feed(id: &str, day: &str, kg: f64) -> FeedIntakeObservation {
        FeedIntakeObservation {
            animal_id: id.to_string(),
            intake_date: date(day),
            feed_type: "silage".to_string(),
            amount_consumed_kg: kg,
        }
    }

    #[test]
    fn test_fcr_worked_example() {
        let weights = vec![
            weigh("A1", "2024-01-01", 200.0, None),
            weigh("A1", "2024-07-01", 260.0, None),
        ];
        let intake = vec![
            feed("A1", "2024-02-01", 300.0),
            feed("A1", "2024-04-01", 300.0),
            feed("A1", "2024-06-01", 300.0),
        ];

        let result = calculate_fcr("A1", date("2024-01-01"), date("2024-07-01"), &weights, &intake);
        assert_eq!(result.induction_weight_kg, Some(200.0));
        assert_eq!(result.final_weight_kg, Some(260.0));
        assert_relative_eq!(result.total_feed_kg, 900.0);
        assert_eq!(result.feed_source, FeedSource::IntakeRecords);
        assert_relative_eq!(result.fcr.or_sentinel(), 15.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fcr_window_excludes_outside_records() {
        let weights = vec![
            weigh("A1", "2023-12-01", 150.0, None),
            weigh("A1", "2024-01-01", 200.0, None),
            weigh("A1", "2024-07-01", 260.0, None),
            weigh("A1", "2024-09-01", 290.0, None),
        ];
        let intake = vec![
            feed("A1", "2023-12-15", 1000.0),
            feed("A1", "2024-03-01", 600.0),
            feed("B2", "2024-03-01", 999.0),
        ];
        let fcr = feed_conversion_ratio("A1", date("2024-01-01"), date("2024-07-01"), &weights, &intake);
        assert_relative_eq!(fcr.or_sentinel(), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fcr_zero_when_weight_lost_or_held() {
        let intake = vec![feed("A1", "2024-03-01", 500.0)];

        let lost = vec![
            weigh("A1", "2024-01-01", 260.0, None),
            weigh("A1", "2024-07-01", 240.0, None),
        ];
        let fcr = feed_conversion_ratio("A1", date("2024-01-01"), date("2024-12-31"), &lost, &intake);
        assert!(fcr.is_insufficient());
        assert_eq!(fcr.or_sentinel(), 0.0);

        let held = vec![
            weigh("A1", "2024-01-01", 250.0, None),
            weigh("A1", "2024-07-01", 250.0, None),
        ];
        let fcr = feed_conversion_ratio("A1", date("2024-01-01"), date("2024-12-31"), &held, &intake);
        assert_eq!(fcr.or_sentinel(), 0.0);
    }

    #[test]
    fn test_fcr_single_weighing_is_insufficient() {
        let weights = vec![weigh("A1", "2024-01-01", 200.0, None)];
        let intake = vec![feed("A1", "2024-03-01", 500.0)];
        let result = calculate_fcr("A1", date("2024-01-01"), date("2024-12-31"), &weights, &intake);
        assert_eq!(result.weight_gain_kg, 0.0);
        assert!(result.fcr.is_insufficient());
    }

    #[test]
    fn test_fcr_falls_back_to_weight_sheet_feed() {
        let weights = vec![
            weigh("A1", "2024-01-01", 200.0, None),
            weigh("A1", "2024-04-01", 230.0, Some(250.0)),
            weigh("A1", "2024-07-01", 260.0, Some(350.0)),
        ];
        let result = calculate_fcr("A1", date("2024-01-01"), date("2024-07-01"), &weights, &[]);
        assert_eq!(result.feed_source, FeedSource::WeightRecords);
        assert_relative_eq!(result.fcr.or_sentinel(), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fcr_never_negative() {
        let weights = vec![
            weigh("A1", "2024-01-01", 200.0, None),
            weigh("A1", "2024-07-01", 260.0, None),
        ];
        let intake = vec![feed("A1", "2024-03-01", -400.0)];
        let result = calculate_fcr("A1", date("2024-01-01"), date("2024-07-01"), &weights, &intake);
        assert_eq!(result.feed_source, FeedSource::None);
        assert!(result.fcr.is_insufficient());
        assert!(result.fcr.or_sentinel() >= 0.0);
    }
}
