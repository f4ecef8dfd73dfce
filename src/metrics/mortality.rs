//! Mortality
//!
//! Deaths as a percentage of the average head count over a period, scored
//! with the stricter mortality bands.

use serde::{Deserialize, Serialize};

use crate::data::HerdSnapshot;
use crate::types::{MortalityEvent, Reading};
use crate::utils::dates::HerdPeriod;
use crate::utils::performance::{score_mortality, Score};
use crate::utils::targets::MetricsConfig;

/// Mortality calculation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortalityResult {
    pub deaths: usize,
    pub average_herd_size: f64,
    pub rate_pct: Reading,
    pub score: Option<Score>,
}

/// `deaths / average_herd_size × 100`
pub fn mortality_rate(deaths: usize, average_herd_size: f64) -> Reading {
    if average_herd_size <= 0.0 || average_herd_size.is_nan() {
        return Reading::Insufficient;
    }
    Reading::Measured(deaths as f64 / average_herd_size * 100.0)
}

pub fn deaths_in_period(events: &[MortalityEvent], period: &HerdPeriod) -> usize {
    events
        .iter()
        .filter(|event| period.contains(event.death_date))
        .count()
}

/// Mortality over a period
///
/// Average herd size is the mean of the head counts at the start and end
/// of the period.
pub fn calculate_mortality(
    snapshot: &HerdSnapshot,
    period: &HerdPeriod,
    config: &MetricsConfig,
) -> MortalityResult {
    let deaths = deaths_in_period(&snapshot.mortality, period);
    let opening = snapshot.herd_size_at(period.start) as f64;
    let closing = snapshot.herd_size_at(period.end) as f64;
    let average_herd_size = (opening + closing) / 2.0;

    let rate_pct = mortality_rate(deaths, average_herd_size);
    let score = rate_pct
        .value()
        .map(|rate| score_mortality(rate, config.targets.mortality_pct));

    MortalityResult {
        deaths,
        average_herd_size,
        rate_pct,
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Animal, Sex};
    use crate::utils::performance::Band;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_mortality_rate() {
        assert_relative_eq!(mortality_rate(2, 80.0).or_sentinel(), 2.5);
        assert!(mortality_rate(1, 0.0).is_insufficient());
        assert!(mortality_rate(1, f64::NAN).is_insufficient());
    }

    #[test]
    fn test_calculate_mortality_uses_average_head_count() {
        let animals: Vec<Animal> = (0..4)
            .map(|i| Animal {
                animal_id: format!("A{}", i),
                breed: "Friesian".to_string(),
                sex: Sex::Female,
                date_of_birth: date("2020-01-01"),
            })
            .collect();
        let snapshot = HerdSnapshot {
            animals,
            mortality: vec![
                MortalityEvent {
                    animal_id: "A0".to_string(),
                    death_date: date("2024-06-01"),
                    cause: Some("bloat".to_string()),
                },
                MortalityEvent {
                    animal_id: "A1".to_string(),
                    death_date: date("2023-06-01"),
                    cause: None,
                },
            ],
            ..HerdSnapshot::default()
        };

        let period = HerdPeriod::new(date("2024-01-01"), date("2024-12-31"));
        let result = calculate_mortality(&snapshot, &period, &MetricsConfig::default());

        // Opening 3 (A1 already dead), closing 2
        assert_eq!(result.deaths, 1);
        assert_relative_eq!(result.average_herd_size, 2.5);
        assert_relative_eq!(result.rate_pct.or_sentinel(), 40.0);
        assert_eq!(result.score.map(|s| s.band), Some(Band::Poor));
    }
}
