//! Breeding and Reproduction Metrics
//!
//! Conception rate, in-calf rates, calving interval, calf crop and weaning
//! rate, computed from breeding-cycle and calf records.
//!
//! Denominators:
//! - served = cycles with a `last_service_date`
//! - pregnant = cycles with a `first_pd_date`
//!
//! Every ratio returns `Insufficient` (sentinel 0) on a zero denominator.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::HerdSnapshot;
use crate::types::{Animal, BreedingEvent, CalfRecord, Reading, Sex};
use crate::utils::dates::{days_between, HerdPeriod};
use crate::utils::targets::MetricsConfig;

/// Short in-calf window (six weeks after service)
pub const IN_CALF_SHORT_WINDOW_DAYS: i64 = 42;
/// Long in-calf window
pub const IN_CALF_LONG_WINDOW_DAYS: i64 = 100;
/// Calving interval reported when fewer than two calvings are on record
pub const DEFAULT_CALVING_INTERVAL_DAYS: f64 = 365.0;

/// Breeding cycles reported under `year`
///
/// A cycle belongs to the year of its service date, or of its calving date
/// when it was never served on record.
pub fn events_in_year(events: &[BreedingEvent], year: i32) -> Vec<BreedingEvent> {
    events
        .iter()
        .filter(|event| event.reporting_year() == Some(year))
        .cloned()
        .collect()
}

pub fn served_count(events: &[BreedingEvent]) -> usize {
    events.iter().filter(|e| e.last_service_date.is_some()).count()
}

pub fn pregnant_count(events: &[BreedingEvent]) -> usize {
    events.iter().filter(|e| e.first_pd_date.is_some()).count()
}

/// `pregnant / served × 100`
pub fn conception_rate_from_counts(pregnant: usize, served: usize) -> Reading {
    Reading::percentage(pregnant, served)
}

/// Conception rate (%) over breeding cycles
pub fn conception_rate(events: &[BreedingEvent]) -> Reading {
    conception_rate_from_counts(pregnant_count(events), served_count(events))
}

/// Share of served cycles confirmed pregnant within `window_days` of service
///
/// The confirming PD is the earliest PD checkpoint recorded for the cycle.
/// The gap is taken as an absolute day count.
pub fn in_calf_rate(events: &[BreedingEvent], window_days: i64) -> Reading {
    let in_count = events
        .iter()
        .filter_map(|event| {
            let service = event.last_service_date?;
            let pd = event.confirming_pd_date()?;
            Some(days_between(service, pd))
        })
        .filter(|gap| *gap <= window_days)
        .count();

    Reading::percentage(in_count, served_count(events))
}

/// 42-day in-calf rate (%)
pub fn in_calf_rate_42_day(events: &[BreedingEvent]) -> Reading {
    in_calf_rate(events, IN_CALF_SHORT_WINDOW_DAYS)
}

/// 100-day in-calf rate (%)
pub fn in_calf_rate_100_day(events: &[BreedingEvent]) -> Reading {
    in_calf_rate(events, IN_CALF_LONG_WINDOW_DAYS)
}

/// Mean gap in days between consecutive calvings across the herd
///
/// With fewer than two calving dates the default of 365 days is returned as
/// `Estimated`: a placeholder, not a measurement.
pub fn calving_interval(events: &[BreedingEvent]) -> Reading {
    calving_interval_with_default(events, DEFAULT_CALVING_INTERVAL_DAYS)
}

pub fn calving_interval_with_default(events: &[BreedingEvent], default_days: f64) -> Reading {
    let mut dates: Vec<NaiveDate> = events
        .iter()
        .filter_map(|event| event.actual_calving_date)
        .collect();

    if dates.len() < 2 {
        return Reading::Estimated(default_days);
    }
    dates.sort_unstable();

    let gaps: Vec<i64> = dates
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_days())
        .collect();

    Reading::Measured(gaps.iter().sum::<i64>() as f64 / gaps.len() as f64)
}

/// Calves born per breeding female (%)
pub fn calf_crop_percentage(calves_born: usize, breeding_females: usize) -> Reading {
    Reading::percentage(calves_born, breeding_females)
}

/// Calves weaned per calf born (%)
pub fn weaning_rate(weaned_count: usize, total_calves: usize) -> Reading {
    Reading::percentage(weaned_count, total_calves)
}

/// Weaning rate (%) over calf records
pub fn weaning_rate_for(calves: &[CalfRecord]) -> Reading {
    let weaned = calves.iter().filter(|calf| calf.is_weaned()).count();
    weaning_rate(weaned, calves.len())
}

/// Females at or above `min_age_months` on `as_of`
pub fn breeding_females(animals: &[Animal], as_of: NaiveDate, min_age_months: u32) -> usize {
    animals
        .iter()
        .filter(|animal| animal.sex == Sex::Female)
        .filter(|animal| {
            animal
                .age_months(as_of)
                .is_some_and(|months| months >= min_age_months)
        })
        .count()
}

/// Reproduction metrics for a herd
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreedingSummary {
    /// `None` = whole history
    pub year: Option<i32>,
    pub served: usize,
    pub pregnant: usize,
    pub conception_rate_pct: Reading,
    pub in_calf_short_pct: Reading,
    pub in_calf_long_pct: Reading,
    /// `Estimated` when fewer than two calvings are on record
    pub calving_interval_days: Reading,
    pub calves_born: usize,
    pub breeding_females: usize,
    pub calf_crop_pct: Reading,
    pub weaning_rate_pct: Reading,
}

/// Calves born in the reporting scope
///
/// With a reporting year, calves born in that calendar year; otherwise
/// calves born inside `period`.
pub fn calves_in_scope(calves: &[CalfRecord], year: Option<i32>, period: &HerdPeriod) -> Vec<CalfRecord> {
    calves
        .iter()
        .filter(|calf| match year {
            Some(y) => calf.date_of_birth.year() == y,
            None => period.contains(calf.date_of_birth),
        })
        .cloned()
        .collect()
}

/// Calculate all reproduction metrics, optionally for one reporting year
///
/// Calf crop and weaning rate count the calves from `calves_in_scope`, and
/// breeding females are counted on `period.end`. Calving interval always
/// uses the full calving history; it needs consecutive calvings, which
/// straddle reporting years.
pub fn calculate_breeding(
    snapshot: &HerdSnapshot,
    year: Option<i32>,
    period: &HerdPeriod,
    config: &MetricsConfig,
) -> BreedingSummary {
    let scoped: Vec<BreedingEvent> = match year {
        Some(y) => events_in_year(&snapshot.breeding, y),
        None => snapshot.breeding.clone(),
    };

    let calves = calves_in_scope(&snapshot.calves, year, period);

    let females = breeding_females(&snapshot.animals, period.end, config.min_breeding_age_months);

    let summary = BreedingSummary {
        year,
        served: served_count(&scoped),
        pregnant: pregnant_count(&scoped),
        conception_rate_pct: conception_rate(&scoped),
        in_calf_short_pct: in_calf_rate(&scoped, config.in_calf_short_window_days),
        in_calf_long_pct: in_calf_rate(&scoped, config.in_calf_long_window_days),
        calving_interval_days: calving_interval_with_default(
            &snapshot.breeding,
            config.default_calving_interval_days,
        ),
        calves_born: calves.len(),
        breeding_females: females,
        calf_crop_pct: calf_crop_percentage(calves.len(), females),
        weaning_rate_pct: weaning_rate_for(&calves),
    };

    debug!(
        year = ?year,
        served = summary.served,
        pregnant = summary.pregnant,
        calves = summary.calves_born,
        "Calculated breeding summary"
    );

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn cycle(service: Option<&str>, first_pd: Option<&str>, calving: Option<&str>) -> BreedingEvent {
        BreedingEvent {
            animal_id: "C1".to_string(),
            last_service_date: service.map(date),
            first_pd_date: first_pd.map(date),
            second_pd_date: None,
            third_pd_date: None,
            actual_calving_date: calving.map(date),
        }
    }

    #[test]
    fn test_conception_rate() {
        let events = vec![
            cycle(Some("2024-03-01"), Some("2024-04-01"), None),
            cycle(Some("2024-03-05"), None, None),
            cycle(Some("2024-03-10"), Some("2024-05-01"), None),
            cycle(Some("2024-03-12"), None, None),
        ];
        assert_relative_eq!(conception_rate(&events).or_sentinel(), 50.0);
    }

    #[test]
    fn test_conception_rate_monotonic_in_pregnancies() {
        let served = 10;
        let mut previous = conception_rate_from_counts(0, served).or_sentinel();
        for pregnant in 1..=served {
            let rate = conception_rate_from_counts(pregnant, served).or_sentinel();
            assert!(rate > previous);
            previous = rate;
        }

        // Same via records: confirming one more served cycle raises the rate
        let mut events = vec![
            cycle(Some("2024-03-01"), Some("2024-04-01"), None),
            cycle(Some("2024-03-05"), None, None),
        ];
        let before = conception_rate(&events).or_sentinel();
        events[1].first_pd_date = Some(date("2024-04-20"));
        let after = conception_rate(&events).or_sentinel();
        assert!(after > before);
    }

    #[test]
    fn test_conception_rate_no_services() {
        let events = vec![cycle(None, None, Some("2024-01-01"))];
        assert!(conception_rate(&events).is_insufficient());
        assert_eq!(conception_rate(&[]).or_sentinel(), 0.0);
    }

    #[test]
    fn test_in_calf_windows() {
        let mut late = cycle(Some("2024-03-01"), None, None);
        late.second_pd_date = Some(date("2024-05-30")); // 90 days

        let events = vec![
            cycle(Some("2024-03-01"), Some("2024-04-12"), None), // 42 days
            cycle(Some("2024-03-01"), Some("2024-04-13"), None), // 43 days
            late,
            cycle(Some("2024-03-01"), None, None),
        ];

        assert_relative_eq!(in_calf_rate_42_day(&events).or_sentinel(), 25.0);
        assert_relative_eq!(in_calf_rate_100_day(&events).or_sentinel(), 75.0);
    }

    #[test]
    fn test_in_calf_gap_is_absolute() {
        // PD recorded before service (data-entry order swapped)
        let events = vec![cycle(Some("2024-04-12"), Some("2024-03-01"), None)];
        assert_relative_eq!(in_calf_rate_42_day(&events).or_sentinel(), 100.0);
    }

    #[test]
    fn test_calving_interval() {
        let events = vec![
            cycle(None, None, Some("2025-01-05")),
            cycle(None, None, Some("2023-01-01")),
            cycle(None, None, Some("2024-01-01")),
        ];
        let interval = calving_interval(&events);
        assert!(interval.is_measured());
        assert_relative_eq!(interval.or_sentinel(), 367.5);
    }

    #[test]
    fn test_calving_interval_default_is_estimated() {
        let events = vec![cycle(None, None, Some("2024-01-01")), cycle(None, None, None)];
        assert_eq!(calving_interval(&events), Reading::Estimated(365.0));
        assert_eq!(calving_interval(&[]), Reading::Estimated(365.0));
    }

    #[test]
    fn test_calf_crop_and_weaning_zero_denominators() {
        assert_relative_eq!(calf_crop_percentage(45, 50).or_sentinel(), 90.0);
        assert_eq!(calf_crop_percentage(3, 0).or_sentinel(), 0.0);
        assert_relative_eq!(weaning_rate(40, 45).or_sentinel(), 40.0 / 45.0 * 100.0);
        assert_eq!(weaning_rate(0, 0).or_sentinel(), 0.0);
    }

    #[test]
    fn test_events_in_year() {
        let events = vec![
            cycle(Some("2023-11-20"), Some("2024-01-05"), Some("2024-08-30")),
            cycle(Some("2024-02-01"), None, None),
            cycle(None, None, Some("2024-03-15")),
        ];
        let in_2024 = events_in_year(&events, 2024);
        assert_eq!(in_2024.len(), 2);
        assert_eq!(events_in_year(&events, 2023).len(), 1);
    }

    fn calf(id: &str, born: &str) -> CalfRecord {
        CalfRecord {
            calf_id: id.to_string(),
            dam_id: None,
            date_of_birth: date(born),
            birth_weight_kg: Some(35.0),
            weaning_weight_kg: None,
            weaning_date: None,
        }
    }

    #[test]
    fn test_calf_crop_counts_only_calves_born_in_period() {
        let cows: Vec<Animal> = (0..4)
            .map(|i| Animal {
                animal_id: format!("C{}", i),
                breed: "Angus".to_string(),
                sex: Sex::Female,
                date_of_birth: date("2018-04-01"),
            })
            .collect();
        // Four calves a year for five years from a stable herd of four cows
        let calves: Vec<CalfRecord> = (2020..=2024)
            .flat_map(|year| {
                (0..4).map(move |i| calf(&format!("K{}-{}", year, i), &format!("{}-03-1{}", year, i)))
            })
            .collect();
        let snapshot = HerdSnapshot {
            animals: cows,
            calves,
            ..HerdSnapshot::default()
        };

        let period = HerdPeriod::calendar_year(2024).unwrap();
        let summary = calculate_breeding(&snapshot, None, &period, &MetricsConfig::default());
        assert_eq!(summary.calves_born, 4);
        assert_eq!(summary.breeding_females, 4);
        assert_relative_eq!(summary.calf_crop_pct.or_sentinel(), 100.0);

        let spanning = HerdPeriod::new(date("2023-01-01"), date("2024-12-31"));
        let summary = calculate_breeding(&snapshot, None, &spanning, &MetricsConfig::default());
        assert_eq!(summary.calves_born, 8);
    }

    #[test]
    fn test_reporting_year_overrides_period_for_calves() {
        let calves = vec![calf("K1", "2023-11-01"), calf("K2", "2024-02-01")];
        let period = HerdPeriod::new(date("2023-07-01"), date("2024-06-30"));

        assert_eq!(calves_in_scope(&calves, None, &period).len(), 2);
        let in_2024 = calves_in_scope(&calves, Some(2024), &period);
        assert_eq!(in_2024.len(), 1);
        assert_eq!(in_2024[0].calf_id, "K2");
    }

    #[test]
    fn test_breeding_females_respects_min_age() {
        let animals = vec![
            Animal {
                animal_id: "C1".to_string(),
                breed: "Angus".to_string(),
                sex: Sex::Female,
                date_of_birth: date("2020-04-01"),
            },
            Animal {
                animal_id: "H1".to_string(),
                breed: "Angus".to_string(),
                sex: Sex::Female,
                date_of_birth: date("2024-01-01"),
            },
            Animal {
                animal_id: "B1".to_string(),
                breed: "Angus".to_string(),
                sex: Sex::Male,
                date_of_birth: date("2019-01-01"),
            },
        ];
        assert_eq!(breeding_females(&animals, date("2024-12-31"), 15), 1);
        assert_eq!(breeding_females(&animals, date("2025-04-01"), 15), 2);
    }
}
