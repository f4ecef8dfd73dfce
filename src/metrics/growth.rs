//! Growth Metrics: DLWG, WGM and ADG
//!
//! Per-animal weight-gain rates computed from an animal's own weighings.
//!
//! - DLWG (daily live weight gain): gain per day of the animal's life
//! - ADG (average daily gain): gain per elapsed day between two weighings
//! - WGM (weight gain metric): DLWG / ADG over the same two weighings,
//!   which reduces to `days between weighings / age at last weighing`. It
//!   is the share of the animal's life the weighing record spans, never
//!   above 1.0; values near 1.0 mean the record covers most of its life.
//!
//! A series needs two chronologically distinct plausible weighings; anything
//! less is `Reading::Insufficient`.

use chrono::NaiveDate;

use crate::types::{Animal, CalfRecord, Reading, WeightObservation};
use crate::utils::dates::{days_between, HerdPeriod};

/// Days per month used when converting calf age to days
const DAYS_PER_MONTH: f64 = 30.0;

/// First and last plausible weighing of one animal that pass `keep`
///
/// Returns `None` unless the two ends fall on different dates.
pub(crate) fn weighing_endpoints<'a, F>(
    animal_id: &str,
    observations: &'a [WeightObservation],
    keep: F,
) -> Option<(&'a WeightObservation, &'a WeightObservation)>
where
    F: Fn(&WeightObservation) -> bool,
{
    let mut series = observations
        .iter()
        .filter(|obs| obs.animal_id == animal_id && obs.is_plausible() && keep(obs));

    let head = series.next()?;
    let (first, last) = series.fold((head, head), |(first, last), obs| {
        // Ties keep the earlier-listed observation as first, the later-listed as last
        let first = if obs.observation_date < first.observation_date { obs } else { first };
        let last = if obs.observation_date >= last.observation_date { obs } else { last };
        (first, last)
    });

    if last.observation_date > first.observation_date {
        Some((first, last))
    } else {
        None
    }
}

/// Daily live weight gain
///
/// Algorithm:
/// 1. Keep the animal's plausible weighings dated on or before `as_of_date`
/// 2. Take the chronologically first and last
/// 3. `age_days = |last.date − date_of_birth|`
/// 4. `DLWG = (last.weight − first.weight) / age_days`
///
/// A zero age is `Insufficient`. Negative DLWG (weight loss) is returned as
/// measured.
pub fn daily_live_weight_gain(
    animal: &Animal,
    weight_observations: &[WeightObservation],
    as_of_date: NaiveDate,
) -> Reading {
    let Some((first, last)) = weighing_endpoints(&animal.animal_id, weight_observations, |obs| {
        obs.observation_date <= as_of_date
    }) else {
        return Reading::Insufficient;
    };

    dlwg_between(animal, first, last)
}

fn dlwg_between(animal: &Animal, first: &WeightObservation, last: &WeightObservation) -> Reading {
    let age_days = days_between(animal.date_of_birth, last.observation_date);
    if age_days == 0 {
        return Reading::Insufficient;
    }
    Reading::Measured((last.weight_kg - first.weight_kg) / age_days as f64)
}

/// Weight gain metric (DLWG / ADG) over the animal's full weighing history
///
/// ADG here uses the same two weighings as DLWG but divides by the days
/// between them. `Insufficient` unless ADG is positive.
pub fn weight_gain_metric(animal: &Animal, weight_observations: &[WeightObservation]) -> Reading {
    let Some((first, last)) = weighing_endpoints(&animal.animal_id, weight_observations, |_| true)
    else {
        return Reading::Insufficient;
    };

    let Some(dlwg) = dlwg_between(animal, first, last).value() else {
        return Reading::Insufficient;
    };

    let elapsed = days_between(first.observation_date, last.observation_date);
    let adg = (last.weight_kg - first.weight_kg) / elapsed as f64;
    if adg > 0.0 {
        Reading::Measured(dlwg / adg)
    } else {
        Reading::Insufficient
    }
}

/// Average daily gain of one animal between its first and last weighing in `period`
pub fn period_daily_gain(
    animal_id: &str,
    period: &HerdPeriod,
    weight_observations: &[WeightObservation],
) -> Reading {
    match weighing_endpoints(animal_id, weight_observations, |obs| {
        period.contains(obs.observation_date)
    }) {
        Some((first, last)) => {
            let elapsed = days_between(first.observation_date, last.observation_date);
            Reading::Measured((last.weight_kg - first.weight_kg) / elapsed as f64)
        }
        None => Reading::Insufficient,
    }
}

/// Birth-to-weaning gain rate of one calf (kg/day)
///
/// `(weaning_weight − birth_weight) / (age_months × 30)`. `None` when either
/// weight is missing or non-positive, the calf is not weaned, or it was
/// weaned inside its first month.
pub fn calf_gain_rate(calf: &CalfRecord) -> Option<f64> {
    let birth = calf.birth_weight_kg.filter(|w| *w > 0.0)?;
    let weaning = calf.weaning_weight_kg.filter(|w| *w > 0.0)?;
    let age_months = calf.age_months_at_weaning().filter(|m| *m > 0)?;

    Some((weaning - birth) / (age_months as f64 * DAYS_PER_MONTH))
}

/// Average daily gain across calves, birth to weaning
///
/// Calves lacking weights or a weaning date are excluded, not zero-filled.
pub fn average_daily_gain(calf_records: &[CalfRecord]) -> Reading {
    let rates: Vec<f64> = calf_records.iter().filter_map(calf_gain_rate).collect();

    if rates.is_empty() {
        return Reading::Insufficient;
    }
    Reading::Measured(rates.iter().sum::<f64>() / rates.len() as f64)
}
