//! Herd Aggregation
//!
//! Combines per-animal readings into one representative value per metric.
//!
//! Naive averaging over every animal would pull each headline KPI toward
//! zero (animals with no data) or toward absurd values (data-entry typos),
//! so every herd average goes through the plausibility range first.
//!
//! Per-animal work runs in parallel with Rayon; there is no cross-animal
//! state inside the loop.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::HerdSnapshot;
use crate::metrics::feed_conversion::feed_conversion_ratio;
use crate::metrics::growth::{
    daily_live_weight_gain, period_daily_gain, weighing_endpoints, weight_gain_metric,
};
use crate::types::{Reading, WeightObservation};
use crate::utils::dates::HerdPeriod;
use crate::utils::grouping::{feed_by_animal, weights_by_animal};
use crate::utils::targets::{MetricsConfig, ValidRange};

/// Mean of the values strictly inside `valid_range`
///
/// Zeros standing in for "no data" and out-of-range outliers are dropped.
/// With nothing left the result is `Insufficient` (sentinel 0).
pub fn average_herd_metric(per_animal_values: &[f64], valid_range: ValidRange) -> Reading {
    let kept: Vec<f64> = per_animal_values
        .iter()
        .copied()
        .filter(|v| valid_range.contains(*v))
        .collect();

    if kept.is_empty() {
        return Reading::Insufficient;
    }
    Reading::Measured(kept.iter().sum::<f64>() / kept.len() as f64)
}

/// `average_herd_metric` over calculator readings
pub fn average_herd_readings(readings: &[Reading], valid_range: ValidRange) -> Reading {
    let values: Vec<f64> = readings.iter().map(Reading::or_sentinel).collect();
    average_herd_metric(&values, valid_range)
}

/// Coarse herd weight gain: `herd_size × default_daily_gain_kg × days`
pub fn estimate_herd_weight_gain_fallback(
    herd_size: usize,
    default_daily_gain_kg: f64,
    days: i64,
) -> f64 {
    herd_size as f64 * default_daily_gain_kg * days.max(0) as f64
}

/// Weight gained by one animal between its first and last weighing in `period`
pub fn animal_period_gain(
    animal_id: &str,
    period: &HerdPeriod,
    weight_observations: &[WeightObservation],
) -> Option<f64> {
    weighing_endpoints(animal_id, weight_observations, |obs| {
        period.contains(obs.observation_date)
    })
    .map(|(first, last)| last.weight_kg - first.weight_kg)
}

/// Total herd weight gain over `period`
///
/// Sums per-animal gains for animals with two or more weighings in the
/// window. When no animal qualifies, falls back to
/// `estimate_herd_weight_gain_fallback` and returns it as `Estimated`.
pub fn total_herd_weight_gain(
    snapshot: &HerdSnapshot,
    period: &HerdPeriod,
    config: &MetricsConfig,
) -> Reading {
    let by_animal = weights_by_animal(&snapshot.weights);

    let gains: Vec<f64> = by_animal
        .par_iter()
        .filter_map(|(animal_id, observations)| animal_period_gain(animal_id, period, observations))
        .collect();

    if gains.is_empty() {
        let herd_size = snapshot.herd_size_at(period.end);
        let estimate =
            estimate_herd_weight_gain_fallback(herd_size, config.default_daily_gain_kg, period.days());
        debug!(
            herd_size,
            days = period.days(),
            estimate,
            "No animal has two weighings in period, using fallback weight gain"
        );
        return Reading::Estimated(estimate);
    }

    Reading::Measured(gains.iter().sum())
}

/// Per-animal growth readings
#[derive(Debug, Clone)]
pub struct AnimalGrowth {
    pub animal_id: String,
    pub dlwg: Reading,
    pub adg: Reading,
    pub wgm: Reading,
    pub fcr: Reading,
}

/// Herd-level growth metrics for one period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HerdGrowth {
    pub dlwg: Reading,
    pub adg: Reading,
    pub wgm: Reading,
    pub fcr: Reading,
    /// `Estimated` when no animal had usable weighings
    pub total_weight_gain_kg: Reading,
    pub herd_size: usize,
    /// Animals with at least one measured growth reading
    pub animals_measured: usize,
}

/// Compute every per-animal growth reading in parallel
pub fn calculate_animal_growth(snapshot: &HerdSnapshot, period: &HerdPeriod) -> Vec<AnimalGrowth> {
    let weights = weights_by_animal(&snapshot.weights);
    let feed = feed_by_animal(&snapshot.feed_intake);
    let no_weights: Vec<WeightObservation> = Vec::new();
    let no_feed = Vec::new();

    snapshot
        .animals
        .par_iter()
        .map(|animal| {
            let id = animal.animal_id.as_str();
            let observations = weights.get(id).unwrap_or(&no_weights);
            let intake = feed.get(id).unwrap_or(&no_feed);

            // WGM looks at the whole weighing history up to the period end
            let history: Vec<WeightObservation> = observations
                .iter()
                .filter(|obs| obs.observation_date <= period.end)
                .cloned()
                .collect();

            AnimalGrowth {
                animal_id: animal.animal_id.clone(),
                dlwg: daily_live_weight_gain(animal, observations, period.end),
                adg: period_daily_gain(id, period, observations),
                wgm: weight_gain_metric(animal, &history),
                fcr: feed_conversion_ratio(id, period.start, period.end, observations, intake),
            }
        })
        .collect()
}

/// Aggregate herd growth metrics for one period
///
/// Algorithm:
/// 1. Per-animal DLWG, ADG (period-local), WGM and FCR in parallel
/// 2. Each herd figure = `average_herd_readings` with its configured range
/// 3. Total weight gain with the fallback estimate when nothing is measured
pub fn calculate_herd_growth(
    snapshot: &HerdSnapshot,
    period: &HerdPeriod,
    config: &MetricsConfig,
) -> HerdGrowth {
    let per_animal = calculate_animal_growth(snapshot, period);

    let readings = |pick: fn(&AnimalGrowth) -> Reading| -> Vec<Reading> {
        per_animal.iter().map(pick).collect()
    };

    let dlwg = average_herd_readings(&readings(|a| a.dlwg), config.ranges.dlwg);
    let adg = average_herd_readings(&readings(|a| a.adg), config.ranges.adg);
    let wgm = average_herd_readings(&readings(|a| a.wgm), config.ranges.wgm);
    let fcr = average_herd_readings(&readings(|a| a.fcr), config.ranges.fcr);

    let animals_measured = per_animal
        .iter()
        .filter(|a| a.dlwg.is_measured() || a.adg.is_measured())
        .count();

    debug!(
        animals = per_animal.len(),
        animals_measured,
        "Aggregated herd growth readings"
    );

    HerdGrowth {
        dlwg,
        adg,
        wgm,
        fcr,
        total_weight_gain_kg: total_herd_weight_gain(snapshot, period, config),
        herd_size: snapshot.herd_size_at(period.end),
        animals_measured,
    }
}
