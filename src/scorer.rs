//! Herd Scorer - Main coordinator for herd performance reports
//!
//! Runs every calculator over one snapshot and period, scores each result
//! against its configured target and collects them into a `HerdReport`.
//!
//! The scorer holds configuration only. Reports are recomputed from the
//! snapshot on every call; callers that want to cache them key the cache
//! with `ReportKey`.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::data::HerdSnapshot;
use crate::metrics::breeding::{calculate_breeding, calves_in_scope, BreedingSummary};
use crate::metrics::growth::average_daily_gain;
use crate::metrics::herd::{calculate_herd_growth, HerdGrowth};
use crate::metrics::mortality::{calculate_mortality, MortalityResult};
use crate::types::{DerivedMetric, Direction, Reading};
use crate::utils::dates::HerdPeriod;
use crate::utils::performance::{score_reading, Band};
use crate::utils::targets::MetricsConfig;

/// Cache key for a computed report
///
/// `herd_version` is whatever the caller bumps when the underlying records
/// change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportKey {
    pub herd_version: u64,
    pub period: HerdPeriod,
}

impl ReportKey {
    pub fn new(herd_version: u64, period: HerdPeriod) -> Self {
        Self {
            herd_version,
            period,
        }
    }
}

/// Herd report result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HerdReport {
    pub period: HerdPeriod,
    /// Date ages and the breeding herd are assessed on (period end)
    pub as_of: NaiveDate,
    /// Reporting year the breeding figures are restricted to, if any
    pub breeding_year: Option<i32>,
    /// Every KPI, scored, in presentation order
    pub metrics: Vec<DerivedMetric>,
    pub growth: HerdGrowth,
    pub calf_adg_kg_per_day: Reading,
    pub breeding: BreedingSummary,
    pub mortality: MortalityResult,
}

impl HerdReport {
    /// Look up a KPI by name
    pub fn metric(&self, name: &str) -> Option<&DerivedMetric> {
        self.metrics.iter().find(|m| m.metric_name == name)
    }

    /// KPIs that scored in the given band
    pub fn metrics_in_band(&self, band: Band) -> Vec<&DerivedMetric> {
        self.metrics
            .iter()
            .filter(|m| m.score.map(|s| s.band) == Some(band))
            .collect()
    }

    /// True when herd weight gain came from the fallback estimate
    pub fn weight_gain_estimated(&self) -> bool {
        self.growth.total_weight_gain_kg.is_estimated()
    }
}

/// Main herd scorer
#[derive(Debug, Clone, Default)]
pub struct HerdScorer {
    config: MetricsConfig,
}

impl HerdScorer {
    pub fn new(config: MetricsConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::default()
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Score a herd over one period
    ///
    /// Breeding cycles are not restricted by year; calves are those born
    /// inside `period`.
    pub fn score_herd(&self, snapshot: &HerdSnapshot, period: HerdPeriod) -> HerdReport {
        self.score_herd_for(snapshot, period, None)
    }

    /// Score a herd over one period
    ///
    /// Algorithm:
    /// 1. Herd growth (per-animal in parallel) alongside breeding and
    ///    mortality; calf ADG over the calves in the same scope as calf crop
    /// 2. Score every reading against its target and direction
    /// 3. Assemble the report in presentation order
    pub fn score_herd_for(
        &self,
        snapshot: &HerdSnapshot,
        period: HerdPeriod,
        breeding_year: Option<i32>,
    ) -> HerdReport {
        let config = &self.config;
        let as_of = period.end;

        let (growth, (breeding, mortality)) = rayon::join(
            || calculate_herd_growth(snapshot, &period, config),
            || {
                (
                    calculate_breeding(snapshot, breeding_year, &period, config),
                    calculate_mortality(snapshot, &period, config),
                )
            },
        );
        let calf_adg_kg_per_day =
            average_daily_gain(&calves_in_scope(&snapshot.calves, breeding_year, &period));

        let metrics = self.derive_metrics(&growth, calf_adg_kg_per_day, &breeding, &mortality);

        let report = HerdReport {
            period,
            as_of,
            breeding_year,
            metrics,
            growth,
            calf_adg_kg_per_day,
            breeding,
            mortality,
        };

        info!(
            start = %period.start,
            end = %period.end,
            herd_size = report.growth.herd_size,
            good = report.metrics_in_band(Band::Good).len(),
            poor = report.metrics_in_band(Band::Poor).len(),
            "Scored herd"
        );
        if report.weight_gain_estimated() {
            info!("Herd weight gain estimated from the default daily gain");
        }

        report
    }

    /// Score several periods in parallel
    pub fn score_periods(&self, snapshot: &HerdSnapshot, periods: &[HerdPeriod]) -> Vec<HerdReport> {
        periods
            .par_iter()
            .map(|period| self.score_herd(snapshot, *period))
            .collect()
    }

    fn derive_metrics(
        &self,
        growth: &HerdGrowth,
        calf_adg: Reading,
        breeding: &BreedingSummary,
        mortality: &MortalityResult,
    ) -> Vec<DerivedMetric> {
        let targets = &self.config.targets;
        use Direction::{HigherIsBetter, LowerIsBetter};

        let mut metrics = vec![
            derived("dlwg", growth.dlwg, "kg/day", targets.dlwg_kg_per_day, HigherIsBetter),
            derived("adg", growth.adg, "kg/day", targets.adg_kg_per_day, HigherIsBetter),
            derived("wgm", growth.wgm, "ratio", targets.wgm, HigherIsBetter),
            derived("fcr", growth.fcr, "kg feed/kg gain", targets.fcr, LowerIsBetter),
            derived("calf_adg", calf_adg, "kg/day", targets.calf_adg_kg_per_day, HigherIsBetter),
            derived(
                "conception_rate",
                breeding.conception_rate_pct,
                "%",
                targets.conception_rate_pct,
                HigherIsBetter,
            ),
            derived(
                "in_calf_42_day",
                breeding.in_calf_short_pct,
                "%",
                targets.in_calf_42_day_pct,
                HigherIsBetter,
            ),
            derived(
                "in_calf_100_day",
                breeding.in_calf_long_pct,
                "%",
                targets.in_calf_100_day_pct,
                HigherIsBetter,
            ),
            derived(
                "calving_interval",
                breeding.calving_interval_days,
                "days",
                targets.calving_interval_days,
                LowerIsBetter,
            ),
            derived("calf_crop", breeding.calf_crop_pct, "%", targets.calf_crop_pct, HigherIsBetter),
            derived(
                "weaning_rate",
                breeding.weaning_rate_pct,
                "%",
                targets.weaning_rate_pct,
                HigherIsBetter,
            ),
        ];

        // Mortality uses its own bands rather than the generic score
        metrics.push(DerivedMetric {
            metric_name: "mortality".to_string(),
            value: mortality.rate_pct,
            unit: "%".to_string(),
            target: targets.mortality_pct,
            direction: LowerIsBetter,
            score: mortality.score,
        });

        for metric in &metrics {
            debug!(
                metric = %metric.metric_name,
                value = ?metric.value,
                band = ?metric.score.map(|s| s.band),
                "Scored metric"
            );
        }

        metrics
    }
}

fn derived(name: &str, value: Reading, unit: &str, target: f64, direction: Direction) -> DerivedMetric {
    DerivedMetric {
        metric_name: name.to_string(),
        value,
        unit: unit.to_string(),
        target,
        direction,
        score: score_reading(&value, target, direction),
    }
}
