//! Metric modules for herd performance
//!
//! Per-animal growth and feed conversion, herd aggregation, reproduction
//! and mortality. Every calculator is pure: insufficient data comes back as
//! `Reading::Insufficient`, never as an error.

pub mod growth;
pub mod feed_conversion;
pub mod herd;
pub mod breeding;
pub mod mortality;

// Re-export metric functions
pub use growth::{
    average_daily_gain, calf_gain_rate, daily_live_weight_gain, period_daily_gain,
    weight_gain_metric,
};
pub use feed_conversion::{calculate_fcr, feed_conversion_ratio, FcrResult, FeedSource};
pub use herd::{
    average_herd_metric, average_herd_readings, calculate_animal_growth, calculate_herd_growth,
    estimate_herd_weight_gain_fallback, total_herd_weight_gain, AnimalGrowth, HerdGrowth,
};
pub use breeding::{
    breeding_females, calculate_breeding, calf_crop_percentage, calves_in_scope, calving_interval,
    calving_interval_with_default, conception_rate, in_calf_rate, in_calf_rate_100_day,
    in_calf_rate_42_day, weaning_rate, BreedingSummary,
};
pub use mortality::{calculate_mortality, mortality_rate, MortalityResult};
