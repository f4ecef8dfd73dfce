//! Utility modules for herd metrics
//!
//! Shared functionality used across the calculators:
//! - Dates: Parsing, day counts and reporting periods
//! - Grouping: Per-animal record series
//! - Targets: Configurable targets and plausibility ranges
//! - Performance: Target scoring and bands

pub mod dates;
pub mod grouping;
pub mod targets;
pub mod performance;

// Re-export commonly used types
pub use dates::{days_between, parse_date, HerdPeriod};
pub use grouping::{feed_by_animal, weights_by_animal};
pub use targets::{MetricsConfig, Targets, ValidRange, ValidRanges};
pub use performance::{score, score_mortality, score_reading, Band, Score};
