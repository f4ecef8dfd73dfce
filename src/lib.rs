//! Herd Metrics Rust Implementation
//!
//! Livestock performance metrics for beef and dairy herds: growth,
//! feed conversion, reproduction and mortality KPIs, aggregated across the
//! herd and scored against targets.
//!
//! Layout:
//! - `types`: Typed farm records and result types
//! - `data`: Record snapshot and loading with Polars
//! - `metrics/`: Per-animal calculators, herd aggregation, breeding, mortality
//! - `utils/`: Dates, grouping, targets and the performance scorer
//! - `scorer`: Report coordinator

pub mod types;
pub mod utils;
pub mod data;
pub mod metrics;
pub mod scorer;

// Re-export commonly used types
pub use types::{
    Animal, BreedingEvent, CalfRecord, DerivedMetric, Direction, FeedIntakeObservation,
    MortalityEvent, Reading, RecordError, Sex, WeightObservation,
};
pub use data::HerdSnapshot;
pub use metrics::*;
pub use scorer::{HerdReport, HerdScorer, ReportKey};
pub use utils::{score, Band, HerdPeriod, MetricsConfig, Score};
