//! Per-Animal Grouping
//!
//! Splits herd-wide record lists into per-animal series so each animal's
//! calculation only scans its own records.

use rustc_hash::FxHashMap;

use crate::types::{FeedIntakeObservation, WeightObservation};

/// Group records by an animal key, preserving input order within each group
pub fn group_by_animal<'a, T, F>(records: &'a [T], key: F) -> FxHashMap<&'a str, Vec<T>>
where
    T: Clone,
    F: Fn(&'a T) -> &'a str,
{
    let mut groups: FxHashMap<&'a str, Vec<T>> = FxHashMap::default();
    for record in records {
        groups.entry(key(record)).or_default().push(record.clone());
    }
    groups
}

/// Weight observations keyed by animal id
pub fn weights_by_animal(records: &[WeightObservation]) -> FxHashMap<&str, Vec<WeightObservation>> {
    group_by_animal(records, |obs| obs.animal_id.as_str())
}

/// Feed intake observations keyed by animal id
pub fn feed_by_animal(records: &[FeedIntakeObservation]) -> FxHashMap<&str, Vec<FeedIntakeObservation>> {
    group_by_animal(records, |obs| obs.animal_id.as_str())
}
