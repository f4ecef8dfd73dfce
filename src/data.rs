//! Herd Record Snapshot and Loading
//!
//! Holds the in-memory snapshot of farm records the engine computes over,
//! and converts tabular exports (Polars DataFrames, or CSV files read with
//! Polars) into typed records.
//!
//! This is the only place records are validated. Rows that cannot be typed
//! (missing ids, unparseable dates) are skipped with a warning. Implausible
//! values such as non-positive weights are kept: the calculators filter
//! those themselves.
//!
//! Expected files in a snapshot directory:
//!   animals.csv      animal_id, breed, sex, date_of_birth            (required)
//!   weights.csv      animal_id, observation_date, weight_kg,
//!                    [feed_consumed_kg]                              (required)
//!   feed_intake.csv  animal_id, intake_date, feed_type, amount_consumed_kg
//!   breeding.csv     animal_id, last_service_date, first_pd_date,
//!                    second_pd_date, third_pd_date, actual_calving_date
//!   calves.csv       calf_id, [dam_id], date_of_birth, birth_weight_kg,
//!                    weaning_weight_kg, weaning_date
//!   mortality.csv    animal_id, death_date, [cause]

use anyhow::{Context, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use rustc_hash::FxHashSet;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::types::{
    Animal, BreedingEvent, CalfRecord, FeedIntakeObservation, MortalityEvent, RecordError, Sex,
    WeightObservation,
};
use crate::utils::dates::parse_date;

/// In-memory snapshot of one farm's records
///
/// Supplied by the caller; the engine only reads it.
#[derive(Debug, Clone, Default)]
pub struct HerdSnapshot {
    pub animals: Vec<Animal>,
    pub weights: Vec<WeightObservation>,
    pub feed_intake: Vec<FeedIntakeObservation>,
    pub breeding: Vec<BreedingEvent>,
    pub calves: Vec<CalfRecord>,
    pub mortality: Vec<MortalityEvent>,
}

impl HerdSnapshot {
    /// Head count on `date`: born on or before it and not dead before it
    pub fn herd_size_at(&self, date: NaiveDate) -> usize {
        let dead: FxHashSet<&str> = self
            .mortality
            .iter()
            .filter(|event| event.death_date < date)
            .map(|event| event.animal_id.as_str())
            .collect();

        self.animals
            .iter()
            .filter(|animal| animal.date_of_birth <= date)
            .filter(|animal| !dead.contains(animal.animal_id.as_str()))
            .count()
    }

    /// Load a snapshot from a directory of CSV exports
    pub fn load(dir: &Path) -> Result<Self> {
        info!("Loading herd snapshot from {:?}", dir);

        let animals = animals_from_frame(&read_csv(&dir.join("animals.csv"))?)?;
        let weights = weights_from_frame(&read_csv(&dir.join("weights.csv"))?)?;

        let feed_intake = match read_optional_csv(&dir.join("feed_intake.csv"))? {
            Some(df) => feed_intake_from_frame(&df)?,
            None => Vec::new(),
        };
        let breeding = match read_optional_csv(&dir.join("breeding.csv"))? {
            Some(df) => breeding_from_frame(&df)?,
            None => Vec::new(),
        };
        let calves = match read_optional_csv(&dir.join("calves.csv"))? {
            Some(df) => calves_from_frame(&df)?,
            None => Vec::new(),
        };
        let mortality = match read_optional_csv(&dir.join("mortality.csv"))? {
            Some(df) => mortality_from_frame(&df)?,
            None => Vec::new(),
        };

        info!("  Animals: {}", animals.len());
        info!("  Weighings: {}", weights.len());
        info!("  Feed intake records: {}", feed_intake.len());
        info!("  Breeding cycles: {}", breeding.len());
        info!("  Calves: {}", calves.len());
        info!("  Deaths: {}", mortality.len());

        Ok(Self {
            animals,
            weights,
            feed_intake,
            breeding,
            calves,
            mortality,
        })
    }
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to create CSV reader: {:?}", path))?
        .finish()
        .with_context(|| format!("Failed to load CSV: {:?}", path))
}

fn read_optional_csv(path: &Path) -> Result<Option<DataFrame>> {
    if !path.exists() {
        debug!("Optional file not present: {:?}", path);
        return Ok(None);
    }
    read_csv(path).map(Some)
}

// ============================================================================
// Column access
// ============================================================================

fn text_column(df: &DataFrame, table: &'static str, name: &str) -> Result<Column> {
    let column = df.column(name).map_err(|_| RecordError::MissingColumn {
        table,
        column: name.to_string(),
    })?;
    column
        .cast(&DataType::String)
        .with_context(|| format!("{}: column '{}' cannot be read as text", table, name))
}

fn optional_text_column(df: &DataFrame, table: &'static str, name: &str) -> Result<Option<Column>> {
    match df.column(name) {
        Ok(_) => text_column(df, table, name).map(Some),
        Err(_) => Ok(None),
    }
}

fn number_column(df: &DataFrame, table: &'static str, name: &str) -> Result<Column> {
    let column = df.column(name).map_err(|_| RecordError::MissingColumn {
        table,
        column: name.to_string(),
    })?;
    column
        .cast(&DataType::Float64)
        .with_context(|| format!("{}: column '{}' cannot be read as a number", table, name))
}

fn optional_number_column(df: &DataFrame, table: &'static str, name: &str) -> Result<Option<Column>> {
    match df.column(name) {
        Ok(_) => number_column(df, table, name).map(Some),
        Err(_) => Ok(None),
    }
}

/// Cell text, `None` for nulls and blank strings
fn cell<'a>(values: &'a StringChunked, row: usize) -> Option<&'a str> {
    values.get(row).map(str::trim).filter(|s| !s.is_empty())
}

fn required_text(
    values: &StringChunked,
    table: &'static str,
    row: usize,
    column: &'static str,
) -> Result<String, RecordError> {
    cell(values, row)
        .map(str::to_string)
        .ok_or(RecordError::MissingValue { table, row, column })
}

fn optional_text(values: Option<&StringChunked>, row: usize) -> Option<String> {
    values.and_then(|v| cell(v, row)).map(str::to_string)
}

fn required_date(
    values: &StringChunked,
    table: &'static str,
    row: usize,
    column: &'static str,
) -> Result<NaiveDate, RecordError> {
    let raw = cell(values, row).ok_or(RecordError::MissingValue { table, row, column })?;
    parse_date(raw).ok_or_else(|| RecordError::BadDate {
        table,
        row,
        column,
        value: raw.to_string(),
    })
}

fn optional_date(
    values: Option<&StringChunked>,
    table: &'static str,
    row: usize,
    column: &'static str,
) -> Result<Option<NaiveDate>, RecordError> {
    let Some(raw) = values.and_then(|v| cell(v, row)) else {
        return Ok(None);
    };
    parse_date(raw).map(Some).ok_or_else(|| RecordError::BadDate {
        table,
        row,
        column,
        value: raw.to_string(),
    })
}

fn required_number(
    values: &Float64Chunked,
    table: &'static str,
    row: usize,
    column: &'static str,
) -> Result<f64, RecordError> {
    values
        .get(row)
        .ok_or(RecordError::MissingValue { table, row, column })
}

/// Type every row, skipping (and logging) the ones that fail
fn collect_rows<T, F>(table: &'static str, height: usize, parse_row: F) -> Vec<T>
where
    F: Fn(usize) -> Result<T, RecordError>,
{
    let mut records = Vec::with_capacity(height);
    let mut skipped = 0usize;

    for row in 0..height {
        match parse_row(row) {
            Ok(record) => records.push(record),
            Err(e) => {
                skipped += 1;
                warn!("{}", e);
            }
        }
    }

    if skipped > 0 {
        warn!(table, skipped, kept = records.len(), "Skipped rows that could not be typed");
    } else {
        debug!(table, rows = records.len(), "Typed all rows");
    }

    records
}

// ============================================================================
// Tables
// ============================================================================

/// Herd roster
pub fn animals_from_frame(df: &DataFrame) -> Result<Vec<Animal>> {
    const TABLE: &str = "animals";
    let ids = text_column(df, TABLE, "animal_id")?;
    let breeds = optional_text_column(df, TABLE, "breed")?;
    let sexes = optional_text_column(df, TABLE, "sex")?;
    let births = text_column(df, TABLE, "date_of_birth")?;

    let ids = ids.str()?;
    let breeds = breeds.as_ref().map(|c| c.str()).transpose()?;
    let sexes = sexes.as_ref().map(|c| c.str()).transpose()?;
    let births = births.str()?;

    Ok(collect_rows(TABLE, df.height(), |row| {
        Ok(Animal {
            animal_id: required_text(ids, TABLE, row, "animal_id")?,
            breed: optional_text(breeds, row).unwrap_or_default(),
            sex: optional_text(sexes, row)
                .map(|s| Sex::parse(&s))
                .unwrap_or(Sex::Unknown),
            date_of_birth: required_date(births, TABLE, row, "date_of_birth")?,
        })
    }))
}

/// Weigh-scale readings
pub fn weights_from_frame(df: &DataFrame) -> Result<Vec<WeightObservation>> {
    const TABLE: &str = "weights";
    let ids = text_column(df, TABLE, "animal_id")?;
    let dates = text_column(df, TABLE, "observation_date")?;
    let weights = number_column(df, TABLE, "weight_kg")?;
    let feed = optional_number_column(df, TABLE, "feed_consumed_kg")?;

    let ids = ids.str()?;
    let dates = dates.str()?;
    let weights = weights.f64()?;
    let feed = feed.as_ref().map(|c| c.f64()).transpose()?;

    Ok(collect_rows(TABLE, df.height(), |row| {
        Ok(WeightObservation {
            animal_id: required_text(ids, TABLE, row, "animal_id")?,
            observation_date: required_date(dates, TABLE, row, "observation_date")?,
            weight_kg: required_number(weights, TABLE, row, "weight_kg")?,
            feed_consumed_kg: feed.and_then(|f| f.get(row)),
        })
    }))
}

/// Feed intake records
pub fn feed_intake_from_frame(df: &DataFrame) -> Result<Vec<FeedIntakeObservation>> {
    const TABLE: &str = "feed_intake";
    let ids = text_column(df, TABLE, "animal_id")?;
    let dates = text_column(df, TABLE, "intake_date")?;
    let feed_types = optional_text_column(df, TABLE, "feed_type")?;
    let amounts = number_column(df, TABLE, "amount_consumed_kg")?;

    let ids = ids.str()?;
    let dates = dates.str()?;
    let feed_types = feed_types.as_ref().map(|c| c.str()).transpose()?;
    let amounts = amounts.f64()?;

    Ok(collect_rows(TABLE, df.height(), |row| {
        Ok(FeedIntakeObservation {
            animal_id: required_text(ids, TABLE, row, "animal_id")?,
            intake_date: required_date(dates, TABLE, row, "intake_date")?,
            feed_type: optional_text(feed_types, row).unwrap_or_default(),
            amount_consumed_kg: required_number(amounts, TABLE, row, "amount_consumed_kg")?,
        })
    }))
}

/// Breeding cycles
///
/// Every date column except `animal_id` is optional, both as a column and
/// as a cell.
pub fn breeding_from_frame(df: &DataFrame) -> Result<Vec<BreedingEvent>> {
    const TABLE: &str = "breeding";
    let ids = text_column(df, TABLE, "animal_id")?;
    let service = optional_text_column(df, TABLE, "last_service_date")?;
    let pd1 = optional_text_column(df, TABLE, "first_pd_date")?;
    let pd2 = optional_text_column(df, TABLE, "second_pd_date")?;
    let pd3 = optional_text_column(df, TABLE, "third_pd_date")?;
    let calving = optional_text_column(df, TABLE, "actual_calving_date")?;

    let ids = ids.str()?;
    let service = service.as_ref().map(|c| c.str()).transpose()?;
    let pd1 = pd1.as_ref().map(|c| c.str()).transpose()?;
    let pd2 = pd2.as_ref().map(|c| c.str()).transpose()?;
    let pd3 = pd3.as_ref().map(|c| c.str()).transpose()?;
    let calving = calving.as_ref().map(|c| c.str()).transpose()?;

    Ok(collect_rows(TABLE, df.height(), |row| {
        Ok(BreedingEvent {
            animal_id: required_text(ids, TABLE, row, "animal_id")?,
            last_service_date: optional_date(service, TABLE, row, "last_service_date")?,
            first_pd_date: optional_date(pd1, TABLE, row, "first_pd_date")?,
            second_pd_date: optional_date(pd2, TABLE, row, "second_pd_date")?,
            third_pd_date: optional_date(pd3, TABLE, row, "third_pd_date")?,
            actual_calving_date: optional_date(calving, TABLE, row, "actual_calving_date")?,
        })
    }))
}

/// Calf birth and weaning records
pub fn calves_from_frame(df: &DataFrame) -> Result<Vec<CalfRecord>> {
    const TABLE: &str = "calves";
    let ids = text_column(df, TABLE, "calf_id")?;
    let dams = optional_text_column(df, TABLE, "dam_id")?;
    let births = text_column(df, TABLE, "date_of_birth")?;
    let birth_weights = optional_number_column(df, TABLE, "birth_weight_kg")?;
    let weaning_weights = optional_number_column(df, TABLE, "weaning_weight_kg")?;
    let weaning_dates = optional_text_column(df, TABLE, "weaning_date")?;

    let ids = ids.str()?;
    let dams = dams.as_ref().map(|c| c.str()).transpose()?;
    let births = births.str()?;
    let birth_weights = birth_weights.as_ref().map(|c| c.f64()).transpose()?;
    let weaning_weights = weaning_weights.as_ref().map(|c| c.f64()).transpose()?;
    let weaning_dates = weaning_dates.as_ref().map(|c| c.str()).transpose()?;

    Ok(collect_rows(TABLE, df.height(), |row| {
        Ok(CalfRecord {
            calf_id: required_text(ids, TABLE, row, "calf_id")?,
            dam_id: optional_text(dams, row),
            date_of_birth: required_date(births, TABLE, row, "date_of_birth")?,
            birth_weight_kg: birth_weights.and_then(|w| w.get(row)),
            weaning_weight_kg: weaning_weights.and_then(|w| w.get(row)),
            weaning_date: optional_date(weaning_dates, TABLE, row, "weaning_date")?,
        })
    }))
}

/// Deaths
pub fn mortality_from_frame(df: &DataFrame) -> Result<Vec<MortalityEvent>> {
    const TABLE: &str = "mortality";
    let ids = text_column(df, TABLE, "animal_id")?;
    let dates = text_column(df, TABLE, "death_date")?;
    let causes = optional_text_column(df, TABLE, "cause")?;

    let ids = ids.str()?;
    let dates = dates.str()?;
    let causes = causes.as_ref().map(|c| c.str()).transpose()?;

    Ok(collect_rows(TABLE, df.height(), |row| {
        Ok(MortalityEvent {
            animal_id: required_text(ids, TABLE, row, "animal_id")?,
            death_date: required_date(dates, TABLE, row, "death_date")?,
            cause: optional_text(causes, row),
        })
    }))
}
