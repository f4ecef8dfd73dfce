//! Date Utilities
//!
//! Day arithmetic and reporting windows shared by every calculator.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Accepted date layouts on record store exports
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

/// Parse a record date, trying ISO first
///
/// Empty strings and unparseable values return `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    // Datetime exports carry a time part; only the date matters here
    let raw = raw.split(['T', ' ']).next().unwrap_or(raw);

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Absolute number of days between two dates
pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    (b - a).num_days().abs()
}

/// Whole calendar months from `start` to `end`
///
/// A month counts once the day-of-month has been reached again.
/// Returns `None` when `end` precedes `start`.
pub fn whole_months_between(start: NaiveDate, end: NaiveDate) -> Option<u32> {
    if end < start {
        return None;
    }
    let mut months = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    if end.day() < start.day() {
        months -= 1;
    }
    u32::try_from(months.max(0)).ok()
}

/// Inclusive reporting window `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HerdPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl HerdPeriod {
    /// Build a window; reversed bounds are swapped
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if end < start {
            Self { start: end, end: start }
        } else {
            Self { start, end }
        }
    }

    /// The 365 days up to and including `as_of`
    pub fn trailing_year(as_of: NaiveDate) -> Self {
        let start = as_of
            .checked_sub_signed(Duration::days(364))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end: as_of }
    }

    /// A calendar year, 1 January to 31 December
    pub fn calendar_year(year: i32) -> Option<Self> {
        Some(Self {
            start: NaiveDate::from_ymd_opt(year, 1, 1)?,
            end: NaiveDate::from_ymd_opt(year, 12, 31)?,
        })
    }

    /// Number of calendar days in the window, both bounds counted
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}
