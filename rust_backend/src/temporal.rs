//! Temporal bucketing: weekday names and time-of-day shifts derived from the
//! raw transaction date and time text.
//!
//! Dates use a fixed day/month/year representation (`dd/mm/yy` or
//! `dd/mm/yyyy`); no locale inference is attempted. Two-digit years follow
//! chrono's `%y` century pivot.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, AnalyticsResult};

/// First hour classified as [`Shift::Afternoon`].
pub const AFTERNOON_START_HOUR: u32 = 12;
/// First hour classified as [`Shift::Evening`].
pub const EVENING_START_HOUR: u32 = 18;

/// Coarse time-of-day bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Shift {
    Morning,
    Afternoon,
    Evening,
}

impl Shift {
    /// `hour < 12` is Morning, `12..=17` is Afternoon, anything else Evening.
    pub fn from_hour(hour: u32) -> Self {
        if hour < AFTERNOON_START_HOUR {
            Shift::Morning
        } else if hour < EVENING_START_HOUR {
            Shift::Afternoon
        } else {
            Shift::Evening
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Shift::Morning => "Morning",
            Shift::Afternoon => "Afternoon",
            Shift::Evening => "Evening",
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a `dd/mm/yy` or `dd/mm/yyyy` date.
///
/// # Examples
///
/// ```
/// use retail_analytics::temporal::parse_date;
///
/// assert_eq!(parse_date("05/01/19").unwrap().to_string(), "2019-01-05");
/// assert_eq!(parse_date("05/01/2019").unwrap().to_string(), "2019-01-05");
/// assert!(parse_date("2019-01-05").is_err());
/// ```
pub fn parse_date(raw: &str) -> AnalyticsResult<NaiveDate> {
    let trimmed = raw.trim();
    let parts: Vec<&str> = trimmed.split('/').collect();

    let well_formed = parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
    if !well_formed {
        return Err(AnalyticsError::InvalidDate(format!(
            "'{}' is not in day/month/year form",
            raw
        )));
    }

    let format = match parts[2].len() {
        2 => "%d/%m/%y",
        4 => "%d/%m/%Y",
        _ => {
            return Err(AnalyticsError::InvalidDate(format!(
                "'{}' has a {}-digit year",
                raw,
                parts[2].len()
            )))
        }
    };

    NaiveDate::parse_from_str(trimmed, format)
        .map_err(|e| AnalyticsError::InvalidDate(format!("'{}': {}", raw, e)))
}

/// Parses an `HH:MM:SS` or `HH:MM` clock time.
pub fn parse_time(raw: &str) -> AnalyticsResult<NaiveTime> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|e| AnalyticsError::InvalidTime(format!("'{}': {}", raw, e)))
}

/// Full English weekday name for `date`.
pub fn day_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Weekday name straight from the raw date text.
pub fn derive_day_name(raw_date: &str) -> AnalyticsResult<&'static str> {
    parse_date(raw_date).map(day_name)
}

pub fn derive_shift(time: NaiveTime) -> Shift {
    Shift::from_hour(time.hour())
}

/// Shift straight from the raw time text.
pub fn derive_shift_from_str(raw_time: &str) -> AnalyticsResult<Shift> {
    parse_time(raw_time).map(derive_shift)
}
