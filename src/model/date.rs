// File: ./src/model/date.rs
// Wall-clock calendar dates used as occurrence keys.
use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Days, Local, Months, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A calendar date with no time of day and no timezone.
///
/// Occurrences are keyed by this type rather than by instants, so two dates
/// are equal exactly when their `YYYY-MM-DD` keys are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalDate(NaiveDate);

impl LocalDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn from_naive(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Today's date on the local wall clock.
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    /// The local wall-clock date an instant falls on.
    pub fn of_instant(instant: &DateTime<Utc>) -> Self {
        Self(instant.with_timezone(&Local).date_naive())
    }

    pub fn naive(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn weekday(&self) -> Weekday {
        self.0.weekday()
    }

    /// Lowercase English weekday name, e.g. `"monday"`.
    pub fn weekday_name(&self) -> &'static str {
        match self.0.weekday() {
            Weekday::Mon => "monday",
            Weekday::Tue => "tuesday",
            Weekday::Wed => "wednesday",
            Weekday::Thu => "thursday",
            Weekday::Fri => "friday",
            Weekday::Sat => "saturday",
            Weekday::Sun => "sunday",
        }
    }

    pub fn add_days(&self, days: u64) -> Option<Self> {
        self.0.checked_add_days(Days::new(days)).map(Self)
    }

    pub fn add_months(&self, months: u32) -> Option<Self> {
        self.0.checked_add_months(Months::new(months)).map(Self)
    }

    /// Signed number of days from `other` to `self`.
    pub fn days_since(&self, other: &LocalDate) -> i64 {
        self.0.signed_duration_since(other.0).num_days()
    }

    /// The `YYYY-MM-DD` key of this date.
    pub fn key(&self) -> String {
        self.0.format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for LocalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for LocalDate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map(Self)
            .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
    }
}

impl From<NaiveDate> for LocalDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

/// Parses a schedule entry such as `"monday"`, `"Wed"` or `"FRIDAY"`.
pub fn parse_weekday(name: &str) -> Option<Weekday> {
    Weekday::from_str(name.trim()).ok()
}
