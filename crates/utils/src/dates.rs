//! Calendar-day helpers. Every date the service stores is a local
//! `YYYY-MM-DD` day.

use chrono::{Days, Local, NaiveDate};
use thiserror::Error;

pub const DAY_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Error, PartialEq)]
#[error("invalid date '{0}', expected YYYY-MM-DD")]
pub struct InvalidDate(pub String);

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn tomorrow_of(day: NaiveDate) -> NaiveDate {
    day.checked_add_days(Days::new(1)).unwrap_or(day)
}

pub fn parse_day(value: &str) -> Result<NaiveDate, InvalidDate> {
    NaiveDate::parse_from_str(value.trim(), DAY_FORMAT).map_err(|_| InvalidDate(value.to_string()))
}

/// Every day from `start` to `end`, both inclusive. Empty when `end < start`.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d <= end).collect()
}

/// Number of days in the inclusive range, zero when reversed.
pub fn span_in_days(start: NaiveDate, end: NaiveDate) -> i64 {
    ((end - start).num_days() + 1).max(0)
}
