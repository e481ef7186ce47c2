//! Timestamp conversion and time dimension attributes

use crate::tables::TimeRow;
use chrono::{DateTime, Datelike, Timelike, Utc};

/// Convert epoch milliseconds to a UTC timestamp in whole seconds
///
/// Sub-second precision is dropped (floor division), so every table that
/// derives a timestamp from `ts` agrees on the value.
pub fn start_time_from_millis(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.div_euclid(1000), 0)
}

/// Derive a time dimension row
///
/// `weekday` is 1 = Sunday through 7 = Saturday; `week` is the ISO week.
pub fn time_row(start_time: DateTime<Utc>) -> TimeRow {
    TimeRow {
        start_time,
        hour: start_time.hour() as i32,
        day: start_time.day() as i32,
        week: start_time.iso_week().week() as i32,
        month: start_time.month() as i32,
        year: start_time.year(),
        weekday: start_time.weekday().number_from_sunday() as i32,
    }
}
