use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use std::fmt::Display;

/// Returns current timestamp in seconds (Unix epoch)
pub fn current_timestamp_seconds() -> i64 {
    Utc::now().timestamp()
}

/// Returns current timestamp in milliseconds
pub fn current_timestamp_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// "Month Year" label of a date as seen in `zone`, e.g. `March 2024`
pub fn month_year_label<Tz: TimeZone>(date: &DateTime<Utc>, zone: &Tz) -> String
where
    Tz::Offset: Display,
{
    date.with_timezone(zone).format("%B %Y").to_string()
}

/// First day of the month a date falls in within `zone`, used to order
/// month labels
pub fn month_start<Tz: TimeZone>(date: &DateTime<Utc>, zone: &Tz) -> NaiveDate {
    let local = date.with_timezone(zone);
    NaiveDate::from_ymd_opt(local.year(), local.month(), 1).unwrap_or_else(|| local.date_naive())
}
