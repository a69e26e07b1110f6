//! Minute-precision timestamp format shared by the normalizer, the output
//! stamp and anything that reads the document back.

use crate::error::CoreError;
use chrono::{DateTime, NaiveDateTime, TimeZone, Timelike, Utc};

pub const MINUTE_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn format_minute(ts: DateTime<Utc>) -> String {
    ts.format(MINUTE_FORMAT).to_string()
}

pub fn parse_minute(value: &str) -> Result<DateTime<Utc>, CoreError> {
    let naive = NaiveDateTime::parse_from_str(value, MINUTE_FORMAT)
        .map_err(|e| CoreError::malformed("time_posted", format!("{value:?}: {e}")))?;
    Ok(Utc.from_utc_datetime(&naive))
}

pub fn truncate_to_minute(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// Converts an upstream `created_utc` (fractional epoch seconds).
pub fn from_epoch_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    Utc.timestamp_opt(seconds.trunc() as i64, 0).single()
}
