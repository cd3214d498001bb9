//! Shard resolution
//!
//! Maps instants to daily shard IDs and shard IDs back to the start of their day.
//! Every shard covers one UTC calendar day and is named `YYYY-MM-DD`.

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};

use crate::shard::{ShardError, ShardId, ShardResult, SHARD_EXTENSION};

/// Format used for shard IDs
pub const SHARD_ID_FORMAT: &str = "%Y-%m-%d";

/// Create the shard ID for a timestamp
pub fn shard_id_for(timestamp: &DateTime<Utc>) -> ShardId {
    timestamp.format(SHARD_ID_FORMAT).to_string()
}

/// Parse a shard ID into the instant its day starts (midnight UTC)
pub fn parse_shard_id(shard_id: &str) -> ShardResult<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(shard_id, SHARD_ID_FORMAT)
        .map_err(|e| ShardError::invalid_id(format!("{}: {}", shard_id, e)))?;

    date.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ShardError::invalid_id(format!("Invalid date in shard ID: {}", shard_id)))
}

/// Get the `[start, end)` range covered by a shard
pub fn shard_range(shard_id: &str) -> ShardResult<(DateTime<Utc>, DateTime<Utc>)> {
    let start = parse_shard_id(shard_id)?;
    Ok((start, start + ChronoDuration::days(1)))
}

/// Extract the shard ID from a shard file name, if it is one
///
/// Only the extension is checked here; the date part is validated by
/// [`parse_shard_id`] where it matters.
pub fn shard_id_from_file_name(file_name: &str) -> Option<ShardId> {
    file_name
        .strip_suffix(SHARD_EXTENSION)
        .and_then(|stem| stem.strip_suffix('.'))
        .map(str::to_string)
}

/// Convert float seconds since the epoch into an instant
///
/// Precision is rounded to microseconds. Returns `None` for NaN, infinities
/// and values outside the representable range.
pub fn timestamp_to_utc(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }

    let micros = (seconds * 1_000_000.0).round();
    if micros.abs() >= i64::MAX as f64 {
        return None;
    }

    DateTime::from_timestamp_micros(micros as i64)
}

/// Convert an instant into float seconds since the epoch
pub fn utc_to_timestamp(instant: &DateTime<Utc>) -> f64 {
    instant.timestamp_micros() as f64 / 1_000_000.0
}

/// Resolve the shard for float seconds since the epoch
pub fn shard_id_for_timestamp(seconds: f64) -> ShardResult<ShardId> {
    timestamp_to_utc(seconds)
        .map(|instant| shard_id_for(&instant))
        .ok_or_else(|| ShardError::timestamp_error(format!("Timestamp out of range: {}", seconds)))
}
