//! Log records
//!
//! A record is an ordered JSON object. The store only interprets a handful of
//! fields; everything else is carried through untouched.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::shard::{resolver, ShardId};

/// Key holding seconds since the Unix epoch
pub const TIMESTAMP_KEY: &str = "timestamp";
/// Key holding the record's level
pub const LEVEL_KEY: &str = "level";
/// Key holding the request or source path
pub const PATH_KEY: &str = "path";
/// Key holding the human-readable local time
pub const FORMATTED_TIME_KEY: &str = "formatted_time";

/// Format of the `formatted_time` field
pub const FORMATTED_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A structured log record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogRecord(Map<String, Value>);

impl LogRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record from a JSON value, which must be an object
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::other(format!("Log record must be a JSON object, got {}", other))),
        }
    }

    /// Add a field, replacing any previous value
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a field, returning the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Get a field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Check if a field is present (even when `null`)
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Numeric timestamp in seconds, if present
    pub fn timestamp(&self) -> Option<f64> {
        self.0.get(TIMESTAMP_KEY).and_then(Value::as_f64)
    }

    /// Timestamp as an instant, if present and representable
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        self.timestamp().and_then(resolver::timestamp_to_utc)
    }

    /// Level field, if it is a string
    pub fn level(&self) -> Option<&str> {
        self.0.get(LEVEL_KEY).and_then(Value::as_str)
    }

    /// Path field, if it is a string
    pub fn path(&self) -> Option<&str> {
        self.0.get(PATH_KEY).and_then(Value::as_str)
    }

    /// Formatted local time, if present
    pub fn formatted_time(&self) -> Option<&str> {
        self.0.get(FORMATTED_TIME_KEY).and_then(Value::as_str)
    }

    /// Borrow the underlying JSON object
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Take the underlying JSON object
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the record has no fields
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Prepare a record for persistence
    ///
    /// A missing or `null` timestamp becomes `now`. A numeric timestamp is kept
    /// as given. `formatted_time` is added only when the key is absent, rendered
    /// in the host's local time zone.
    pub fn enrich(mut self, now: DateTime<Utc>) -> Result<EnrichedRecord> {
        let (seconds, value) = match self.0.get(TIMESTAMP_KEY) {
            None | Some(Value::Null) => {
                let seconds = resolver::utc_to_timestamp(&now);
                (seconds, Value::from(seconds))
            }
            Some(value) => match value.as_f64() {
                Some(seconds) => (seconds, value.clone()),
                None => {
                    return Err(Error::timestamp(format!(
                        "Timestamp must be numeric seconds, got {}",
                        value
                    )))
                }
            },
        };

        let instant = resolver::timestamp_to_utc(seconds)
            .ok_or_else(|| Error::timestamp(format!("Timestamp out of range: {}", seconds)))?;

        self.0.insert(TIMESTAMP_KEY.to_string(), value);

        if !self.0.contains_key(FORMATTED_TIME_KEY) {
            let formatted = instant
                .with_timezone(&Local)
                .format(FORMATTED_TIME_FORMAT)
                .to_string();
            self.0.insert(FORMATTED_TIME_KEY.to_string(), Value::String(formatted));
        }

        Ok(EnrichedRecord {
            shard_id: resolver::shard_id_for(&instant),
            instant,
            record: self,
        })
    }
}

impl From<Map<String, Value>> for LogRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<LogRecord> for Value {
    fn from(record: LogRecord) -> Self {
        Value::Object(record.0)
    }
}

/// A record ready to be appended, with its resolved shard
#[derive(Debug, Clone)]
pub struct EnrichedRecord {
    /// Shard the record belongs to
    pub shard_id: ShardId,
    /// Resolved instant of the record's timestamp
    pub instant: DateTime<Utc>,
    /// The enriched record
    pub record: LogRecord,
}

impl EnrichedRecord {
    /// Encode as a single JSON line (without the newline)
    pub fn to_line(&self) -> Result<String> {
        serde_json::to_string(&self.record).map_err(Error::Serialization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_field_accessors() -> Result<()> {
        let record = LogRecord::from_value(json!({
            "timestamp": 1_700_000_000,
            "level": "INFO",
            "path": "/api/users",
            "extra": {"nested": true},
        }))?;

        assert_eq!(record.timestamp(), Some(1_700_000_000.0));
        assert_eq!(record.level(), Some("INFO"));
        assert_eq!(record.path(), Some("/api/users"));
        assert_eq!(record.formatted_time(), None);
        assert_eq!(record.len(), 4);

        assert!(LogRecord::from_value(json!([1, 2])).is_err());

        Ok(())
    }

    #[test]
    fn test_enrich_keeps_explicit_timestamp() -> Result<()> {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let record = LogRecord::new()
            .with("level", "ERROR")
            .with("timestamp", 1_700_000_000.5);

        let enriched = record.enrich(now)?;

        assert_eq!(enriched.shard_id, "2023-11-14");
        assert_eq!(enriched.record.timestamp(), Some(1_700_000_000.5));
        assert!(enriched.record.formatted_time().is_some());

        // Original key order is kept, derived field goes last
        let keys: Vec<_> = enriched.record.as_map().keys().cloned().collect();
        assert_eq!(keys, vec!["level", "timestamp", "formatted_time"]);

        Ok(())
    }

    #[test]
    fn test_enrich_defaults_timestamp_to_now() -> Result<()> {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap();

        let enriched = LogRecord::new().with("message", "hi").enrich(now)?;
        assert_eq!(enriched.instant, now);
        assert_eq!(enriched.shard_id, "2024-06-01");
        assert_eq!(enriched.record.timestamp(), Some(now.timestamp() as f64));

        let enriched = LogRecord::new().with("timestamp", Value::Null).enrich(now)?;
        assert_eq!(enriched.instant, now);

        Ok(())
    }

    #[test]
    fn test_enrich_keeps_existing_formatted_time() -> Result<()> {
        let enriched = LogRecord::new()
            .with("timestamp", 0)
            .with("formatted_time", "custom")
            .enrich(Utc::now())?;

        assert_eq!(enriched.record.formatted_time(), Some("custom"));
        assert_eq!(enriched.shard_id, "1970-01-01");

        Ok(())
    }

    #[test]
    fn test_enrich_rejects_bad_timestamps() {
        let err = LogRecord::new().with("timestamp", "yesterday").enrich(Utc::now()).unwrap_err();
        assert!(err.is_timestamp_error());

        let err = LogRecord::new().with("timestamp", 1e300).enrich(Utc::now()).unwrap_err();
        assert!(err.is_timestamp_error());
    }

    #[test]
    fn test_line_preserves_non_ascii() -> Result<()> {
        let enriched = LogRecord::new()
            .with("timestamp", 1)
            .with("message", "日志写入")
            .enrich(Utc::now())?;

        let line = enriched.to_line()?;
        assert!(line.contains("日志写入"));
        assert!(!line.contains('\n'));

        Ok(())
    }
}
