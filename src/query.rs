use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use rayon::prelude::*;
use serde_json::Value;

use crate::error::Result;
use crate::record::LogRecord;
use crate::shard::{util, ShardError, ShardResult};
use crate::store::LogStore;

/// Conversion of a query bound into a UTC instant
///
/// Zoned date-times are converted; naive ones are taken to already be UTC.
pub trait IntoUtc {
    fn into_utc(self) -> DateTime<Utc>;
}

impl<Tz: TimeZone> IntoUtc for DateTime<Tz> {
    fn into_utc(self) -> DateTime<Utc> {
        self.with_timezone(&Utc)
    }
}

impl IntoUtc for NaiveDateTime {
    fn into_utc(self) -> DateTime<Utc> {
        self.and_utc()
    }
}

/// Time range for querying logs, inclusive at both ends
///
/// Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    /// Start time (inclusive)
    pub start: Option<DateTime<Utc>>,
    /// End time (inclusive)
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// Create a new time range
    pub fn new(start: impl IntoUtc, end: impl IntoUtc) -> Self {
        Self {
            start: Some(start.into_utc()),
            end: Some(end.into_utc()),
        }
    }

    /// A range with no bounds
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Everything from `start` on
    pub fn since(start: impl IntoUtc) -> Self {
        Self { start: Some(start.into_utc()), end: None }
    }

    /// Everything up to and including `end`
    pub fn until(end: impl IntoUtc) -> Self {
        Self { start: None, end: Some(end.into_utc()) }
    }

    /// Create a time range for the last N hours
    pub fn last_hours(hours: i64) -> Self {
        Self::ending_now(Duration::try_hours(hours))
    }

    /// Create a time range for the last N days
    pub fn last_days(days: i64) -> Self {
        Self::ending_now(Duration::try_days(days))
    }

    /// A range ending now and reaching back `span`
    ///
    /// A span too large to represent leaves the start open.
    fn ending_now(span: Option<Duration>) -> Self {
        let end = Utc::now();
        Self {
            start: span.and_then(|span| end.checked_sub_signed(span)),
            end: Some(end),
        }
    }

    /// Check if an instant falls within the range
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        if let Some(start) = self.start {
            if *instant < start {
                return false;
            }
        }

        if let Some(end) = self.end {
            if *instant > end {
                return false;
            }
        }

        true
    }
}

/// Field filters applied to each record
///
/// Empty filter strings are treated as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilters {
    /// Exact level, compared case-insensitively
    pub level: Option<String>,
    /// Substring of the record's path, compared case-insensitively
    pub path_filter: Option<String>,
}

impl QueryFilters {
    /// Create an empty filter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    /// Filter by path substring
    pub fn with_path_filter(mut self, path: impl Into<String>) -> Self {
        self.path_filter = Some(path.into());
        self
    }

    /// Check if a record passes every filter
    pub fn matches(&self, record: &LogRecord) -> bool {
        if let Some(level) = self.level.as_deref().filter(|l| !l.is_empty()) {
            match record.level() {
                Some(actual) if actual.to_uppercase() == level.to_uppercase() => {}
                _ => return false,
            }
        }

        if let Some(path) = self.path_filter.as_deref().filter(|p| !p.is_empty()) {
            let actual = record.path().unwrap_or("").to_lowercase();
            if !actual.contains(&path.to_lowercase()) {
                return false;
            }
        }

        true
    }
}

/// One page of query results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPage {
    /// Records on this page, newest first
    pub records: Vec<LogRecord>,
    /// Number of matching records before pagination
    pub total: usize,
}

/// A query over every shard
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Time range to search
    pub time_range: TimeRange,
    /// Field filters
    pub filters: QueryFilters,
    /// Maximum number of results to return
    pub limit: usize,
    /// Number of results to skip
    pub offset: usize,
    /// Whether to parse shard files in parallel
    pub parallel: bool,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            time_range: TimeRange::unbounded(),
            filters: QueryFilters::default(),
            limit: 100,
            offset: 0,
            parallel: true,
        }
    }
}

impl Query {
    /// Create a query matching everything, first page of 100
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan every shard in `base_dir` and return the requested page
    pub fn execute_in(&self, base_dir: &Path) -> Result<QueryPage> {
        let records = scan_shards(base_dir, self.parallel)?;
        Ok(self.apply(records))
    }

    /// Filter, sort newest first and paginate a set of records
    ///
    /// Records without a usable timestamp are dropped since they cannot be
    /// placed on the timeline.
    pub fn apply(&self, records: Vec<LogRecord>) -> QueryPage {
        let mut matched: Vec<(f64, LogRecord)> = records
            .into_iter()
            .filter_map(|record| {
                let seconds = record.timestamp()?;
                let instant = record.timestamp_utc()?;
                if !self.time_range.contains(&instant) || !self.filters.matches(&record) {
                    return None;
                }
                Some((seconds, record))
            })
            .collect();

        // Stable, so equal timestamps keep scan order
        matched.sort_by(|a, b| b.0.total_cmp(&a.0));

        let total = matched.len();
        let records = matched
            .into_iter()
            .skip(self.offset)
            .take(self.limit)
            .map(|(_, record)| record)
            .collect();

        QueryPage { records, total }
    }
}

/// Read every record from every shard, in shard order
pub fn scan_shards(base_dir: &Path, parallel: bool) -> ShardResult<Vec<LogRecord>> {
    let files = util::list_shard_files(base_dir)?;

    let per_shard: Vec<Vec<LogRecord>> = if parallel && files.len() > 1 {
        files
            .par_iter()
            .map(|(_, path)| read_shard_records(path))
            .collect::<ShardResult<_>>()?
    } else {
        files
            .iter()
            .map(|(_, path)| read_shard_records(path))
            .collect::<ShardResult<_>>()?
    };

    Ok(per_shard.into_iter().flatten().collect())
}

/// Read the records of one shard file
///
/// Blank lines, malformed JSON and non-object values are skipped one line at a
/// time; a torn final line from an in-flight append is just another malformed
/// line. A missing file yields nothing.
pub fn read_shard_records(path: &Path) -> ShardResult<Vec<LogRecord>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(ShardError::file_error(
                path,
                format!("Failed to open shard file: {}", e),
            ))
        }
    };

    let mut records = Vec::new();

    for line in BufReader::new(file).split(b'\n') {
        let line = line?;
        let trimmed = line.trim_ascii();
        if trimmed.is_empty() {
            continue;
        }

        if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(trimmed) {
            records.push(LogRecord::from(map));
        }
    }

    Ok(records)
}

/// Builder for creating and running queries against a store
pub struct QueryBuilder<'a> {
    store: &'a LogStore,
    query: Query,
}

impl<'a> QueryBuilder<'a> {
    /// Create a new query builder
    pub(crate) fn new(store: &'a LogStore, query: Query) -> Self {
        Self { store, query }
    }

    /// Set the time range
    pub fn in_time_range(mut self, range: TimeRange) -> Self {
        self.query.time_range = range;
        self
    }

    /// Only records at or after `start`
    pub fn since(mut self, start: impl IntoUtc) -> Self {
        self.query.time_range.start = Some(start.into_utc());
        self
    }

    /// Only records at or before `end`
    pub fn until(mut self, end: impl IntoUtc) -> Self {
        self.query.time_range.end = Some(end.into_utc());
        self
    }

    /// Set time range to last N hours
    pub fn in_last_hours(mut self, hours: i64) -> Self {
        self.query.time_range = TimeRange::last_hours(hours);
        self
    }

    /// Set time range to last N days
    pub fn in_last_days(mut self, days: i64) -> Self {
        self.query.time_range = TimeRange::last_days(days);
        self
    }

    /// Replace all field filters
    pub fn with_filters(mut self, filters: QueryFilters) -> Self {
        self.query.filters = filters;
        self
    }

    /// Filter by level (case-insensitive)
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.query.filters.level = Some(level.into());
        self
    }

    /// Filter by path substring (case-insensitive)
    pub fn with_path_filter(mut self, path: impl Into<String>) -> Self {
        self.query.filters.path_filter = Some(path.into());
        self
    }

    /// Set maximum number of results
    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = limit;
        self
    }

    /// Set number of results to skip
    pub fn offset(mut self, offset: usize) -> Self {
        self.query.offset = offset;
        self
    }

    /// Disable parallel shard parsing
    pub fn disable_parallel(mut self) -> Self {
        self.query.parallel = false;
        self
    }

    /// Build the query
    pub fn build(self) -> Query {
        self.query
    }

    /// Execute the query
    pub fn execute(self) -> Result<QueryPage> {
        self.store.execute_query(&self.query)
    }
}
