use std::path::{Path, PathBuf};
use std::time::Instant;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::metrics::{MetricsSnapshot, StoreMetrics};
use crate::query::{Query, QueryBuilder, QueryFilters, QueryPage, TimeRange};
use crate::record::LogRecord;
use crate::retention::{self, RetentionGate};
use crate::shard::{self, util, DailyCounters, Reservation, ShardId, ShardInfo};

/// What happened to a record handed to [`LogStore::write_log`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The record was appended to its shard
    Written {
        /// Shard that received the record
        shard: ShardId,
    },
    /// The shard had reached the daily limit; nothing was written
    Dropped {
        /// Shard that was full
        shard: ShardId,
    },
}

impl WriteOutcome {
    /// Check if the record was persisted
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }

    /// Shard the record resolved to
    pub fn shard(&self) -> &str {
        match self {
            Self::Written { shard } | Self::Dropped { shard } => shard,
        }
    }
}

/// Mutable state shared by writers, guarded by one lock
#[derive(Debug)]
struct StoreState {
    /// Per-shard write counters
    counters: DailyCounters,
    /// Rate limit for opportunistic sweeps
    gate: RetentionGate,
    /// Retention currently in force; manual cleanups override the configured value
    retention_days: u32,
}

/// The day-sharded log store
pub struct LogStore {
    /// Directory holding the shard files
    base_dir: PathBuf,
    /// Store configuration
    config: StoreConfig,
    /// Counters and retention state
    state: Mutex<StoreState>,
    /// Metrics collector
    metrics: StoreMetrics,
}

impl LogStore {
    /// Create a new store with default configuration
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::open(StoreConfig::new().with_directory(dir))
    }

    /// Create a new store with custom configuration, stored under `dir`
    pub fn with_config<P: AsRef<Path>>(dir: P, config: StoreConfig) -> Result<Self> {
        Self::open(config.with_directory(dir))
    }

    /// Create a new store from a configuration
    pub fn open(config: StoreConfig) -> Result<Self> {
        config.validate()?;

        let base_dir = config.directory.clone();
        util::ensure_shards_dir(&base_dir)
            .map_err(|e| Error::storage(format!("Failed to prepare log directory: {}", e)))?;

        debug!(dir = %base_dir.display(), daily_limit = config.daily_limit, "opened log store");

        Ok(Self {
            base_dir,
            state: Mutex::new(StoreState {
                counters: DailyCounters::new(),
                gate: RetentionGate::new(),
                retention_days: config.retention_days,
            }),
            config,
            metrics: StoreMetrics::new(),
        })
    }

    /// Persist a record in the shard for its day
    ///
    /// Once a shard holds `daily_limit` records further writes to it are
    /// dropped and reported as [`WriteOutcome::Dropped`], never as an error.
    /// A successful write may trigger a retention sweep; a failing sweep is
    /// logged and does not fail the write.
    pub fn write_log(&self, record: LogRecord) -> Result<WriteOutcome> {
        let enriched = record.enrich(Utc::now())?;
        let line = enriched.to_line()?;
        let shard = enriched.shard_id;
        let path = util::shard_path(&self.base_dir, &shard);

        // The slot is reserved before the append so concurrent writers can't
        // both take the last one
        let reservation = {
            let mut state = self.state.lock();
            state.counters.try_reserve(&shard, &path, self.config.daily_limit)?
        };

        if reservation == Reservation::Full {
            self.metrics.record_drop();
            trace!(shard = %shard, "daily limit reached, dropping record");
            return Ok(WriteOutcome::Dropped { shard });
        }

        let start = Instant::now();
        util::append_line(&path, &line)?;
        self.metrics.record_write(line.len() + 1, start.elapsed());

        if let Err(e) = self.maybe_cleanup() {
            warn!(error = %e, "retention sweep failed");
        }

        Ok(WriteOutcome::Written { shard })
    }

    /// Run a retention sweep unless one ran within the check interval
    ///
    /// Returns the shards removed, empty when the sweep was skipped.
    pub fn maybe_cleanup(&self) -> Result<Vec<ShardId>> {
        let now = Utc::now();

        let retention_days = {
            let mut state = self.state.lock();
            if !state.gate.try_begin(now, self.config.retention_check_interval()) {
                return Ok(Vec::new());
            }
            state.retention_days
        };

        self.sweep(now, retention_days)
    }

    /// Set the retention to `days` and run the gated sweep
    ///
    /// The new retention sticks for every later sweep. Within the check
    /// interval of the last sweep only the setting changes.
    pub fn cleanup_old_files(&self, days: u32) -> Result<Vec<ShardId>> {
        self.state.lock().retention_days = days;
        self.maybe_cleanup()
    }

    /// Query records by time range and filters, newest first
    ///
    /// Bounds are inclusive; `None` leaves that side open.
    pub fn query_logs(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        filters: &QueryFilters,
        limit: usize,
        offset: usize,
    ) -> Result<QueryPage> {
        let query = Query {
            time_range: TimeRange { start, end },
            filters: filters.clone(),
            limit,
            offset,
            parallel: self.config.parallel_query_execution,
        };

        self.execute_query(&query)
    }

    /// Create a query builder with the configured defaults
    pub fn query(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(
            self,
            Query {
                limit: self.config.default_query_limit,
                parallel: self.config.parallel_query_execution,
                ..Query::default()
            },
        )
    }

    /// Execute a query
    pub fn execute_query(&self, query: &Query) -> Result<QueryPage> {
        let start = Instant::now();
        let page = query.execute_in(&self.base_dir)?;
        let duration = start.elapsed();

        self.metrics.record_query(page.records.len(), duration);
        debug!(total = page.total, returned = page.records.len(), ?duration, "query finished");

        Ok(page)
    }

    /// Get the most recent records, newest first
    pub fn get_recent_logs(&self, limit: usize) -> Result<Vec<LogRecord>> {
        let page = self.query_logs(None, None, &QueryFilters::default(), limit, 0)?;
        Ok(page.records)
    }

    /// Get the configured default number of recent records
    pub fn recent_logs(&self) -> Result<Vec<LogRecord>> {
        self.get_recent_logs(self.config.default_recent_limit)
    }

    /// Delete every shard and reset counters and retention state
    ///
    /// Returns the number of shard files removed.
    pub fn clear_all(&self) -> Result<usize> {
        let mut state = self.state.lock();

        let result = util::remove_all_shards(&self.base_dir);

        // Whatever was deleted before a failure no longer matches the cache
        state.counters.clear();
        state.gate.reset();

        let removed = result?;
        self.metrics.add_shards_removed(removed);
        info!(removed, "cleared all shards");

        Ok(removed)
    }

    /// Rotate shard files
    ///
    /// Does nothing: a new day already means a new file.
    pub fn rotate_files(&self) -> Result<()> {
        Ok(())
    }

    /// Describe the shard files on disk, oldest first
    pub fn list_shards(&self) -> Result<Vec<ShardInfo>> {
        Ok(shard::collect_shard_info(&self.base_dir)?)
    }

    /// Cached write count for a shard, if it has one
    pub fn cached_count(&self, shard_id: &str) -> Option<usize> {
        self.state.lock().counters.get(shard_id)
    }

    /// Retention currently in force
    pub fn retention_days(&self) -> u32 {
        self.state.lock().retention_days
    }

    /// Get a snapshot of the store's metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Get the store's base directory
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get the store's configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // Internal methods

    /// Delete expired shards and forget their counters
    fn sweep(&self, now: DateTime<Utc>, retention_days: u32) -> Result<Vec<ShardId>> {
        let start = Instant::now();
        let removed = retention::sweep_expired(&self.base_dir, retention::cutoff(now, retention_days))?;

        if !removed.is_empty() {
            self.state.lock().counters.evict(&removed);
        }

        self.metrics.record_sweep(removed.len(), start.elapsed());
        debug!(removed = removed.len(), retention_days, "retention sweep finished");

        Ok(removed)
    }
}

impl std::fmt::Debug for LogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogStore")
            .field("base_dir", &self.base_dir)
            .field("daily_limit", &self.config.daily_limit)
            .finish_non_exhaustive()
    }
}
