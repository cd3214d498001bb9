use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use parking_lot::Mutex;

/// Operation metrics for a log store
#[derive(Debug)]
pub struct StoreMetrics {
    // Write path
    /// Number of records appended
    records_written: AtomicUsize,
    /// Number of records dropped by the daily limit
    records_dropped: AtomicUsize,
    /// Total bytes appended, newlines included
    bytes_written: AtomicUsize,
    /// Total append duration in nanoseconds
    write_duration_ns: AtomicU64,

    // Query path
    /// Number of queries executed
    query_count: AtomicUsize,
    /// Number of records returned by queries
    query_result_count: AtomicUsize,
    /// Total query duration in nanoseconds
    query_duration_ns: AtomicU64,

    // Retention
    /// Number of sweeps run
    sweep_count: AtomicUsize,
    /// Number of shard files removed by sweeps or clears
    shards_removed: AtomicUsize,
    /// Duration of the most recent sweep
    last_sweep_duration: Mutex<Duration>,

    /// Start time of the metrics collector
    start_time: Instant,
}

/// Point-in-time copy of [`StoreMetrics`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub records_written: usize,
    pub records_dropped: usize,
    pub bytes_written: usize,
    pub query_count: usize,
    pub query_result_count: usize,
    pub sweep_count: usize,
    pub shards_removed: usize,
    pub avg_write_duration: Duration,
    pub avg_query_duration: Duration,
    pub last_sweep_duration: Duration,
    pub uptime: Duration,
}

impl Default for StoreMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            records_written: AtomicUsize::new(0),
            records_dropped: AtomicUsize::new(0),
            bytes_written: AtomicUsize::new(0),
            write_duration_ns: AtomicU64::new(0),
            query_count: AtomicUsize::new(0),
            query_result_count: AtomicUsize::new(0),
            query_duration_ns: AtomicU64::new(0),
            sweep_count: AtomicUsize::new(0),
            shards_removed: AtomicUsize::new(0),
            last_sweep_duration: Mutex::new(Duration::ZERO),
            start_time: Instant::now(),
        }
    }

    /// Record a successful append
    pub fn record_write(&self, bytes: usize, duration: Duration) {
        self.records_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
        self.write_duration_ns.fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Record a record dropped by the daily limit
    pub fn record_drop(&self) {
        self.records_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished query
    pub fn record_query(&self, results: usize, duration: Duration) {
        self.query_count.fetch_add(1, Ordering::Relaxed);
        self.query_result_count.fetch_add(results, Ordering::Relaxed);
        self.query_duration_ns.fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Record a finished retention sweep
    pub fn record_sweep(&self, removed: usize, duration: Duration) {
        self.sweep_count.fetch_add(1, Ordering::Relaxed);
        self.shards_removed.fetch_add(removed, Ordering::Relaxed);
        *self.last_sweep_duration.lock() = duration;
    }

    /// Record shard files removed outside a sweep
    pub fn add_shards_removed(&self, removed: usize) {
        self.shards_removed.fetch_add(removed, Ordering::Relaxed);
    }

    /// Get the number of dropped records
    pub fn records_dropped(&self) -> usize {
        self.records_dropped.load(Ordering::Relaxed)
    }

    /// Take a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        let records_written = self.records_written.load(Ordering::Relaxed);
        let query_count = self.query_count.load(Ordering::Relaxed);

        MetricsSnapshot {
            records_written,
            records_dropped: self.records_dropped(),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            query_count,
            query_result_count: self.query_result_count.load(Ordering::Relaxed),
            sweep_count: self.sweep_count.load(Ordering::Relaxed),
            shards_removed: self.shards_removed.load(Ordering::Relaxed),
            avg_write_duration: average(&self.write_duration_ns, records_written),
            avg_query_duration: average(&self.query_duration_ns, query_count),
            last_sweep_duration: *self.last_sweep_duration.lock(),
            uptime: self.start_time.elapsed(),
        }
    }
}

fn average(total_ns: &AtomicU64, count: usize) -> Duration {
    if count == 0 {
        return Duration::ZERO;
    }
    Duration::from_nanos(total_ns.load(Ordering::Relaxed) / count as u64)
}
