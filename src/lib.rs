//! # dayshard
//!
//! Append-only log storage sharded by UTC calendar day.
//!
//! Each day's records live in one JSON Lines file, `<YYYY-MM-DD>.jsonl`,
//! under a single directory. Writes are capped per day, old days are swept
//! away by a rate-limited retention check, and queries scan every shard,
//! filter, sort newest first and paginate.
//!
//! ```no_run
//! use dayshard::{LogRecord, LogStore};
//!
//! # fn main() -> dayshard::Result<()> {
//! let store = LogStore::new("logs")?;
//!
//! store.write_log(
//!     LogRecord::new()
//!         .with("level", "ERROR")
//!         .with("path", "/api/orders")
//!         .with("message", "upstream timeout"),
//! )?;
//!
//! let page = store
//!     .query()
//!     .with_level("error")
//!     .in_last_hours(1)
//!     .execute()?;
//! println!("{} matching records", page.total);
//!
//! let recent = store.get_recent_logs(20)?;
//! println!("{} recent records", recent.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod query;
pub mod record;
pub mod retention;
pub mod shard;
pub mod sink;
pub mod store;

#[cfg(feature = "async")]
pub mod async_store;

pub use config::StoreConfig;
pub use error::{Error, Result};
pub use metrics::{MetricsSnapshot, StoreMetrics};
pub use query::{IntoUtc, Query, QueryBuilder, QueryFilters, QueryPage, TimeRange};
pub use record::LogRecord;
pub use shard::{ShardId, ShardInfo};
pub use sink::LogSink;
pub use store::{LogStore, WriteOutcome};

#[cfg(feature = "async")]
pub use async_store::AsyncLogStore;
#[cfg(feature = "async")]
pub use sink::AsyncLogSink;
