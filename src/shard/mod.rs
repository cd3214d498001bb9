//! Day-based shard management for log storage
//!
//! Logs are organized into one JSON Lines file per UTC calendar day. A shard's
//! identity is its date, `YYYY-MM-DD`, derived once from a record's timestamp
//! when the record is written.

pub mod resolver;
mod info;
mod counter;
mod error;
pub(crate) mod util;

pub use info::{collect_shard_info, ShardInfo};
pub use counter::{DailyCounters, Reservation};
pub use error::{ShardError, ShardResult};
pub use resolver::{parse_shard_id, shard_id_for, shard_id_for_timestamp};

/// Shard ID type
pub type ShardId = String;

/// File extension of shard files
pub const SHARD_EXTENSION: &str = "jsonl";
