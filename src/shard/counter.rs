//! Per-shard write counters
//!
//! A process-local cache of how many records each daily shard holds. Entries
//! are populated lazily from the line count of the shard file and kept in step
//! by reserving a slot before every append. The cache is the authority for the
//! daily cap; it is not reconciled with out-of-band edits to the files.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use super::{util, ShardId, ShardResult};

/// Outcome of trying to reserve a slot in a shard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    /// A slot was reserved; the counter now includes it
    Reserved {
        /// Counter value after the reservation
        count: usize,
    },
    /// The shard already holds `limit` records
    Full,
}

/// Write counters keyed by shard ID
#[derive(Debug, Default)]
pub struct DailyCounters {
    counts: HashMap<ShardId, usize>,
}

impl DailyCounters {
    /// Create an empty counter cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached count for a shard without touching the disk
    pub fn get(&self, shard_id: &str) -> Option<usize> {
        self.counts.get(shard_id).copied()
    }

    /// Get the count for a shard, populating it from `path` on a miss
    pub fn get_or_populate(&mut self, shard_id: &str, path: &Path) -> ShardResult<usize> {
        if let Some(count) = self.counts.get(shard_id) {
            return Ok(*count);
        }

        let count = util::count_lines(path)?;
        debug!(shard = shard_id, count, "populated shard write counter");
        self.counts.insert(shard_id.to_string(), count);

        Ok(count)
    }

    /// Reserve one slot in a shard unless it already holds `limit` records
    pub fn try_reserve(&mut self, shard_id: &str, path: &Path, limit: usize) -> ShardResult<Reservation> {
        let count = self.get_or_populate(shard_id, path)?;

        if count >= limit {
            return Ok(Reservation::Full);
        }

        let count = count + 1;
        self.counts.insert(shard_id.to_string(), count);

        Ok(Reservation::Reserved { count })
    }

    /// Drop the cached counts for shards whose files are gone
    pub fn evict<'a, I>(&mut self, shard_ids: I)
    where
        I: IntoIterator<Item = &'a ShardId>,
    {
        for shard_id in shard_ids {
            self.counts.remove(shard_id);
        }
    }

    /// Drop every cached count
    pub fn clear(&mut self) {
        self.counts.clear();
    }

    /// Number of shards with a cached count
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check if no shard has a cached count
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_populate_from_existing_file() -> ShardResult<()> {
        let temp_dir = tempdir()?;
        let path = util::shard_path(temp_dir.path(), "2024-02-01");
        util::append_line(&path, "{}")?;
        util::append_line(&path, "not json")?;

        let mut counters = DailyCounters::new();
        assert_eq!(counters.get("2024-02-01"), None);
        assert_eq!(counters.get_or_populate("2024-02-01", &path)?, 2);

        // Cached value wins over the file afterwards
        util::append_line(&path, "{}")?;
        assert_eq!(counters.get_or_populate("2024-02-01", &path)?, 2);

        Ok(())
    }

    #[test]
    fn test_reserve_until_full() -> ShardResult<()> {
        let temp_dir = tempdir()?;
        let path = util::shard_path(temp_dir.path(), "2024-02-01");

        let mut counters = DailyCounters::new();
        assert_eq!(counters.try_reserve("2024-02-01", &path, 2)?, Reservation::Reserved { count: 1 });
        assert_eq!(counters.try_reserve("2024-02-01", &path, 2)?, Reservation::Reserved { count: 2 });
        assert_eq!(counters.try_reserve("2024-02-01", &path, 2)?, Reservation::Full);
        assert_eq!(counters.get("2024-02-01"), Some(2));

        Ok(())
    }

    #[test]
    fn test_evict_and_clear() -> ShardResult<()> {
        let temp_dir = tempdir()?;
        let mut counters = DailyCounters::new();

        for id in ["2024-01-01", "2024-01-02", "2024-01-03"] {
            let path = util::shard_path(temp_dir.path(), id);
            counters.try_reserve(id, &path, 10)?;
        }
        assert_eq!(counters.len(), 3);

        let gone = vec!["2024-01-01".to_string(), "2024-01-09".to_string()];
        counters.evict(&gone);
        assert_eq!(counters.len(), 2);
        assert_eq!(counters.get("2024-01-01"), None);

        counters.clear();
        assert!(counters.is_empty());

        Ok(())
    }
}
