//! Shard information data structures

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::shard::{resolver, util, ShardId, ShardResult};

/// Information about a shard file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardInfo {
    /// Shard ID (`YYYY-MM-DD`)
    pub id: ShardId,
    /// Path of the shard file
    pub path: PathBuf,
    /// Size of the file in bytes
    pub size_bytes: u64,
}

impl ShardInfo {
    /// Start of the day this shard covers, if the ID is a valid date
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        resolver::parse_shard_id(&self.id).ok()
    }

    /// Check if a timestamp falls in this shard's day
    pub fn contains_timestamp(&self, timestamp: &DateTime<Utc>) -> bool {
        resolver::shard_range(&self.id)
            .map(|(start, end)| *timestamp >= start && *timestamp < end)
            .unwrap_or(false)
    }

    /// Check if the shard file is empty
    pub fn is_empty(&self) -> bool {
        self.size_bytes == 0
    }
}

/// Describe every shard file in a directory, sorted by ID
///
/// Files removed between listing and inspection are left out.
pub fn collect_shard_info(base_dir: &std::path::Path) -> ShardResult<Vec<ShardInfo>> {
    let mut infos = Vec::new();

    for (id, path) in util::list_shard_files(base_dir)? {
        match fs::metadata(&path) {
            Ok(meta) => infos.push(ShardInfo {
                id,
                path,
                size_bytes: meta.len(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(infos)
}
