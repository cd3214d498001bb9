//! Retention enforcement
//!
//! Shards whose day starts before the retention cutoff are deleted whole.
//! Sweeps are best-effort and idempotent: a file that vanished under us is
//! already what we wanted, and files that aren't dated shards are left alone.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tracing::{debug, info};

use crate::shard::{resolver, util, ShardId, ShardResult};

/// Check-then-run guard limiting how often sweeps happen
#[derive(Debug, Clone, Default)]
pub struct RetentionGate {
    last_run: Option<DateTime<Utc>>,
}

impl RetentionGate {
    /// Create a gate that has never run
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a run if at least `interval` has passed since the last one
    ///
    /// On success the run time is recorded immediately, so concurrent callers
    /// see the gate closed. A clock that moved backwards keeps the gate closed.
    pub fn try_begin(&mut self, now: DateTime<Utc>, interval: Duration) -> bool {
        if let Some(last) = self.last_run {
            match (now - last).to_std() {
                Ok(elapsed) if elapsed >= interval => {}
                _ => return false,
            }
        }

        self.last_run = Some(now);
        true
    }

    /// Forget the last run
    pub fn reset(&mut self) {
        self.last_run = None;
    }

    /// Time of the last run, if any
    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        self.last_run
    }
}

/// Compute the retention cutoff for `now`
pub fn cutoff(now: DateTime<Utc>, retention_days: u32) -> DateTime<Utc> {
    now.checked_sub_signed(ChronoDuration::days(retention_days as i64))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Delete every shard whose day starts strictly before `cutoff`
///
/// Returns the IDs of the shards actually removed.
pub fn sweep_expired(base_dir: &Path, cutoff: DateTime<Utc>) -> ShardResult<Vec<ShardId>> {
    let mut removed = Vec::new();

    for (shard_id, path) in util::list_shard_files(base_dir)? {
        let start = match resolver::parse_shard_id(&shard_id) {
            Ok(start) => start,
            Err(_) => {
                debug!(file = %path.display(), "skipping file with unparseable shard name");
                continue;
            }
        };

        if start >= cutoff {
            continue;
        }

        if util::delete_shard_file(&path)? {
            info!(shard = %shard_id, "deleted expired shard");
            removed.push(shard_id);
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_gate_rate_limits() {
        let mut gate = RetentionGate::new();
        let hour = Duration::from_secs(3600);
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        assert!(gate.try_begin(t0, hour));
        assert!(!gate.try_begin(t0 + ChronoDuration::minutes(59), hour));
        assert!(!gate.try_begin(t0 - ChronoDuration::hours(2), hour));
        assert!(gate.try_begin(t0 + ChronoDuration::hours(1), hour));
        assert_eq!(gate.last_run(), Some(t0 + ChronoDuration::hours(1)));

        gate.reset();
        assert!(gate.try_begin(t0, hour));
        assert!(!gate.try_begin(t0 + ChronoDuration::minutes(1), hour));
    }

    #[test]
    fn test_cutoff() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
        assert_eq!(cutoff(now, 7), Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap());
        assert_eq!(cutoff(now, u32::MAX), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn test_sweep_expired() -> ShardResult<()> {
        let temp_dir = tempdir()?;
        for name in ["2024-01-02.jsonl", "2024-01-03.jsonl", "2024-01-04.jsonl", "archive.jsonl", "2024-01-01.txt"] {
            File::create(temp_dir.path().join(name))?;
        }

        let cutoff = Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap();
        let removed = sweep_expired(temp_dir.path(), cutoff)?;

        // The shard for the cutoff's own day starts before it, so it goes too
        assert_eq!(removed, vec!["2024-01-02".to_string(), "2024-01-03".to_string()]);
        assert!(temp_dir.path().join("2024-01-04.jsonl").exists());
        assert!(temp_dir.path().join("archive.jsonl").exists());
        assert!(temp_dir.path().join("2024-01-01.txt").exists());

        // Idempotent
        assert!(sweep_expired(temp_dir.path(), cutoff)?.is_empty());

        Ok(())
    }

    #[test]
    fn test_sweep_missing_directory() -> ShardResult<()> {
        let temp_dir = tempdir()?;
        let removed = sweep_expired(&temp_dir.path().join("gone"), Utc::now())?;
        assert!(removed.is_empty());
        Ok(())
    }
}
