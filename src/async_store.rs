//! Async wrapper around [`LogStore`]
//!
//! Every operation touches the filesystem, so each one runs on tokio's
//! blocking pool and the caller awaits the result.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::{Error, Result};
use crate::metrics::MetricsSnapshot;
use crate::query::{QueryFilters, QueryPage};
use crate::record::LogRecord;
use crate::shard::{ShardId, ShardInfo};
use crate::sink::AsyncLogSink;
use crate::store::{LogStore, WriteOutcome};

/// A [`LogStore`] usable from async code
#[derive(Debug, Clone)]
pub struct AsyncLogStore {
    inner: Arc<LogStore>,
}

impl AsyncLogStore {
    /// Wrap a store
    pub fn new(store: LogStore) -> Self {
        Self { inner: Arc::new(store) }
    }

    /// Wrap a shared store
    pub fn from_arc(inner: Arc<LogStore>) -> Self {
        Self { inner }
    }

    /// Borrow the underlying store
    pub fn inner(&self) -> &Arc<LogStore> {
        &self.inner
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&LogStore) -> Result<T> + Send + 'static,
    {
        let store = self.inner.clone();
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| Error::task(format!("Blocking task failed: {}", e)))?
    }

    /// See [`LogStore::write_log`]
    pub async fn write_log(&self, record: LogRecord) -> Result<WriteOutcome> {
        self.run(move |store| store.write_log(record)).await
    }

    /// See [`LogStore::query_logs`]
    pub async fn query_logs(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        filters: QueryFilters,
        limit: usize,
        offset: usize,
    ) -> Result<QueryPage> {
        self.run(move |store| store.query_logs(start, end, &filters, limit, offset))
            .await
    }

    /// See [`LogStore::get_recent_logs`]
    pub async fn get_recent_logs(&self, limit: usize) -> Result<Vec<LogRecord>> {
        self.run(move |store| store.get_recent_logs(limit)).await
    }

    /// See [`LogStore::cleanup_old_files`]
    pub async fn cleanup_old_files(&self, days: u32) -> Result<Vec<ShardId>> {
        self.run(move |store| store.cleanup_old_files(days)).await
    }

    /// See [`LogStore::clear_all`]
    pub async fn clear_all(&self) -> Result<usize> {
        self.run(|store| store.clear_all()).await
    }

    /// See [`LogStore::rotate_files`]
    pub async fn rotate_files(&self) -> Result<()> {
        self.inner.rotate_files()
    }

    /// See [`LogStore::list_shards`]
    pub async fn list_shards(&self) -> Result<Vec<ShardInfo>> {
        self.run(|store| store.list_shards()).await
    }

    /// See [`LogStore::metrics`]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics()
    }
}

impl From<LogStore> for AsyncLogStore {
    fn from(store: LogStore) -> Self {
        Self::new(store)
    }
}

#[async_trait]
impl AsyncLogSink for AsyncLogStore {
    async fn ingest(&self, record: LogRecord) {
        if let Err(e) = self.write_log(record).await {
            warn!(error = %e, "failed to persist log record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use tempfile::tempdir;

    const T: i64 = 1_700_000_000;

    fn open(dir: &std::path::Path, daily_limit: usize) -> Result<AsyncLogStore> {
        let store = LogStore::with_config(
            dir,
            StoreConfig::new()
                .with_daily_limit(daily_limit)
                .with_retention_days(365 * 100),
        )?;
        Ok(store.into())
    }

    #[tokio::test]
    async fn test_async_write_and_query() -> Result<()> {
        let temp_dir = tempdir()?;
        let store = open(temp_dir.path(), 1000)?;

        store.write_log(LogRecord::new().with("timestamp", T).with("level", "INFO")).await?;
        store.write_log(LogRecord::new().with("timestamp", T + 1).with("level", "ERROR")).await?;

        let page = store
            .query_logs(None, None, QueryFilters::new().with_level("error"), 10, 0)
            .await?;
        assert_eq!(page.total, 1);

        let recent = store.get_recent_logs(5).await?;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].level(), Some("ERROR"));

        store.rotate_files().await?;
        assert_eq!(store.list_shards().await?.len(), 1);
        assert_eq!(store.clear_all().await?, 1);
        assert!(store.get_recent_logs(5).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_async_concurrent_ingest() -> Result<()> {
        let temp_dir = tempdir()?;
        let store = open(temp_dir.path(), 25)?;

        let mut handles = Vec::new();
        for i in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.ingest(LogRecord::new().with("timestamp", T + i)).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let page = store.query_logs(None, None, QueryFilters::new(), 100, 0).await?;
        assert_eq!(page.total, 25);
        assert_eq!(store.metrics().records_dropped, 25);

        Ok(())
    }

    #[tokio::test]
    async fn test_async_cleanup() -> Result<()> {
        let temp_dir = tempdir()?;
        let store = open(temp_dir.path(), 10)?;

        let path = crate::shard::util::shard_path(temp_dir.path(), "2023-11-14");
        crate::shard::util::append_line(&path, &format!("{{\"timestamp\": {}}}", T))?;

        let removed = store.cleanup_old_files(1).await?;
        assert_eq!(removed, vec!["2023-11-14".to_string()]);
        assert_eq!(store.inner().retention_days(), 1);

        // The sweep just ran, so the next one waits for the interval
        store.write_log(LogRecord::new().with("timestamp", T)).await?;
        assert!(store.cleanup_old_files(1).await?.is_empty());
        assert!(path.exists());

        Ok(())
    }
}
