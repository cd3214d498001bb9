//! Producer interface
//!
//! Request handlers hand records to a sink and move on. Nothing about the
//! write, including a dropped or failed one, is reported back to them.

use std::sync::Arc;

use tracing::warn;

use crate::record::LogRecord;
use crate::store::LogStore;

/// Fire-and-forget destination for log records
pub trait LogSink: Send + Sync {
    /// Hand a record to the sink
    fn ingest(&self, record: LogRecord);
}

impl LogSink for LogStore {
    fn ingest(&self, record: LogRecord) {
        if let Err(e) = self.write_log(record) {
            warn!(error = %e, "failed to persist log record");
        }
    }
}

impl<T: LogSink + ?Sized> LogSink for Arc<T> {
    fn ingest(&self, record: LogRecord) {
        (**self).ingest(record)
    }
}

/// Async counterpart of [`LogSink`]
#[cfg(feature = "async")]
#[async_trait::async_trait]
pub trait AsyncLogSink: Send + Sync {
    /// Hand a record to the sink
    async fn ingest(&self, record: LogRecord);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::error::Result;
    use tempfile::tempdir;

    #[test]
    fn test_ingest_swallows_errors() -> Result<()> {
        let temp_dir = tempdir()?;
        let store = Arc::new(LogStore::with_config(
            temp_dir.path(),
            StoreConfig::new().with_daily_limit(1).with_retention_days(365 * 100),
        )?);
        let sink: Arc<dyn LogSink> = store.clone();

        sink.ingest(LogRecord::new().with("timestamp", 1_700_000_000).with("level", "INFO"));
        // Over the cap and a bad timestamp: neither panics nor surfaces
        sink.ingest(LogRecord::new().with("timestamp", 1_700_000_001).with("level", "INFO"));
        sink.ingest(LogRecord::new().with("timestamp", "later"));

        let page = store.query().execute()?;
        assert_eq!(page.total, 1);
        assert_eq!(store.metrics().records_dropped, 1);

        Ok(())
    }
}
