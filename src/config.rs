//! Configuration for dayshard
//!
//! This module provides configuration options for the log store.

use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Serialize, Deserialize};

use crate::error::{Result, Error};

/// Default storage directory
pub const DEFAULT_DIRECTORY: &str = "logs";

/// Configuration options for a log store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct StoreConfig {
    // Storage configuration
    /// Directory holding the daily shard files
    pub directory: PathBuf,
    /// Maximum number of records admitted into one day's shard
    pub daily_limit: usize,

    // Retention policy
    /// Number of days to retain logs
    pub retention_days: u32,
    /// Minimum number of seconds between opportunistic retention sweeps
    pub retention_check_interval_secs: u64,

    // Query settings
    /// Default page size for queries
    pub default_query_limit: usize,
    /// Default number of records returned by recent-log lookups
    pub default_recent_limit: usize,
    /// Whether to parse shard files in parallel during queries
    pub parallel_query_execution: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            // Storage configuration
            directory: PathBuf::from(DEFAULT_DIRECTORY),
            daily_limit: 1000,

            // Retention policy
            retention_days: 7,
            retention_check_interval_secs: 60 * 60,

            // Query settings
            default_query_limit: 100,
            default_recent_limit: 20,
            parallel_query_execution: true,
        }
    }
}

impl StoreConfig {
    /// Create a new store configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the storage directory
    pub fn with_directory<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.directory = path.as_ref().to_path_buf();
        self
    }

    /// Set the daily record limit
    pub fn with_daily_limit(mut self, limit: usize) -> Self {
        self.daily_limit = limit;
        self
    }

    /// Set the number of days to retain logs
    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = days;
        self
    }

    /// Set the interval in seconds between retention sweeps
    pub fn with_retention_check_interval_secs(mut self, secs: u64) -> Self {
        self.retention_check_interval_secs = secs;
        self
    }

    /// Set the default query page size
    pub fn with_default_query_limit(mut self, limit: usize) -> Self {
        self.default_query_limit = limit;
        self
    }

    /// Set the default number of recent records
    pub fn with_default_recent_limit(mut self, limit: usize) -> Self {
        self.default_recent_limit = limit;
        self
    }

    /// Set whether to parse shard files in parallel during queries
    pub fn with_parallel_query_execution(mut self, parallel: bool) -> Self {
        self.parallel_query_execution = parallel;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.directory.as_os_str().is_empty() {
            return Err(Error::config(
                "Storage directory must not be empty"
            ));
        }

        if self.daily_limit < 1 {
            return Err(Error::config(
                "Daily limit must be at least 1"
            ));
        }

        if self.retention_days < 1 {
            return Err(Error::config(
                "Retention days must be at least 1"
            ));
        }

        if self.retention_check_interval_secs < 1 {
            return Err(Error::config(
                "Retention check interval must be at least 1 second"
            ));
        }

        Ok(())
    }

    /// Get retention check interval as a Duration
    pub fn retention_check_interval(&self) -> Duration {
        Duration::from_secs(self.retention_check_interval_secs)
    }

    /// Create a human-readable string representation of the configuration
    pub fn to_string_pretty(&self) -> String {
        let mut result = String::new();

        result.push_str("=== dayshard Configuration ===\n\n");

        result.push_str("Storage Configuration:\n");
        result.push_str(&format!("  Directory: {:?}\n", self.directory));
        result.push_str(&format!("  Daily Limit: {}\n", self.daily_limit));

        result.push_str("\nRetention Policy:\n");
        result.push_str(&format!("  Retention Days: {}\n", self.retention_days));
        result.push_str(&format!("  Retention Check Interval: {} seconds\n", self.retention_check_interval_secs));

        result.push_str("\nQuery Settings:\n");
        result.push_str(&format!("  Default Query Limit: {}\n", self.default_query_limit));
        result.push_str(&format!("  Default Recent Limit: {}\n", self.default_recent_limit));
        result.push_str(&format!("  Parallel Query Execution: {}\n", self.parallel_query_execution));

        result
    }

    /// Load configuration from a TOML file
    #[cfg(feature = "toml")]
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    #[cfg(feature = "toml")]
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize to TOML: {}", e)))?;

        std::fs::write(path, content)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();

        assert_eq!(config.directory, PathBuf::from("logs"));
        assert_eq!(config.daily_limit, 1000);
        assert_eq!(config.retention_days, 7);
        assert_eq!(config.retention_check_interval_secs, 3600);
        assert_eq!(config.default_query_limit, 100);
        assert_eq!(config.default_recent_limit, 20);
        assert!(config.parallel_query_execution);

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = StoreConfig::new()
            .with_directory("/var/log/app")
            .with_daily_limit(50)
            .with_retention_days(30)
            .with_retention_check_interval_secs(60)
            .with_parallel_query_execution(false);

        assert_eq!(config.directory, PathBuf::from("/var/log/app"));
        assert_eq!(config.daily_limit, 50);
        assert_eq!(config.retention_days, 30);
        assert_eq!(config.retention_check_interval(), Duration::from_secs(60));
        assert!(!config.parallel_query_execution);

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let invalid_configs = vec![
            StoreConfig::new().with_directory(""),
            StoreConfig::new().with_daily_limit(0),
            StoreConfig::new().with_retention_days(0),
            StoreConfig::new().with_retention_check_interval_secs(0),
        ];

        for config in invalid_configs {
            assert!(matches!(config.validate(), Err(Error::Config(_))));
        }
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: StoreConfig = serde_json::from_str(r#"{"daily_limit": 5}"#).unwrap();
        assert_eq!(config.daily_limit, 5);
        assert_eq!(config.retention_days, 7);
    }

    #[test]
    fn test_config_pretty_string() {
        let pretty = StoreConfig::new().to_string_pretty();

        assert!(pretty.contains("Storage Configuration:"));
        assert!(pretty.contains("Retention Policy:"));
        assert!(pretty.contains("Query Settings:"));
        assert!(pretty.contains("Daily Limit: 1000"));
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_toml_round_trip() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("store.toml");

        let config = StoreConfig::new().with_daily_limit(10).with_retention_days(3);
        config.to_toml_file(&path)?;

        assert_eq!(StoreConfig::from_toml_file(&path)?, config);
        Ok(())
    }
}
