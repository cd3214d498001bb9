//! Error handling for dayshard
//!
//! This module provides error types and result aliases for store operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::shard::ShardError;

/// Errors that can occur in store operations
#[derive(Error, Debug)]
pub enum Error {
    /// Errors related to storage operations
    #[error("Storage error: {0}")]
    Storage(String),

    /// Errors related to I/O operations
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Errors related to a specific shard file
    #[error("Shard file error for {path:?}: {message}")]
    ShardFile {
        path: PathBuf,
        message: String,
    },

    /// Errors related to configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to shard operations
    #[error("Shard error: {0}")]
    Shard(String),

    /// Errors related to timestamp handling
    #[error("Timestamp error: {0}")]
    Timestamp(String),

    /// A blocking task on the async runtime failed to complete
    #[error("Task error: {0}")]
    Task(String),

    /// Generic error type for other cases
    #[error("{0}")]
    Other(String),
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a new shard file error
    pub fn shard_file(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ShardFile {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new shard error
    pub fn shard(message: impl Into<String>) -> Self {
        Self::Shard(message.into())
    }

    /// Create a new timestamp error
    pub fn timestamp(message: impl Into<String>) -> Self {
        Self::Timestamp(message.into())
    }

    /// Create a new task error
    pub fn task(message: impl Into<String>) -> Self {
        Self::Task(message.into())
    }

    /// Create a new generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Check if this is an I/O error
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Io(_))
    }

    /// Check if this is a serialization error
    pub fn is_serialization_error(&self) -> bool {
        matches!(self, Self::Serialization(_))
    }

    /// Check if this is a timestamp error
    pub fn is_timestamp_error(&self) -> bool {
        matches!(self, Self::Timestamp(_))
    }

    /// Get a user-friendly suggestion for resolving the error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Storage(_) => Some("Check if the storage path exists and is writable".to_string()),
            Self::Io(err) if err.kind() == io::ErrorKind::NotFound => {
                Some("The specified file or directory does not exist".to_string())
            }
            Self::Io(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                Some("You don't have permission to access this file or directory".to_string())
            }
            Self::ShardFile { .. } => Some("Verify permissions on the log storage directory".to_string()),
            Self::Timestamp(_) => Some("Timestamps must be numeric seconds since the Unix epoch".to_string()),
            Self::Config(_) => Some("Review the store configuration values".to_string()),
            _ => None,
        }
    }
}

impl From<ShardError> for Error {
    fn from(err: ShardError) -> Self {
        match err {
            ShardError::Io(err) => Self::Io(err),
            ShardError::File { path, message } => Self::shard_file(path, message),
            ShardError::Timestamp(msg) => Self::Timestamp(msg),
            other => Self::Shard(other.to_string()),
        }
    }
}
