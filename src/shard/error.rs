//! Error types for the shard module
//!
//! Defines error types specific to shard operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during shard operations
#[derive(Error, Debug)]
pub enum ShardError {
    /// Error when shard ID is invalid
    #[error("Invalid shard ID: {0}")]
    InvalidId(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// File error
    #[error("File error for {path:?}: {message}")]
    File {
        path: PathBuf,
        message: String,
    },

    /// Timestamp conversion error
    #[error("Timestamp error: {0}")]
    Timestamp(String),
}

/// Result type for shard operations
pub type ShardResult<T> = std::result::Result<T, ShardError>;

impl ShardError {
    /// Create a new file error
    pub fn file_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::File {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new invalid shard ID error
    pub fn invalid_id(message: impl Into<String>) -> Self {
        Self::InvalidId(message.into())
    }

    /// Create a new timestamp error
    pub fn timestamp_error(message: impl Into<String>) -> Self {
        Self::Timestamp(message.into())
    }

    /// Check if this is an invalid ID error
    pub fn is_invalid_id(&self) -> bool {
        matches!(self, Self::InvalidId(_))
    }

    /// Check if this is an I/O error
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_error_creation() {
        let err = ShardError::file_error("/path/to/file", "file not found");
        assert!(matches!(err, ShardError::File { path, message } if path == PathBuf::from("/path/to/file") && message == "file not found"));

        let err = ShardError::invalid_id("not-a-date");
        assert!(err.is_invalid_id());
        assert_eq!(err.to_string(), "Invalid shard ID: not-a-date");
    }

    #[test]
    fn test_shard_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err = ShardError::from(io_err);
        assert!(err.is_io_error());
    }
}
