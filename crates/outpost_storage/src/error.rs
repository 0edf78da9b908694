//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The key cannot be used by this backend.
    #[error("invalid storage key {key:?}: {reason}")]
    InvalidKey {
        /// The rejected key.
        key: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The write would exceed the backend's storage quota.
    #[error("storage quota exceeded: need {needed} bytes, {available} available")]
    QuotaExceeded {
        /// Bytes the store would hold after the write.
        needed: u64,
        /// Configured quota.
        available: u64,
    },

    /// The storage is closed.
    #[error("storage is closed")]
    Closed,
}

impl StorageError {
    /// Creates an invalid key error.
    pub fn invalid_key(key: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason,
        }
    }

    /// Returns true if the failure is caused by running out of space.
    ///
    /// Callers use this to offer remedies such as pruning old logs.
    pub fn is_quota(&self) -> bool {
        matches!(self, StorageError::QuotaExceeded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_detection() {
        let err = StorageError::QuotaExceeded {
            needed: 10,
            available: 5,
        };
        assert!(err.is_quota());
        assert!(err.to_string().contains("10"));

        assert!(!StorageError::Closed.is_quota());
        assert!(!StorageError::invalid_key("a/b", "contains a path separator").is_quota());
    }
}
