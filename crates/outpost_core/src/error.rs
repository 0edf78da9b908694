//! Error types for Outpost core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in Outpost core operations.
///
/// Reads never produce these: corrupt or missing collections are recovered
/// as empty. Errors come from writes, from backup import validation and
/// from contract violations by callers.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error (quota exceeded, I/O, invalid key).
    #[error("storage error: {0}")]
    Storage(#[from] outpost_storage::StorageError),

    /// JSON serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A backup payload could not be parsed.
    #[error("invalid backup: {message}")]
    InvalidBackup {
        /// User-facing description of the problem.
        message: String,
    },

    /// A record with this id already exists in the collection.
    #[error("duplicate id {id:?} in collection {key}")]
    DuplicateId {
        /// Storage key of the collection.
        key: String,
        /// The conflicting id.
        id: String,
    },

    /// A stored collection cannot be parsed, so it cannot be rewritten
    /// without destroying it.
    #[error("collection {key} is corrupt and was left untouched: {reason}")]
    CorruptCollection {
        /// Storage key of the collection.
        key: String,
        /// What was wrong with the stored value.
        reason: String,
    },

    /// Operation not permitted.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid backup error.
    pub fn invalid_backup(message: impl Into<String>) -> Self {
        Self::InvalidBackup {
            message: message.into(),
        }
    }

    /// Creates a duplicate id error.
    pub fn duplicate_id(key: impl Into<String>, id: impl Into<String>) -> Self {
        Self::DuplicateId {
            key: key.into(),
            id: id.into(),
        }
    }

    /// Creates a corrupt collection error.
    pub fn corrupt_collection(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CorruptCollection {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true if the error was caused by the storage quota.
    pub fn is_quota(&self) -> bool {
        matches!(self, CoreError::Storage(e) if e.is_quota())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outpost_storage::StorageError;

    #[test]
    fn quota_passes_through() {
        let err: CoreError = StorageError::QuotaExceeded {
            needed: 2,
            available: 1,
        }
        .into();
        assert!(err.is_quota());
        assert!(!CoreError::invalid_backup("bad").is_quota());
    }

    #[test]
    fn display_messages() {
        let err = CoreError::duplicate_id("outpost_entries", "abc");
        assert_eq!(
            err.to_string(),
            "duplicate id \"abc\" in collection outpost_entries"
        );
        assert_eq!(
            CoreError::invalid_backup("invalid backup file format").to_string(),
            "invalid backup: invalid backup file format"
        );
    }
}
