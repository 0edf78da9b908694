//! Storage backend trait definition.

use crate::error::{StorageError, StorageResult};

/// A low-level keyed storage backend for Outpost.
///
/// Storage backends are **opaque byte stores**. Each key addresses one slot
/// holding one value; Outpost owns the interpretation of those bytes
/// (JSON collections, the tombstone queue, settings).
///
/// # Invariants
///
/// - `get` returns exactly the bytes of the last successful `put` for that key
/// - `put` replaces the value as a whole; readers never observe a partial value
/// - A failed `put` leaves the previous value intact
/// - Writes to different keys are independent (no cross-key transactions)
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait KvBackend: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key has never been written or was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or an I/O error occurs.
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The key is invalid for this backend
    /// - The write would exceed the backend quota
    /// - An I/O error occurs
    fn put(&self, key: &str, value: &[u8]) -> StorageResult<()>;

    /// Removes the value stored under `key`.
    ///
    /// Removing a key that does not exist succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or an I/O error occurs.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Returns all keys currently holding a value, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the key listing cannot be read.
    fn keys(&self) -> StorageResult<Vec<String>>;

    /// Returns the total number of value bytes held by the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Returns true if `key` currently holds a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read fails.
    fn contains(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Checks that `key` is usable by every backend.
///
/// Keys must be non-empty, must not start with `.` and may only contain
/// ASCII letters, digits, `_`, `-` and `.`. This keeps keys valid as file
/// names for [`super::FileBackend`].
///
/// # Errors
///
/// Returns [`StorageError::InvalidKey`] describing the first violation.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::invalid_key(key, "key is empty"));
    }
    if key.starts_with('.') {
        return Err(StorageError::invalid_key(key, "key starts with '.'"));
    }
    if !key
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'))
    {
        return Err(StorageError::invalid_key(
            key,
            "key contains characters outside [A-Za-z0-9_.-]",
        ));
    }
    Ok(())
}
