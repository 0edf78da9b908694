//! In-memory storage backend for testing.

use crate::backend::{validate_key, KvBackend};
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// An in-memory key-value backend.
///
/// This backend stores all values in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral stores that don't need persistence
///
/// An optional byte quota models the small storage budgets of the
/// platforms Outpost targets; writes that would exceed it fail with
/// [`StorageError::QuotaExceeded`].
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use outpost_storage::{KvBackend, InMemoryBackend};
///
/// let backend = InMemoryBackend::new();
/// backend.put("k", b"test data").unwrap();
/// assert_eq!(backend.size().unwrap(), 9);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
    quota: Option<u64>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty backend that refuses to hold more than `quota` bytes.
    #[must_use]
    pub fn with_quota(quota: u64) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            quota: Some(quota),
        }
    }

    /// Creates a backend with pre-existing values.
    ///
    /// Useful for testing recovery from corrupt or legacy data.
    #[must_use]
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            quota: None,
        }
    }

    /// Returns a copy of every stored key and value.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        self.entries.read().clone()
    }

    /// Clears all values from the backend.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl KvBackend for InMemoryBackend {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_key(key)?;
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        validate_key(key)?;
        let mut entries = self.entries.write();

        if let Some(quota) = self.quota {
            let current: u64 = entries.values().map(|v| v.len() as u64).sum();
            let replaced = entries.get(key).map_or(0, |v| v.len() as u64);
            let needed = current - replaced + value.len() as u64;
            if needed > quota {
                return Err(StorageError::QuotaExceeded {
                    needed,
                    available: quota,
                });
            }
        }

        entries.insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.entries.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.entries.read().values().map(|v| v.len() as u64).sum())
    }
}
