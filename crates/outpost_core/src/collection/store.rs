//! Keyed collection store over a key-value backend.

use crate::error::CoreResult;
use outpost_storage::KvBackend;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Why a stored collection could not be read as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryReason {
    /// The backend failed to read the key.
    Unreadable(String),
    /// The bytes are not valid JSON.
    Malformed(String),
    /// The JSON is valid but not an array.
    NotAnArray,
    /// Some array elements did not fit the record type and were dropped.
    InvalidElements {
        /// Number of elements dropped.
        dropped: usize,
    },
}

impl RecoveryReason {
    /// Returns true if saving the recovered collection would discard
    /// stored data that might still be salvageable.
    #[must_use]
    pub fn loses_data(&self) -> bool {
        !matches!(self, RecoveryReason::NotAnArray)
    }
}

impl fmt::Display for RecoveryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryReason::Unreadable(e) => write!(f, "unreadable: {e}"),
            RecoveryReason::Malformed(e) => write!(f, "malformed JSON: {e}"),
            RecoveryReason::NotAnArray => f.write_str("not an array"),
            RecoveryReason::InvalidElements { dropped } => {
                write!(f, "{dropped} invalid element(s) dropped")
            }
        }
    }
}

/// The result of reading a collection.
///
/// Distinguishes an absent collection from one recovered out of corrupt
/// storage. Both are non-fatal.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome<T> {
    /// The key holds no value.
    Missing,
    /// The collection was read intact.
    Loaded(Vec<T>),
    /// The stored value was corrupt; `records` is what could be salvaged.
    Recovered {
        /// Salvaged records (empty unless only some elements were invalid).
        records: Vec<T>,
        /// What was wrong with the stored value.
        reason: RecoveryReason,
    },
}

impl<T> LoadOutcome<T> {
    /// Returns the records, treating absence and corruption as empty.
    #[must_use]
    pub fn into_records(self) -> Vec<T> {
        match self {
            LoadOutcome::Missing => Vec::new(),
            LoadOutcome::Loaded(records) | LoadOutcome::Recovered { records, .. } => records,
        }
    }

    /// Returns true if the stored value was corrupt.
    #[must_use]
    pub fn is_recovered(&self) -> bool {
        matches!(self, LoadOutcome::Recovered { .. })
    }

    /// Returns the recovery reason, if any.
    #[must_use]
    pub fn recovery_reason(&self) -> Option<&RecoveryReason> {
        match self {
            LoadOutcome::Recovered { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// Generic get/save access to named record collections.
///
/// Each collection is one JSON array stored under one key. Reads never
/// fail: a missing key is an empty collection and corrupt content is
/// recovered (and logged). Writes replace the whole collection and their
/// failures surface to the caller.
#[derive(Clone)]
pub struct CollectionStore {
    backend: Arc<dyn KvBackend>,
}

impl CollectionStore {
    /// Creates a store over the given backend.
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self { backend }
    }

    /// Returns the underlying backend.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn KvBackend> {
        &self.backend
    }

    /// Reads the collection at `key`, reporting any recovery.
    pub fn load_checked<T: DeserializeOwned>(&self, key: &str) -> LoadOutcome<T> {
        let bytes = match self.backend.get(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return LoadOutcome::Missing,
            Err(e) => return recovered(key, Vec::new(), RecoveryReason::Unreadable(e.to_string())),
        };

        let value: Value = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => return recovered(key, Vec::new(), RecoveryReason::Malformed(e.to_string())),
        };

        let Value::Array(items) = value else {
            return recovered(key, Vec::new(), RecoveryReason::NotAnArray);
        };

        let total = items.len();
        let records: Vec<T> = items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect();

        if records.len() < total {
            let dropped = total - records.len();
            return recovered(key, records, RecoveryReason::InvalidElements { dropped });
        }

        LoadOutcome::Loaded(records)
    }

    /// Reads the collection at `key`; absent or corrupt reads as empty.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        self.load_checked(key).into_records()
    }

    /// Reads the collection at `key` as raw JSON values.
    pub fn load_raw(&self, key: &str) -> Vec<Value> {
        self.load(key)
    }

    /// Replaces the collection at `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backend write fails
    /// (for example when the storage quota is exceeded).
    pub fn save<T: Serialize>(&self, key: &str, records: &[T]) -> CoreResult<()> {
        let bytes = serde_json::to_vec(records)?;
        self.backend.put(key, &bytes)?;
        debug!(key, records = records.len(), bytes = bytes.len(), "collection saved");
        Ok(())
    }

    /// Replaces the collection at `key` with raw JSON values.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    pub fn save_raw(&self, key: &str, values: &[Value]) -> CoreResult<()> {
        self.save(key, values)
    }

    /// Reads a single-value slot (settings, draft).
    ///
    /// Returns `None` if the key is absent or its content does not parse.
    pub fn read_value<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.backend.get(key) {
            Ok(bytes) => bytes?,
            Err(e) => {
                warn!(key, error = %e, "slot unreadable");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "slot malformed, ignoring");
                None
            }
        }
    }

    /// Writes a single-value slot.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backend write fails.
    pub fn write_value<T: Serialize>(&self, key: &str, value: &T) -> CoreResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.backend.put(key, &bytes)?;
        Ok(())
    }

    /// Removes whatever is stored at `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn remove(&self, key: &str) -> CoreResult<()> {
        self.backend.remove(key)?;
        Ok(())
    }
}

impl fmt::Debug for CollectionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionStore").finish_non_exhaustive()
    }
}

fn recovered<T>(key: &str, records: Vec<T>, reason: RecoveryReason) -> LoadOutcome<T> {
    warn!(key, %reason, salvaged = records.len(), "recovered corrupt collection");
    LoadOutcome::Recovered { records, reason }
}
