//! Store configuration.

use crate::types::CollectionKind;

/// Configuration for opening a local store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Prefix shared by every storage key of this store.
    pub namespace: String,

    /// Maximum number of audit log entries kept; older entries are dropped.
    pub log_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            namespace: "outpost".into(),
            log_capacity: 2000,
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the key namespace.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Sets the audit log capacity.
    #[must_use]
    pub const fn log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = capacity;
        self
    }

    /// Builds the storage key for a slot.
    #[must_use]
    pub fn key(&self, slot: &str) -> String {
        format!("{}_{}", self.namespace, slot)
    }

    /// Storage key of an entity collection.
    #[must_use]
    pub fn collection_key(&self, kind: CollectionKind) -> String {
        self.key(kind.slot())
    }

    /// Storage key of the deletion tombstone queue.
    #[must_use]
    pub fn tombstone_key(&self) -> String {
        self.key("deleted_queue")
    }

    /// Storage key of the settings record.
    #[must_use]
    pub fn settings_key(&self) -> String {
        self.key("settings")
    }

    /// Storage key of the form draft.
    #[must_use]
    pub fn draft_key(&self) -> String {
        self.key("draft")
    }

    /// Storage key of the internal users cache.
    #[must_use]
    pub fn users_key(&self) -> String {
        self.key("users_cache")
    }

    /// Maximum length of a collection, if it is capped.
    #[must_use]
    pub fn capacity_for(&self, kind: CollectionKind) -> Option<usize> {
        match kind {
            CollectionKind::Logs => Some(self.log_capacity),
            _ => None,
        }
    }
}
