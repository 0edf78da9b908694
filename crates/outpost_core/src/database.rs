//! Local store facade.

use crate::collection::{Collection, CollectionStore};
use crate::config::StoreConfig;
use crate::entities::{
    AppLog, BreakfastRecord, Meter, MeterReading, PackageRecord, PatrolRecord, VehicleEntry,
    WorkShift,
};
use crate::entity::{Document, Entity};
use crate::error::CoreResult;
use crate::sync::{MergeOutcome, TombstoneQueue};
use crate::types::CollectionKind;
use outpost_storage::{FileBackend, InMemoryBackend, KvBackend};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// The main local store handle.
///
/// `LocalDb` is the entry point for everything persisted on a station:
/// - Typed entity collections with the record lifecycle applied
/// - The deletion tombstone queue
/// - Untyped, kind-addressed access for a sync driver
/// - Settings, drafts, the users cache and backups
///
/// Every operation is a synchronous read-modify-write of one storage key.
/// The handle is cheap to share behind an `Arc`, but concurrent writers to
/// the same collection race (last write wins).
///
/// # Opening a Store
///
/// ```rust,no_run
/// use outpost_core::LocalDb;
/// use std::path::Path;
///
/// let db = LocalDb::open(Path::new("station_data")).unwrap();
/// println!("{} entries", db.entries().count());
/// ```
///
/// # In-Memory Stores
///
/// ```rust
/// let db = outpost_core::LocalDb::open_in_memory();
/// assert_eq!(db.settings().company_name, "Portaria PX");
/// ```
pub struct LocalDb {
    config: StoreConfig,
    store: CollectionStore,
    tombstones: TombstoneQueue,
}

impl LocalDb {
    /// Opens a store in a directory, creating it if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(path: &Path) -> CoreResult<Self> {
        Self::open_with_config(path, StoreConfig::default())
    }

    /// Opens a store in a directory with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open_with_config(path: &Path, config: StoreConfig) -> CoreResult<Self> {
        let backend = FileBackend::open_with_create_dirs(path)?;
        info!(path = %path.display(), namespace = %config.namespace, "local store opened");
        Ok(Self::with_backend(Arc::new(backend), config))
    }

    /// Opens a fresh in-memory store.
    #[must_use]
    pub fn open_in_memory() -> Self {
        Self::open_in_memory_with_config(StoreConfig::default())
    }

    /// Opens a fresh in-memory store with custom configuration.
    #[must_use]
    pub fn open_in_memory_with_config(config: StoreConfig) -> Self {
        Self::with_backend(Arc::new(InMemoryBackend::new()), config)
    }

    /// Creates a store over any backend.
    pub fn with_backend(backend: Arc<dyn KvBackend>, config: StoreConfig) -> Self {
        let store = CollectionStore::new(backend);
        let tombstones = TombstoneQueue::new(store.clone(), config.tombstone_key());
        Self {
            config,
            store,
            tombstones,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the underlying collection store.
    #[must_use]
    pub fn store(&self) -> &CollectionStore {
        &self.store
    }

    /// Returns the deletion tombstone queue.
    #[must_use]
    pub fn tombstones(&self) -> &TombstoneQueue {
        &self.tombstones
    }

    /// Returns the typed collection of `T`.
    pub fn collection<T: Entity>(&self) -> Collection<'_, T> {
        Collection::new(
            &self.store,
            &self.tombstones,
            self.config.collection_key(T::COLLECTION),
            self.config.capacity_for(T::COLLECTION),
        )
    }

    /// Gate log entries.
    pub fn entries(&self) -> Collection<'_, VehicleEntry> {
        self.collection()
    }

    /// Utility meters.
    pub fn meters(&self) -> Collection<'_, Meter> {
        self.collection()
    }

    /// Meter readings.
    pub fn readings(&self) -> Collection<'_, MeterReading> {
        self.collection()
    }

    /// Received packages.
    pub fn packages(&self) -> Collection<'_, PackageRecord> {
        self.collection()
    }

    /// Work shifts.
    pub fn shifts(&self) -> Collection<'_, WorkShift> {
        self.collection()
    }

    /// Breakfast list.
    pub fn breakfast(&self) -> Collection<'_, BreakfastRecord> {
        self.collection()
    }

    /// Patrol rounds.
    pub fn patrols(&self) -> Collection<'_, PatrolRecord> {
        self.collection()
    }

    /// Audit log.
    pub fn logs(&self) -> Collection<'_, AppLog> {
        self.collection()
    }

    // Kind-addressed access. These work on untyped documents so a sync
    // driver never drops fields the concrete types do not model.

    /// Returns the unsynced records of a collection.
    pub fn unsynced(&self, kind: CollectionKind) -> Vec<Document> {
        self.store
            .get_unsynced_items(&self.config.collection_key(kind))
    }

    /// Marks records of a collection as synced. Returns how many matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn mark_synced<I, S>(&self, kind: CollectionKind, ids: I) -> CoreResult<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.store
            .mark_as_synced(&self.config.collection_key(kind), ids)
    }

    /// Merges a remote batch into a collection.
    pub fn merge_from_cloud<I>(&self, kind: CollectionKind, batch: I) -> MergeOutcome
    where
        I: IntoIterator<Item = Document>,
    {
        self.store
            .upsert_from_cloud(&self.config.collection_key(kind), batch)
    }

    /// Returns every record of a collection as untyped documents.
    pub fn documents(&self, kind: CollectionKind) -> Vec<Document> {
        self.store.load(&self.config.collection_key(kind))
    }
}

impl std::fmt::Debug for LocalDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalDb")
            .field("namespace", &self.config.namespace)
            .field("pending_tombstones", &self.tombstones.len())
            .finish_non_exhaustive()
    }
}
