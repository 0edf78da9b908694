//! Typed collection implementation.

use crate::clock;
use crate::collection::{CollectionStore, LoadOutcome};
use crate::entity::{new_id, Entity, SyncRecord};
use crate::error::{CoreError, CoreResult};
use crate::sync::{MergeOutcome, TombstoneQueue};
use serde::Deserialize;
use serde_json::Value;
use std::marker::PhantomData;
use tracing::debug;

/// A typed view of one entity collection.
///
/// `Collection<T>` applies the record lifecycle to entities of type `T`:
///
/// - `add` assigns an id if none is set, stamps the creation field and
///   `updated_at`, and marks the record dirty.
/// - `update` replaces the record with the same id, re-stamps it and marks
///   it dirty. `updated_at` strictly increases on every update.
/// - `delete` removes the record and queues a tombstone for the remote
///   table.
///
/// Every mutation rewrites the whole collection. Capped collections keep
/// only their most recent entries.
///
/// # Example
///
/// ```rust
/// use outpost_core::{LocalDb, Meter};
///
/// let db = LocalDb::open_in_memory();
/// let meters = db.meters();
///
/// let meter = meters.add(Meter::new("Water", "Hydrometer")).unwrap();
/// assert!(!meter.synced);
/// assert_eq!(meters.count(), 1);
///
/// meters.delete(&meter.id).unwrap();
/// assert_eq!(db.tombstones().len(), 1);
/// ```
pub struct Collection<'a, T: Entity> {
    store: &'a CollectionStore,
    tombstones: &'a TombstoneQueue,
    key: String,
    capacity: Option<usize>,
    _marker: PhantomData<T>,
}

/// One stored element, as seen by a read-modify-write.
///
/// Elements that do not decode as `T` (a remote row with a `null` where
/// `T` expects a string, a restored backup with a mistyped field) are
/// carried as raw JSON and written back byte-for-byte.
pub(crate) enum Slot<T> {
    Typed(T),
    Opaque(Value),
}

impl<T: SyncRecord> Slot<T> {
    fn decode(value: Value) -> Self {
        match T::deserialize(&value) {
            Ok(record) => Slot::Typed(record),
            Err(_) => Slot::Opaque(value),
        }
    }

    pub(crate) fn id(&self) -> Option<&str> {
        match self {
            Slot::Typed(record) => Some(record.id()),
            Slot::Opaque(value) => value.get("id").and_then(Value::as_str),
        }
    }

    fn updated_at(&self) -> Option<&str> {
        match self {
            Slot::Typed(record) => record.updated_at(),
            Slot::Opaque(value) => value.get("updated_at").and_then(Value::as_str),
        }
    }

    pub(crate) fn as_typed_mut(&mut self) -> Option<&mut T> {
        match self {
            Slot::Typed(record) => Some(record),
            Slot::Opaque(_) => None,
        }
    }

    fn into_value(self) -> CoreResult<Value> {
        match self {
            Slot::Typed(record) => Ok(serde_json::to_value(record)?),
            Slot::Opaque(value) => Ok(value),
        }
    }
}

impl<'a, T: Entity> Collection<'a, T> {
    /// Creates a typed collection stored under `key`.
    pub fn new(
        store: &'a CollectionStore,
        tombstones: &'a TombstoneQueue,
        key: String,
        capacity: Option<usize>,
    ) -> Self {
        Self {
            store,
            tombstones,
            key,
            capacity,
            _marker: PhantomData,
        }
    }

    /// Storage key of the collection.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Remote table of the collection.
    #[must_use]
    pub fn table(&self) -> &'static str {
        T::COLLECTION.table()
    }

    /// Returns every record, in stored order.
    ///
    /// Stored elements that do not decode as `T` are skipped here but are
    /// never removed by a mutation.
    pub fn list(&self) -> Vec<T> {
        self.store.load(&self.key)
    }

    /// Gets a record by id.
    pub fn get(&self, id: &str) -> Option<T> {
        self.list().into_iter().find(|r| r.id() == id)
    }

    /// Returns the number of records.
    pub fn count(&self) -> usize {
        self.list().len()
    }

    /// Adds a new record and returns it as stored.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateId`] if a record with the same id
    /// exists, [`CoreError::CorruptCollection`] if the stored collection
    /// cannot be parsed, or a storage error if the write fails.
    pub fn add(&self, mut record: T) -> CoreResult<T> {
        let mut slots = self.load_slots()?;

        if record.id().is_empty() {
            record.set_id(new_id());
        } else if slots.iter().any(|s| s.id() == Some(record.id())) {
            return Err(CoreError::duplicate_id(&self.key, record.id()));
        }

        let now = clock::now_iso();
        record.stamp_created(&now);
        record.set_updated_at(now);
        record.set_synced(false);

        slots.push(Slot::Typed(record.clone()));
        self.persist(slots)?;
        debug!(key = %self.key, id = record.id(), "record added");
        Ok(record)
    }

    /// Replaces the record with the same id.
    ///
    /// Returns `false` without writing if no such record exists. A stored
    /// element that does not decode as `T` is replaced too.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored collection cannot be parsed or the
    /// write fails.
    pub fn update(&self, mut record: T) -> CoreResult<bool> {
        let mut slots = self.load_slots()?;
        let Some(index) = slots.iter().position(|s| s.id() == Some(record.id())) else {
            return Ok(false);
        };

        let stamp = clock::stamp_after(latest(slots[index].updated_at(), record.updated_at()));
        record.set_updated_at(stamp);
        record.set_synced(false);

        slots[index] = Slot::Typed(record);
        self.persist(slots)?;
        Ok(true)
    }

    /// Applies `f` to the record with `id`, then stores it as an update.
    ///
    /// Returns the updated record, or `None` if no record with that id
    /// decodes as `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored collection cannot be parsed or the
    /// write fails.
    pub fn modify<F>(&self, id: &str, f: F) -> CoreResult<Option<T>>
    where
        F: FnOnce(&mut T),
    {
        let mut slots = self.load_slots()?;
        let Some(record) = slots
            .iter_mut()
            .filter_map(Slot::as_typed_mut)
            .find(|r| r.id() == id)
        else {
            return Ok(None);
        };

        let previous = record.updated_at().map(str::to_owned);
        f(record);
        record.set_id(id.to_owned());
        record.set_updated_at(clock::stamp_after(previous.as_deref()));
        record.set_synced(false);
        let updated = record.clone();

        self.persist(slots)?;
        Ok(Some(updated))
    }

    /// Deletes the record with `id` and queues its tombstone.
    ///
    /// The tombstone is queued even if no local record matched, so a
    /// deletion issued against stale local state still reaches the remote
    /// store. A stored element with that id is removed whether or not it
    /// decodes as `T`. Returns whether a local record was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored collection cannot be parsed or
    /// either write fails.
    pub fn delete(&self, id: &str) -> CoreResult<bool> {
        let mut slots = self.load_slots()?;
        let before = slots.len();
        slots.retain(|s| s.id() != Some(id));

        let removed = slots.len() < before;
        if removed {
            self.persist(slots)?;
        }
        self.tombstones.enqueue(id, self.table())?;
        debug!(key = %self.key, id, removed, "record deleted");
        Ok(removed)
    }

    /// Deletes every record matching `predicate` and queues a tombstone
    /// for each. Returns the removed records.
    ///
    /// Stored elements that do not decode as `T` are never matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored collection cannot be parsed or a
    /// write fails.
    pub fn delete_where<P>(&self, mut predicate: P) -> CoreResult<Vec<T>>
    where
        P: FnMut(&T) -> bool,
    {
        let mut removed = Vec::new();
        let mut kept = Vec::new();
        for slot in self.load_slots()? {
            match slot {
                Slot::Typed(record) if predicate(&record) => removed.push(record),
                other => kept.push(other),
            }
        }
        if removed.is_empty() {
            return Ok(removed);
        }

        self.persist(kept)?;
        for record in &removed {
            self.tombstones.enqueue(record.id(), self.table())?;
        }
        debug!(key = %self.key, removed = removed.len(), "records deleted");
        Ok(removed)
    }

    /// Returns every record not yet acknowledged by the remote store.
    pub fn unsynced(&self) -> Vec<T> {
        self.store.get_unsynced_items(&self.key)
    }

    /// Marks the given ids as synced. Returns how many matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn mark_synced<I, S>(&self, ids: I) -> CoreResult<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.store.mark_as_synced(&self.key, ids)
    }

    /// Merges a batch from the remote store.
    pub fn merge_from_cloud<I>(&self, batch: I) -> MergeOutcome
    where
        I: IntoIterator<Item = T>,
    {
        self.store.upsert_from_cloud(&self.key, batch)
    }

    /// Replaces the whole collection without touching any record.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save_all(&self, records: Vec<T>) -> CoreResult<()> {
        self.persist(records.into_iter().map(Slot::Typed).collect())
    }

    /// Reads the collection for a read-modify-write.
    ///
    /// A value that is not an array is replaced, as the merge does. A
    /// value that cannot be read or parsed is an error: writing over it
    /// would destroy it.
    pub(crate) fn load_slots(&self) -> CoreResult<Vec<Slot<T>>> {
        let values = match self.store.load_checked::<Value>(&self.key) {
            LoadOutcome::Missing => Vec::new(),
            LoadOutcome::Loaded(values) => values,
            LoadOutcome::Recovered { reason, .. } if reason.loses_data() => {
                return Err(CoreError::corrupt_collection(&self.key, reason.to_string()));
            }
            LoadOutcome::Recovered { records, .. } => records,
        };
        Ok(values.into_iter().map(Slot::decode).collect())
    }

    pub(crate) fn persist(&self, mut slots: Vec<Slot<T>>) -> CoreResult<()> {
        if let Some(capacity) = self.capacity {
            if slots.len() > capacity {
                slots.drain(..slots.len() - capacity);
            }
        }
        let values = slots
            .into_iter()
            .map(Slot::into_value)
            .collect::<CoreResult<Vec<Value>>>()?;
        self.store.save_raw(&self.key, &values)
    }
}

fn latest<'s>(a: Option<&'s str>, b: Option<&'s str>) -> Option<&'s str> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if clock::parse_iso(a) >= clock::parse_iso(b) { a } else { b }),
        (a, b) => a.or(b),
    }
}
