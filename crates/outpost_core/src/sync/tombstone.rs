//! Deletion tombstone queue.
//!
//! When a record is deleted locally it disappears from its collection
//! immediately. The deletion still has to reach the remote store, so the
//! id is queued here, independent of any collection, until a sync pass
//! confirms it and calls [`TombstoneQueue::clear`].

use crate::clock;
use crate::collection::CollectionStore;
use crate::error::CoreResult;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// A locally deleted record awaiting remote deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tombstone {
    /// Id of the deleted record.
    pub id: String,
    /// Remote table the record belonged to.
    pub table: String,
    /// When the deletion happened.
    pub timestamp: String,
}

/// The single queue of pending tombstones, shared by every collection.
///
/// Tombstones are either pending (in the queue) or confirmed (removed by
/// `clear`). There is no retry bookkeeping here; retry policy belongs to
/// the sync driver. Duplicate ids are tolerated.
#[derive(Debug, Clone)]
pub struct TombstoneQueue {
    store: CollectionStore,
    key: String,
}

impl TombstoneQueue {
    /// Creates a queue stored under `key`.
    pub fn new(store: CollectionStore, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Storage key of the queue.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Appends a tombstone for `id` in `table`, stamped now.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be written.
    pub fn enqueue(&self, id: &str, table: &str) -> CoreResult<()> {
        let mut queue = self.peek_all();
        queue.push(Tombstone {
            id: id.to_owned(),
            table: table.to_owned(),
            timestamp: clock::now_iso(),
        });
        self.store.save(&self.key, &queue)?;
        debug!(id, table, pending = queue.len(), "tombstone queued");
        Ok(())
    }

    /// Returns every pending tombstone, oldest first.
    ///
    /// A corrupt queue reads as empty.
    pub fn peek_all(&self) -> Vec<Tombstone> {
        self.store.load(&self.key)
    }

    /// Returns the number of pending tombstones.
    pub fn len(&self) -> usize {
        self.peek_all().len()
    }

    /// Returns true if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every tombstone whose id is in `ids`.
    ///
    /// Tombstones for other ids are preserved.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be written.
    pub fn clear<I, S>(&self, ids: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let remove: HashSet<String> = ids.into_iter().map(|s| s.as_ref().to_owned()).collect();
        let mut queue = self.peek_all();
        let before = queue.len();
        queue.retain(|t| !remove.contains(&t.id));

        self.store.save(&self.key, &queue)?;
        debug!(
            cleared = before - queue.len(),
            pending = queue.len(),
            "tombstones confirmed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outpost_storage::{InMemoryBackend, KvBackend};
    use std::sync::Arc;

    fn queue() -> (TombstoneQueue, Arc<InMemoryBackend>) {
        let backend = Arc::new(InMemoryBackend::new());
        let store = CollectionStore::new(backend.clone());
        (TombstoneQueue::new(store, "outpost_deleted_queue"), backend)
    }

    #[test]
    fn empty_queue() {
        let (q, _) = queue();
        assert!(q.peek_all().is_empty());
        assert!(q.is_empty());
    }

    #[test]
    fn enqueue_records_table_and_time() {
        let (q, _) = queue();
        q.enqueue("a", "patrols").unwrap();

        let all = q.peek_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "a");
        assert_eq!(all[0].table, "patrols");
        assert!(crate::clock::parse_iso(&all[0].timestamp).is_some());
    }

    #[test]
    fn duplicates_are_kept() {
        let (q, _) = queue();
        q.enqueue("a", "meters").unwrap();
        q.enqueue("a", "meters").unwrap();
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn clear_removes_only_listed_ids() {
        let (q, _) = queue();
        q.enqueue("a", "meters").unwrap();
        q.enqueue("b", "packages").unwrap();
        q.enqueue("a", "meters").unwrap();
        q.enqueue("c", "patrols").unwrap();

        q.clear(["a", "c"]).unwrap();

        let ids: Vec<_> = q.peek_all().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn clear_with_unknown_ids_is_harmless() {
        let (q, _) = queue();
        q.enqueue("a", "meters").unwrap();
        q.clear(vec![String::from("zzz")]).unwrap();
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn corrupt_queue_reads_empty_and_is_replaced() {
        let (q, backend) = queue();
        backend.put(q.key(), b"\x00\x01garbage").unwrap();

        assert!(q.peek_all().is_empty());
        q.enqueue("x", "patrols").unwrap();
        assert_eq!(q.len(), 1);
    }
}
