//! Store statistics.
//!
//! A point-in-time snapshot of what is stored and what is waiting to sync.
//!
//! # Usage
//!
//! ```rust
//! use outpost_core::{LocalDb, Meter};
//!
//! let db = LocalDb::open_in_memory();
//! db.meters().add(Meter::new("Water", "Hydrometer")).unwrap();
//!
//! let stats = db.stats();
//! assert_eq!(stats.total_records(), 1);
//! assert_eq!(stats.total_unsynced(), 1);
//! ```

use crate::collection::{LoadOutcome, RecoveryReason};
use crate::database::LocalDb;
use crate::entity::{Document, SyncRecord};
use crate::types::CollectionKind;
use tracing::warn;

/// Counts for one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionStats {
    /// The collection.
    pub kind: CollectionKind,
    /// Records stored.
    pub total: usize,
    /// Records not yet acknowledged by the remote store.
    pub unsynced: usize,
    /// Set if the stored value was corrupt.
    pub recovery: Option<RecoveryReason>,
}

/// Snapshot of the whole store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Per-collection counts, in backup order.
    pub collections: Vec<CollectionStats>,
    /// Tombstones waiting to be confirmed.
    pub pending_tombstones: usize,
    /// Bytes held by the backend (all keys).
    pub bytes: u64,
}

impl StoreStats {
    /// Records across all collections.
    #[must_use]
    pub fn total_records(&self) -> usize {
        self.collections.iter().map(|c| c.total).sum()
    }

    /// Unsynced records across all collections.
    #[must_use]
    pub fn total_unsynced(&self) -> usize {
        self.collections.iter().map(|c| c.unsynced).sum()
    }

    /// Returns true if nothing is waiting to sync.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.total_unsynced() == 0 && self.pending_tombstones == 0
    }
}

impl LocalDb {
    /// Collects store statistics.
    pub fn stats(&self) -> StoreStats {
        let collections = CollectionKind::ALL
            .into_iter()
            .map(|kind| {
                let outcome = self
                    .store()
                    .load_checked::<Document>(&self.config().collection_key(kind));
                let recovery = outcome.recovery_reason().cloned();
                let records = match outcome {
                    LoadOutcome::Missing => Vec::new(),
                    LoadOutcome::Loaded(r) | LoadOutcome::Recovered { records: r, .. } => r,
                };
                CollectionStats {
                    kind,
                    total: records.len(),
                    unsynced: records.iter().filter(|r| !r.is_synced()).count(),
                    recovery,
                }
            })
            .collect();

        let bytes = self.store().backend().size().unwrap_or_else(|e| {
            warn!(error = %e, "backend size unavailable");
            0
        });

        StoreStats {
            collections,
            pending_tombstones: self.tombstones().len(),
            bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Meter, PatrolRecord};
    use outpost_storage::KvBackend;

    #[test]
    fn empty_store_is_clean() {
        let stats = LocalDb::open_in_memory().stats();
        assert_eq!(stats.collections.len(), 8);
        assert!(stats.is_clean());
        assert_eq!(stats.bytes, 0);
    }

    #[test]
    fn counts_unsynced_and_tombstones() {
        let db = LocalDb::open_in_memory();
        let m = db.meters().add(Meter::new("A", "x")).unwrap();
        db.meters().add(Meter::new("B", "x")).unwrap();
        db.meters().mark_synced([&m.id]).unwrap();
        let p = db.patrols().add(PatrolRecord::default()).unwrap();
        db.patrols().delete(&p.id).unwrap();

        let stats = db.stats();
        let meters = stats
            .collections
            .iter()
            .find(|c| c.kind == CollectionKind::Meters)
            .unwrap();
        assert_eq!((meters.total, meters.unsynced), (2, 1));
        assert_eq!(stats.pending_tombstones, 1);
        assert!(!stats.is_clean());
        assert!(stats.bytes > 0);
    }

    #[test]
    fn reports_corruption() {
        let db = LocalDb::open_in_memory();
        db.store()
            .backend()
            .put(db.entries().key(), b"<html>")
            .unwrap();

        let stats = db.stats();
        let entries = &stats.collections[0];
        assert_eq!(entries.kind, CollectionKind::Entries);
        assert!(matches!(entries.recovery, Some(RecoveryReason::Malformed(_))));
    }
}
