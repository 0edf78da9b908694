//! Cloud merge: apply an authoritative remote batch to a local collection.

use crate::collection::{CollectionStore, LoadOutcome};
use crate::entity::SyncRecord;
use std::collections::HashMap;
use tracing::{debug, error, warn};

/// Counts reported by a merge pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Records whose id was new locally.
    pub added: usize,
    /// Local synced records overwritten by the cloud version.
    pub updated: usize,
}

impl MergeOutcome {
    /// Returns true if the merge changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.updated == 0
    }
}

impl std::ops::AddAssign for MergeOutcome {
    fn add_assign(&mut self, rhs: Self) {
        self.added += rhs.added;
        self.updated += rhs.updated;
    }
}

impl CollectionStore {
    /// Merges `cloud` into the collection at `key`.
    ///
    /// - An id unseen locally is appended with `synced = true`.
    /// - An id present locally replaces the local record only if the local
    ///   record is `synced`. A local record with a pending edit wins and the
    ///   cloud version is discarded for this pass.
    ///
    /// Storage is written once, and only if something was added or
    /// updated. This never fails: a corrupt local collection or a failed
    /// write is logged and reported as an empty outcome.
    pub fn upsert_from_cloud<T, I>(&self, key: &str, cloud: I) -> MergeOutcome
    where
        T: SyncRecord,
        I: IntoIterator<Item = T>,
    {
        let mut local: Vec<T> = match self.load_checked(key) {
            LoadOutcome::Missing => Vec::new(),
            LoadOutcome::Loaded(records) => records,
            LoadOutcome::Recovered { records, reason } => {
                if reason.loses_data() {
                    warn!(key, %reason, "refusing to merge over corrupt collection");
                    return MergeOutcome::default();
                }
                records
            }
        };

        let mut positions: HashMap<String, usize> = local
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id().to_owned(), i))
            .collect();

        let mut outcome = MergeOutcome::default();
        for mut incoming in cloud {
            incoming.set_synced(true);
            match positions.get(incoming.id()) {
                Some(&index) => {
                    if local[index].is_synced() {
                        local[index] = incoming;
                        outcome.updated += 1;
                    }
                }
                None => {
                    positions.insert(incoming.id().to_owned(), local.len());
                    local.push(incoming);
                    outcome.added += 1;
                }
            }
        }

        if outcome.is_empty() {
            return outcome;
        }

        if let Err(e) = self.save(key, &local) {
            error!(key, error = %e, "cloud merge could not be saved");
            return MergeOutcome::default();
        }

        debug!(key, added = outcome.added, updated = outcome.updated, "cloud merge applied");
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Document;
    use outpost_storage::{InMemoryBackend, KvBackend};
    use serde_json::{json, Value};
    use std::sync::Arc;

    const KEY: &str = "outpost_entries";

    fn docs(value: Value) -> Vec<Document> {
        serde_json::from_value(value).unwrap()
    }

    fn store_with(local: Value) -> (CollectionStore, Arc<InMemoryBackend>) {
        let backend = Arc::new(InMemoryBackend::new());
        backend.put(KEY, local.to_string().as_bytes()).unwrap();
        (CollectionStore::new(backend.clone()), backend)
    }

    #[test]
    fn adds_and_overwrites_synced() {
        let (store, _) = store_with(json!([{"id": "1", "synced": true, "v": "old"}]));

        let outcome = store.upsert_from_cloud(
            KEY,
            docs(json!([{"id": "1", "v": "new"}, {"id": "2", "v": "x"}])),
        );

        assert_eq!(outcome, MergeOutcome { added: 1, updated: 1 });
        assert_eq!(
            store.load_raw(KEY),
            vec![
                json!({"id": "1", "v": "new", "synced": true}),
                json!({"id": "2", "v": "x", "synced": true}),
            ]
        );
    }

    #[test]
    fn protects_unsynced_local_edit() {
        let (store, _) = store_with(json!([{"id": "1", "synced": false, "v": "mine"}]));

        let outcome = store.upsert_from_cloud(KEY, docs(json!([{"id": "1", "v": "theirs"}])));

        assert_eq!(outcome, MergeOutcome::default());
        assert_eq!(
            store.load_raw(KEY),
            vec![json!({"id": "1", "synced": false, "v": "mine"})]
        );
    }

    #[test]
    fn record_without_synced_flag_is_dirty() {
        let (store, _) = store_with(json!([{"id": "1", "v": "legacy"}]));
        let outcome = store.upsert_from_cloud(KEY, docs(json!([{"id": "1", "v": "cloud"}])));
        assert_eq!(outcome.updated, 0);
    }

    #[test]
    fn no_change_leaves_storage_untouched() {
        let raw = r#"[{"id":"1","synced":false}]   "#;
        let backend = Arc::new(InMemoryBackend::new());
        backend.put(KEY, raw.as_bytes()).unwrap();
        let store = CollectionStore::new(backend.clone());

        let outcome = store.upsert_from_cloud(KEY, docs(json!([{"id": "1"}])));
        assert!(outcome.is_empty());
        // Byte-identical, including the trailing whitespace
        assert_eq!(backend.get(KEY).unwrap(), Some(raw.as_bytes().to_vec()));

        let outcome = store.upsert_from_cloud(KEY, Vec::<Document>::new());
        assert!(outcome.is_empty());
    }

    #[test]
    fn merge_into_missing_collection() {
        let store = CollectionStore::new(Arc::new(InMemoryBackend::new()));
        let outcome = store.upsert_from_cloud(KEY, docs(json!([{"id": "a"}, {"id": "b"}])));
        assert_eq!(outcome, MergeOutcome { added: 2, updated: 0 });
        assert!(store.load::<Document>(KEY).iter().all(|d| d.is_synced()));
    }

    #[test]
    fn repeated_id_in_batch_does_not_duplicate() {
        let store = CollectionStore::new(Arc::new(InMemoryBackend::new()));
        let outcome = store.upsert_from_cloud(
            KEY,
            docs(json!([{"id": "a", "v": 1}, {"id": "a", "v": 2}])),
        );

        assert_eq!(outcome, MergeOutcome { added: 1, updated: 1 });
        assert_eq!(
            store.load_raw(KEY),
            vec![json!({"id": "a", "v": 2, "synced": true})]
        );
    }

    #[test]
    fn corrupt_local_data_merges_nothing() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.put(KEY, b"garbage").unwrap();
        let store = CollectionStore::new(backend.clone());

        let outcome = store.upsert_from_cloud(KEY, docs(json!([{"id": "1"}])));
        assert!(outcome.is_empty());
        assert_eq!(backend.get(KEY).unwrap(), Some(b"garbage".to_vec()));
    }

    #[test]
    fn non_array_local_data_is_replaced() {
        let (store, _) = store_with(json!({"not": "an array"}));
        let outcome = store.upsert_from_cloud(KEY, docs(json!([{"id": "1"}])));
        assert_eq!(outcome.added, 1);
        assert_eq!(store.load::<Document>(KEY).len(), 1);
    }

    #[test]
    fn failed_save_reports_zero() {
        let store = CollectionStore::new(Arc::new(InMemoryBackend::with_quota(8)));
        let outcome = store.upsert_from_cloud(KEY, docs(json!([{"id": "long-enough-to-overflow"}])));
        assert!(outcome.is_empty());
        assert!(store.load::<Document>(KEY).is_empty());
    }
}
