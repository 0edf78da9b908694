//! Dirty-record bookkeeping for the sync driver.

use crate::collection::{CollectionStore, LoadOutcome};
use crate::entity::{Document, SyncRecord};
use crate::error::CoreResult;
use std::collections::HashSet;
use tracing::{debug, warn};

impl CollectionStore {
    /// Returns every record at `key` whose `synced` flag is not `true`.
    ///
    /// Corrupt storage reads as empty.
    pub fn get_unsynced_items<T: SyncRecord>(&self, key: &str) -> Vec<T> {
        self.load::<T>(key)
            .into_iter()
            .filter(|r| !r.is_synced())
            .collect()
    }

    /// Sets `synced = true` on every record at `key` whose id is in `ids`.
    ///
    /// This is the only transition from dirty to clean. Records are handled
    /// as untyped documents so no field is lost. Nothing is written if the
    /// key is missing or corrupt; otherwise the collection is persisted once.
    /// Marking the same ids twice yields the same state as marking once.
    ///
    /// Returns how many records matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be written.
    pub fn mark_as_synced<I, S>(&self, key: &str, ids: I) -> CoreResult<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut records: Vec<Document> = match self.load_checked(key) {
            LoadOutcome::Loaded(records) => records,
            LoadOutcome::Missing => return Ok(0),
            LoadOutcome::Recovered { reason, .. } => {
                warn!(key, %reason, "not marking synced on corrupt collection");
                return Ok(0);
            }
        };

        let ids: HashSet<String> = ids.into_iter().map(|s| s.as_ref().to_owned()).collect();
        let mut matched = 0;
        for record in records.iter_mut().filter(|r| ids.contains(r.id())) {
            record.set_synced(true);
            matched += 1;
        }

        if matched > 0 {
            self.save(key, &records)?;
        }
        debug!(key, matched, "records marked synced");
        Ok(matched)
    }
}
