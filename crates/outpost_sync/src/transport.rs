//! Transport abstraction over the remote store.

use crate::error::{SyncError, SyncResult};
use outpost_core::{Document, SyncRecord};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// A cloud transport talks to the remote store, one table at a time.
///
/// This trait abstracts the network layer, allowing for different
/// implementations (a hosted database's REST API, a mock for testing, etc.).
/// Records travel as untyped [`Document`]s so no field is lost in transit.
pub trait CloudTransport: Send + Sync {
    /// Fetches every record of a remote table.
    fn fetch(&self, table: &str) -> SyncResult<Vec<Document>>;

    /// Upserts records into a remote table.
    ///
    /// Returns the ids the remote store acknowledged. Ids not returned stay
    /// dirty locally and are pushed again next cycle.
    fn push(&self, table: &str, records: &[Document]) -> SyncResult<Vec<String>>;

    /// Deletes records from a remote table.
    ///
    /// Returns the ids whose deletion is confirmed. Deleting an id the
    /// remote store does not have counts as confirmed.
    fn delete(&self, table: &str, ids: &[String]) -> SyncResult<Vec<String>>;

    /// Checks if the transport is connected.
    fn is_connected(&self) -> bool;
}

/// An in-memory remote store for testing.
///
/// Holds one table per name. Connectivity can be switched off, failures
/// can be queued for the next calls, and individual ids can be refused.
#[derive(Debug)]
pub struct MockTransport {
    connected: AtomicBool,
    tables: Mutex<BTreeMap<String, Vec<Document>>>,
    failures: Mutex<VecDeque<SyncError>>,
    refused: Mutex<HashSet<String>>,
    calls: AtomicU64,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Creates a connected mock with no tables.
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            tables: Mutex::new(BTreeMap::new()),
            failures: Mutex::new(VecDeque::new()),
            refused: Mutex::new(HashSet::new()),
            calls: AtomicU64::new(0),
        }
    }

    /// Replaces the content of a remote table.
    pub fn set_table(&self, table: impl Into<String>, records: Vec<Document>) {
        self.tables.lock().insert(table.into(), records);
    }

    /// Returns the content of a remote table.
    pub fn table(&self, table: &str) -> Vec<Document> {
        self.tables.lock().get(table).cloned().unwrap_or_default()
    }

    /// Sets the connected state.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Makes the next call fail with `error`. Queued failures are consumed
    /// in order, one per call.
    pub fn fail_next(&self, error: SyncError) {
        self.failures.lock().push_back(error);
    }

    /// Makes the remote store refuse pushes and deletions of `id`.
    pub fn refuse(&self, id: impl Into<String>) {
        self.refused.lock().insert(id.into());
    }

    /// Number of transport calls made so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin_call(&self) -> SyncResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.is_connected() {
            return Err(SyncError::NotConnected);
        }
        match self.failures.lock().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl CloudTransport for MockTransport {
    fn fetch(&self, table: &str) -> SyncResult<Vec<Document>> {
        self.begin_call()?;
        Ok(self.table(table))
    }

    fn push(&self, table: &str, records: &[Document]) -> SyncResult<Vec<String>> {
        self.begin_call()?;
        let refused = self.refused.lock();
        let mut tables = self.tables.lock();
        let rows = tables.entry(table.to_owned()).or_default();

        let mut acked = Vec::new();
        for record in records.iter().filter(|r| !refused.contains(r.id())) {
            // The remote table has no dirty flag
            let mut row = record.clone();
            row.0.remove("synced");

            match rows.iter_mut().find(|r| r.id() == record.id()) {
                Some(existing) => *existing = row,
                None => rows.push(row),
            }
            acked.push(record.id().to_owned());
        }
        Ok(acked)
    }

    fn delete(&self, table: &str, ids: &[String]) -> SyncResult<Vec<String>> {
        self.begin_call()?;
        let refused = self.refused.lock();
        let confirmed: Vec<String> = ids
            .iter()
            .filter(|id| !refused.contains(id.as_str()))
            .cloned()
            .collect();

        if let Some(rows) = self.tables.lock().get_mut(table) {
            rows.retain(|r| !confirmed.iter().any(|id| id == r.id()));
        }
        Ok(confirmed)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str) -> Document {
        Document::new().with("id", id).with("synced", false)
    }

    #[test]
    fn push_upserts_without_dirty_flag() {
        let mock = MockTransport::new();
        let acked = mock.push("meters", &[doc("a"), doc("b")]).unwrap();
        assert_eq!(acked, vec!["a", "b"]);

        mock.push("meters", &[doc("a").with("name", "x")]).unwrap();
        let rows = mock.table("meters");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("name"), Some(&serde_json::json!("x")));
        assert!(rows.iter().all(|r| r.get("synced").is_none()));
    }

    #[test]
    fn refused_ids_are_not_acknowledged() {
        let mock = MockTransport::new();
        mock.refuse("b");
        let acked = mock.push("meters", &[doc("a"), doc("b")]).unwrap();
        assert_eq!(acked, vec!["a"]);

        let confirmed = mock
            .delete("meters", &["a".to_owned(), "b".to_owned()])
            .unwrap();
        assert_eq!(confirmed, vec!["a"]);
        assert!(mock.table("meters").is_empty());
    }

    #[test]
    fn delete_unknown_is_confirmed() {
        let mock = MockTransport::new();
        let confirmed = mock.delete("patrols", &["ghost".to_owned()]).unwrap();
        assert_eq!(confirmed, vec!["ghost"]);
    }

    #[test]
    fn disconnected_and_queued_failures() {
        let mock = MockTransport::new();
        mock.set_connected(false);
        assert!(matches!(mock.fetch("x"), Err(SyncError::NotConnected)));

        mock.set_connected(true);
        mock.fail_next(SyncError::Timeout);
        assert!(matches!(mock.fetch("x"), Err(SyncError::Timeout)));
        assert!(mock.fetch("x").unwrap().is_empty());
        assert_eq!(mock.calls(), 3);
    }
}
