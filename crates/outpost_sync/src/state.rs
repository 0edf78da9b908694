//! Sync engine state machine.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::transport::CloudTransport;
use outpost_core::{CollectionKind, LocalDb, MergeOutcome, SyncRecord};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// The current state of the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Engine is idle, not syncing.
    Idle,
    /// Engine is merging remote tables into local collections.
    Pulling,
    /// Engine is pushing dirty records.
    Pushing,
    /// Engine is sending queued deletions.
    Draining,
    /// Engine has completed a sync cycle.
    Synced,
    /// Engine encountered an error.
    Error,
    /// Engine is waiting before retrying.
    RetryWait,
}

impl SyncState {
    /// Returns true if the engine is in an active sync state.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SyncState::Pulling | SyncState::Pushing | SyncState::Draining
        )
    }

    /// Returns true if the engine can start a new sync.
    pub fn can_start_sync(&self) -> bool {
        matches!(
            self,
            SyncState::Idle | SyncState::Synced | SyncState::Error | SyncState::RetryWait
        )
    }
}

/// Statistics accumulated over the engine's lifetime.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Total number of sync cycles completed.
    pub cycles_completed: u64,
    /// Remote records added locally.
    pub records_added: u64,
    /// Local records overwritten by the remote version.
    pub records_updated: u64,
    /// Local records acknowledged by the remote store.
    pub records_pushed: u64,
    /// Tombstones confirmed and cleared.
    pub tombstones_drained: u64,
    /// Total number of retries.
    pub retries: u64,
    /// Last successful sync time.
    pub last_sync_time: Option<Instant>,
    /// Last error message.
    pub last_error: Option<String>,
}

/// Result of a sync cycle.
#[derive(Debug, Clone, Default)]
pub struct SyncCycleResult {
    /// Merge counts of the pull phase.
    pub pulled: MergeOutcome,
    /// Records acknowledged in the push phase.
    pub pushed: u64,
    /// Tombstones confirmed in the drain phase.
    pub drained: u64,
    /// Pulled records skipped because a local deletion is pending.
    pub skipped_deleted: u64,
    /// Duration of the sync cycle.
    pub duration: Duration,
}

/// The sync engine drives a local store against a remote one.
///
/// A cycle runs three phases in order:
///
/// 1. **Pull**: every configured collection's remote table is merged into
///    the local collection. Unsynced local edits are protected by the
///    merge; records with a pending local deletion are not re-added.
/// 2. **Push**: dirty records are sent in batches; acknowledged ids are
///    marked synced.
/// 3. **Drain**: pending tombstones are deduplicated, grouped by table,
///    sent, and cleared once confirmed.
///
/// The engine must be the only sync pass running against its store.
pub struct SyncEngine<T: CloudTransport> {
    config: SyncConfig,
    db: Arc<LocalDb>,
    transport: Arc<T>,
    state: RwLock<SyncState>,
    stats: RwLock<SyncStats>,
    cancelled: AtomicBool,
}

impl<T: CloudTransport> SyncEngine<T> {
    /// Creates a new sync engine.
    pub fn new(config: SyncConfig, db: Arc<LocalDb>, transport: Arc<T>) -> Self {
        Self {
            config,
            db,
            transport,
            state: RwLock::new(SyncState::Idle),
            stats: RwLock::new(SyncStats::default()),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Gets the current state.
    pub fn state(&self) -> SyncState {
        *self.state.read()
    }

    /// Gets the current stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Cancels the running sync at the next phase or table boundary.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Resets the cancelled flag.
    pub fn reset_cancel(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    fn check_cancelled(&self) -> SyncResult<()> {
        if self.cancelled.load(Ordering::SeqCst) {
            Err(SyncError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn set_state(&self, state: SyncState) {
        *self.state.write() = state;
    }

    /// Performs a full sync cycle: pull, push, then drain tombstones.
    ///
    /// A failing phase stops the cycle. Work completed before the failure
    /// stays applied: merged records stay merged and acknowledged records
    /// stay synced.
    pub fn sync(&self) -> SyncResult<SyncCycleResult> {
        let start = Instant::now();

        if !self.state().can_start_sync() {
            return Err(SyncError::InvalidStateTransition {
                from: format!("{:?}", self.state()),
                to: "sync".into(),
            });
        }

        match self.run_cycle() {
            Ok(mut result) => {
                result.duration = start.elapsed();
                self.set_state(SyncState::Synced);

                let mut stats = self.stats.write();
                stats.cycles_completed += 1;
                stats.records_added += result.pulled.added as u64;
                stats.records_updated += result.pulled.updated as u64;
                stats.records_pushed += result.pushed;
                stats.tombstones_drained += result.drained;
                stats.last_sync_time = Some(Instant::now());
                stats.last_error = None;

                info!(
                    added = result.pulled.added,
                    updated = result.pulled.updated,
                    pushed = result.pushed,
                    drained = result.drained,
                    elapsed_ms = result.duration.as_millis() as u64,
                    "sync cycle completed"
                );
                Ok(result)
            }
            Err(e) => {
                self.handle_error(&e);
                Err(e)
            }
        }
    }

    /// Performs a sync with retry on transient errors.
    pub fn sync_with_retry(&self) -> SyncResult<SyncCycleResult> {
        let retry_config = &self.config.retry;
        self.reset_cancel();

        let mut attempt = 0;
        loop {
            if attempt > 0 {
                self.set_state(SyncState::RetryWait);
                std::thread::sleep(retry_config.delay_for_attempt(attempt));
                self.stats.write().retries += 1;
            }
            self.check_cancelled()?;

            match self.sync() {
                Ok(result) => return Ok(result),
                Err(e) if retry_config.should_retry(&e, attempt) => {
                    warn!(attempt, error = %e, "sync failed, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn run_cycle(&self) -> SyncResult<SyncCycleResult> {
        if !self.transport.is_connected() {
            return Err(SyncError::NotConnected);
        }
        let mut result = SyncCycleResult::default();

        self.check_cancelled()?;
        self.set_state(SyncState::Pulling);
        self.pull_all(&mut result)?;

        self.check_cancelled()?;
        self.set_state(SyncState::Pushing);
        self.push_all(&mut result)?;

        if self.config.drain_tombstones {
            self.check_cancelled()?;
            self.set_state(SyncState::Draining);
            self.drain_tombstones(&mut result)?;
        }

        Ok(result)
    }

    /// Merges every configured remote table into its local collection.
    fn pull_all(&self, result: &mut SyncCycleResult) -> SyncResult<()> {
        let pending_deletes: HashSet<String> = self
            .db
            .tombstones()
            .peek_all()
            .into_iter()
            .map(|t| t.id)
            .collect();

        for &kind in &self.config.collections {
            self.check_cancelled()?;
            let mut batch = self.transport.fetch(kind.table())?;

            let before = batch.len();
            batch.retain(|r| !pending_deletes.contains(r.id()));
            result.skipped_deleted += (before - batch.len()) as u64;

            let outcome = self.db.merge_from_cloud(kind, batch);
            debug!(collection = %kind, added = outcome.added, updated = outcome.updated, "pulled");
            result.pulled += outcome;
        }
        Ok(())
    }

    /// Pushes dirty records of every configured collection in batches.
    fn push_all(&self, result: &mut SyncCycleResult) -> SyncResult<()> {
        for &kind in &self.config.collections {
            let pending = self.db.unsynced(kind);
            if pending.is_empty() {
                continue;
            }

            for batch in pending.chunks(self.config.batch_size()) {
                self.check_cancelled()?;
                let acked = self.transport.push(kind.table(), batch)?;
                let marked = self.db.mark_synced(kind, &acked)?;
                result.pushed += marked as u64;

                if acked.len() < batch.len() {
                    warn!(
                        collection = %kind,
                        sent = batch.len(),
                        acked = acked.len(),
                        "remote acknowledged part of a batch"
                    );
                }
            }
        }
        Ok(())
    }

    /// Sends pending deletions and clears the confirmed ones.
    fn drain_tombstones(&self, result: &mut SyncCycleResult) -> SyncResult<()> {
        let queue = self.db.tombstones().peek_all();
        if queue.is_empty() {
            return Ok(());
        }

        let mut by_table: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut seen = HashSet::new();
        for tombstone in queue {
            if seen.insert((tombstone.table.clone(), tombstone.id.clone())) {
                by_table.entry(tombstone.table).or_default().push(tombstone.id);
            }
        }

        for (table, ids) in by_table {
            self.check_cancelled()?;
            if CollectionKind::from_name(&table).is_none() {
                warn!(table = %table, "tombstones for unknown table");
            }
            let confirmed = self.transport.delete(&table, &ids)?;
            self.db.tombstones().clear(&confirmed)?;
            result.drained += confirmed.len() as u64;
            debug!(table = %table, sent = ids.len(), confirmed = confirmed.len(), "tombstones drained");
        }
        Ok(())
    }

    fn handle_error(&self, error: &SyncError) {
        self.set_state(SyncState::Error);
        self.stats.write().last_error = Some(error.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use crate::transport::MockTransport;
    use outpost_core::{Document, Meter, PatrolRecord};

    fn setup(config: SyncConfig) -> (SyncEngine<MockTransport>, Arc<LocalDb>, Arc<MockTransport>) {
        let db = Arc::new(LocalDb::open_in_memory());
        let mock = Arc::new(MockTransport::new());
        let engine = SyncEngine::new(config, db.clone(), mock.clone());
        (engine, db, mock)
    }

    fn fast_retry(attempts: u32) -> RetryConfig {
        RetryConfig::new(attempts)
            .with_initial_delay(Duration::from_millis(1))
            .with_jitter(false)
    }

    #[test]
    fn state_predicates() {
        assert!(SyncState::Idle.can_start_sync());
        assert!(SyncState::Error.can_start_sync());
        assert!(!SyncState::Pushing.can_start_sync());
        assert!(SyncState::Draining.is_active());
        assert!(!SyncState::Synced.is_active());
    }

    #[test]
    fn empty_cycle_succeeds() {
        let (engine, _, _) = setup(SyncConfig::default());
        let result = engine.sync().unwrap();
        assert!(result.pulled.is_empty());
        assert_eq!(result.pushed, 0);
        assert_eq!(engine.state(), SyncState::Synced);
        assert_eq!(engine.stats().cycles_completed, 1);
    }

    #[test]
    fn push_marks_acknowledged_records() {
        let (engine, db, mock) = setup(SyncConfig::default().with_push_batch_size(2));
        for name in ["a", "b", "c"] {
            db.meters().add(Meter::new(name, "t")).unwrap();
        }

        let result = engine.sync().unwrap();
        assert_eq!(result.pushed, 3);
        assert!(db.meters().unsynced().is_empty());
        assert_eq!(mock.table("meters").len(), 3);
    }

    #[test]
    fn zero_push_batch_size_still_pushes_everything() {
        let config = SyncConfig {
            push_batch_size: 0,
            ..SyncConfig::default()
        };
        let (engine, db, mock) = setup(config);
        for name in ["a", "b", "c"] {
            db.meters().add(Meter::new(name, "t")).unwrap();
        }

        let result = engine.sync().unwrap();
        assert_eq!(result.pushed, 3);
        assert!(db.meters().unsynced().is_empty());
        assert_eq!(mock.table("meters").len(), 3);
    }

    #[test]
    fn refused_record_stays_dirty() {
        let (engine, db, mock) = setup(SyncConfig::default());
        let kept = db.meters().add(Meter::new("kept", "t")).unwrap();
        let refused = db.meters().add(Meter::new("refused", "t")).unwrap();
        mock.refuse(refused.id.clone());

        let result = engine.sync().unwrap();
        assert_eq!(result.pushed, 1);
        let pending = db.meters().unsynced();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, refused.id);
        assert!(db.meters().get(&kept.id).unwrap().synced);
    }

    #[test]
    fn pull_does_not_resurrect_pending_deletion() {
        let (engine, db, mock) = setup(SyncConfig::default().with_tombstone_drain(false));
        mock.set_table(
            "patrols",
            vec![Document::new().with("id", "p1").with("status", "open")],
        );
        engine.sync().unwrap();
        assert!(db.patrols().get("p1").is_some());

        db.patrols().delete("p1").unwrap();
        let result = engine.sync().unwrap();
        assert_eq!(result.skipped_deleted, 1);
        assert!(db.patrols().get("p1").is_none());
    }

    #[test]
    fn drain_dedups_and_clears_confirmed() {
        let (engine, db, mock) = setup(SyncConfig::default());
        mock.set_table(
            "patrols",
            vec![
                Document::new().with("id", "p1"),
                Document::new().with("id", "p2"),
            ],
        );
        engine.sync().unwrap();

        db.patrols().delete("p1").unwrap();
        db.patrols().delete("p1").unwrap();
        db.patrols().delete("p2").unwrap();
        mock.refuse("p2");
        assert_eq!(db.tombstones().len(), 3);

        let result = engine.sync().unwrap();
        assert_eq!(result.drained, 1);
        let left = db.tombstones().peek_all();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, "p2");
        assert_eq!(mock.table("patrols").len(), 1);
    }

    #[test]
    fn offline_sync_fails_and_records_error() {
        let (engine, db, mock) = setup(SyncConfig::default());
        db.patrols().add(PatrolRecord::default()).unwrap();
        mock.set_connected(false);

        let err = engine.sync().unwrap_err();
        assert!(matches!(err, SyncError::NotConnected));
        assert_eq!(engine.state(), SyncState::Error);
        assert!(engine.stats().last_error.is_some());
        assert_eq!(db.patrols().unsynced().len(), 1);
    }

    #[test]
    fn retry_recovers_from_transient_failure() {
        let (engine, _, mock) = setup(SyncConfig::default().with_retry(fast_retry(3)));
        mock.fail_next(SyncError::transport_retryable("reset by peer"));

        engine.sync_with_retry().unwrap();
        let stats = engine.stats();
        assert_eq!(stats.retries, 1);
        assert_eq!(stats.cycles_completed, 1);
        assert!(stats.last_error.is_none());
    }

    #[test]
    fn retry_stops_on_fatal_error() {
        let (engine, _, mock) = setup(SyncConfig::default().with_retry(fast_retry(5)));
        mock.fail_next(SyncError::rejected("vehicle_entries", "forbidden"));

        let err = engine.sync_with_retry().unwrap_err();
        assert!(matches!(err, SyncError::Rejected { .. }));
        assert_eq!(engine.stats().retries, 0);
    }

    #[test]
    fn retry_gives_up_after_max_attempts() {
        let (engine, _, mock) = setup(SyncConfig::default().with_retry(fast_retry(2)));
        mock.set_connected(false);

        assert!(engine.sync_with_retry().is_err());
        assert_eq!(engine.stats().retries, 1);
    }

    #[test]
    fn cancelled_engine_stops() {
        let (engine, _, _) = setup(SyncConfig::default());
        engine.cancel();
        assert!(matches!(engine.sync(), Err(SyncError::Cancelled)));
        engine.reset_cancel();
        assert!(engine.sync().is_ok());
    }

    #[test]
    fn configured_collections_only() {
        let (engine, db, mock) =
            setup(SyncConfig::default().with_collections([CollectionKind::Meters]));
        db.patrols().add(PatrolRecord::default()).unwrap();
        mock.set_table("packages", vec![Document::new().with("id", "x")]);

        engine.sync().unwrap();
        assert_eq!(db.patrols().unsynced().len(), 1);
        assert!(db.packages().list().is_empty());
        assert!(mock.table("patrols").is_empty());
    }
}
