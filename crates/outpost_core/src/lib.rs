//! # Outpost Core
//!
//! Offline-first persistence for gatehouse stations.
//!
//! This crate provides:
//! - Record identity (collision-resistant string ids)
//! - A keyed collection store that never fails on read
//! - Typed entity collections with the add/update/delete lifecycle
//! - Cloud merge that protects unsynced local edits
//! - A deletion tombstone queue
//! - Sync bookkeeping (dirty tracking, acknowledgements)
//! - Settings, drafts, the users cache and full backups
//!
//! Networking is out of scope: a sync driver feeds remote batches in and
//! pushes dirty records out using the operations exposed here.
//!
//! ## Example
//!
//! ```rust
//! use outpost_core::{LocalDb, VehicleEntry};
//!
//! let db = LocalDb::open_in_memory();
//! let entry = db
//!     .entries()
//!     .add(VehicleEntry::new("Maria", Some("ABC1D23".into())))
//!     .unwrap();
//!
//! assert_eq!(db.entries().unsynced().len(), 1);
//! db.entries().mark_synced([&entry.id]).unwrap();
//! assert!(db.entries().unsynced().is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backup;
pub mod clock;
mod collection;
mod config;
mod database;
mod entities;
mod entity;
mod error;
mod stats;
mod sync;
mod types;

pub use backup::{ImportReport, INVALID_BACKUP_MESSAGE};
pub use collection::{Collection, CollectionStore, LoadOutcome, RecoveryReason};
pub use config::StoreConfig;
pub use database::LocalDb;
pub use entities::{
    AppLog, AppSettings, BreakfastRecord, Draft, InternalUser, Meter, MeterReading,
    PackageRecord, PatrolRecord, VehicleEntry, WorkShift, DELIVERED_STATUS,
};
pub use entity::{new_id, Document, Entity, SyncRecord};
pub use error::{CoreError, CoreResult};
pub use stats::{CollectionStats, StoreStats};
pub use sync::{MergeOutcome, Tombstone, TombstoneQueue};
pub use types::{CollectionKind, OperatorContext};

// Re-export storage types for convenience
pub use outpost_storage::{FileBackend, InMemoryBackend, KvBackend, StorageError};
