//! # Outpost Sync Driver
//!
//! Drives an [`outpost_core::LocalDb`] against a remote store.
//!
//! This crate provides:
//! - Sync state machine (idle → pulling → pushing → draining → synced)
//! - Batched push with per-record acknowledgement
//! - Tombstone drain with deduplication
//! - Retry with exponential backoff
//! - Transport abstraction and an in-memory mock
//!
//! ## Architecture
//!
//! A cycle pulls first, then pushes, then drains deletions:
//! 1. Pull every remote table and merge it into the local collection
//! 2. Push dirty records and mark the acknowledged ones synced
//! 3. Send queued deletions and clear the confirmed tombstones
//!
//! ## Key Invariants
//!
//! - The remote store is authoritative for records without local edits
//! - An unsynced local record is never overwritten by a pull
//! - A record is marked synced only after the remote store acknowledges it
//! - A tombstone is cleared only after its deletion is confirmed

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod state;
mod transport;

pub use config::{RetryConfig, SyncConfig};
pub use error::{SyncError, SyncResult};
pub use state::{SyncCycleResult, SyncEngine, SyncState, SyncStats};
pub use transport::{CloudTransport, MockTransport};
