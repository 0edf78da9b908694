//! Local half of offline sync: cloud merge, dirty tracking and tombstones.
//!
//! Nothing in here talks to a network. A sync driver pulls remote batches
//! into [`CollectionStore::upsert_from_cloud`], pushes what
//! [`CollectionStore::get_unsynced_items`] returns, acknowledges with
//! [`CollectionStore::mark_as_synced`], and drains the [`TombstoneQueue`].
//!
//! [`CollectionStore::upsert_from_cloud`]: crate::CollectionStore::upsert_from_cloud
//! [`CollectionStore::get_unsynced_items`]: crate::CollectionStore::get_unsynced_items
//! [`CollectionStore::mark_as_synced`]: crate::CollectionStore::mark_as_synced

mod bookkeeping;
mod merge;
mod tombstone;

pub use merge::MergeOutcome;
pub use tombstone::{Tombstone, TombstoneQueue};
