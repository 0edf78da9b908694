//! Collection API.
//!
//! [`CollectionStore`] reads and writes whole collections by storage key,
//! recovering from corrupt content. [`Collection`] layers the typed record
//! lifecycle (ids, stamps, dirty flags, tombstones) on top of it.

mod store;
mod typed;

pub use store::{CollectionStore, LoadOutcome, RecoveryReason};
pub use typed::Collection;
pub(crate) use typed::Slot;
