//! Record identity and the sync record contract.

mod id;
mod record;

pub use id::new_id;
pub use record::{Document, Entity, SyncRecord};
