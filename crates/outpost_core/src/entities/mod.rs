//! Concrete record types for the gatehouse collections.
//!
//! Every synced type serializes with camelCase fields (except `updated_at`
//! and the log's `created_at`, which keep their stored names) and carries a
//! flattened `extra` map, so fields written by other clients survive a
//! load/save cycle.

mod breakfast;
mod draft;
mod entry;
mod log;
mod meter;
mod package;
mod patrol;
mod settings;
mod shift;
mod user;

pub use breakfast::{BreakfastRecord, DELIVERED_STATUS};
pub use draft::Draft;
pub use entry::VehicleEntry;
pub use log::AppLog;
pub use meter::{Meter, MeterReading};
pub use package::PackageRecord;
pub use patrol::PatrolRecord;
pub use settings::AppSettings;
pub use shift::WorkShift;
pub use user::InternalUser;

/// Implements [`SyncRecord`](crate::SyncRecord) and [`Entity`](crate::Entity)
/// for a struct with `id: String`, `synced: bool` and
/// `updated_at: Option<String>` fields.
///
/// An optional trailing closure-like block stamps the creation field.
macro_rules! sync_entity {
    ($ty:ty, $kind:expr $(, |$rec:ident, $now:ident| $stamp:block)?) => {
        impl $crate::entity::SyncRecord for $ty {
            fn id(&self) -> &str {
                &self.id
            }

            fn set_id(&mut self, id: String) {
                self.id = id;
            }

            fn is_synced(&self) -> bool {
                self.synced
            }

            fn set_synced(&mut self, synced: bool) {
                self.synced = synced;
            }

            fn updated_at(&self) -> Option<&str> {
                self.updated_at.as_deref()
            }

            fn set_updated_at(&mut self, at: String) {
                self.updated_at = Some(at);
            }

            $(
                fn stamp_created(&mut self, $now: &str) {
                    let $rec = self;
                    $stamp
                }
            )?
        }

        impl $crate::entity::Entity for $ty {
            const COLLECTION: $crate::types::CollectionKind = $kind;
        }
    };
}

pub(crate) use sync_entity;

/// Returns true if an optional stamp is absent or blank.
fn is_unset(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}
