//! Gate log entries and profile-wide operations on them.

use super::{is_unset, sync_entity};
use crate::clock;
use crate::collection::{Collection, Slot};
use crate::entity::{new_id, Document, SyncRecord};
use crate::error::CoreResult;
use crate::types::CollectionKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

/// A vehicle or visitor passing through the gate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VehicleEntry {
    /// Record id.
    pub id: String,
    /// Name of the driver or visitor.
    pub driver_name: String,
    /// License plate, if the visitor came by vehicle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_plate: Option<String>,
    /// Company the visitor represents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// When the visitor entered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_time: Option<String>,
    /// When the visitor left; `None` while still inside.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_time: Option<String>,
    /// Where an imported entry came from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Creation stamp. Kept if already set when the entry is added.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Dirty flag.
    pub synced: bool,
    /// Last local mutation.
    #[serde(rename = "updated_at", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Fields this type does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

sync_entity!(VehicleEntry, CollectionKind::Entries, |entry, now| {
    if is_unset(entry.created_at.as_deref()) {
        entry.created_at = Some(now.to_owned());
    }
});

impl VehicleEntry {
    /// Creates an entry for a driver.
    pub fn new(driver_name: impl Into<String>, vehicle_plate: Option<String>) -> Self {
        Self {
            driver_name: driver_name.into(),
            vehicle_plate,
            ..Self::default()
        }
    }

    /// Returns true if this entry belongs to the profile identified by
    /// driver name and plate, compared case-insensitively. A missing plate
    /// matches the empty plate.
    #[must_use]
    pub fn matches_profile(&self, name: &str, plate: &str) -> bool {
        self.driver_name.to_lowercase() == name.to_lowercase()
            && self.vehicle_plate.as_deref().unwrap_or("").to_lowercase() == plate.to_lowercase()
    }
}

impl Collection<'_, VehicleEntry> {
    /// Appends entries from an external source.
    ///
    /// Only ids not yet present are added; existing records are never
    /// touched. Added entries are tagged with `origin` and marked dirty.
    /// Entries without an id get a fresh one. Storage is written only if
    /// something was added.
    ///
    /// Returns the number of entries added.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored collection cannot be parsed or the
    /// write fails.
    pub fn import(&self, batch: Vec<VehicleEntry>, origin: &str) -> CoreResult<usize> {
        let mut current = self.load_slots()?;
        let mut known: HashSet<String> = current
            .iter()
            .filter_map(|s| s.id())
            .map(str::to_owned)
            .collect();

        let mut added = 0;
        for mut entry in batch {
            if entry.id.is_empty() {
                entry.id = new_id();
            }
            if !known.insert(entry.id.clone()) {
                continue;
            }
            entry.origin = Some(origin.to_owned());
            entry.synced = false;
            current.push(Slot::Typed(entry));
            added += 1;
        }

        if added > 0 {
            self.persist(current)?;
        }
        debug!(origin, added, "entries imported");
        Ok(added)
    }

    /// Deletes every entry of a driver profile and tombstones each one.
    ///
    /// Returns the number of entries removed.
    ///
    /// # Errors
    ///
    /// Returns an error if a write fails.
    pub fn delete_profile(&self, name: &str, plate: &str) -> CoreResult<usize> {
        let removed = self.delete_where(|e| e.matches_profile(name, plate))?;
        Ok(removed.len())
    }

    /// Applies a partial update to every entry of a driver profile.
    ///
    /// `patch` holds the JSON fields to overwrite. Ids are preserved.
    /// Matching entries are re-stamped and marked dirty. If any patched
    /// entry no longer fits the entry shape nothing is written.
    ///
    /// Returns the number of entries updated.
    ///
    /// # Errors
    ///
    /// Returns an error if the patch produces an invalid entry or the
    /// write fails.
    pub fn update_profile(
        &self,
        old_name: &str,
        old_plate: &str,
        patch: &Map<String, Value>,
    ) -> CoreResult<usize> {
        let mut entries = self.load_slots()?;
        let mut updated = 0;

        for entry in entries
            .iter_mut()
            .filter_map(Slot::as_typed_mut)
            .filter(|e| e.matches_profile(old_name, old_plate))
        {
            let mut doc = Document::from_record(&*entry)?;
            for (field, value) in patch {
                doc.insert(field.clone(), value.clone());
            }
            let mut patched: VehicleEntry = doc.into_record()?;
            patched.id = std::mem::take(&mut entry.id);
            patched.set_updated_at(clock::stamp_after(entry.updated_at.as_deref()));
            patched.synced = false;
            *entry = patched;
            updated += 1;
        }

        if updated > 0 {
            self.persist(entries)?;
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LocalDb;
    use outpost_storage::KvBackend;
    use serde_json::json;

    fn entry(id: &str, name: &str, plate: Option<&str>) -> VehicleEntry {
        VehicleEntry {
            id: id.into(),
            ..VehicleEntry::new(name, plate.map(str::to_owned))
        }
    }

    #[test]
    fn add_keeps_existing_created_at() {
        let db = LocalDb::open_in_memory();
        let mut e = VehicleEntry::new("Rita", None);
        e.created_at = Some("2023-03-01T08:00:00.000Z".into());

        let stored = db.entries().add(e).unwrap();
        assert_eq!(stored.created_at.as_deref(), Some("2023-03-01T08:00:00.000Z"));
        assert_ne!(stored.updated_at, stored.created_at);
    }

    #[test]
    fn unknown_fields_survive() {
        let db = LocalDb::open_in_memory();
        let raw = json!([{"id": "1", "driverName": "Rui", "synced": true, "badge": 42}]);
        db.store()
            .save_raw(db.entries().key(), raw.as_array().unwrap())
            .unwrap();

        let e = db.entries().get("1").unwrap();
        assert_eq!(e.extra.get("badge"), Some(&json!(42)));
        db.entries().update(e).unwrap();
        assert_eq!(db.store().load_raw(db.entries().key())[0]["badge"], json!(42));
    }

    #[test]
    fn import_is_additive_only() {
        let db = LocalDb::open_in_memory();
        let entries = db.entries();
        entries.add(entry("a", "Ana", None)).unwrap();
        entries.mark_synced(["a"]).unwrap();

        let added = entries
            .import(
                vec![
                    entry("a", "Changed", None),
                    entry("b", "Bia", Some("XYZ1234")),
                    entry("b", "Bia again", None),
                    entry("", "No id", None),
                ],
                "spreadsheet",
            )
            .unwrap();

        assert_eq!(added, 2);
        let a = entries.get("a").unwrap();
        assert_eq!(a.driver_name, "Ana");
        assert!(a.synced);
        let b = entries.get("b").unwrap();
        assert_eq!(b.origin.as_deref(), Some("spreadsheet"));
        assert!(!b.synced);
        assert_eq!(entries.count(), 3);
    }

    #[test]
    fn import_nothing_new_writes_nothing() {
        let db = LocalDb::open_in_memory();
        assert_eq!(db.entries().import(Vec::new(), "x").unwrap(), 0);
        assert!(db.store().backend().keys().unwrap().is_empty());
    }

    #[test]
    fn delete_profile_is_case_insensitive() {
        let db = LocalDb::open_in_memory();
        let entries = db.entries();
        entries.add(entry("1", "João", Some("abc1d23"))).unwrap();
        entries.add(entry("2", "JOÃO", Some("ABC1D23"))).unwrap();
        entries.add(entry("3", "João", None)).unwrap();
        entries.add(entry("4", "Maria", Some("ABC1D23"))).unwrap();

        assert_eq!(entries.delete_profile("joão", "Abc1D23").unwrap(), 2);

        let left: Vec<_> = entries.list().into_iter().map(|e| e.id).collect();
        assert_eq!(left, vec!["3", "4"]);
        let tombs: Vec<_> = db.tombstones().peek_all().into_iter().map(|t| t.id).collect();
        assert_eq!(tombs, vec!["1", "2"]);
        assert!(db
            .tombstones()
            .peek_all()
            .iter()
            .all(|t| t.table == "vehicle_entries"));
    }

    #[test]
    fn empty_plate_matches_missing_plate() {
        let db = LocalDb::open_in_memory();
        db.entries().add(entry("1", "Leo", None)).unwrap();
        assert_eq!(db.entries().delete_profile("leo", "").unwrap(), 1);
    }

    #[test]
    fn update_profile_patches_matching_entries() {
        let db = LocalDb::open_in_memory();
        let entries = db.entries();
        let first = entries.add(entry("1", "Ana", Some("AAA0000"))).unwrap();
        entries.add(entry("2", "Bia", Some("AAA0000"))).unwrap();
        entries.mark_synced(["1", "2"]).unwrap();

        let patch = json!({"driverName": "Ana Paula", "vehiclePlate": "BBB1111", "id": "hijack"});
        let n = entries
            .update_profile("ANA", "aaa0000", patch.as_object().unwrap())
            .unwrap();
        assert_eq!(n, 1);

        let updated = entries.get("1").unwrap();
        assert_eq!(updated.driver_name, "Ana Paula");
        assert_eq!(updated.vehicle_plate.as_deref(), Some("BBB1111"));
        assert!(!updated.synced);
        assert!(updated.updated_at > first.updated_at);
        assert!(entries.get("2").unwrap().synced);
    }

    #[test]
    fn update_profile_with_bad_patch_writes_nothing() {
        let db = LocalDb::open_in_memory();
        db.entries().add(entry("1", "Ana", None)).unwrap();
        let before = db.store().load_raw(db.entries().key());

        let patch = json!({"driverName": 12});
        assert!(db
            .entries()
            .update_profile("ana", "", patch.as_object().unwrap())
            .is_err());
        assert_eq!(db.store().load_raw(db.entries().key()), before);
    }

    #[test]
    fn profile_helpers_keep_records_that_do_not_decode() {
        let db = LocalDb::open_in_memory();
        let backup = json!({
            "entries": [
                {"id": "bad", "driverName": null, "synced": false},
                {"id": "1", "driverName": "Rui", "vehiclePlate": "AAA1B23"}
            ]
        });
        db.import_backup(&backup.to_string()).unwrap();
        let entries = db.entries();

        entries
            .import(vec![entry("2", "Ana", None), entry("bad", "Ana", None)], "csv")
            .unwrap();
        let patch = json!({"company": "Acme"});
        let patched = entries
            .update_profile("rui", "aaa1b23", patch.as_object().unwrap())
            .unwrap();
        assert_eq!(patched, 1);

        let raw = db.store().load_raw(entries.key());
        let ids: Vec<_> = raw.iter().map(|v| v["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["bad", "1", "2"]);
        assert_eq!(raw[0]["driverName"], Value::Null);
        assert_eq!(raw[0]["synced"], json!(false));
    }
}
