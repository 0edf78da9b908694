//! Full backup export and import.
//!
//! ## Backup Format
//!
//! A backup is one JSON object with one array per synced collection plus
//! the settings record:
//!
//! ```text
//! { "entries": [..], "breakfast": [..], "packages": [..], "meters": [..],
//!   "readings": [..], "shifts": [..], "logs": [..], "patrols": [..],
//!   "settings": {..} }
//! ```
//!
//! Records are exported exactly as stored, including `synced` flags and
//! fields unknown to this crate.
//!
//! ## Usage
//!
//! ```rust
//! use outpost_core::LocalDb;
//!
//! let source = LocalDb::open_in_memory();
//! let json = source.export_backup().unwrap();
//!
//! let target = LocalDb::open_in_memory();
//! let report = target.import_backup(&json).unwrap();
//! assert!(report.skipped.is_empty());
//! ```

use crate::database::LocalDb;
use crate::error::{CoreError, CoreResult};
use crate::types::CollectionKind;
use serde_json::{Map, Value};
use tracing::{info, warn};

/// Message of the error returned for an unusable backup payload.
pub const INVALID_BACKUP_MESSAGE: &str = "invalid backup file format";

/// Field holding the settings record.
const SETTINGS_FIELD: &str = "settings";

/// What an import wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Collections overwritten and how many records each received.
    pub collections: Vec<(CollectionKind, usize)>,
    /// Whether the settings record was written.
    pub settings: bool,
    /// Fields present but not usable (wrong JSON type); left untouched.
    pub skipped: Vec<String>,
}

impl ImportReport {
    /// Total records written across collections.
    #[must_use]
    pub fn total_records(&self) -> usize {
        self.collections.iter().map(|(_, n)| n).sum()
    }
}

impl LocalDb {
    /// Builds the backup object.
    ///
    /// Settings are exported with defaults applied.
    pub fn export_backup_value(&self) -> Value {
        let mut backup = Map::new();
        for kind in CollectionKind::ALL {
            let records = self.store().load_raw(&self.config().collection_key(kind));
            backup.insert(kind.backup_field().to_owned(), Value::Array(records));
        }
        backup.insert(SETTINGS_FIELD.to_owned(), Value::Object(self.settings_value()));
        Value::Object(backup)
    }

    /// Serializes a full backup to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn export_backup(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(&self.export_backup_value())?)
    }

    /// Restores a full backup.
    ///
    /// Every array-typed collection field overwrites its collection
    /// wholesale; the audit log is re-capped. An object-typed `settings`
    /// field is written as-is. Absent or `null` fields leave their slot
    /// untouched; fields of any other type are skipped and reported.
    ///
    /// There is no atomicity across fields: if a write fails midway, the
    /// fields before it stay imported.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidBackup`] without writing anything if the
    /// payload is not a JSON object, or a storage error if a write fails.
    pub fn import_backup(&self, json: &str) -> CoreResult<ImportReport> {
        let backup = match serde_json::from_str::<Value>(json) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(CoreError::invalid_backup(INVALID_BACKUP_MESSAGE)),
            Err(e) => {
                warn!(error = %e, "backup payload does not parse");
                return Err(CoreError::invalid_backup(INVALID_BACKUP_MESSAGE));
            }
        };

        let mut report = ImportReport::default();
        for kind in CollectionKind::ALL {
            let field = kind.backup_field();
            match backup.get(field) {
                None | Some(Value::Null) => {}
                Some(Value::Array(records)) => {
                    let records = match self.config().capacity_for(kind) {
                        Some(cap) if records.len() > cap => &records[records.len() - cap..],
                        _ => &records[..],
                    };
                    self.store()
                        .save_raw(&self.config().collection_key(kind), records)?;
                    report.collections.push((kind, records.len()));
                }
                Some(_) => report.skipped.push(field.to_owned()),
            }
        }

        match backup.get(SETTINGS_FIELD) {
            None | Some(Value::Null) => {}
            Some(settings @ Value::Object(_)) => {
                self.write_settings_value(settings)?;
                report.settings = true;
            }
            Some(_) => report.skipped.push(SETTINGS_FIELD.to_owned()),
        }

        info!(
            records = report.total_records(),
            settings = report.settings,
            skipped = report.skipped.len(),
            "backup imported"
        );
        Ok(report)
    }
}
