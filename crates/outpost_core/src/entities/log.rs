//! Operational audit log.

use super::{is_unset, sync_entity};
use crate::database::LocalDb;
use crate::error::CoreResult;
use crate::types::{CollectionKind, OperatorContext};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One audit log line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppLog {
    /// Record id.
    pub id: String,
    /// When the action happened.
    pub timestamp: String,
    /// Operator name, or `"Sistema"`.
    pub user: String,
    /// Functional area, e.g. `"entries"`.
    pub module: String,
    /// What was done.
    pub action: String,
    /// Id of the record the action concerns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    /// Free-form details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Dirty flag.
    pub synced: bool,
    /// Creation stamp, set when added.
    #[serde(rename = "created_at", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last local mutation.
    #[serde(rename = "updated_at", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Fields this type does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

sync_entity!(AppLog, CollectionKind::Logs, |log, now| {
    log.created_at = Some(now.to_owned());
    if is_unset(Some(log.timestamp.as_str())) {
        log.timestamp = now.to_owned();
    }
});

impl LocalDb {
    /// Appends an audit log line attributed to `ctx`.
    ///
    /// The log keeps only the most recent
    /// [`log_capacity`](crate::StoreConfig::log_capacity) lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn add_log(
        &self,
        ctx: &OperatorContext,
        module: &str,
        action: &str,
        reference_id: Option<&str>,
        details: Option<&str>,
    ) -> CoreResult<AppLog> {
        let log = AppLog {
            user: ctx.display_name().to_owned(),
            module: module.to_owned(),
            action: action.to_owned(),
            reference_id: reference_id.map(str::to_owned),
            details: details.map(str::to_owned),
            ..AppLog::default()
        };
        self.logs().add(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CollectionKind, StoreConfig};

    #[test]
    fn add_log_without_operator_is_system() {
        let db = LocalDb::open_in_memory();
        let log = db
            .add_log(&OperatorContext::system(), "settings", "saved", None, None)
            .unwrap();

        assert_eq!(log.user, "Sistema");
        assert!(!log.synced);
        assert_eq!(log.created_at.as_deref(), Some(log.timestamp.as_str()));
        assert_eq!(log.updated_at, log.created_at);
    }

    #[test]
    fn add_log_records_operator_and_reference() {
        let db = LocalDb::open_in_memory();
        db.add_log(
            &OperatorContext::operator("Joana"),
            "packages",
            "delivered",
            Some("pkg-1"),
            Some("apt 101"),
        )
        .unwrap();

        let logs = db.logs().list();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].user, "Joana");
        assert_eq!(logs[0].reference_id.as_deref(), Some("pkg-1"));

        let raw = db
            .store()
            .load_raw(&db.config().collection_key(CollectionKind::Logs));
        assert_eq!(raw[0]["referenceId"], "pkg-1");
        assert!(raw[0].get("created_at").is_some());
    }

    #[test]
    fn log_is_capped_at_default_capacity() {
        let db = LocalDb::open_in_memory();
        let seed: Vec<AppLog> = (0..2000)
            .map(|i| AppLog {
                id: format!("old-{i}"),
                action: "seed".into(),
                ..AppLog::default()
            })
            .collect();
        db.logs().save_all(seed).unwrap();

        db.add_log(&OperatorContext::system(), "system", "newest", None, None)
            .unwrap();

        let logs = db.logs().list();
        assert_eq!(logs.len(), 2000);
        assert_eq!(logs[0].id, "old-1");
        assert_eq!(logs[1999].action, "newest");
    }

    #[test]
    fn custom_capacity() {
        let db = LocalDb::open_in_memory_with_config(StoreConfig::new().log_capacity(1));
        let ctx = OperatorContext::system();
        db.add_log(&ctx, "a", "first", None, None).unwrap();
        db.add_log(&ctx, "a", "second", None, None).unwrap();
        assert_eq!(db.logs().list()[0].action, "second");
    }
}
