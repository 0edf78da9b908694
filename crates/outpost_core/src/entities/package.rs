//! Packages received at the gatehouse.

use super::sync_entity;
use crate::types::CollectionKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A package held for a recipient.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PackageRecord {
    /// Record id.
    pub id: String,
    /// Who the package is for.
    pub recipient_name: String,
    /// Sender or carrier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Workflow status, e.g. `"Pendente"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// When the package arrived; set when added.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_at: Option<String>,
    /// When the package was handed over.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<String>,
    /// Dirty flag.
    pub synced: bool,
    /// Last local mutation.
    #[serde(rename = "updated_at", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Fields this type does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

sync_entity!(PackageRecord, CollectionKind::Packages, |package, now| {
    package.received_at = Some(now.to_owned());
});

impl PackageRecord {
    /// Creates a package record for a recipient.
    pub fn new(recipient_name: impl Into<String>) -> Self {
        Self {
            recipient_name: recipient_name.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LocalDb;

    #[test]
    fn received_at_is_stamped() {
        let db = LocalDb::open_in_memory();
        let stored = db.packages().add(PackageRecord::new("Apt 12")).unwrap();
        assert_eq!(stored.received_at, stored.updated_at);
        assert!(!stored.synced);
    }

    #[test]
    fn camel_case_round_trip() {
        let mut p = PackageRecord::new("Carla");
        p.delivered_at = Some("2024-01-01T00:00:00.000Z".into());
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["recipientName"], "Carla");
        assert_eq!(json["deliveredAt"], "2024-01-01T00:00:00.000Z");
        assert_eq!(serde_json::from_value::<PackageRecord>(json).unwrap(), p);
    }
}
