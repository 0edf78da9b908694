use super::sync_entity;
use crate::types::CollectionKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A patrol round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PatrolRecord {
    /// Record id.
    pub id: String,
    /// Guard on the round.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guard_name: Option<String>,
    /// Round status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Free-form notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Creation stamp, set when added.
    #[serde(rename = "criadoEm", skip_serializing_if = "Option::is_none")]
    pub criado_em: Option<String>,
    /// Dirty flag.
    pub synced: bool,
    /// Last local mutation.
    #[serde(rename = "updated_at", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Fields this type does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

sync_entity!(PatrolRecord, CollectionKind::Patrols, |patrol, now| {
    patrol.criado_em = Some(now.to_owned());
});
