//! The record contract shared by every synced collection.

use crate::error::CoreResult;
use crate::types::CollectionKind;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A record that participates in offline sync.
///
/// Every record carries an immutable `id`, a `synced` dirty flag and an
/// `updated_at` stamp. `synced == false` means the local state has diverged
/// from the remote store and must be pushed.
pub trait SyncRecord: Serialize + DeserializeOwned + Clone {
    /// The record id. Empty until one is assigned.
    fn id(&self) -> &str;

    /// Assigns the record id.
    fn set_id(&mut self, id: String);

    /// Whether the remote store has acknowledged the current state.
    fn is_synced(&self) -> bool;

    /// Sets the dirty flag.
    fn set_synced(&mut self, synced: bool);

    /// Last local mutation stamp.
    fn updated_at(&self) -> Option<&str>;

    /// Sets the mutation stamp.
    fn set_updated_at(&mut self, at: String);

    /// Stamps the entity-specific creation field when a record is added.
    fn stamp_created(&mut self, _now: &str) {}
}

/// A record type stored in one of the [`CollectionKind`] slots.
pub trait Entity: SyncRecord {
    /// The collection this type lives in.
    const COLLECTION: CollectionKind;
}

/// An untyped record.
///
/// Used for collections without a concrete type and wherever a pass must
/// not lose fields it does not understand (sync bookkeeping, transport).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(pub Map<String, Value>);

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts any serializable record into a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the record does not serialize to a JSON object.
    pub fn from_record<T: Serialize>(record: &T) -> CoreResult<Self> {
        Ok(serde_json::from_value(serde_json::to_value(record)?)?)
    }

    /// Converts the document into a typed record.
    ///
    /// # Errors
    ///
    /// Returns an error if the fields do not fit `T`.
    pub fn into_record<T: DeserializeOwned>(self) -> CoreResult<T> {
        Ok(serde_json::from_value(Value::Object(self.0))?)
    }

    /// Returns a field value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Sets a field value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    /// Builder form of [`Document::insert`].
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl SyncRecord for Document {
    fn id(&self) -> &str {
        self.0.get("id").and_then(Value::as_str).unwrap_or("")
    }

    fn set_id(&mut self, id: String) {
        self.0.insert("id".into(), Value::String(id));
    }

    fn is_synced(&self) -> bool {
        self.0.get("synced").and_then(Value::as_bool) == Some(true)
    }

    fn set_synced(&mut self, synced: bool) {
        self.0.insert("synced".into(), Value::Bool(synced));
    }

    fn updated_at(&self) -> Option<&str> {
        self.0.get("updated_at").and_then(Value::as_str)
    }

    fn set_updated_at(&mut self, at: String) {
        self.0.insert("updated_at".into(), Value::String(at));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn document_sync_fields() {
        let mut doc: Document = serde_json::from_value(json!({"id": "1", "v": "old"})).unwrap();
        assert_eq!(doc.id(), "1");
        assert!(!doc.is_synced());
        assert_eq!(doc.updated_at(), None);

        doc.set_synced(true);
        doc.set_updated_at("2024-01-01T00:00:00.000Z".into());
        assert!(doc.is_synced());
        assert_eq!(doc.get("v"), Some(&json!("old")));
        assert_eq!(doc.updated_at(), Some("2024-01-01T00:00:00.000Z"));
    }

    #[test]
    fn document_synced_requires_true_bool() {
        let doc: Document = serde_json::from_value(json!({"id": "1", "synced": "yes"})).unwrap();
        assert!(!doc.is_synced());
    }

    #[test]
    fn document_non_string_id_reads_empty() {
        let doc: Document = serde_json::from_value(json!({"id": 7})).unwrap();
        assert_eq!(doc.id(), "");
    }

    #[test]
    fn document_rejects_non_objects() {
        assert!(serde_json::from_value::<Document>(json!([1, 2])).is_err());
        assert!(serde_json::from_value::<Document>(json!("x")).is_err());
    }

    #[test]
    fn document_record_conversion() {
        let doc = Document::new().with("id", "a").with("n", 3);
        let value: Value = doc.clone().into_record().unwrap();
        assert_eq!(value, json!({"id": "a", "n": 3}));
        assert_eq!(Document::from_record(&value).unwrap(), doc);
    }
}
