//! Station settings: one record, merged over defaults on every read.

use crate::clock;
use crate::database::LocalDb;
use crate::error::CoreResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Station-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Name shown on reports.
    pub company_name: String,
    /// Name of this station.
    pub device_name: String,
    /// `"light"` or `"dark"`.
    pub theme: String,
    /// `"small"`, `"medium"` or `"large"`.
    pub font_size: String,
    /// Phone book of sectors; shape owned by the UI.
    pub sector_contacts: Vec<Value>,
    /// Dirty flag.
    pub synced: bool,
    /// Last local save.
    #[serde(rename = "updated_at", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Fields this type does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            company_name: "Portaria PX".into(),
            device_name: "Estação Principal".into(),
            theme: "light".into(),
            font_size: "medium".into(),
            sector_contacts: Vec::new(),
            synced: true,
            updated_at: None,
            extra: Map::new(),
        }
    }
}

impl AppSettings {
    /// The defaults as a JSON object.
    fn default_object() -> Map<String, Value> {
        match serde_json::to_value(Self::default()) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

impl LocalDb {
    /// Returns the persisted settings merged over the defaults, as JSON.
    ///
    /// Persisted fields win. A non-array `sectorContacts` becomes `[]`.
    /// Missing or malformed storage yields the defaults.
    pub fn settings_value(&self) -> Map<String, Value> {
        let mut merged = AppSettings::default_object();
        if let Some(Value::Object(stored)) = self.store().read_value(&self.config().settings_key()) {
            merged.extend(stored);
            if !merged.get("sectorContacts").is_some_and(Value::is_array) {
                merged.insert("sectorContacts".into(), Value::Array(Vec::new()));
            }
        }
        merged
    }

    /// Returns the current settings.
    ///
    /// Stored fields of the wrong type fall back to the defaults.
    pub fn settings(&self) -> AppSettings {
        let merged = self.settings_value();
        serde_json::from_value(Value::Object(merged)).unwrap_or_else(|e| {
            warn!(error = %e, "stored settings do not fit, using defaults");
            AppSettings::default()
        })
    }

    /// Saves the settings, marking them dirty.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save_settings(&self, settings: &AppSettings) -> CoreResult<AppSettings> {
        let mut settings = settings.clone();
        settings.synced = false;
        settings.updated_at = Some(clock::stamp_after(settings.updated_at.as_deref()));
        self.store()
            .write_value(&self.config().settings_key(), &settings)?;
        Ok(settings)
    }

    pub(crate) fn write_settings_value(&self, value: &Value) -> CoreResult<()> {
        self.store().write_value(&self.config().settings_key(), value)
    }
}
