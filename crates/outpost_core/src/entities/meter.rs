//! Utility meters and their readings.

use super::{is_unset, sync_entity};
use crate::clock;
use crate::collection::Collection;
use crate::types::CollectionKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Reverse;

/// A utility meter (water, power, gas) read on each shift.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Meter {
    /// Record id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Meter type, e.g. `"Hydrometer"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Unit of the readings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Creation stamp, set when added.
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

sync_entity!(Meter, CollectionKind::Meters, |meter, now| {
    meter.created_at = Some(now.to_owned());
});

impl Meter {
    /// Creates a meter.
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            ..Self::default()
        }
    }
}

/// One reading of a [`Meter`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MeterReading {
    /// Record id.
    pub id: String,
    /// Id of the meter read.
    pub meter_id: String,
    /// Value shown on the meter.
    pub value: f64,
    /// When the reading was taken. Kept if already set when added.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Operator who took the reading.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator_name: Option<String>,
    /// Free-form observation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,
    /// Dirty flag.
    pub synced: bool,
    /// Last local mutation.
    #[serde(rename = "updated_at", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Fields this type does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

sync_entity!(MeterReading, CollectionKind::Readings, |reading, now| {
    if is_unset(reading.timestamp.as_deref()) {
        reading.timestamp = Some(now.to_owned());
    }
});

impl MeterReading {
    /// Creates a reading for a meter.
    pub fn new(meter_id: impl Into<String>, value: f64) -> Self {
        Self {
            meter_id: meter_id.into(),
            value,
            ..Self::default()
        }
    }
}

impl Collection<'_, MeterReading> {
    /// Returns the readings of one meter, newest first.
    ///
    /// Readings whose timestamp does not parse sort last.
    pub fn by_meter(&self, meter_id: &str) -> Vec<MeterReading> {
        let mut readings: Vec<MeterReading> = self
            .list()
            .into_iter()
            .filter(|r| r.meter_id == meter_id)
            .collect();
        readings.sort_by_key(|r| Reverse(r.timestamp.as_deref().and_then(clock::parse_iso)));
        readings
    }
}
