//! Work shifts (time clock).

use super::sync_entity;
use crate::collection::Collection;
use crate::error::CoreResult;
use crate::types::CollectionKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One operator's work shift.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkShift {
    /// Record id.
    pub id: String,
    /// Operator on duty.
    pub operator_name: String,
    /// Shift start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// Shift end; `None` while the shift is open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    /// Dirty flag.
    pub synced: bool,
    /// Last local mutation.
    #[serde(rename = "updated_at", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Fields this type does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

sync_entity!(WorkShift, CollectionKind::Shifts);

impl WorkShift {
    /// Opens a shift for an operator.
    pub fn new(operator_name: impl Into<String>, start_time: impl Into<String>) -> Self {
        Self {
            operator_name: operator_name.into(),
            start_time: Some(start_time.into()),
            ..Self::default()
        }
    }
}

impl Collection<'_, WorkShift> {
    /// Stores a shift: replaces the shift with the same id, or adds it.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn upsert(&self, shift: WorkShift) -> CoreResult<WorkShift> {
        if !shift.id.is_empty() && self.update(shift.clone())? {
            return Ok(self.get(&shift.id).unwrap_or(shift));
        }
        self.add(shift)
    }
}
