//! Daily breakfast list.

use super::sync_entity;
use crate::clock;
use crate::collection::Collection;
use crate::error::CoreResult;
use crate::types::CollectionKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status of a breakfast that was handed out.
pub const DELIVERED_STATUS: &str = "Entregue";

/// A person on the breakfast list for one day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BreakfastRecord {
    /// Record id.
    pub id: String,
    /// Person entitled to breakfast.
    pub person_name: String,
    /// Day of the list, `YYYY-MM-DD`.
    pub date: String,
    /// Delivery status; [`DELIVERED_STATUS`] once handed out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// When it was handed out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<String>,
    /// Operator who handed it out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator_name: Option<String>,
    /// Dirty flag.
    pub synced: bool,
    /// Last local mutation.
    #[serde(rename = "updated_at", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Fields this type does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

sync_entity!(BreakfastRecord, CollectionKind::Breakfast);

impl BreakfastRecord {
    /// Puts a person on the list for `date`.
    pub fn new(person_name: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            person_name: person_name.into(),
            date: date.into(),
            ..Self::default()
        }
    }

    /// Returns true once the breakfast was handed out.
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        self.status.as_deref() == Some(DELIVERED_STATUS)
    }
}

impl Collection<'_, BreakfastRecord> {
    /// Marks a breakfast as handed out by `operator_name`.
    ///
    /// Returns `false` if no record has that id.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn mark_delivered(&self, id: &str, operator_name: &str) -> CoreResult<bool> {
        let delivered = self.modify(id, |record| {
            record.status = Some(DELIVERED_STATUS.to_owned());
            record.delivered_at = Some(clock::now_iso());
            record.operator_name = Some(operator_name.to_owned());
        })?;
        Ok(delivered.is_some())
    }

    /// Removes the whole list of one day, tombstoning every record.
    ///
    /// Returns the number of records removed.
    ///
    /// # Errors
    ///
    /// Returns an error if a write fails.
    pub fn clear_date(&self, date: &str) -> CoreResult<usize> {
        Ok(self.delete_where(|r| r.date == date)?.len())
    }
}
