//! Unsubmitted form draft.

use crate::database::LocalDb;
use crate::error::CoreResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A multi-step form saved mid-way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    /// Whatever the form had filled in.
    pub form_data: Value,
    /// Step the operator was on.
    pub step: u32,
}

impl LocalDb {
    /// Saves the form draft, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save_draft(&self, form_data: Value, step: u32) -> CoreResult<()> {
        self.store()
            .write_value(&self.config().draft_key(), &Draft { form_data, step })
    }

    /// Returns the saved draft. A malformed draft reads as `None`.
    pub fn draft(&self) -> Option<Draft> {
        self.store().read_value(&self.config().draft_key())
    }

    /// Discards the saved draft.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn clear_draft(&self) -> CoreResult<()> {
        self.store().remove(&self.config().draft_key())
    }
}
