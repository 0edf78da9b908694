//! Local cache of internal users.
//!
//! The cache lets operators log in while offline. It is not synced and
//! never produces tombstones.

use crate::database::LocalDb;
use crate::error::CoreResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A gatehouse operator account as last seen from the remote store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InternalUser {
    /// Account id.
    pub id: String,
    /// Login name.
    pub username: String,
    /// Role, e.g. `"admin"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Whether the account may log in.
    pub active: bool,
    /// Fields this type does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LocalDb {
    /// Returns the cached users. Corrupt storage reads as empty.
    pub fn users_cache(&self) -> Vec<InternalUser> {
        self.store().load(&self.config().users_key())
    }

    /// Replaces the cached users.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save_users_cache(&self, users: &[InternalUser]) -> CoreResult<()> {
        self.store().save(&self.config().users_key(), users)
    }

    /// Replaces the cached user with the same id, or appends it.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn update_user_in_cache(&self, user: InternalUser) -> CoreResult<()> {
        let mut users = self.users_cache();
        match users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user,
            None => users.push(user),
        }
        self.save_users_cache(&users)
    }
}
