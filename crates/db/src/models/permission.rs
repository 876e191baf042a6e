//! Permission policy rows (one live row per project).

use dbpilot_core::permission::PermissionPolicy;
use dbpilot_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `permissions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Permission {
    pub id: DbId,
    pub project_id: DbId,
    pub allow_ddl: bool,
    pub allow_write: bool,
    pub allow_read: bool,
    pub allow_delete: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Permission {
    /// The four flags as the gate consumes them.
    pub fn policy(&self) -> PermissionPolicy {
        PermissionPolicy {
            allow_ddl: self.allow_ddl,
            allow_write: self.allow_write,
            allow_read: self.allow_read,
            allow_delete: self.allow_delete,
        }
    }
}

/// Partial flag update. `None` leaves the stored flag untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionFlags {
    pub allow_ddl: Option<bool>,
    pub allow_write: Option<bool>,
    pub allow_read: Option<bool>,
    pub allow_delete: Option<bool>,
}

impl PermissionFlags {
    pub fn is_empty(&self) -> bool {
        self.allow_ddl.is_none()
            && self.allow_write.is_none()
            && self.allow_read.is_none()
            && self.allow_delete.is_none()
    }
}
