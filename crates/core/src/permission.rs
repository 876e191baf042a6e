//! Per-project permission policy and the authorization gate.

use serde::{Deserialize, Serialize};

use crate::classifier::QueryType;

/// Denial reason returned by the validate (dry explain) path.
pub const VALIDATION_READ_REQUIRED: &str = "Read permission required for query validation";

/// One of the four independent policy dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Ddl,
    /// Covers both INSERT and UPDATE.
    Write,
    Read,
    Delete,
}

impl Permission {
    /// The caller-facing reason used when this permission is missing.
    pub fn denial_reason(self) -> &'static str {
        match self {
            Self::Ddl => "DDL operations are not allowed for this project",
            Self::Write => "Write operations are not allowed for this project",
            Self::Read => "Read operations are not allowed for this project",
            Self::Delete => "Delete operations are not allowed for this project",
        }
    }
}

/// The four-flag permission record attached 1:1 to a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionPolicy {
    pub allow_ddl: bool,
    pub allow_write: bool,
    pub allow_read: bool,
    pub allow_delete: bool,
}

impl Default for PermissionPolicy {
    /// Everything allowed, as at project creation.
    fn default() -> Self {
        Self {
            allow_ddl: true,
            allow_write: true,
            allow_read: true,
            allow_delete: true,
        }
    }
}

impl PermissionPolicy {
    /// Build a policy from optional overrides; unspecified flags default to `true`.
    pub fn with_overrides(
        allow_ddl: Option<bool>,
        allow_write: Option<bool>,
        allow_read: Option<bool>,
        allow_delete: Option<bool>,
    ) -> Self {
        Self {
            allow_ddl: allow_ddl.unwrap_or(true),
            allow_write: allow_write.unwrap_or(true),
            allow_read: allow_read.unwrap_or(true),
            allow_delete: allow_delete.unwrap_or(true),
        }
    }

    pub fn allows(&self, permission: Permission) -> bool {
        match permission {
            Permission::Ddl => self.allow_ddl,
            Permission::Write => self.allow_write,
            Permission::Read => self.allow_read,
            Permission::Delete => self.allow_delete,
        }
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(String),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Decide whether `query_type` may run under `policy`.
///
/// A missing policy is fully permissive (projects created before policies
/// existed). [`QueryType::Other`] is always allowed since no flag governs it.
pub fn authorize(query_type: QueryType, policy: Option<&PermissionPolicy>) -> Decision {
    let Some(policy) = policy else {
        return Decision::Allow;
    };

    match query_type.required_permission() {
        Some(permission) if !policy.allows(permission) => {
            Decision::Deny(permission.denial_reason().to_string())
        }
        Some(_) | None => Decision::Allow,
    }
}

/// Decide whether the validate path may run under `policy`.
///
/// Validation always executes as a read-only explain, so it needs read
/// permission whatever the statement's own class.
pub fn authorize_validation(policy: Option<&PermissionPolicy>) -> Decision {
    match policy {
        Some(policy) if !policy.allow_read => Decision::Deny(VALIDATION_READ_REQUIRED.to_string()),
        _ => Decision::Allow,
    }
}
