//! Admin domain types.
//!
//! Admins are the back-office operators. Each admin is linked to any number
//! of roles and permissions through join records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use backoffice_core::{AdminId, PermissionId, RawInput, RoleId};

use super::links::AdminLinks;

/// A persisted admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    /// Database ID.
    pub id: AdminId,
    /// Login identifier (unique).
    pub user_id: String,
    /// Display name.
    pub user_name: String,
    /// Argon2id PHC string. Never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Avatar path or URL.
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A role that can be granted to admins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
}

/// A permission that can be granted to admins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: String,
}

/// Admin together with its current grants.
#[derive(Debug, Clone, Serialize)]
pub struct AdminDetail {
    pub admin: Admin,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
}

/// Fields needed to insert an admin.
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub user_id: String,
    pub user_name: String,
    pub password_hash: String,
    pub avatar: Option<String>,
}

/// Replacement values for an admin's mutable fields.
///
/// `password_hash` is only written when present; the other fields are always
/// replaced.
#[derive(Debug, Clone)]
pub struct AdminChanges {
    pub user_id: String,
    pub user_name: String,
    pub avatar: Option<String>,
    pub password_hash: Option<String>,
}

/// Submitted admin form (create and edit).
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminForm {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    /// Plain-text password. Required on create, optional on edit.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default, rename = "adminRoles")]
    pub roles: Vec<RoleId>,
    #[serde(default, rename = "adminPermissions")]
    pub permissions: Vec<PermissionId>,
}

impl AdminForm {
    /// Fields checked by the admin length rules.
    #[must_use]
    pub fn raw(&self) -> RawInput {
        let mut raw = RawInput::new();
        if let Some(user_id) = &self.user_id {
            raw.insert("userId".to_owned(), user_id.clone());
        }
        if let Some(user_name) = &self.user_name {
            raw.insert("userName".to_owned(), user_name.clone());
        }
        raw
    }

    /// Requested grants, with duplicates collapsed.
    #[must_use]
    pub fn links(&self) -> AdminLinks {
        AdminLinks::new(self.roles.iter().copied(), self.permissions.iter().copied())
    }
}

impl fmt::Debug for AdminForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminForm")
            .field("user_id", &self.user_id)
            .field("user_name", &self.user_name)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("avatar", &self.avatar)
            .field("roles", &self.roles)
            .field("permissions", &self.permissions)
            .finish()
    }
}
