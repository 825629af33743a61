//! Acting admin identity and permission checks.
//!
//! Each resource is guarded by one permission name. Holding the
//! [`SUPER_ADMIN_ROLE`] role passes every check.

use std::fmt;

use backoffice_core::AdminId;

use super::ServiceError;
use crate::models::CurrentAdmin;

/// Role that bypasses permission checks.
pub const SUPER_ADMIN_ROLE: &str = "super_admin";

/// Reference roles created by `bo-cli seed`, in ID order.
pub const REFERENCE_ROLES: &[&str] = &[SUPER_ADMIN_ROLE, "staff"];

/// Reference permissions created by `bo-cli seed`, in ID order.
pub const REFERENCE_PERMISSIONS: &[&str] = &[
    Resource::Admins.permission(),
    Resource::Categories.permission(),
    Resource::Brands.permission(),
    Resource::Items.permission(),
];

/// A guarded resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Admins and the role/permission reference lists.
    Admins,
    Categories,
    Brands,
    Items,
}

impl Resource {
    /// Permission name required to operate on this resource.
    #[must_use]
    pub const fn permission(self) -> &'static str {
        match self {
            Self::Admins => "admin.manage",
            Self::Categories => "category.manage",
            Self::Brands => "brand.manage",
            Self::Items => "item.manage",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Admins => "admins",
            Self::Categories => "categories",
            Self::Brands => "brands",
            Self::Items => "items",
        };
        f.write_str(name)
    }
}

/// The admin on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// `None` for the system actor used by the CLI.
    pub id: Option<AdminId>,
    pub user_id: String,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

impl Actor {
    /// Actor for operator tooling, holding the super-admin role.
    #[must_use]
    pub fn system() -> Self {
        Self {
            id: None,
            user_id: "system".to_owned(),
            roles: vec![SUPER_ADMIN_ROLE.to_owned()],
            permissions: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        self.roles.iter().any(|r| r == SUPER_ADMIN_ROLE)
    }

    #[must_use]
    pub fn can(&self, resource: Resource) -> bool {
        self.is_super_admin() || self.permissions.iter().any(|p| p == resource.permission())
    }
}

impl From<CurrentAdmin> for Actor {
    fn from(admin: CurrentAdmin) -> Self {
        Self {
            id: Some(admin.id),
            user_id: admin.user_id,
            roles: admin.roles,
            permissions: admin.permissions,
        }
    }
}

impl From<&CurrentAdmin> for Actor {
    fn from(admin: &CurrentAdmin) -> Self {
        admin.clone().into()
    }
}

/// Fail with `Forbidden` unless `actor` may operate on `resource`.
///
/// # Errors
///
/// Returns `ServiceError::Forbidden` naming the missing permission.
pub fn authorize(actor: &Actor, resource: Resource) -> Result<(), ServiceError> {
    if actor.can(resource) {
        Ok(())
    } else {
        tracing::warn!(
            actor = %actor.user_id,
            %resource,
            "permission denied"
        );
        Err(ServiceError::Forbidden(format!(
            "{} requires {}",
            resource,
            resource.permission()
        )))
    }
}
