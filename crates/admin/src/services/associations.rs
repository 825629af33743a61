//! Admin role/permission association management.
//!
//! Replacing an admin's grants always means "make the links exactly this
//! set". The store computes the diff against the current links and applies
//! it atomically; this module checks the requested IDs first.

use backoffice_core::{AdminId, FieldReason, ValidationErrors};
use tracing::instrument;

use super::ServiceError;
use crate::db::AdminRepository;
use crate::models::AdminLinks;

/// Form field carrying role IDs.
pub const ROLES_FIELD: &str = "adminRoles";

/// Form field carrying permission IDs.
pub const PERMISSIONS_FIELD: &str = "adminPermissions";

/// Validates and replaces admin role/permission links.
pub struct AssociationManager<'a, S> {
    store: &'a S,
}

impl<'a, S: AdminRepository> AssociationManager<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Report every requested role or permission ID that does not exist.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Persistence` if the reference lists cannot be
    /// read. Unknown IDs are returned in the `Ok` value, not as an error.
    pub async fn unknown_references(
        &self,
        links: &AdminLinks,
    ) -> Result<ValidationErrors, ServiceError> {
        let mut errors = ValidationErrors::new();
        if links.roles.is_empty() && links.permissions.is_empty() {
            return Ok(errors);
        }

        let roles = self.store.list_roles().await?;
        for id in &links.roles {
            if !roles.iter().any(|r| r.id == *id) {
                errors.push(ROLES_FIELD, FieldReason::UnknownReference { id: id.as_i32() });
            }
        }

        let permissions = self.store.list_permissions().await?;
        for id in &links.permissions {
            if !permissions.iter().any(|p| p.id == *id) {
                errors.push(
                    PERMISSIONS_FIELD,
                    FieldReason::UnknownReference { id: id.as_i32() },
                );
            }
        }

        Ok(errors)
    }

    /// Make the admin's links exactly `links`. Re-applying the same sets is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for unknown IDs,
    /// `ServiceError::NotFound` if the admin does not exist, or
    /// `ServiceError::Persistence` on storage failure.
    #[instrument(skip(self, links), fields(roles = links.roles.len(), permissions = links.permissions.len()))]
    pub async fn replace(&self, admin_id: AdminId, links: &AdminLinks) -> Result<(), ServiceError> {
        self.unknown_references(links).await?.into_result()?;

        self.store
            .replace_admin_links(admin_id, links)
            .await
            .map_err(|e| ServiceError::from_write(e, "admin", Some(admin_id.as_i32()), ""))
    }
}
