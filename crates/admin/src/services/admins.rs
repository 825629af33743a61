//! Admin CRUD orchestration.
//!
//! Admin writes carry their role/permission sets: the admin row and its link
//! diff are persisted together, so an admin never exists with a partial set
//! of grants. Unlike the catalog entities, admins are hard-deleted.

use backoffice_core::validation::{ADMIN_RULES, validate};
use backoffice_core::{AdminId, FieldReason, ValidationErrors};
use tracing::instrument;

use super::ServiceError;
use super::access::{Actor, Resource, authorize};
use super::associations::AssociationManager;
use super::auth::hash_password;
use crate::db::AdminRepository;
use crate::models::{
    Admin, AdminChanges, AdminDetail, AdminForm, AdminLinks, NewAdmin, Page, PageRequest,
    Permission, Role,
};

const ENTITY: &str = "admin";

/// Admin orchestrator.
pub struct AdminService<'a, S> {
    store: &'a S,
}

impl<'a, S: AdminRepository> AdminService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// True when no admin other than `exclude` uses `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Persistence` on storage failure.
    pub async fn check_unique(
        &self,
        user_id: &str,
        exclude: Option<AdminId>,
    ) -> Result<bool, ServiceError> {
        Ok(!self.store.admin_user_id_taken(user_id, exclude).await?)
    }

    /// Admin by ID.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the admin does not exist.
    pub async fn find_by_id(&self, id: AdminId) -> Result<Admin, ServiceError> {
        self.store
            .find_admin(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ENTITY, id))
    }

    /// Page of admins, optionally filtered by a keyword matched against
    /// login identifier and display name.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` or `ServiceError::Persistence`.
    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn list(
        &self,
        actor: &Actor,
        page: PageRequest,
        keyword: Option<&str>,
    ) -> Result<Page<Admin>, ServiceError> {
        authorize(actor, Resource::Admins)?;
        Ok(self.store.list_admins(page, keyword).await?)
    }

    /// Admin together with its current roles and permissions.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` or `ServiceError::NotFound`.
    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn detail(&self, actor: &Actor, id: AdminId) -> Result<AdminDetail, ServiceError> {
        authorize(actor, Resource::Admins)?;
        let admin = self.find_by_id(id).await?;
        let roles = self.store.roles_of(id).await?;
        let permissions = self.store.permissions_of(id).await?;
        Ok(AdminDetail {
            admin,
            roles,
            permissions,
        })
    }

    /// Every role, for the admin forms.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` or `ServiceError::Persistence`.
    pub async fn roles(&self, actor: &Actor) -> Result<Vec<Role>, ServiceError> {
        authorize(actor, Resource::Admins)?;
        Ok(self.store.list_roles().await?)
    }

    /// Every permission, for the admin forms.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` or `ServiceError::Persistence`.
    pub async fn permissions(&self, actor: &Actor) -> Result<Vec<Permission>, ServiceError> {
        authorize(actor, Resource::Admins)?;
        Ok(self.store.list_permissions().await?)
    }

    /// Validate, check uniqueness, hash the password, then insert the admin
    /// with its links.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for bad input or unknown grant IDs,
    /// `ServiceError::Conflict` if the login identifier is taken, and
    /// `ServiceError::PasswordHash` if hashing fails.
    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn create(&self, actor: &Actor, form: &AdminForm) -> Result<Admin, ServiceError> {
        authorize(actor, Resource::Admins)?;

        let mut errors = validate(&form.raw(), ADMIN_RULES).err().unwrap_or_default();
        let password = new_password(form);
        if password.is_none() {
            errors.push("password", FieldReason::Required);
        }
        errors.into_result()?;

        let links = form.links();
        self.check_references(&links).await?;

        let user_id = form.user_id.clone().unwrap_or_default();
        if !self.check_unique(&user_id, None).await? {
            tracing::warn!(user_id = %user_id, "admin user id already taken");
            return Err(ServiceError::conflict("userId", &user_id));
        }

        let password_hash = password
            .map(hash_password)
            .transpose()
            .map_err(|_| ServiceError::PasswordHash)?
            .unwrap_or_default();

        let admin = self
            .store
            .insert_admin(
                NewAdmin {
                    user_id: user_id.clone(),
                    user_name: form.user_name.clone().unwrap_or_default(),
                    password_hash,
                    avatar: form.avatar.clone(),
                },
                &links,
            )
            .await
            .map_err(|e| ServiceError::from_write(e, ENTITY, None, &user_id))?;

        tracing::info!(
            admin_id = %admin.id,
            roles = links.roles.len(),
            permissions = links.permissions.len(),
            "admin created"
        );
        Ok(admin)
    }

    /// Replace an admin's fields and grants. The password is only changed
    /// when a new one is submitted.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound`, `ServiceError::Validation`,
    /// `ServiceError::Conflict` or `ServiceError::PasswordHash`.
    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn edit(
        &self,
        actor: &Actor,
        id: AdminId,
        form: &AdminForm,
    ) -> Result<Admin, ServiceError> {
        authorize(actor, Resource::Admins)?;
        self.find_by_id(id).await?;

        validate(&form.raw(), ADMIN_RULES)?;

        let links = form.links();
        self.check_references(&links).await?;

        let user_id = form.user_id.clone().unwrap_or_default();
        if !self.check_unique(&user_id, Some(id)).await? {
            tracing::warn!(user_id = %user_id, "admin user id already taken");
            return Err(ServiceError::conflict("userId", &user_id));
        }

        let password_hash = new_password(form)
            .map(hash_password)
            .transpose()
            .map_err(|_| ServiceError::PasswordHash)?;

        let admin = self
            .store
            .update_admin(
                id,
                AdminChanges {
                    user_id: user_id.clone(),
                    user_name: form.user_name.clone().unwrap_or_default(),
                    avatar: form.avatar.clone(),
                    password_hash,
                },
                &links,
            )
            .await
            .map_err(|e| ServiceError::from_write(e, ENTITY, Some(id.as_i32()), &user_id))?;

        tracing::info!(admin_id = %admin.id, "admin updated");
        Ok(admin)
    }

    /// Make the admin's grants exactly `links`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden`, `ServiceError::NotFound` or
    /// `ServiceError::Validation` for unknown grant IDs.
    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn replace_associations(
        &self,
        actor: &Actor,
        id: AdminId,
        links: &AdminLinks,
    ) -> Result<(), ServiceError> {
        authorize(actor, Resource::Admins)?;
        AssociationManager::new(self.store).replace(id, links).await
    }

    /// Hard-delete an admin and its grant links. Admins cannot delete
    /// themselves.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` for self-deletion and
    /// `ServiceError::NotFound` if the admin does not exist.
    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn delete(&self, actor: &Actor, id: AdminId) -> Result<Admin, ServiceError> {
        authorize(actor, Resource::Admins)?;
        if actor.id == Some(id) {
            tracing::warn!(admin_id = %id, "admin attempted to delete own account");
            return Err(ServiceError::Forbidden(
                "admins cannot delete their own account".to_owned(),
            ));
        }
        self.find_by_id(id).await?;

        let admin = self
            .store
            .delete_admin(id)
            .await
            .map_err(|e| ServiceError::from_write(e, ENTITY, Some(id.as_i32()), ""))?;

        tracing::info!(admin_id = %admin.id, "admin deleted");
        Ok(admin)
    }

    async fn check_references(&self, links: &AdminLinks) -> Result<(), ServiceError> {
        let errors: ValidationErrors = AssociationManager::new(self.store)
            .unknown_references(links)
            .await?;
        Ok(errors.into_result()?)
    }
}

/// Submitted password, treating an empty string as absent.
fn new_password(form: &AdminForm) -> Option<&str> {
    form.password.as_deref().filter(|p| !p.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::services::access::{REFERENCE_PERMISSIONS, REFERENCE_ROLES};
    use crate::services::auth::verify_password;
    use backoffice_core::{PermissionId, RoleId};

    fn root() -> Actor {
        Actor::system()
    }

    fn store() -> MemoryStore {
        MemoryStore::with_grants(REFERENCE_ROLES, REFERENCE_PERMISSIONS)
    }

    fn form(user_id: &str, user_name: &str) -> AdminForm {
        AdminForm {
            user_id: Some(user_id.to_owned()),
            user_name: Some(user_name.to_owned()),
            password: Some("initial-password".to_owned()),
            avatar: None,
            roles: vec![RoleId::new(1)],
            permissions: vec![PermissionId::new(1)],
        }
    }

    #[tokio::test]
    async fn test_create_with_boundary_lengths_and_links() {
        let store = store();
        let service = AdminService::new(&store);

        let admin = service
            .create(&root(), &form("ああああああああああ", "あ"))
            .await
            .unwrap();

        let detail = service.detail(&root(), admin.id).await.unwrap();
        assert_eq!(detail.admin.user_id, "ああああああああああ");
        assert_eq!(detail.roles.iter().map(|r| r.id).collect::<Vec<_>>(), vec![RoleId::new(1)]);
        assert_eq!(
            detail.permissions.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![PermissionId::new(1)]
        );
        assert!(verify_password("initial-password", &detail.admin.password_hash).is_ok());
    }

    #[tokio::test]
    async fn test_create_requires_password() {
        let store = store();
        let err = AdminService::new(&store)
            .create(
                &root(),
                &AdminForm {
                    password: None,
                    ..form("admin01", "Admin")
                },
            )
            .await
            .unwrap_err();

        let ServiceError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(errors.reason_for("password"), Some(&FieldReason::Required));
        assert!(store.journal().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_user_id_conflicts() {
        let store = store();
        let service = AdminService::new(&store);
        service.create(&root(), &form("admin01", "A")).await.unwrap();

        let err = service.create(&root(), &form("admin01", "B")).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Conflict { ref field, .. } if field == "userId"
        ));
    }

    #[tokio::test]
    async fn test_edit_replaces_links_and_keeps_password() {
        let store = store();
        let service = AdminService::new(&store);
        let admin = service.create(&root(), &form("admin01", "A")).await.unwrap();

        let edited = service
            .edit(
                &root(),
                admin.id,
                &AdminForm {
                    password: None,
                    roles: vec![RoleId::new(2)],
                    permissions: vec![],
                    ..form("admin01", "B")
                },
            )
            .await
            .unwrap();

        assert_eq!(edited.user_name, "B");
        assert!(verify_password("initial-password", &edited.password_hash).is_ok());
        let links = store.admin_links(admin.id).await.unwrap();
        assert_eq!(links, AdminLinks::new([RoleId::new(2)], Vec::<PermissionId>::new()));
    }

    #[tokio::test]
    async fn test_edit_with_new_password_rehashes() {
        let store = store();
        let service = AdminService::new(&store);
        let admin = service.create(&root(), &form("admin01", "A")).await.unwrap();

        let edited = service
            .edit(
                &root(),
                admin.id,
                &AdminForm {
                    password: Some("changed-password".to_owned()),
                    ..form("admin01", "A")
                },
            )
            .await
            .unwrap();
        assert!(verify_password("changed-password", &edited.password_hash).is_ok());
    }

    #[tokio::test]
    async fn test_unknown_role_is_rejected() {
        let store = store();
        let err = AdminService::new(&store)
            .create(
                &root(),
                &AdminForm {
                    roles: vec![RoleId::new(99)],
                    ..form("admin01", "A")
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(!store.journal().contains(&"insert_admin"));
    }

    #[tokio::test]
    async fn test_delete_is_hard_and_drops_links() {
        let store = store();
        let service = AdminService::new(&store);
        let admin = service.create(&root(), &form("admin01", "A")).await.unwrap();

        service.delete(&root(), admin.id).await.unwrap();

        assert!(matches!(
            service.find_by_id(admin.id).await,
            Err(ServiceError::NotFound { entity: "admin", .. })
        ));
        assert!(store.admin_links(admin.id).await.unwrap().roles.is_empty());
        assert!(service.check_unique("admin01", None).await.unwrap());
        assert!(matches!(
            service.delete(&root(), admin.id).await,
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_cannot_delete_self() {
        let store = store();
        let service = AdminService::new(&store);
        let admin = service.create(&root(), &form("admin01", "A")).await.unwrap();

        let me = Actor {
            id: Some(admin.id),
            ..root()
        };
        assert!(matches!(
            service.delete(&me, admin.id).await,
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_keyword_filter() {
        let store = store();
        let service = AdminService::new(&store);
        service.create(&root(), &form("tanaka", "田中")).await.unwrap();
        service.create(&root(), &form("suzuki", "鈴木")).await.unwrap();

        let page = service
            .list(&root(), PageRequest::default(), Some("鈴"))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].user_id, "suzuki");
    }

    #[tokio::test]
    async fn test_staff_without_admin_permission_is_forbidden() {
        let store = store();
        let staff = Actor {
            id: None,
            user_id: "staff".to_owned(),
            roles: vec!["staff".to_owned()],
            permissions: vec!["item.manage".to_owned()],
        };
        assert!(matches!(
            AdminService::new(&store).roles(&staff).await,
            Err(ServiceError::Forbidden(_))
        ));
    }
}
