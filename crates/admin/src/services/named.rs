//! CRUD orchestration shared by the name-only catalog entities.
//!
//! Categories and brands have one mutable field, a name unique among active
//! rows, and are soft-deleted. [`NamedService`] holds that flow once; each
//! entity supplies a [`NamedKind`] marker naming its id type, permission and
//! field rules, and bridges its repository trait through
//! [`NamedRepository`].

use std::fmt;
use std::marker::PhantomData;

use backoffice_core::FieldRule;
use backoffice_core::validation::validate;
use tracing::instrument;

use super::ServiceError;
use super::access::{Actor, Resource, authorize};
use crate::db::RepositoryError;
use crate::models::{NameForm, NamedRecord, Page, PageRequest};

/// Static description of one name-only entity.
pub trait NamedKind: Send + Sync + 'static {
    type Id: Copy + fmt::Debug + fmt::Display + Into<i32> + Send + Sync + 'static;

    /// Entity name used in `NotFound` errors and logs.
    const ENTITY: &'static str;
    /// Resource whose permission gates every operation.
    const RESOURCE: Resource;
    /// Field rules for the submitted name.
    const RULES: &'static [FieldRule];
}

/// The repository operations [`NamedService`] needs for entity `K`.
pub trait NamedRepository<K: NamedKind>: Send + Sync {
    fn list(
        &self,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<NamedRecord<K::Id>>, RepositoryError>> + Send;

    fn find(
        &self,
        id: K::Id,
    ) -> impl Future<Output = Result<Option<NamedRecord<K::Id>>, RepositoryError>> + Send;

    fn name_taken(
        &self,
        name: &str,
        exclude: Option<K::Id>,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    fn insert(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<NamedRecord<K::Id>, RepositoryError>> + Send;

    fn rename(
        &self,
        id: K::Id,
        name: &str,
    ) -> impl Future<Output = Result<NamedRecord<K::Id>, RepositoryError>> + Send;

    fn soft_delete(
        &self,
        id: K::Id,
    ) -> impl Future<Output = Result<NamedRecord<K::Id>, RepositoryError>> + Send;
}

/// Orchestrator for a name-only entity.
pub struct NamedService<'a, S, K> {
    store: &'a S,
    kind: PhantomData<K>,
}

impl<'a, S: NamedRepository<K>, K: NamedKind> NamedService<'a, S, K> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self {
            store,
            kind: PhantomData,
        }
    }

    /// True when no active record other than `exclude` is named `name`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Persistence` on storage failure.
    pub async fn check_unique(
        &self,
        name: &str,
        exclude: Option<K::Id>,
    ) -> Result<bool, ServiceError> {
        Ok(!self.store.name_taken(name, exclude).await?)
    }

    /// Active record by ID.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the record does not exist or was
    /// deleted.
    pub async fn find_by_id(&self, id: K::Id) -> Result<NamedRecord<K::Id>, ServiceError> {
        self.store
            .find(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(K::ENTITY, id))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` or `ServiceError::Persistence`.
    #[instrument(skip(self, actor), fields(entity = K::ENTITY, actor = %actor.user_id))]
    pub async fn list(
        &self,
        actor: &Actor,
        page: PageRequest,
    ) -> Result<Page<NamedRecord<K::Id>>, ServiceError> {
        authorize(actor, K::RESOURCE)?;
        Ok(self.store.list(page).await?)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` or `ServiceError::NotFound`.
    #[instrument(skip(self, actor), fields(entity = K::ENTITY, actor = %actor.user_id))]
    pub async fn show(
        &self,
        actor: &Actor,
        id: K::Id,
    ) -> Result<NamedRecord<K::Id>, ServiceError> {
        authorize(actor, K::RESOURCE)?;
        self.find_by_id(id).await
    }

    /// Validate, check uniqueness, then insert.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for bad input and
    /// `ServiceError::Conflict` if the name is taken.
    #[instrument(skip(self, actor), fields(entity = K::ENTITY, actor = %actor.user_id))]
    pub async fn create(
        &self,
        actor: &Actor,
        form: &NameForm,
    ) -> Result<NamedRecord<K::Id>, ServiceError> {
        authorize(actor, K::RESOURCE)?;
        let name = validated_name::<K>(form)?;

        if !self.check_unique(name, None).await? {
            tracing::warn!(name, "{} name already taken", K::ENTITY);
            return Err(ServiceError::conflict("name", name));
        }

        let record = self
            .store
            .insert(name)
            .await
            .map_err(|e| ServiceError::from_write(e, K::ENTITY, None, name))?;

        tracing::info!(id = %record.id, "{} created", K::ENTITY);
        Ok(record)
    }

    /// Replace the name of an active record.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound`, `ServiceError::Validation` or
    /// `ServiceError::Conflict`.
    #[instrument(skip(self, actor), fields(entity = K::ENTITY, actor = %actor.user_id))]
    pub async fn edit(
        &self,
        actor: &Actor,
        id: K::Id,
        form: &NameForm,
    ) -> Result<NamedRecord<K::Id>, ServiceError> {
        authorize(actor, K::RESOURCE)?;
        self.find_by_id(id).await?;
        let name = validated_name::<K>(form)?;

        if !self.check_unique(name, Some(id)).await? {
            tracing::warn!(name, "{} name already taken", K::ENTITY);
            return Err(ServiceError::conflict("name", name));
        }

        let record = self
            .store
            .rename(id, name)
            .await
            .map_err(|e| ServiceError::from_write(e, K::ENTITY, Some(id.into()), name))?;

        tracing::info!(id = %record.id, "{} updated", K::ENTITY);
        Ok(record)
    }

    /// Soft-delete an active record and return it.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if it does not exist or is already
    /// deleted.
    #[instrument(skip(self, actor), fields(entity = K::ENTITY, actor = %actor.user_id))]
    pub async fn delete(
        &self,
        actor: &Actor,
        id: K::Id,
    ) -> Result<NamedRecord<K::Id>, ServiceError> {
        authorize(actor, K::RESOURCE)?;
        self.find_by_id(id).await?;

        let record = self
            .store
            .soft_delete(id)
            .await
            .map_err(|e| ServiceError::from_write(e, K::ENTITY, Some(id.into()), ""))?;

        tracing::info!(id = %record.id, "{} deleted", K::ENTITY);
        Ok(record)
    }
}

fn validated_name<K: NamedKind>(form: &NameForm) -> Result<&str, ServiceError> {
    validate(&form.raw(), K::RULES)?;
    Ok(form.name.as_deref().unwrap_or_default())
}
