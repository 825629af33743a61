//! Category repository.

use backoffice_core::CategoryId;

use super::named::{self, CATEGORIES};
use super::{PgStore, RepositoryError};
use crate::models::{Category, Page, PageRequest};

/// Data access for active (not soft-deleted) categories.
pub trait CategoryRepository: Send + Sync {
    fn list_categories(
        &self,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<Category>, RepositoryError>> + Send;

    fn find_category(
        &self,
        id: CategoryId,
    ) -> impl Future<Output = Result<Option<Category>, RepositoryError>> + Send;

    /// Whether an active category other than `exclude` already uses `name`.
    fn category_name_taken(
        &self,
        name: &str,
        exclude: Option<CategoryId>,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    fn insert_category(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Category, RepositoryError>> + Send;

    fn update_category(
        &self,
        id: CategoryId,
        name: &str,
    ) -> impl Future<Output = Result<Category, RepositoryError>> + Send;

    /// Stamp `deleted_at` and return the row as it was removed.
    fn soft_delete_category(
        &self,
        id: CategoryId,
    ) -> impl Future<Output = Result<Category, RepositoryError>> + Send;
}

impl CategoryRepository for PgStore {
    async fn list_categories(&self, page: PageRequest) -> Result<Page<Category>, RepositoryError> {
        named::list(self.pool(), CATEGORIES, page).await
    }

    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        named::find(self.pool(), CATEGORIES, id).await
    }

    async fn category_name_taken(
        &self,
        name: &str,
        exclude: Option<CategoryId>,
    ) -> Result<bool, RepositoryError> {
        named::name_taken(self.pool(), CATEGORIES, name, exclude).await
    }

    async fn insert_category(&self, name: &str) -> Result<Category, RepositoryError> {
        named::insert(self.pool(), CATEGORIES, name).await
    }

    async fn update_category(
        &self,
        id: CategoryId,
        name: &str,
    ) -> Result<Category, RepositoryError> {
        named::rename(self.pool(), CATEGORIES, id, name).await
    }

    async fn soft_delete_category(&self, id: CategoryId) -> Result<Category, RepositoryError> {
        named::soft_delete(self.pool(), CATEGORIES, id).await
    }
}
