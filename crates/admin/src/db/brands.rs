//! Brand repository.

use backoffice_core::BrandId;

use super::named::{self, BRANDS};
use super::{PgStore, RepositoryError};
use crate::models::{Brand, Page, PageRequest};

/// Data access for active (not soft-deleted) brands.
pub trait BrandRepository: Send + Sync {
    fn list_brands(
        &self,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<Brand>, RepositoryError>> + Send;

    fn find_brand(
        &self,
        id: BrandId,
    ) -> impl Future<Output = Result<Option<Brand>, RepositoryError>> + Send;

    /// Whether an active brand other than `exclude` already uses `name`.
    fn brand_name_taken(
        &self,
        name: &str,
        exclude: Option<BrandId>,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    fn insert_brand(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Brand, RepositoryError>> + Send;

    fn update_brand(
        &self,
        id: BrandId,
        name: &str,
    ) -> impl Future<Output = Result<Brand, RepositoryError>> + Send;

    /// Stamp `deleted_at` and return the row as it was removed.
    fn soft_delete_brand(
        &self,
        id: BrandId,
    ) -> impl Future<Output = Result<Brand, RepositoryError>> + Send;
}

impl BrandRepository for PgStore {
    async fn list_brands(&self, page: PageRequest) -> Result<Page<Brand>, RepositoryError> {
        named::list(self.pool(), BRANDS, page).await
    }

    async fn find_brand(&self, id: BrandId) -> Result<Option<Brand>, RepositoryError> {
        named::find(self.pool(), BRANDS, id).await
    }

    async fn brand_name_taken(
        &self,
        name: &str,
        exclude: Option<BrandId>,
    ) -> Result<bool, RepositoryError> {
        named::name_taken(self.pool(), BRANDS, name, exclude).await
    }

    async fn insert_brand(&self, name: &str) -> Result<Brand, RepositoryError> {
        named::insert(self.pool(), BRANDS, name).await
    }

    async fn update_brand(&self, id: BrandId, name: &str) -> Result<Brand, RepositoryError> {
        named::rename(self.pool(), BRANDS, id, name).await
    }

    async fn soft_delete_brand(&self, id: BrandId) -> Result<Brand, RepositoryError> {
        named::soft_delete(self.pool(), BRANDS, id).await
    }
}
