//! Brand CRUD orchestration.

use backoffice_core::validation::BRAND_RULES;
use backoffice_core::{BrandId, FieldRule};

use super::access::Resource;
use super::named::{NamedKind, NamedRepository, NamedService};
use crate::db::{BrandRepository, RepositoryError};
use crate::models::{Brand, Page, PageRequest};

/// Marker for the `brands` table.
#[derive(Debug, Clone, Copy)]
pub struct Brands;

impl NamedKind for Brands {
    type Id = BrandId;

    const ENTITY: &'static str = "brand";
    const RESOURCE: Resource = Resource::Brands;
    const RULES: &'static [FieldRule] = BRAND_RULES;
}

impl<T: BrandRepository> NamedRepository<Brands> for T {
    fn list(
        &self,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<Brand>, RepositoryError>> + Send {
        self.list_brands(page)
    }

    fn find(
        &self,
        id: BrandId,
    ) -> impl Future<Output = Result<Option<Brand>, RepositoryError>> + Send {
        self.find_brand(id)
    }

    fn name_taken(
        &self,
        name: &str,
        exclude: Option<BrandId>,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send {
        self.brand_name_taken(name, exclude)
    }

    fn insert(&self, name: &str) -> impl Future<Output = Result<Brand, RepositoryError>> + Send {
        self.insert_brand(name)
    }

    fn rename(
        &self,
        id: BrandId,
        name: &str,
    ) -> impl Future<Output = Result<Brand, RepositoryError>> + Send {
        self.update_brand(id, name)
    }

    fn soft_delete(
        &self,
        id: BrandId,
    ) -> impl Future<Output = Result<Brand, RepositoryError>> + Send {
        self.soft_delete_brand(id)
    }
}

/// Brand orchestrator.
pub type BrandService<'a, S> = NamedService<'a, S, Brands>;
