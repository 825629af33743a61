//! Category CRUD orchestration.

use backoffice_core::validation::CATEGORY_RULES;
use backoffice_core::{CategoryId, FieldRule};

use super::access::Resource;
use super::named::{NamedKind, NamedRepository, NamedService};
use crate::db::{CategoryRepository, RepositoryError};
use crate::models::{Category, Page, PageRequest};

/// Marker for the `categories` table.
#[derive(Debug, Clone, Copy)]
pub struct Categories;

impl NamedKind for Categories {
    type Id = CategoryId;

    const ENTITY: &'static str = "category";
    const RESOURCE: Resource = Resource::Categories;
    const RULES: &'static [FieldRule] = CATEGORY_RULES;
}

impl<T: CategoryRepository> NamedRepository<Categories> for T {
    fn list(
        &self,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<Category>, RepositoryError>> + Send {
        self.list_categories(page)
    }

    fn find(
        &self,
        id: CategoryId,
    ) -> impl Future<Output = Result<Option<Category>, RepositoryError>> + Send {
        self.find_category(id)
    }

    fn name_taken(
        &self,
        name: &str,
        exclude: Option<CategoryId>,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send {
        self.category_name_taken(name, exclude)
    }

    fn insert(&self, name: &str) -> impl Future<Output = Result<Category, RepositoryError>> + Send {
        self.insert_category(name)
    }

    fn rename(
        &self,
        id: CategoryId,
        name: &str,
    ) -> impl Future<Output = Result<Category, RepositoryError>> + Send {
        self.update_category(id, name)
    }

    fn soft_delete(
        &self,
        id: CategoryId,
    ) -> impl Future<Output = Result<Category, RepositoryError>> + Send {
        self.soft_delete_category(id)
    }
}

/// Category orchestrator.
pub type CategoryService<'a, S> = NamedService<'a, S, Categories>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::NameForm;
    use crate::services::Actor;
    use crate::services::access::{REFERENCE_PERMISSIONS, REFERENCE_ROLES};

    #[tokio::test]
    async fn test_create_assigns_id() {
        let store = MemoryStore::with_grants(REFERENCE_ROLES, REFERENCE_PERMISSIONS);
        let manager = Actor {
            id: None,
            user_id: "staff".to_owned(),
            roles: vec!["staff".to_owned()],
            permissions: vec!["category.manage".to_owned()],
        };
        let service = CategoryService::new(&store);
        let category = service
            .create(&manager, &NameForm::new("カテゴリーA"))
            .await
            .unwrap();
        assert_eq!(category.name, "カテゴリーA");
        assert_eq!(service.find_by_id(category.id).await.unwrap(), category);
        assert_eq!(store.journal().last(), Some(&"find_category"));
    }
}
