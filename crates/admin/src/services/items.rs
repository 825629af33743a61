//! Item CRUD orchestration.
//!
//! Items carry more than length rules: the price must be a non-negative
//! amount and the brand and category must be active records. Pure field
//! checks run first; reference checks only read the store once those pass.

use backoffice_core::validation::{ITEM_RULES, validate};
use backoffice_core::{BrandId, CategoryId, FieldReason, ItemId, Price, ValidationErrors};
use tracing::instrument;

use super::ServiceError;
use super::access::{Actor, Resource, authorize};
use crate::db::{BrandRepository, CategoryRepository, ItemRepository};
use crate::models::{Item, ItemForm, NewItem, Page, PageRequest};

const ENTITY: &str = "item";

/// Item orchestrator.
pub struct ItemService<'a, S> {
    store: &'a S,
}

impl<'a, S> ItemService<'a, S>
where
    S: ItemRepository + BrandRepository + CategoryRepository,
{
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// True when no active item other than `exclude` is named `name`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Persistence` on storage failure.
    pub async fn check_unique(
        &self,
        name: &str,
        exclude: Option<ItemId>,
    ) -> Result<bool, ServiceError> {
        Ok(!self.store.item_name_taken(name, exclude).await?)
    }

    /// Active item by ID.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the item does not exist or was
    /// deleted.
    pub async fn find_by_id(&self, id: ItemId) -> Result<Item, ServiceError> {
        self.store
            .find_item(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ENTITY, id))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` or `ServiceError::Persistence`.
    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn list(&self, actor: &Actor, page: PageRequest) -> Result<Page<Item>, ServiceError> {
        authorize(actor, Resource::Items)?;
        Ok(self.store.list_items(page).await?)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` or `ServiceError::NotFound`.
    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn show(&self, actor: &Actor, id: ItemId) -> Result<Item, ServiceError> {
        authorize(actor, Resource::Items)?;
        self.find_by_id(id).await
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for bad input or unknown
    /// references, and `ServiceError::Conflict` if the name is taken.
    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn create(&self, actor: &Actor, form: &ItemForm) -> Result<Item, ServiceError> {
        authorize(actor, Resource::Items)?;
        let item = self.validated(form).await?;

        if !self.check_unique(&item.name, None).await? {
            tracing::warn!(name = %item.name, "item name already taken");
            return Err(ServiceError::conflict("name", &item.name));
        }

        let name = item.name.clone();
        let item = self
            .store
            .insert_item(item)
            .await
            .map_err(|e| ServiceError::from_write(e, ENTITY, None, &name))?;

        tracing::info!(item_id = %item.id, "item created");
        Ok(item)
    }

    /// Replace every mutable field of an active item.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound`, `ServiceError::Validation` or
    /// `ServiceError::Conflict`.
    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn edit(
        &self,
        actor: &Actor,
        id: ItemId,
        form: &ItemForm,
    ) -> Result<Item, ServiceError> {
        authorize(actor, Resource::Items)?;
        self.find_by_id(id).await?;
        let item = self.validated(form).await?;

        if !self.check_unique(&item.name, Some(id)).await? {
            tracing::warn!(name = %item.name, "item name already taken");
            return Err(ServiceError::conflict("name", &item.name));
        }

        let name = item.name.clone();
        let item = self
            .store
            .update_item(id, item)
            .await
            .map_err(|e| ServiceError::from_write(e, ENTITY, Some(id.as_i32()), &name))?;

        tracing::info!(item_id = %item.id, "item updated");
        Ok(item)
    }

    /// Soft-delete an active item and return it.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if it does not exist or is already
    /// deleted.
    #[instrument(skip(self, actor), fields(actor = %actor.user_id))]
    pub async fn delete(&self, actor: &Actor, id: ItemId) -> Result<Item, ServiceError> {
        authorize(actor, Resource::Items)?;
        self.find_by_id(id).await?;

        let item = self
            .store
            .soft_delete_item(id)
            .await
            .map_err(|e| ServiceError::from_write(e, ENTITY, Some(id.as_i32()), ""))?;

        tracing::info!(item_id = %item.id, "item deleted");
        Ok(item)
    }

    /// Run the field rules, then the reference checks.
    async fn validated(&self, form: &ItemForm) -> Result<NewItem, ServiceError> {
        let (item, errors) = check_fields(form);
        let Some(item) = item else {
            return Err(ServiceError::Validation(errors));
        };
        errors.into_result()?;

        let mut errors = ValidationErrors::new();
        if self.store.find_brand(item.brand_id).await?.is_none() {
            errors.push(
                "brandId",
                FieldReason::UnknownReference {
                    id: item.brand_id.as_i32(),
                },
            );
        }
        if self.store.find_category(item.category_id).await?.is_none() {
            errors.push(
                "categoryId",
                FieldReason::UnknownReference {
                    id: item.category_id.as_i32(),
                },
            );
        }
        errors.into_result()?;

        Ok(item)
    }
}

/// Pure checks on the submitted form. Returns the parsed item only when
/// every field is usable.
fn check_fields(form: &ItemForm) -> (Option<NewItem>, ValidationErrors) {
    let mut errors = validate(&form.raw(), ITEM_RULES).err().unwrap_or_default();

    let price = match form.price.map(Price::new) {
        Some(Ok(price)) => Some(price),
        Some(Err(e)) => {
            errors.push(
                "price",
                FieldReason::Invalid {
                    message: e.to_string(),
                },
            );
            None
        }
        None => {
            errors.push("price", FieldReason::Required);
            None
        }
    };
    let brand_id: Option<BrandId> = form.brand_id;
    if brand_id.is_none() {
        errors.push("brandId", FieldReason::Required);
    }
    let category_id: Option<CategoryId> = form.category_id;
    if category_id.is_none() {
        errors.push("categoryId", FieldReason::Required);
    }

    if !errors.is_empty() {
        return (None, errors);
    }

    let item = match (&form.name, &form.description, price, brand_id, category_id) {
        (Some(name), Some(description), Some(price), Some(brand_id), Some(category_id)) => {
            Some(NewItem {
                name: name.clone(),
                description: description.clone(),
                price,
                brand_id,
                category_id,
            })
        }
        _ => None,
    };
    (item, errors)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::services::access::{REFERENCE_PERMISSIONS, REFERENCE_ROLES};
    use rust_decimal::Decimal;

    fn manager() -> Actor {
        Actor {
            id: None,
            user_id: "staff".to_owned(),
            roles: vec!["staff".to_owned()],
            permissions: vec!["item.manage".to_owned()],
        }
    }

    struct Fixture {
        store: MemoryStore,
        brand: BrandId,
        category: CategoryId,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::with_grants(REFERENCE_ROLES, REFERENCE_PERMISSIONS);
        let brand = store.insert_brand("ブランドA").await.unwrap().id;
        let category = store.insert_category("カテゴリーA").await.unwrap().id;
        store.clear_journal();
        Fixture {
            store,
            brand,
            category,
        }
    }

    fn form(f: &Fixture, name: &str) -> ItemForm {
        ItemForm {
            name: Some(name.to_owned()),
            description: Some("商品の説明".to_owned()),
            price: Some(Decimal::from(200_000)),
            brand_id: Some(f.brand),
            category_id: Some(f.category),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let f = fixture().await;
        let service = ItemService::new(&f.store);
        let item = service.create(&manager(), &form(&f, "商品A")).await.unwrap();
        assert_eq!(item.price.amount(), Decimal::from(200_000));
        assert_eq!(service.find_by_id(item.id).await.unwrap(), item);
    }

    #[tokio::test]
    async fn test_edit_with_long_name_never_reaches_uniqueness_or_write() {
        let f = fixture().await;
        let service = ItemService::new(&f.store);
        let item = service.create(&manager(), &form(&f, "商品A")).await.unwrap();
        f.store.clear_journal();

        let err = service
            .edit(&manager(), item.id, &form(&f, "あああああああああああ"))
            .await
            .unwrap_err();

        let ServiceError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(errors.reason_for("name"), Some(&FieldReason::TooLong { max: 10 }));
        assert_eq!(f.store.journal(), vec!["find_item"]);
        assert_eq!(service.find_by_id(item.id).await.unwrap().name, "商品A");
    }

    #[tokio::test]
    async fn test_every_bad_field_is_reported() {
        let f = fixture().await;
        let err = ItemService::new(&f.store)
            .create(
                &manager(),
                &ItemForm {
                    price: Some(Decimal::from(-1)),
                    ..ItemForm::default()
                },
            )
            .await
            .unwrap_err();

        let ServiceError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(errors.reason_for("name"), Some(&FieldReason::Required));
        assert_eq!(errors.reason_for("description"), Some(&FieldReason::Required));
        assert!(matches!(
            errors.reason_for("price"),
            Some(FieldReason::Invalid { .. })
        ));
        assert_eq!(errors.reason_for("brandId"), Some(&FieldReason::Required));
        assert_eq!(errors.reason_for("categoryId"), Some(&FieldReason::Required));
        assert!(f.store.journal().is_empty());
    }

    #[tokio::test]
    async fn test_price_outside_column_range_is_invalid() {
        let f = fixture().await;
        let service = ItemService::new(&f.store);

        for price in ["10000000000", "1.005"] {
            let err = service
                .create(
                    &manager(),
                    &ItemForm {
                        price: Some(price.parse().unwrap()),
                        ..form(&f, "商品A")
                    },
                )
                .await
                .unwrap_err();
            let ServiceError::Validation(errors) = err else {
                panic!("expected validation error for {price}, got {err:?}");
            };
            assert!(matches!(
                errors.reason_for("price"),
                Some(FieldReason::Invalid { .. })
            ));
        }
        assert!(f.store.journal().is_empty());

        let item = service
            .create(
                &manager(),
                &ItemForm {
                    price: Some(Price::MAX),
                    ..form(&f, "商品A")
                },
            )
            .await
            .unwrap();
        assert_eq!(item.price.amount(), Price::MAX);
    }

    #[tokio::test]
    async fn test_deleted_brand_is_unknown_reference() {
        let f = fixture().await;
        f.store.soft_delete_brand(f.brand).await.unwrap();

        let err = ItemService::new(&f.store)
            .create(&manager(), &form(&f, "商品A"))
            .await
            .unwrap_err();
        let ServiceError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(
            errors.reason_for("brandId"),
            Some(&FieldReason::UnknownReference {
                id: f.brand.as_i32()
            })
        );
        assert!(errors.reason_for("categoryId").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let f = fixture().await;
        let service = ItemService::new(&f.store);
        service.create(&manager(), &form(&f, "商品A")).await.unwrap();
        assert!(matches!(
            service.create(&manager(), &form(&f, "商品A")).await,
            Err(ServiceError::Conflict { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_then_find_is_not_found() {
        let f = fixture().await;
        let service = ItemService::new(&f.store);
        let item = service.create(&manager(), &form(&f, "商品A")).await.unwrap();
        service.delete(&manager(), item.id).await.unwrap();
        assert!(matches!(
            service.show(&manager(), item.id).await,
            Err(ServiceError::NotFound { entity: "item", .. })
        ));
    }
}
