//! Item repository.

use chrono::{DateTime, Utc};

use backoffice_core::{BrandId, CategoryId, ItemId, Price};

use super::{PgStore, RepositoryError, conflict_on_unique, limit_offset, row_count};
use crate::models::{Item, NewItem, Page, PageRequest};

/// Data access for active (not soft-deleted) items.
pub trait ItemRepository: Send + Sync {
    fn list_items(
        &self,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<Item>, RepositoryError>> + Send;

    fn find_item(
        &self,
        id: ItemId,
    ) -> impl Future<Output = Result<Option<Item>, RepositoryError>> + Send;

    /// Whether an active item other than `exclude` already uses `name`.
    fn item_name_taken(
        &self,
        name: &str,
        exclude: Option<ItemId>,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    fn insert_item(
        &self,
        item: NewItem,
    ) -> impl Future<Output = Result<Item, RepositoryError>> + Send;

    fn update_item(
        &self,
        id: ItemId,
        item: NewItem,
    ) -> impl Future<Output = Result<Item, RepositoryError>> + Send;

    /// Stamp `deleted_at` and return the row as it was removed.
    fn soft_delete_item(
        &self,
        id: ItemId,
    ) -> impl Future<Output = Result<Item, RepositoryError>> + Send;
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: ItemId,
    name: String,
    description: String,
    price: Price,
    brand_id: BrandId,
    category_id: CategoryId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            brand_id: row.brand_id,
            category_id: row.category_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

const ITEM_COLUMNS: &str = "id, name, description, price, brand_id, category_id, \
                            created_at, updated_at, deleted_at";

impl ItemRepository for PgStore {
    async fn list_items(&self, page: PageRequest) -> Result<Page<Item>, RepositoryError> {
        let (limit, offset) = limit_offset(page);

        let rows: Vec<ItemRow> = sqlx::query_as(&format!(
            r"
            SELECT {ITEM_COLUMNS}
            FROM items
            WHERE deleted_at IS NULL
            ORDER BY id ASC
            LIMIT $1 OFFSET $2
            "
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE deleted_at IS NULL")
            .fetch_one(self.pool())
            .await?;

        Ok(Page::new(
            rows.into_iter().map(Item::from).collect(),
            row_count(total),
            page,
        ))
    }

    async fn find_item(&self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        let row: Option<ItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Item::from))
    }

    async fn item_name_taken(
        &self,
        name: &str,
        exclude: Option<ItemId>,
    ) -> Result<bool, RepositoryError> {
        let taken: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1 FROM items
                WHERE name = $1
                  AND deleted_at IS NULL
                  AND ($2::integer IS NULL OR id <> $2)
            )
            ",
        )
        .bind(name)
        .bind(exclude)
        .fetch_one(self.pool())
        .await?;

        Ok(taken)
    }

    async fn insert_item(&self, item: NewItem) -> Result<Item, RepositoryError> {
        let row: ItemRow = sqlx::query_as(&format!(
            r"
            INSERT INTO items (name, description, price, brand_id, category_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price)
        .bind(item.brand_id)
        .bind(item.category_id)
        .fetch_one(self.pool())
        .await
        .map_err(conflict_on_unique("name"))?;

        Ok(row.into())
    }

    async fn update_item(&self, id: ItemId, item: NewItem) -> Result<Item, RepositoryError> {
        let row: ItemRow = sqlx::query_as(&format!(
            r"
            UPDATE items
            SET name = $1,
                description = $2,
                price = $3,
                brand_id = $4,
                category_id = $5,
                updated_at = NOW()
            WHERE id = $6 AND deleted_at IS NULL
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price)
        .bind(item.brand_id)
        .bind(item.category_id)
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(conflict_on_unique("name"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    async fn soft_delete_item(&self, id: ItemId) -> Result<Item, RepositoryError> {
        let row: ItemRow = sqlx::query_as(&format!(
            r"
            UPDATE items
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }
}
