//! Shared SQL for the name-only catalog tables (`categories`, `brands`).
//!
//! Both tables have the same columns and the same partial unique index on
//! `name WHERE deleted_at IS NULL`, so one set of queries serves both.
//! Table names only ever come from the constants below.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row};

use super::{RepositoryError, conflict_on_unique, limit_offset, row_count};
use crate::models::{NamedRecord, Page, PageRequest};

pub(super) const CATEGORIES: &str = "categories";
pub(super) const BRANDS: &str = "brands";

const COLUMNS: &str = "id, name, created_at, updated_at, deleted_at";

/// Id types that can key a name-only table.
pub(super) trait NamedId:
    for<'q> sqlx::Encode<'q, Postgres>
    + for<'r> sqlx::Decode<'r, Postgres>
    + sqlx::Type<Postgres>
    + Copy
    + Send
    + Sync
    + Unpin
    + 'static
{
}

impl<T> NamedId for T where
    T: for<'q> sqlx::Encode<'q, Postgres>
        + for<'r> sqlx::Decode<'r, Postgres>
        + sqlx::Type<Postgres>
        + Copy
        + Send
        + Sync
        + Unpin
        + 'static
{
}

impl<'r, I> sqlx::FromRow<'r, PgRow> for NamedRecord<I>
where
    I: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            deleted_at: row.try_get("deleted_at")?,
        })
    }
}

pub(super) async fn list<I: NamedId>(
    pool: &PgPool,
    table: &'static str,
    page: PageRequest,
) -> Result<Page<NamedRecord<I>>, RepositoryError> {
    let (limit, offset) = limit_offset(page);

    let sql = format!(
        "SELECT {COLUMNS} FROM {table} WHERE deleted_at IS NULL ORDER BY id ASC LIMIT $1 OFFSET $2"
    );
    let rows: Vec<NamedRecord<I>> = sqlx::query_as(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let sql = format!("SELECT COUNT(*) FROM {table} WHERE deleted_at IS NULL");
    let total: i64 = sqlx::query_scalar(&sql).fetch_one(pool).await?;

    Ok(Page::new(rows, row_count(total), page))
}

pub(super) async fn find<I: NamedId>(
    pool: &PgPool,
    table: &'static str,
    id: I,
) -> Result<Option<NamedRecord<I>>, RepositoryError> {
    let sql = format!("SELECT {COLUMNS} FROM {table} WHERE id = $1 AND deleted_at IS NULL");
    Ok(sqlx::query_as(&sql).bind(id).fetch_optional(pool).await?)
}

pub(super) async fn name_taken<I: NamedId>(
    pool: &PgPool,
    table: &'static str,
    name: &str,
    exclude: Option<I>,
) -> Result<bool, RepositoryError> {
    let sql = format!(
        r"
        SELECT EXISTS (
            SELECT 1 FROM {table}
            WHERE name = $1
              AND deleted_at IS NULL
              AND ($2::integer IS NULL OR id <> $2)
        )
        "
    );
    let taken: bool = sqlx::query_scalar(&sql)
        .bind(name)
        .bind(exclude)
        .fetch_one(pool)
        .await?;

    Ok(taken)
}

pub(super) async fn insert<I: NamedId>(
    pool: &PgPool,
    table: &'static str,
    name: &str,
) -> Result<NamedRecord<I>, RepositoryError> {
    let sql = format!("INSERT INTO {table} (name) VALUES ($1) RETURNING {COLUMNS}");
    sqlx::query_as(&sql)
        .bind(name)
        .fetch_one(pool)
        .await
        .map_err(conflict_on_unique("name"))
}

pub(super) async fn rename<I: NamedId>(
    pool: &PgPool,
    table: &'static str,
    id: I,
    name: &str,
) -> Result<NamedRecord<I>, RepositoryError> {
    let sql = format!(
        r"
        UPDATE {table}
        SET name = $1, updated_at = NOW()
        WHERE id = $2 AND deleted_at IS NULL
        RETURNING {COLUMNS}
        "
    );
    sqlx::query_as(&sql)
        .bind(name)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(conflict_on_unique("name"))?
        .ok_or(RepositoryError::NotFound)
}

pub(super) async fn soft_delete<I: NamedId>(
    pool: &PgPool,
    table: &'static str,
    id: I,
) -> Result<NamedRecord<I>, RepositoryError> {
    let sql = format!(
        r"
        UPDATE {table}
        SET deleted_at = NOW(), updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING {COLUMNS}
        "
    );
    sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(RepositoryError::NotFound)
}
