//! Data access for the back-office `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `admins` - Back-office operators (hard-deleted)
//! - `roles`, `permissions` - Grant reference data
//! - `role_admin`, `admin_permission` - Admin grant join rows
//! - `categories`, `brands`, `items` - Catalog (soft-deleted via `deleted_at`)
//! - `tower_sessions.session` - Session storage
//!
//! Each entity has a repository trait so services can run against either
//! [`PgStore`] or the in-memory [`MemoryStore`].
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p backoffice-cli -- migrate
//! ```

pub mod admins;
pub mod brands;
pub mod categories;
pub mod items;
pub mod memory;
mod named;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use admins::AdminRepository;
pub use brands::BrandRepository;
pub use categories::CategoryRepository;
pub use items::ItemRepository;
pub use memory::MemoryStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation. Carries the form field that collided.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Every repository the services need, plus a connectivity probe.
pub trait Store:
    AdminRepository + CategoryRepository + BrandRepository + ItemRepository + Clone + 'static
{
    /// Check that the backing store is reachable.
    fn ping(&self) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// `PostgreSQL`-backed implementation of every repository trait.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique-index violation to `Conflict(field)`; other errors pass through.
fn conflict_on_unique(field: &'static str) -> impl Fn(sqlx::Error) -> RepositoryError {
    move |e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return RepositoryError::Conflict(field.to_owned());
        }
        RepositoryError::Database(e)
    }
}

/// `ILIKE` pattern matching `keyword` anywhere, with wildcards escaped.
fn contains_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Clamp a row count from `COUNT(*)` into `u64`.
fn row_count(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

/// `LIMIT`/`OFFSET` values as Postgres `BIGINT`s.
fn limit_offset(page: crate::models::PageRequest) -> (i64, i64) {
    (
        i64::try_from(page.limit()).unwrap_or(i64::MAX),
        i64::try_from(page.offset()).unwrap_or(i64::MAX),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("admin"), "%admin%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_row_count_never_negative() {
        assert_eq!(row_count(-1), 0);
        assert_eq!(row_count(42), 42);
    }

    #[test]
    fn test_limit_offset() {
        let (limit, offset) = limit_offset(crate::models::PageRequest::new(2, 25));
        assert_eq!(limit, 25);
        assert_eq!(offset, 25);
    }
}
