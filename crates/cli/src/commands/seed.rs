//! Seed the reference roles and permissions.
//!
//! Safe to run repeatedly: existing names are left untouched. On a fresh
//! database the IDs follow the order of the reference lists, so `super_admin`
//! is role 1 and `admin.manage` is permission 1.

use sqlx::PgPool;

use backoffice_admin::services::access::{REFERENCE_PERMISSIONS, REFERENCE_ROLES};

use super::{CliError, connect};

/// Insert any missing reference roles and permissions.
///
/// # Errors
///
/// Returns an error if the connection or an insert fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    let roles = insert_missing(&pool, "roles", REFERENCE_ROLES).await?;
    let permissions = insert_missing(&pool, "permissions", REFERENCE_PERMISSIONS).await?;

    tracing::info!(roles, permissions, "Seeding complete!");
    Ok(())
}

/// Insert each name not already present, returning how many were added.
async fn insert_missing(pool: &PgPool, table: &str, names: &[&str]) -> Result<u64, CliError> {
    let sql = format!("INSERT INTO {table} (name) VALUES ($1) ON CONFLICT (name) DO NOTHING");

    let mut inserted = 0;
    for name in names {
        inserted += sqlx::query(&sql)
            .bind(name)
            .execute(pool)
            .await?
            .rows_affected();
    }
    Ok(inserted)
}
