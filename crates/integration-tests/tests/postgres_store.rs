//! `PgStore` against a real database.
//!
//! These tests require a disposable `PostgreSQL` database in `DATABASE_URL`.
//! Each test uses its own names so they can share one database.
//!
//! Run with: cargo test -p backoffice-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use backoffice_admin::db::{
    AdminRepository, BrandRepository, CategoryRepository, PgStore, RepositoryError, Store,
};
use backoffice_admin::models::{AdminLinks, NewAdmin, PageRequest};
use backoffice_core::{PermissionId, RoleId};
use backoffice_integration_tests::postgres_pool;

fn unique(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();
    format!("{prefix}{nanos}")
}

async fn store() -> PgStore {
    PgStore::new(postgres_pool().await.expect("DATABASE_URL must be set"))
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_ping() {
    store().await.ping().await.unwrap();
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_active_name_is_unique_until_soft_deleted() {
    let store = store().await;
    let name = unique("c");

    let first = store.insert_category(&name).await.unwrap();
    let err = store.insert_category(&name).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(ref field) if field == "name"));

    let deleted = store.soft_delete_category(first.id).await.unwrap();
    assert!(deleted.deleted_at.is_some());
    assert!(store.find_category(first.id).await.unwrap().is_none());
    assert!(!store.category_name_taken(&name, None).await.unwrap());

    store.insert_category(&name).await.unwrap();
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_soft_deleted_brands_leave_listings() {
    let store = store().await;
    let brand = store.insert_brand(&unique("b")).await.unwrap();

    let before = store.list_brands(PageRequest::new(1, 100)).await.unwrap().total;
    store.soft_delete_brand(brand.id).await.unwrap();
    let after = store.list_brands(PageRequest::new(1, 100)).await.unwrap().total;
    assert_eq!(after + 1, before);

    let err = store.soft_delete_brand(brand.id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_admin_links_follow_replacement() {
    let store = store().await;
    let pool = store.pool().clone();

    let role: i32 = sqlx::query_scalar("INSERT INTO roles (name) VALUES ($1) RETURNING id")
        .bind(unique("role"))
        .fetch_one(&pool)
        .await
        .unwrap();
    let permission: i32 =
        sqlx::query_scalar("INSERT INTO permissions (name) VALUES ($1) RETURNING id")
            .bind(unique("perm"))
            .fetch_one(&pool)
            .await
            .unwrap();

    let admin = store
        .insert_admin(
            NewAdmin {
                user_id: unique("admin"),
                user_name: "Test".to_owned(),
                password_hash: String::new(),
                avatar: None,
            },
            &AdminLinks::new([RoleId::new(role)], [PermissionId::new(permission)]),
        )
        .await
        .unwrap();
    assert_eq!(store.roles_of(admin.id).await.unwrap().len(), 1);

    let empty = AdminLinks::new(Vec::<RoleId>::new(), [PermissionId::new(permission)]);
    store.replace_admin_links(admin.id, &empty).await.unwrap();
    store.replace_admin_links(admin.id, &empty).await.unwrap();
    assert!(store.roles_of(admin.id).await.unwrap().is_empty());
    assert_eq!(store.permissions_of(admin.id).await.unwrap().len(), 1);

    store.delete_admin(admin.id).await.unwrap();
    assert!(store.permissions_of(admin.id).await.unwrap().is_empty());
}
