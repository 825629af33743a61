//! Category, brand and item flows through the HTTP API.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::{Value, json};

use backoffice_admin::db::MemoryStore;
use backoffice_integration_tests::{TestContext, error_fields};

async fn create(ctx: &TestContext<MemoryStore>, cookie: &str, uri: &str, body: Value) -> i64 {
    let (status, body) = ctx.post(uri, cookie, body).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

fn item(name: &str, brand: i64, category: i64) -> Value {
    json!({
        "name": name,
        "description": "商品の説明",
        "price": "200000",
        "brandId": brand,
        "categoryId": category,
    })
}

#[tokio::test]
async fn test_category_soft_delete_lifecycle() {
    let ctx = TestContext::memory().await;
    let cookie = ctx.login_as_root().await;

    let id = create(&ctx, &cookie, "/categories", json!({ "name": "Shoes" })).await;

    let (status, deleted) = ctx.delete(&format!("/categories/{id}"), &cookie).await;
    assert_eq!(status, StatusCode::OK);
    assert!(deleted["deletedAt"].is_string());

    // Hidden from every read and from a second delete.
    let (status, _) = ctx.get(&format!("/categories/{id}"), &cookie).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = ctx.delete(&format!("/categories/{id}"), &cookie).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = ctx
        .put(&format!("/categories/{id}"), &cookie, json!({ "name": "Boots" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The row itself is kept.
    assert_eq!(ctx.store.category_row_count(), 1);
    assert_eq!(ctx.store.active_category_count(), 0);
}

#[tokio::test]
async fn test_item_edit_with_long_name_stops_before_writes() {
    let ctx = TestContext::memory().await;
    let cookie = ctx.login_as_root().await;

    let brand = create(&ctx, &cookie, "/brands", json!({ "name": "Acme" })).await;
    let category = create(&ctx, &cookie, "/categories", json!({ "name": "Shoes" })).await;
    let id = create(&ctx, &cookie, "/items", item("商品A", brand, category)).await;

    ctx.store.clear_journal();
    let (status, body) = ctx
        .put(
            &format!("/items/{id}"),
            &cookie,
            item(&"あ".repeat(11), brand, category),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_fields(&body), ["name"]);
    assert_eq!(ctx.store.journal(), ["find_item"]);
}

#[tokio::test]
async fn test_items_require_active_references() {
    let ctx = TestContext::memory().await;
    let cookie = ctx.login_as_root().await;

    let brand = create(&ctx, &cookie, "/brands", json!({ "name": "Acme" })).await;
    let category = create(&ctx, &cookie, "/categories", json!({ "name": "Shoes" })).await;
    ctx.delete(&format!("/brands/{brand}"), &cookie).await;

    let (status, body) = ctx.post("/items", &cookie, item("商品A", brand, category)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_fields(&body), ["brandId"]);
}

#[tokio::test]
async fn test_concurrent_duplicate_becomes_conflict() {
    let ctx = TestContext::memory().await;
    let cookie = ctx.login_as_root().await;

    create(&ctx, &cookie, "/brands", json!({ "name": "Acme" })).await;

    // The pre-check misses the existing row; the write still refuses it.
    ctx.store.set_stale_prechecks(true);
    let (status, body) = ctx.post("/brands", &cookie, json!({ "name": "Acme" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("Acme"));
}

#[tokio::test]
async fn test_list_pages_use_default_size() {
    let ctx = TestContext::memory().await;
    let cookie = ctx.login_as_root().await;

    for n in 0..12 {
        create(&ctx, &cookie, "/categories", json!({ "name": format!("Category {n}") })).await;
    }

    let (status, page) = ctx.get("/categories", &cookie).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 12);
    assert_eq!(page["perPage"], 10);
    assert_eq!(page["items"].as_array().unwrap().len(), 10);
    assert_eq!(page["lastPage"], 2);
}
