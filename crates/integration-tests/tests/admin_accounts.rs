//! Admin account flows through the HTTP API.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use backoffice_integration_tests::{TestContext, error_fields};

#[tokio::test]
async fn test_create_admin_with_multibyte_fields() {
    let ctx = TestContext::memory().await;
    let cookie = ctx.login_as_root().await;

    let (status, body) = ctx
        .post(
            "/admins",
            &cookie,
            json!({
                "userId": "あ".repeat(10),
                "userName": "あ",
                "password": "p@ssw0rd-for-test",
                "adminRoles": [1],
                "adminPermissions": [1],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_i64().unwrap();

    let (status, detail) = ctx.get(&format!("/admins/{id}"), &cookie).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["admin"]["userId"], "あ".repeat(10));
    assert_eq!(detail["roles"].as_array().unwrap().len(), 1);
    assert_eq!(detail["permissions"].as_array().unwrap().len(), 1);

    // The new admin can log in with the submitted password.
    assert!(ctx.login(&"あ".repeat(10), "p@ssw0rd-for-test").await.is_some());
}

#[tokio::test]
async fn test_duplicate_user_id_conflicts() {
    let ctx = TestContext::memory().await;
    let cookie = ctx.login_as_root().await;

    let (status, body) = ctx
        .post(
            "/admins",
            &cookie,
            json!({ "userId": "root", "userName": "Other", "password": "another-pass-1" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("userId"));
}

#[tokio::test]
async fn test_unknown_grant_ids_are_field_errors() {
    let ctx = TestContext::memory().await;
    let cookie = ctx.login_as_root().await;

    let (status, body) = ctx
        .post(
            "/admins",
            &cookie,
            json!({
                "userId": "staff01",
                "userName": "Staff",
                "password": "staff-password-1",
                "adminRoles": [99],
                "adminPermissions": [1, 98],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_fields(&body), ["adminRoles", "adminPermissions"]);
}

#[tokio::test]
async fn test_edit_keeps_password_when_blank() {
    let ctx = TestContext::memory().await;
    let cookie = ctx.login_as_root().await;

    let (_, body) = ctx
        .post(
            "/admins",
            &cookie,
            json!({ "userId": "staff01", "userName": "Staff", "password": "first-pass-1" }),
        )
        .await;
    let id = body["id"].as_i64().unwrap();

    let (status, body) = ctx
        .put(
            &format!("/admins/{id}"),
            &cookie,
            json!({ "userId": "staff01", "userName": "Renamed", "password": "" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userName"], "Renamed");
    assert!(ctx.login("staff01", "first-pass-1").await.is_some());
}

#[tokio::test]
async fn test_grant_replacement_is_idempotent() {
    let ctx = TestContext::memory().await;
    let cookie = ctx.login_as_root().await;

    let (_, body) = ctx
        .post(
            "/admins",
            &cookie,
            json!({
                "userId": "staff01",
                "userName": "Staff",
                "password": "staff-password-1",
                "adminPermissions": [2, 3],
            }),
        )
        .await;
    let id = body["id"].as_i64().unwrap();
    let uri = format!("/admins/{id}/grants");

    let grants = json!({ "adminRoles": [2], "adminPermissions": [3, 4] });
    let (_, first) = ctx.put(&uri, &cookie, grants.clone()).await;
    let (status, second) = ctx.put(&uri, &cookie, grants).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);

    let names: Vec<&str> = second["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["brand.manage", "item.manage"]);
}

#[tokio::test]
async fn test_keyword_search_and_paging() {
    let ctx = TestContext::memory().await;
    let cookie = ctx.login_as_root().await;

    for n in 1..=3 {
        ctx.post(
            "/admins",
            &cookie,
            json!({
                "userId": format!("staff0{n}"),
                "userName": format!("Staff {n}"),
                "password": "staff-password-1",
            }),
        )
        .await;
    }

    let (_, page) = ctx.get("/admins?keyword=staff&per_page=2", &cookie).await;
    assert_eq!(page["total"], 3);
    assert_eq!(page["items"].as_array().unwrap().len(), 2);
    assert_eq!(page["lastPage"], 2);

    let (_, page) = ctx.get("/admins?keyword=staff&per_page=2&page=2", &cookie).await;
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_self_delete_is_forbidden() {
    let ctx = TestContext::memory().await;
    let cookie = ctx.login_as_root().await;

    let (_, me) = ctx.get("/auth/me", &cookie).await;
    let id = me["id"].as_i64().unwrap();

    let (status, _) = ctx.delete(&format!("/admins/{id}"), &cookie).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let ctx = TestContext::memory().await;
    let cookie = ctx.login_as_root().await;

    let (status, _) = ctx.get("/auth/me", &cookie).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .send(Method::POST, "/auth/logout", Some(&cookie), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx.get("/auth/me", &cookie).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let ctx = TestContext::memory().await;
    assert!(ctx.login("root", "not-the-password").await.is_none());
    assert!(ctx.login("nobody", "whatever").await.is_none());
}
