//! Admin management route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::{JsonRejection, PathRejection}},
    http::StatusCode,
    routing::{get, put},
};
use serde::Deserialize;
use tracing::instrument;

use backoffice_core::{AdminId, PermissionId, RoleId};

use super::ListQuery;
use crate::db::Store;
use crate::error::AppError;
use crate::middleware::RequireAdminAuth;
use crate::models::{Admin, AdminDetail, AdminForm, AdminLinks, Page, Permission, Role};
use crate::services::AdminService;
use crate::state::AppState;

pub fn router<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/admins", get(index::<S>).post(create::<S>))
        .route(
            "/admins/{id}",
            get(show::<S>).put(update::<S>).delete(destroy::<S>),
        )
        .route("/admins/{id}/grants", put(replace_grants::<S>))
        .route("/roles", get(roles::<S>))
        .route("/permissions", get(permissions::<S>))
}

/// Requested role and permission sets.
#[derive(Debug, Default, Deserialize)]
pub struct GrantsRequest {
    #[serde(default, rename = "adminRoles")]
    pub roles: Vec<RoleId>,
    #[serde(default, rename = "adminPermissions")]
    pub permissions: Vec<PermissionId>,
}

/// Admin list, optionally filtered by `keyword`.
///
/// # Errors
///
/// Returns 403 without `admin.manage`.
#[instrument(skip(auth, state))]
pub async fn index<S: Store>(
    auth: RequireAdminAuth,
    State(state): State<AppState<S>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Admin>>, AppError> {
    let page = AdminService::new(state.store())
        .list(
            &auth.actor(),
            query.page_request(state.page_size()),
            query.keyword.as_deref(),
        )
        .await?;
    Ok(Json(page))
}

/// Create an admin with its roles and permissions.
///
/// # Errors
///
/// Returns 422 for invalid input and 409 for a taken login identifier.
#[instrument(skip(auth, state, payload))]
pub async fn create<S: Store>(
    auth: RequireAdminAuth,
    State(state): State<AppState<S>>,
    payload: Result<Json<AdminForm>, JsonRejection>,
) -> Result<(StatusCode, Json<Admin>), AppError> {
    let Json(form) = payload?;
    let admin = AdminService::new(state.store())
        .create(&auth.actor(), &form)
        .await?;
    Ok((StatusCode::CREATED, Json(admin)))
}

/// Admin detail with current roles and permissions.
///
/// # Errors
///
/// Returns 404 if the admin does not exist.
#[instrument(skip(auth, state))]
pub async fn show<S: Store>(
    auth: RequireAdminAuth,
    State(state): State<AppState<S>>,
    path: Result<Path<AdminId>, PathRejection>,
) -> Result<Json<AdminDetail>, AppError> {
    let Path(id) = path?;
    let detail = AdminService::new(state.store())
        .detail(&auth.actor(), id)
        .await?;
    Ok(Json(detail))
}

/// Replace an admin's fields, roles and permissions.
///
/// # Errors
///
/// Returns 404, 422 or 409.
#[instrument(skip(auth, state, payload))]
pub async fn update<S: Store>(
    auth: RequireAdminAuth,
    State(state): State<AppState<S>>,
    path: Result<Path<AdminId>, PathRejection>,
    payload: Result<Json<AdminForm>, JsonRejection>,
) -> Result<Json<Admin>, AppError> {
    let Path(id) = path?;
    let Json(form) = payload?;
    let admin = AdminService::new(state.store())
        .edit(&auth.actor(), id, &form)
        .await?;
    Ok(Json(admin))
}

/// Hard-delete an admin.
///
/// # Errors
///
/// Returns 404 if the admin does not exist and 403 for self-deletion.
#[instrument(skip(auth, state))]
pub async fn destroy<S: Store>(
    auth: RequireAdminAuth,
    State(state): State<AppState<S>>,
    path: Result<Path<AdminId>, PathRejection>,
) -> Result<Json<Admin>, AppError> {
    let Path(id) = path?;
    let admin = AdminService::new(state.store())
        .delete(&auth.actor(), id)
        .await?;
    Ok(Json(admin))
}

/// Make an admin's roles and permissions exactly the submitted sets.
///
/// # Errors
///
/// Returns 404 if the admin does not exist and 422 for unknown IDs.
#[instrument(skip(auth, state, payload))]
pub async fn replace_grants<S: Store>(
    auth: RequireAdminAuth,
    State(state): State<AppState<S>>,
    path: Result<Path<AdminId>, PathRejection>,
    payload: Result<Json<GrantsRequest>, JsonRejection>,
) -> Result<Json<AdminDetail>, AppError> {
    let Path(id) = path?;
    let Json(request) = payload?;
    let actor = auth.actor();
    let service = AdminService::new(state.store());

    let links = AdminLinks::new(request.roles, request.permissions);
    service.replace_associations(&actor, id, &links).await?;
    Ok(Json(service.detail(&actor, id).await?))
}

/// All roles.
///
/// # Errors
///
/// Returns 403 without `admin.manage`.
pub async fn roles<S: Store>(
    auth: RequireAdminAuth,
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<Role>>, AppError> {
    Ok(Json(
        AdminService::new(state.store()).roles(&auth.actor()).await?,
    ))
}

/// All permissions.
///
/// # Errors
///
/// Returns 403 without `admin.manage`.
pub async fn permissions<S: Store>(
    auth: RequireAdminAuth,
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<Permission>>, AppError> {
    Ok(Json(
        AdminService::new(state.store())
            .permissions(&auth.actor())
            .await?,
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::db::AdminRepository;
    use crate::routes::testing::TestApp;

    #[tokio::test]
    async fn test_requires_login() {
        let app = TestApp::new().await;
        let response = app.get("/admins", None).await;
        assert_eq!(response.0, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_show_and_delete() {
        let app = TestApp::new().await;
        let cookie = app.login_as_root().await;

        let (status, body) = app
            .post(
                "/admins",
                Some(&cookie),
                json!({
                    "userId": "ああああああああああ",
                    "userName": "あ",
                    "password": "p@ssw0rd-for-test",
                    "adminRoles": [1],
                    "adminPermissions": [1],
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body.get("passwordHash").is_none());
        let id = body["id"].as_i64().unwrap();

        let (status, body) = app.get(&format!("/admins/{id}"), Some(&cookie)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["roles"][0]["name"], "super_admin");
        assert_eq!(body["permissions"][0]["name"], "admin.manage");

        let (status, _) = app.delete(&format!("/admins/{id}"), Some(&cookie)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = app.delete(&format!("/admins/{id}"), Some(&cookie)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_form_is_unprocessable() {
        let app = TestApp::new().await;
        let cookie = app.login_as_root().await;

        let (status, body) = app
            .post(
                "/admins",
                Some(&cookie),
                json!({ "userId": "", "userName": "あああああああああああ" }),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let fields: Vec<&str> = body["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"userId"));
        assert!(fields.contains(&"userName"));
        assert!(fields.contains(&"password"));
    }

    #[tokio::test]
    async fn test_grants_replace() {
        let app = TestApp::new().await;
        let cookie = app.login_as_root().await;

        let (_, body) = app
            .post(
                "/admins",
                Some(&cookie),
                json!({ "userId": "staff01", "userName": "Staff", "password": "x-Y-z-123" }),
            )
            .await;
        let id = body["id"].as_i64().unwrap();

        let (status, body) = app
            .put(
                &format!("/admins/{id}/grants"),
                Some(&cookie),
                json!({ "adminRoles": [2], "adminPermissions": [2, 3] }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["roles"].as_array().unwrap().len(), 1);
        assert_eq!(body["permissions"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_revoked_and_deleted_admins_lose_access() {
        let app = TestApp::new().await;
        let root = app.login_as_root().await;

        let (_, body) = app
            .post(
                "/admins",
                Some(&root),
                json!({
                    "userId": "staff01",
                    "userName": "Staff",
                    "password": "x-Y-z-123",
                    "adminPermissions": [1],
                }),
            )
            .await;
        let id = body["id"].as_i64().unwrap();
        let staff = app.login("staff01", "x-Y-z-123").await.unwrap();

        let (status, _) = app.get("/admins", Some(&staff)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app
            .put(
                &format!("/admins/{id}/grants"),
                Some(&root),
                json!({ "adminRoles": [], "adminPermissions": [] }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app.get("/admins", Some(&staff)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (_, body) = app.get("/auth/me", Some(&staff)).await;
        assert_eq!(body["permissions"], json!([]));

        let (status, _) = app.delete(&format!("/admins/{id}"), Some(&root)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app.get("/auth/me", Some(&staff)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = app
            .post(
                "/admins",
                Some(&staff),
                json!({ "userId": "ghostmade", "userName": "Ghost", "password": "x-Y-z-123" }),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(app.store.find_admin_by_user_id("ghostmade").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reference_lists() {
        let app = TestApp::new().await;
        let cookie = app.login_as_root().await;

        let (status, body) = app.get("/roles", Some(&cookie)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (_, body) = app.get("/permissions", Some(&cookie)).await;
        assert_eq!(body.as_array().unwrap().len(), 4);
    }
}
