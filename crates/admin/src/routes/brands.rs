//! Brand route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::{JsonRejection, PathRejection}},
    http::StatusCode,
    routing::get,
};
use tracing::instrument;

use backoffice_core::BrandId;

use super::ListQuery;
use crate::db::Store;
use crate::error::AppError;
use crate::middleware::RequireAdminAuth;
use crate::models::{Brand, NameForm, Page};
use crate::services::BrandService;
use crate::state::AppState;

pub fn router<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/brands", get(index::<S>).post(create::<S>))
        .route(
            "/brands/{id}",
            get(show::<S>).put(update::<S>).delete(destroy::<S>),
        )
}

/// # Errors
///
/// Returns 403 without `brand.manage`.
#[instrument(skip(auth, state))]
pub async fn index<S: Store>(
    auth: RequireAdminAuth,
    State(state): State<AppState<S>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Brand>>, AppError> {
    let page = BrandService::new(state.store())
        .list(&auth.actor(), query.page_request(state.page_size()))
        .await?;
    Ok(Json(page))
}

/// # Errors
///
/// Returns 422 for an invalid name and 409 for a duplicate.
#[instrument(skip(auth, state, payload))]
pub async fn create<S: Store>(
    auth: RequireAdminAuth,
    State(state): State<AppState<S>>,
    payload: Result<Json<NameForm>, JsonRejection>,
) -> Result<(StatusCode, Json<Brand>), AppError> {
    let Json(form) = payload?;
    let brand = BrandService::new(state.store())
        .create(&auth.actor(), &form)
        .await?;
    Ok((StatusCode::CREATED, Json(brand)))
}

/// # Errors
///
/// Returns 404 for missing or deleted brands.
#[instrument(skip(auth, state))]
pub async fn show<S: Store>(
    auth: RequireAdminAuth,
    State(state): State<AppState<S>>,
    path: Result<Path<BrandId>, PathRejection>,
) -> Result<Json<Brand>, AppError> {
    let Path(id) = path?;
    let brand = BrandService::new(state.store())
        .show(&auth.actor(), id)
        .await?;
    Ok(Json(brand))
}

/// # Errors
///
/// Returns 404, 422 or 409.
#[instrument(skip(auth, state, payload))]
pub async fn update<S: Store>(
    auth: RequireAdminAuth,
    State(state): State<AppState<S>>,
    path: Result<Path<BrandId>, PathRejection>,
    payload: Result<Json<NameForm>, JsonRejection>,
) -> Result<Json<Brand>, AppError> {
    let Path(id) = path?;
    let Json(form) = payload?;
    let brand = BrandService::new(state.store())
        .edit(&auth.actor(), id, &form)
        .await?;
    Ok(Json(brand))
}

/// Soft-delete; the response carries the deletion timestamp.
///
/// # Errors
///
/// Returns 404 for missing or already deleted brands.
#[instrument(skip(auth, state))]
pub async fn destroy<S: Store>(
    auth: RequireAdminAuth,
    State(state): State<AppState<S>>,
    path: Result<Path<BrandId>, PathRejection>,
) -> Result<Json<Brand>, AppError> {
    let Path(id) = path?;
    let brand = BrandService::new(state.store())
        .delete(&auth.actor(), id)
        .await?;
    Ok(Json(brand))
}
