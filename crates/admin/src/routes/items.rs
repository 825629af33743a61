//! Item route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::{JsonRejection, PathRejection}},
    http::StatusCode,
    routing::get,
};
use tracing::instrument;

use backoffice_core::ItemId;

use super::ListQuery;
use crate::db::Store;
use crate::error::AppError;
use crate::middleware::RequireAdminAuth;
use crate::models::{Item, ItemForm, Page};
use crate::services::ItemService;
use crate::state::AppState;

pub fn router<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/items", get(index::<S>).post(create::<S>))
        .route(
            "/items/{id}",
            get(show::<S>).put(update::<S>).delete(destroy::<S>),
        )
}

/// # Errors
///
/// Returns 403 without `item.manage`.
#[instrument(skip(auth, state))]
pub async fn index<S: Store>(
    auth: RequireAdminAuth,
    State(state): State<AppState<S>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Item>>, AppError> {
    let page = ItemService::new(state.store())
        .list(&auth.actor(), query.page_request(state.page_size()))
        .await?;
    Ok(Json(page))
}

/// # Errors
///
/// Returns 422 for invalid fields or unknown brand or category IDs, and 409
/// for a duplicate name.
#[instrument(skip(auth, state, payload))]
pub async fn create<S: Store>(
    auth: RequireAdminAuth,
    State(state): State<AppState<S>>,
    payload: Result<Json<ItemForm>, JsonRejection>,
) -> Result<(StatusCode, Json<Item>), AppError> {
    let Json(form) = payload?;
    let item = ItemService::new(state.store())
        .create(&auth.actor(), &form)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// # Errors
///
/// Returns 404 for missing or deleted items.
#[instrument(skip(auth, state))]
pub async fn show<S: Store>(
    auth: RequireAdminAuth,
    State(state): State<AppState<S>>,
    path: Result<Path<ItemId>, PathRejection>,
) -> Result<Json<Item>, AppError> {
    let Path(id) = path?;
    let item = ItemService::new(state.store())
        .show(&auth.actor(), id)
        .await?;
    Ok(Json(item))
}

/// # Errors
///
/// Returns 404, 422 or 409.
#[instrument(skip(auth, state, payload))]
pub async fn update<S: Store>(
    auth: RequireAdminAuth,
    State(state): State<AppState<S>>,
    path: Result<Path<ItemId>, PathRejection>,
    payload: Result<Json<ItemForm>, JsonRejection>,
) -> Result<Json<Item>, AppError> {
    let Path(id) = path?;
    let Json(form) = payload?;
    let item = ItemService::new(state.store())
        .edit(&auth.actor(), id, &form)
        .await?;
    Ok(Json(item))
}

/// Soft-delete; the response carries the deletion timestamp.
///
/// # Errors
///
/// Returns 404 for missing or already deleted items.
#[instrument(skip(auth, state))]
pub async fn destroy<S: Store>(
    auth: RequireAdminAuth,
    State(state): State<AppState<S>>,
    path: Result<Path<ItemId>, PathRejection>,
) -> Result<Json<Item>, AppError> {
    let Path(id) = path?;
    let item = ItemService::new(state.store())
        .delete(&auth.actor(), id)
        .await?;
    Ok(Json(item))
}
