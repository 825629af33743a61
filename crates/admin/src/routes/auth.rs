//! Authentication route handlers.

use std::fmt;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::Store;
use crate::error::{AppError, clear_sentry_user};
use crate::middleware::{RequireAdminAuth, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::services::AuthService;
use crate::state::AppState;

pub fn router<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/auth/login", post(login::<S>))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

/// Login request body.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub user_id: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("user_id", &self.user_id)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Verify the password and start a session.
///
/// # Errors
///
/// Returns 401 for unknown login identifiers or wrong passwords.
#[instrument(skip(state, session, payload))]
pub async fn login<S: Store>(
    State(state): State<AppState<S>>,
    session: Session,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<CurrentAdmin>, AppError> {
    let Json(request) = payload?;

    let admin = match AuthService::new(state.store())
        .login(&request.user_id, &request.password)
        .await
    {
        Ok(admin) => admin,
        Err(e) => {
            tracing::warn!(user_id = %request.user_id, "login failed: {e}");
            return Err(e.into());
        }
    };

    set_current_admin(&session, &admin).await?;
    Ok(Json(admin))
}

/// End the session.
///
/// # Errors
///
/// Returns 500 if the session cannot be cleared.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode, AppError> {
    clear_current_admin(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The logged-in admin.
pub async fn me(RequireAdminAuth(admin): RequireAdminAuth) -> Json<CurrentAdmin> {
    Json(admin)
}
