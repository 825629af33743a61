//! Authentication extractors for the back-office API.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::db::Store;
use crate::error::{AppError, set_sentry_user};
use crate::models::{CurrentAdmin, session_keys};
use crate::services::{Actor, AuthService};
use crate::state::AppState;

/// Extractor that requires admin authentication.
///
/// The session only identifies the admin; roles and permissions are reloaded
/// from the store on every request, so revoked grants and deleted admins take
/// effect immediately. Responds 401 when no admin is logged in or the admin
/// no longer exists.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.user_name)
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

impl RequireAdminAuth {
    /// The logged-in admin as the acting identity for services.
    #[must_use]
    pub fn actor(&self) -> Actor {
        Actor::from(&self.0)
    }
}

fn unauthenticated() -> AppError {
    AppError::Unauthorized("authentication required".to_string())
}

impl<S: Store> FromRequestParts<AppState<S>> for RequireAdminAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(unauthenticated)?;

        let stored: CurrentAdmin = session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .ok()
            .flatten()
            .ok_or_else(unauthenticated)?;

        let Some(admin) = AuthService::new(state.store()).current(stored.id).await? else {
            tracing::warn!(admin_id = %stored.id, "session admin no longer exists");
            clear_current_admin(&session).await?;
            return Err(unauthenticated());
        };

        if admin != stored {
            session.insert(session_keys::CURRENT_ADMIN, &admin).await?;
        }

        set_sentry_user(admin.id.as_i32(), &admin.user_id);
        Ok(Self(admin))
    }
}

/// Store the logged-in admin in the session.
///
/// The session ID is cycled first so a pre-login session ID cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Clear the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await?;
    session.flush().await
}
