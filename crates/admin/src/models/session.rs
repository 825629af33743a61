//! Session-related types for admin authentication.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use backoffice_core::AdminId;

/// Session-stored admin identity.
///
/// Stored in the session to identify the logged-in admin. Only `id` is
/// trusted on later requests: the rest is reloaded from the store each time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentAdmin {
    /// Admin's database ID.
    pub id: AdminId,
    /// Admin's login identifier.
    pub user_id: String,
    /// Admin's display name.
    pub user_name: String,
    /// Names of the roles currently granted.
    pub roles: Vec<String>,
    /// Names of the permissions currently granted.
    pub permissions: Vec<String>,
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";
}
