//! Admin account commands.
//!
//! # Usage
//!
//! ```bash
//! BO_ADMIN_PASSWORD='...' bo-cli admin create -u root -n "Root" -r super_admin
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string
//! - `BO_ADMIN_PASSWORD` - Initial password for the new admin

use backoffice_admin::db::{AdminRepository, PgStore};
use backoffice_admin::models::AdminForm;
use backoffice_admin::services::{Actor, AdminService};

use super::{CliError, connect};

/// Create an admin through the same validation and hashing as the API.
///
/// # Returns
///
/// The ID of the created admin.
///
/// # Errors
///
/// Returns an error if a role or permission name is unknown, or the
/// back-office rejects the form.
pub async fn create(
    user_id: &str,
    user_name: &str,
    roles: &[String],
    permissions: &[String],
) -> Result<i32, CliError> {
    let password = std::env::var("BO_ADMIN_PASSWORD")
        .map_err(|_| CliError::MissingEnvVar("BO_ADMIN_PASSWORD"))?;

    let store = PgStore::new(connect().await?);

    let known_roles = store.list_roles().await?;
    let known_permissions = store.list_permissions().await?;

    let role_ids = roles
        .iter()
        .map(|name| {
            known_roles
                .iter()
                .find(|r| &r.name == name)
                .map(|r| r.id)
                .ok_or_else(|| CliError::UnknownGrant {
                    kind: "role",
                    name: name.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let permission_ids = permissions
        .iter()
        .map(|name| {
            known_permissions
                .iter()
                .find(|p| &p.name == name)
                .map(|p| p.id)
                .ok_or_else(|| CliError::UnknownGrant {
                    kind: "permission",
                    name: name.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!("Creating admin: {user_id}");

    let admin = AdminService::new(&store)
        .create(
            &Actor::system(),
            &AdminForm {
                user_id: Some(user_id.to_owned()),
                user_name: Some(user_name.to_owned()),
                password: Some(password),
                avatar: None,
                roles: role_ids,
                permissions: permission_ids,
            },
        )
        .await?;

    tracing::info!(
        "Admin created successfully! ID: {}, userId: {}",
        admin.id,
        admin.user_id
    );
    Ok(admin.id.as_i32())
}
