//! Business logic services for the back-office.
//!
//! # Services
//!
//! - `access` - Acting admin identity and permission checks
//! - `associations` - Admin role/permission link replacement
//! - `auth` - Password hashing and login
//! - `admins`, `categories`, `brands`, `items` - CRUD orchestrators
//! - `named` - The shared flow behind `categories` and `brands`
//!
//! Every orchestrator borrows a store implementing the repository traits, so
//! the same code runs against [`crate::db::PgStore`] and
//! [`crate::db::MemoryStore`]. Operations run in a fixed order: authorize,
//! validate, check uniqueness, persist, then (for admins) associate.

pub mod access;
pub mod admins;
pub mod associations;
pub mod auth;
pub mod brands;
pub mod categories;
pub mod items;
pub mod named;

use thiserror::Error;

use backoffice_core::ValidationErrors;

use crate::db::RepositoryError;

pub use access::{Actor, Resource};
pub use admins::AdminService;
pub use associations::AssociationManager;
pub use auth::{AuthError, AuthService};
pub use brands::BrandService;
pub use categories::CategoryService;
pub use items::ItemService;

/// Errors returned by the CRUD orchestrators.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Submitted input failed one or more field rules.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// A unique field already holds this value on another active record.
    #[error("{field} '{value}' is already taken")]
    Conflict { field: String, value: String },

    /// No active record with this ID.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    /// The acting admin may not perform this operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Password could not be hashed.
    #[error("password hashing failed")]
    PasswordHash,

    /// Storage failure.
    #[error("storage error: {0}")]
    Persistence(#[from] RepositoryError),
}

impl ServiceError {
    pub(crate) fn not_found(entity: &'static str, id: impl Into<i32>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub(crate) fn conflict(field: &str, value: &str) -> Self {
        Self::Conflict {
            field: field.to_owned(),
            value: value.to_owned(),
        }
    }

    /// Translate a failed write.
    ///
    /// A duplicate key caught by the storage layer becomes the same
    /// `Conflict` the pre-check reports, and a row that vanished between
    /// lookup and write becomes `NotFound`.
    pub(crate) fn from_write(
        err: RepositoryError,
        entity: &'static str,
        id: Option<i32>,
        value: &str,
    ) -> Self {
        match (err, id) {
            (RepositoryError::Conflict(field), _) => Self::conflict(&field, value),
            (RepositoryError::NotFound, Some(id)) => Self::not_found(entity, id),
            (err, _) => Self::Persistence(err),
        }
    }

    /// Whether this error means the request could not be served at all,
    /// as opposed to being rejected.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::PasswordHash | Self::Persistence(_))
    }
}
