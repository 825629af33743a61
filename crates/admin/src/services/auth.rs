//! Admin authentication service.
//!
//! Password login against Argon2id hashes. A successful login yields the
//! [`CurrentAdmin`] that the routes store in the session.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;
use tracing::instrument;

use backoffice_core::AdminId;

use crate::db::{AdminRepository, RepositoryError};
use crate::models::{Admin, CurrentAdmin};

/// Errors that can occur during admin authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown login identifier or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Admin authentication service.
pub struct AuthService<'a, S> {
    store: &'a S,
}

impl<'a, S: AdminRepository> AuthService<'a, S> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Login with login identifier and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the admin does not exist or
    /// the password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, user_id: &str, password: &str) -> Result<CurrentAdmin, AuthError> {
        let admin = self
            .store
            .find_admin_by_user_id(user_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &admin.password_hash)?;

        let current = self.load_grants(admin).await?;
        tracing::info!(admin_id = %current.id, "admin logged in");
        Ok(current)
    }

    /// Reload a logged-in admin with their grants as they are now.
    ///
    /// Returns `None` once the admin has been deleted.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the store fails.
    pub async fn current(&self, id: AdminId) -> Result<Option<CurrentAdmin>, AuthError> {
        match self.store.find_admin(id).await? {
            Some(admin) => Ok(Some(self.load_grants(admin).await?)),
            None => Ok(None),
        }
    }

    async fn load_grants(&self, admin: Admin) -> Result<CurrentAdmin, AuthError> {
        let roles = self.store.roles_of(admin.id).await?;
        let permissions = self.store.permissions_of(admin.id).await?;

        Ok(CurrentAdmin {
            id: admin.id,
            user_id: admin.user_id,
            user_name: admin.user_name,
            roles: roles.into_iter().map(|r| r.name).collect(),
            permissions: permissions.into_iter().map(|p| p.name).collect(),
        })
    }
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a PHC hash string.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the hash is malformed or the
/// password does not match.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
