//! Authentication service.
//!
//! Password registration and login on top of the user repository. Hashing is
//! argon2id; the stored hash string carries its own parameters, so upgrades
//! verify old hashes transparently.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use farmstand_core::{Email, EmailError, UserId};

use crate::db::{RepositoryError, UserRepository};
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors that can occur during authentication.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Email/password pair did not match.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No user exists for the given identifier.
    #[error("user not found")]
    UserNotFound,

    /// Registration email is already taken.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password failed validation.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// Email failed validation.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Hashing failed (never carries the password).
    #[error("password hashing failed")]
    PasswordHash,

    /// Underlying repository error.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Authentication service.
///
/// Handles user registration, login, and account-profile updates.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new user with email, password, and display name.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<User, AuthError> {
        // Validate email
        let email = Email::parse(email)?;

        // Validate password
        validate_password(password)?;

        // Hash password
        let password_hash = hash_password(password)?;

        // Create user
        let user = self
            .users
            .create(&email, name, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        // Validate email format
        let email = Email::parse(email)?;

        // Get user with password hash
        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        // Verify password
        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Update a user's display name and profile address, returning the fresh
    /// row so the caller can refresh the session record.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user row is gone.
    pub async fn update_account(
        &self,
        id: UserId,
        name: &str,
        street: &str,
        city: &str,
        state: &str,
        zip: &str,
    ) -> Result<User, AuthError> {
        self.users
            .update_profile(id, name, street, city, state, zip)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })?;

        self.users
            .get_by_id(id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_too_short() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[test]
    fn test_validate_password_ok() {
        assert!(validate_password("longenough").is_ok());
    }

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
