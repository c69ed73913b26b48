//! Authentication service.
//!
//! Provides password registration/login and bearer token issuing. Passwords
//! are hashed with argon2; tokens are HS256 JWTs whose subject is the user id.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use orchard_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Bearer token claims. `sub` is the user id; ownership and the admin flag
/// are always re-checked against the database on each request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub iat: i64,
    pub exp: i64,
}

/// Authentication service.
///
/// Handles user registration, login, and bearer token verification.
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

    /// Register a new user with name, email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(name, &email, &password_hash)
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
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .get_with_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }
}

// =============================================================================
// Bearer Tokens
// =============================================================================

/// Issue a bearer token for a user.
///
/// # Errors
///
/// Returns `AuthError::InvalidToken` if encoding fails (malformed key).
pub fn issue_token(
    key: &EncodingKey,
    user_id: UserId,
    ttl_hours: u64,
) -> Result<String, AuthError> {
    let now = chrono::Utc::now();
    let ttl = chrono::Duration::hours(i64::try_from(ttl_hours).unwrap_or(i64::MAX));
    let claims = Claims {
        sub: user_id.as_i32(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };

    jsonwebtoken::encode(&Header::default(), &claims, key).map_err(|_| AuthError::InvalidToken)
}

/// Verify a bearer token and extract the user id.
///
/// # Errors
///
/// Returns `AuthError::InvalidToken` if the token is malformed, expired, or
/// the signature doesn't check out.
pub fn verify_token(key: &DecodingKey, token: &str) -> Result<UserId, AuthError> {
    let data = jsonwebtoken::decode::<Claims>(token, key, &Validation::default())
        .map_err(|_| AuthError::InvalidToken)?;

    Ok(UserId::new(data.claims.sub))
}

// =============================================================================
// Passwords
// =============================================================================

/// Validate that a password meets minimum requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` with a client-facing message.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password with argon2 and a fresh salt.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AuthError::PasswordHash)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored argon2 hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if verification fails.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| AuthError::PasswordHash)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same input").unwrap();
        let b = hash_password("same input").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_validate_password_too_short() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[test]
    fn test_validate_password_ok() {
        assert!(validate_password("long enough password").is_ok());
    }

    #[test]
    fn test_token_roundtrip() {
        let secret = b"0123456789abcdef0123456789abcdef";
        let encoding = EncodingKey::from_secret(secret);
        let decoding = DecodingKey::from_secret(secret);

        let token = issue_token(&encoding, UserId::new(42), 1).unwrap();
        let user_id = verify_token(&decoding, &token).unwrap();
        assert_eq!(user_id, UserId::new(42));
    }

    #[test]
    fn test_token_wrong_key_rejected() {
        let encoding = EncodingKey::from_secret(b"0123456789abcdef0123456789abcdef");
        let decoding = DecodingKey::from_secret(b"another-key-another-key-another!");

        let token = issue_token(&encoding, UserId::new(1), 1).unwrap();
        assert!(matches!(
            verify_token(&decoding, &token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let decoding = DecodingKey::from_secret(b"0123456789abcdef0123456789abcdef");
        assert!(matches!(
            verify_token(&decoding, "not-a-jwt"),
            Err(AuthError::InvalidToken)
        ));
    }
}
