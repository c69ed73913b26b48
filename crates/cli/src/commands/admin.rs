//! Admin user management.

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};

use super::{CommandError, connect};

/// Create an admin user, or promote the account if the email already
/// exists.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or hashing fails.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<(), CommandError> {
    let pool = connect().await?;

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| CommandError::PasswordHash)?
        .to_string();

    sqlx::query(
        "INSERT INTO users (name, email, password_hash, is_admin)
         VALUES ($1, $2, $3, TRUE)
         ON CONFLICT (email) DO UPDATE
         SET is_admin = TRUE, updated_at = NOW()",
    )
    .bind(name)
    .bind(email.trim().to_lowercase())
    .bind(password_hash)
    .execute(&pool)
    .await?;

    tracing::info!(email, "Admin user ready");
    Ok(())
}
