//! Database migration command.
//!
//! Migrations live in `crates/api/migrations/` and are embedded in this
//! binary at compile time, so the CLI can migrate any environment it can
//! reach.

use super::{CommandError, connect};

/// Run all pending database migrations.
///
/// # Errors
///
/// Returns `CommandError` if `DATABASE_URL` is unset or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
