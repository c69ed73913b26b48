//! HTTP route handlers.
//!
//! Each submodule owns one `/api/*` prefix and mirrors the storefront
//! client's JSON contract: camelCase bodies, errors as `{"message": "..."}`.

pub mod addresses;
pub mod cart;
pub mod categories;
pub mod orders;
pub mod payments;
pub mod products;
pub mod reviews;
pub mod users;

use axum::Router;

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::state::AppState;

/// Assemble all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/users", users::routes())
        .nest("/api/products", products::routes())
        .nest("/api/categories", categories::routes())
        .nest("/api/cart", cart::routes())
        .nest("/api/orders", orders::routes())
        .nest("/api/addresses", addresses::routes())
        .nest("/api/reviews", reviews::routes())
        .nest("/api/payments", payments::routes())
}

/// Map `RepositoryError::NotFound` to a 404 with a resource-specific
/// message; everything else stays a server error.
fn or_not_found(err: RepositoryError, message: &str) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound(message.to_owned()),
        other => AppError::Database(other),
    }
}
