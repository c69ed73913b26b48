//! Bearer token extractors.
//!
//! `RequireAuth` verifies the `Authorization: Bearer <token>` header and
//! loads the user it names; `RequireAdmin` additionally checks the admin
//! flag. The user row is loaded on every request so revoked accounts and
//! demoted admins take effect immediately rather than at token expiry.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::db::users::UserRepository;
use crate::error::AppError;
use crate::models::User;
use crate::services::auth;
use crate::state::AppState;

/// Extractor for authenticated requests.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub User);

/// Extractor for admin-only requests.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state).await?;
        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state).await?;
        if !user.is_admin {
            return Err(AppError::Unauthorized(
                "Not authorized as an admin".to_owned(),
            ));
        }
        Ok(Self(user))
    }
}

async fn authenticate(parts: &Parts, state: &AppState) -> Result<User, AppError> {
    let token = bearer_token(parts)
        .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".to_owned()))?;

    let user_id = auth::verify_token(state.jwt_decoding(), token)
        .map_err(|_| AppError::Unauthorized("Not authorized, token failed".to_owned()))?;

    UserRepository::new(state.pool())
        .get(user_id)
        .await
        .map_err(|_| AppError::Unauthorized("Not authorized, token failed".to_owned()))
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/cart");
        if let Some(value) = value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[test]
    fn test_bearer_token_extracted() {
        let parts = parts_with_auth(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts), Some("abc.def.ghi"));
    }

    #[test]
    fn test_missing_header() {
        let parts = parts_with_auth(None);
        assert_eq!(bearer_token(&parts), None);
    }

    #[test]
    fn test_wrong_scheme_rejected() {
        let parts = parts_with_auth(Some("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&parts), None);
    }
}
