//! User registration, login, profile and admin user management.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use orchard_core::{Email, UserId};

use crate::db::users::UserRepository;
use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::User;
use crate::routes::or_not_found;
use crate::services::auth::{self, AuthService};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(register).get(list_users))
        .route("/login", post(login))
        .route("/profile", get(get_profile).put(update_profile))
        .route(
            "/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    name: String,
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

/// Authenticated user response carrying a fresh bearer token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserWithToken {
    id: UserId,
    name: String,
    email: String,
    is_admin: bool,
    token: String,
}

impl UserWithToken {
    fn new(user: User, token: String) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            is_admin: user.is_admin,
            token,
        }
    }
}

/// `POST /api/users` - register a new account.
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserWithToken>)> {
    let service = AuthService::new(state.pool());
    let user = service
        .register(&body.name, &body.email, &body.password)
        .await?;

    let token = auth::issue_token(
        state.jwt_encoding(),
        user.id,
        state.config().token_ttl_hours,
    )?;

    Ok((StatusCode::CREATED, Json(UserWithToken::new(user, token))))
}

/// `POST /api/users/login` - authenticate and get a bearer token.
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<UserWithToken>> {
    let service = AuthService::new(state.pool());
    let user = service.login(&body.email, &body.password).await?;

    let token = auth::issue_token(
        state.jwt_encoding(),
        user.id,
        state.config().token_ttl_hours,
    )?;

    Ok(Json(UserWithToken::new(user, token)))
}

/// `GET /api/users/profile` - the authenticated user's profile.
async fn get_profile(RequireAuth(user): RequireAuth) -> Json<User> {
    Json(user)
}

#[derive(Debug, Deserialize)]
struct UpdateProfileRequest {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

/// `PUT /api/users/profile` - update the authenticated user's profile. The
/// response carries a fresh token so the client can keep its session after
/// an email change.
async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<UserWithToken>> {
    let email = match body.email.as_deref() {
        Some(raw) => Some(Email::parse(raw).map_err(auth::AuthError::InvalidEmail)?),
        None => None,
    };
    let password_hash = match body.password.as_deref() {
        Some(password) => {
            auth::validate_password(password)?;
            Some(auth::hash_password(password)?)
        }
        None => None,
    };

    let updated = UserRepository::new(state.pool())
        .update_profile(
            user.id,
            body.name.as_deref(),
            email.as_ref(),
            password_hash.as_deref(),
        )
        .await
        .map_err(|e| or_not_found(e, "User not found"))?;

    let token = auth::issue_token(
        state.jwt_encoding(),
        updated.id,
        state.config().token_ttl_hours,
    )?;

    Ok(Json(UserWithToken::new(updated, token)))
}

/// `GET /api/users` - list all users (admin).
async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<Vec<User>>> {
    let users = UserRepository::new(state.pool()).list().await?;
    Ok(Json(users))
}

/// `GET /api/users/{id}` - get a user (admin).
async fn get_user(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<Json<User>> {
    let user = UserRepository::new(state.pool())
        .get(id)
        .await
        .map_err(|e| or_not_found(e, "User not found"))?;
    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateUserRequest {
    name: Option<String>,
    email: Option<String>,
    is_admin: Option<bool>,
}

/// `PUT /api/users/{id}` - update a user's name, email or admin flag
/// (admin).
async fn update_user(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<UserId>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<User>> {
    let email = match body.email.as_deref() {
        Some(raw) => Some(Email::parse(raw).map_err(auth::AuthError::InvalidEmail)?),
        None => None,
    };

    let user = UserRepository::new(state.pool())
        .update_admin(id, body.name.as_deref(), email.as_ref(), body.is_admin)
        .await
        .map_err(|e| or_not_found(e, "User not found"))?;
    Ok(Json(user))
}

/// `DELETE /api/users/{id}` - delete a user (admin).
async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<Json<serde_json::Value>> {
    UserRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| or_not_found(e, "User not found"))?;
    Ok(Json(json!({ "message": "User removed" })))
}
