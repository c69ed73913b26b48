//! Address book routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use orchard_core::AddressId;

use crate::db::addresses::{AddressChanges, AddressRepository, NewAddress};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Address, User};
use crate::routes::or_not_found;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_addresses).post(create_address))
        .route(
            "/{id}",
            get(get_address).put(update_address).delete(delete_address),
        )
        .route("/{id}/default", put(set_default_address))
}

/// `GET /api/addresses` - the user's address book, default first.
async fn list_addresses(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Address>>> {
    let addresses = AddressRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(addresses))
}

/// Load an address and check the caller may touch it.
async fn load_owned(
    repo: &AddressRepository<'_>,
    user: &User,
    id: AddressId,
) -> Result<Address> {
    let address = repo
        .get(id)
        .await
        .map_err(|e| or_not_found(e, "Address not found"))?;

    if address.user_id != user.id && !user.is_admin {
        return Err(AppError::Unauthorized("Not authorized".to_owned()));
    }
    Ok(address)
}

/// `GET /api/addresses/{id}` - single address, owner or admin.
async fn get_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Json<Address>> {
    let repo = AddressRepository::new(state.pool());
    let address = load_owned(&repo, &user, id).await?;
    Ok(Json(address))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAddressRequest {
    name: String,
    address_line1: String,
    address_line2: Option<String>,
    city: String,
    state: String,
    postal_code: String,
    country: String,
    phone: String,
    #[serde(default)]
    is_default: bool,
}

/// `POST /api/addresses` - add an address. A new default displaces any
/// existing one.
async fn create_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<CreateAddressRequest>,
) -> Result<(StatusCode, Json<Address>)> {
    let address = AddressRepository::new(state.pool())
        .create(
            user.id,
            &NewAddress {
                name: &body.name,
                address_line1: &body.address_line1,
                address_line2: body.address_line2.as_deref(),
                city: &body.city,
                state: &body.state,
                postal_code: &body.postal_code,
                country: &body.country,
                phone: &body.phone,
                is_default: body.is_default,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(address)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAddressRequest {
    name: Option<String>,
    address_line1: Option<String>,
    address_line2: Option<String>,
    city: Option<String>,
    state: Option<String>,
    postal_code: Option<String>,
    country: Option<String>,
    phone: Option<String>,
    is_default: Option<bool>,
}

/// `PUT /api/addresses/{id}` - partial update, owner or admin.
async fn update_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
    Json(body): Json<UpdateAddressRequest>,
) -> Result<Json<Address>> {
    let repo = AddressRepository::new(state.pool());
    let owner = load_owned(&repo, &user, id).await?;

    let address = repo
        .update(
            owner.user_id,
            id,
            &AddressChanges {
                name: body.name.as_deref(),
                address_line1: body.address_line1.as_deref(),
                address_line2: body.address_line2.as_deref(),
                city: body.city.as_deref(),
                state: body.state.as_deref(),
                postal_code: body.postal_code.as_deref(),
                country: body.country.as_deref(),
                phone: body.phone.as_deref(),
                is_default: body.is_default,
            },
        )
        .await
        .map_err(|e| or_not_found(e, "Address not found"))?;

    Ok(Json(address))
}

/// `DELETE /api/addresses/{id}` - remove an address, owner or admin.
async fn delete_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Json<serde_json::Value>> {
    let repo = AddressRepository::new(state.pool());
    let owner = load_owned(&repo, &user, id).await?;

    repo.delete(owner.user_id, id)
        .await
        .map_err(|e| or_not_found(e, "Address not found"))?;

    Ok(Json(json!({ "message": "Address removed" })))
}

/// `PUT /api/addresses/{id}/default` - make an address the single default.
async fn set_default_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Json<Address>> {
    let repo = AddressRepository::new(state.pool());
    let owner = load_owned(&repo, &user, id).await?;

    let address = repo
        .set_default(owner.user_id, id)
        .await
        .map_err(|e| or_not_found(e, "Address not found"))?;

    Ok(Json(address))
}
