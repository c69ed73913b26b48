//! Cart routes. All of them require an authenticated user; every mutation
//! responds with the full updated cart.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use orchard_core::{CartItemId, ProductId};

use crate::db::carts::CartRepository;
use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Cart;
use crate::routes::or_not_found;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart).post(add_to_cart).delete(clear_cart))
        .route("/{itemId}", put(update_cart_item).delete(remove_cart_item))
}

/// `GET /api/cart` - the user's cart, created empty on first access.
async fn get_cart(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> Result<Json<Cart>> {
    let cart = CartRepository::new(state.pool()).get_or_create(user.id).await?;
    Ok(Json(cart))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddToCartRequest {
    product_id: ProductId,
    #[serde(default = "default_quantity")]
    quantity: i32,
    #[serde(default = "default_attributes")]
    attributes: serde_json::Value,
}

const fn default_quantity() -> i32 {
    1
}

fn default_attributes() -> serde_json::Value {
    json!({})
}

/// `POST /api/cart` - add a product, merging quantity if it is already in
/// the cart. The unit price is snapshotted from the catalog.
async fn add_to_cart(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<AddToCartRequest>,
) -> Result<(StatusCode, Json<Cart>)> {
    let product = ProductRepository::new(state.pool())
        .get(body.product_id)
        .await
        .map_err(|e| or_not_found(e, "Product not found"))?;

    if product.count_in_stock < body.quantity {
        return Err(AppError::BadRequest("Product is out of stock".to_owned()));
    }

    let cart = CartRepository::new(state.pool())
        .add_item(
            user.id,
            product.id,
            body.quantity,
            product.price,
            &body.attributes,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(cart)))
}

#[derive(Debug, Deserialize)]
struct UpdateCartItemRequest {
    quantity: Option<i32>,
    attributes: Option<serde_json::Value>,
}

/// `PUT /api/cart/{itemId}` - update an item's quantity and/or attributes,
/// re-checking stock against the requested quantity.
async fn update_cart_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(item_id): Path<CartItemId>,
    Json(body): Json<UpdateCartItemRequest>,
) -> Result<Json<Cart>> {
    let repo = CartRepository::new(state.pool());
    let cart = repo
        .get(user.id)
        .await
        .map_err(|e| or_not_found(e, "Cart not found"))?;

    let item = cart
        .items
        .iter()
        .find(|item| item.id == item_id)
        .ok_or_else(|| AppError::NotFound("Item not found in cart".to_owned()))?;

    if let Some(quantity) = body.quantity
        && item.product.count_in_stock < quantity
    {
        return Err(AppError::BadRequest("Product is out of stock".to_owned()));
    }

    let cart = repo
        .update_item(user.id, item_id, body.quantity, body.attributes.as_ref())
        .await
        .map_err(|e| or_not_found(e, "Item not found in cart"))?;

    Ok(Json(cart))
}

/// `DELETE /api/cart/{itemId}` - remove an item. Removing an item that is
/// not there leaves the cart unchanged.
async fn remove_cart_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<Cart>> {
    let cart = CartRepository::new(state.pool())
        .remove_item(user.id, item_id)
        .await
        .map_err(|e| or_not_found(e, "Cart not found"))?;

    Ok(Json(cart))
}

/// `DELETE /api/cart` - empty the cart.
async fn clear_cart(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<serde_json::Value>> {
    CartRepository::new(state.pool())
        .clear(user.id)
        .await
        .map_err(|e| or_not_found(e, "Cart not found"))?;

    Ok(Json(json!({ "message": "Cart cleared" })))
}
