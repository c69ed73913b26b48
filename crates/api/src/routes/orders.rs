//! Order routes: checkout, payment flags and admin status management.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::Deserialize;

use orchard_core::{AddressId, OrderId, OrderStatus, PaymentStatus, ProductId};

use crate::db::carts::CartRepository;
use crate::db::orders::{NewOrder, NewOrderItem, OrderRepository};
use crate::db::payments::PaymentRepository;
use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{Order, OrderPage, PaymentResult};
use crate::pricing::OrderTotals;
use crate::routes::or_not_found;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/myorders", get(my_orders))
        .route("/{id}", get(get_order))
        .route("/{id}/pay", put(pay_order))
        .route("/{id}/deliver", put(deliver_order))
        .route("/{id}/status", put(update_order_status))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderItemRequest {
    product: ProductId,
    name: String,
    image: Option<String>,
    price: Decimal,
    quantity: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrderRequest {
    #[serde(default)]
    order_items: Vec<OrderItemRequest>,
    shipping_address: AddressId,
    billing_address: Option<AddressId>,
    payment_method: String,
}

/// `POST /api/orders` - checkout.
///
/// Totals are recomputed server-side from the submitted items; the client's
/// numbers are never trusted. Stock is decremented per item with no rollback
/// on partial failure, and the cart is cleared afterwards, matching the
/// storefront's long-standing behavior.
async fn create_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    if body.order_items.is_empty() {
        return Err(AppError::BadRequest("No order items".to_owned()));
    }

    let totals = OrderTotals::compute(
        body.order_items
            .iter()
            .map(|item| (item.price, item.quantity)),
    );

    let items: Vec<NewOrderItem> = body
        .order_items
        .into_iter()
        .map(|item| NewOrderItem {
            product_id: item.product,
            name: item.name,
            image: item.image,
            price: item.price,
            quantity: item.quantity,
        })
        .collect();

    let order = OrderRepository::new(state.pool())
        .create(&NewOrder {
            user_id: user.id,
            items: &items,
            shipping_address_id: body.shipping_address,
            billing_address_id: body.billing_address.unwrap_or(body.shipping_address),
            payment_method: &body.payment_method,
            totals,
        })
        .await?;

    let products = ProductRepository::new(state.pool());
    for item in &items {
        // Unknown products are skipped, not a checkout failure.
        if let Err(err) = products.decrement_stock(item.product_id, item.quantity).await {
            tracing::warn!(
                product_id = %item.product_id,
                error = %err,
                "Failed to decrement stock at checkout"
            );
        }
    }

    if let Err(err) = CartRepository::new(state.pool()).clear(user.id).await {
        tracing::warn!(user_id = %user.id, error = %err, "Failed to clear cart at checkout");
    }

    Ok((StatusCode::CREATED, Json(order)))
}

/// `GET /api/orders/myorders` - the authenticated user's orders.
async fn my_orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders))
}

/// `GET /api/orders/{id}` - single order, visible to its owner or an admin.
async fn get_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await
        .map_err(|e| or_not_found(e, "Order not found"))?;

    if order.user_id != user.id && !user.is_admin {
        return Err(AppError::Unauthorized("Not authorized".to_owned()));
    }

    Ok(Json(order))
}

#[derive(Debug, Deserialize)]
struct Payer {
    email_address: String,
}

/// Gateway callback payload, PayPal-shaped.
#[derive(Debug, Deserialize)]
struct PayOrderRequest {
    id: String,
    status: String,
    update_time: String,
    payer: Payer,
}

/// `PUT /api/orders/{id}/pay` - record a gateway result, mark the order
/// paid and write a completed payment record.
async fn pay_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
    Json(body): Json<PayOrderRequest>,
) -> Result<Json<Order>> {
    let result = PaymentResult {
        id: body.id.clone(),
        status: body.status.clone(),
        update_time: body.update_time.clone(),
        email_address: body.payer.email_address.clone(),
    };

    let order = OrderRepository::new(state.pool())
        .mark_paid(id, &result)
        .await
        .map_err(|e| or_not_found(e, "Order not found"))?;

    let details = serde_json::json!({
        "id": body.id,
        "status": body.status,
        "update_time": body.update_time,
        "payer": { "email_address": body.payer.email_address },
    });
    PaymentRepository::new(state.pool())
        .create(
            user.id,
            order.id,
            &order.payment_method,
            order.total_price,
            "USD",
            PaymentStatus::Completed,
            Some(&body.id),
            Some(&details),
        )
        .await?;

    Ok(Json(order))
}

/// `PUT /api/orders/{id}/deliver` - mark an order delivered (admin).
async fn deliver_order(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .mark_delivered(id)
        .await
        .map_err(|e| or_not_found(e, "Order not found"))?;
    Ok(Json(order))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateStatusRequest {
    status: Option<String>,
    tracking_number: Option<String>,
    notes: Option<String>,
}

/// `PUT /api/orders/{id}/status` - admin status update. A move to
/// `Delivered` also sets the delivered flag and timestamp.
async fn update_order_status(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<Order>> {
    let status = match body.status.as_deref() {
        Some(raw) => Some(
            raw.parse::<OrderStatus>()
                .map_err(|e| AppError::BadRequest(e.to_string()))?,
        ),
        None => None,
    };

    let order = OrderRepository::new(state.pool())
        .update_status(
            id,
            status,
            body.tracking_number.as_deref(),
            body.notes.as_deref(),
        )
        .await
        .map_err(|e| or_not_found(e, "Order not found"))?;

    Ok(Json(order))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageQuery {
    page_number: Option<i64>,
}

/// `GET /api/orders` - all orders, paginated (admin).
async fn list_orders(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(query): Query<PageQuery>,
) -> Result<Json<OrderPage>> {
    let page = OrderRepository::new(state.pool())
        .list(query.page_number.unwrap_or(1))
        .await?;
    Ok(Json(page))
}
