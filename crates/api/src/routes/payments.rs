//! Payment routes. A payment reaching `Completed` also marks its order
//! paid, through the same repository path the order-pay endpoint uses.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;

use orchard_core::{OrderId, PaymentId, PaymentStatus};

use crate::db::orders::OrderRepository;
use crate::db::payments::PaymentRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{Payment, PaymentPage, PaymentResult};
use crate::routes::or_not_found;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_payments).post(create_payment))
        .route("/admin", get(list_all_payments))
        .route("/{id}", get(get_payment).put(update_payment_status))
}

/// `GET /api/payments` - the user's payments, newest first.
async fn list_payments(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Payment>>> {
    let payments = PaymentRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(payments))
}

/// `GET /api/payments/{id}` - single payment, owner or admin.
async fn get_payment(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<PaymentId>,
) -> Result<Json<Payment>> {
    let payment = PaymentRepository::new(state.pool())
        .get(id)
        .await
        .map_err(|e| or_not_found(e, "Payment not found"))?;

    if payment.user_id != user.id && !user.is_admin {
        return Err(AppError::Unauthorized("Not authorized".to_owned()));
    }

    Ok(Json(payment))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePaymentRequest {
    order: OrderId,
    payment_method: String,
    amount: Decimal,
    currency: Option<String>,
    status: PaymentStatus,
    transaction_id: Option<String>,
    payment_details: Option<serde_json::Value>,
}

/// `POST /api/payments` - record a payment against one of the caller's
/// orders. A `Completed` payment marks the order paid.
async fn create_payment(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<Payment>)> {
    let orders = OrderRepository::new(state.pool());
    let order = orders
        .get(body.order)
        .await
        .map_err(|e| or_not_found(e, "Order not found"))?;

    if order.user_id != user.id && !user.is_admin {
        return Err(AppError::Unauthorized("Not authorized".to_owned()));
    }

    let payment = PaymentRepository::new(state.pool())
        .create(
            user.id,
            body.order,
            &body.payment_method,
            body.amount,
            body.currency.as_deref().unwrap_or("USD"),
            body.status,
            body.transaction_id.as_deref(),
            body.payment_details.as_ref(),
        )
        .await?;

    if body.status == PaymentStatus::Completed {
        let result = PaymentResult {
            id: body.transaction_id.unwrap_or_default(),
            status: body.status.to_string(),
            update_time: Utc::now().to_rfc3339(),
            email_address: user.email.clone(),
        };
        orders
            .mark_paid(order.id, &result)
            .await
            .map_err(|e| or_not_found(e, "Order not found"))?;
    }

    Ok((StatusCode::CREATED, Json(payment)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePaymentRequest {
    status: Option<PaymentStatus>,
    transaction_id: Option<String>,
}

/// `PUT /api/payments/{id}` - update a payment's status (admin). A move to
/// `Completed` marks the order paid if it is not already.
async fn update_payment_status(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<PaymentId>,
    Json(body): Json<UpdatePaymentRequest>,
) -> Result<Json<Payment>> {
    let repo = PaymentRepository::new(state.pool());
    let existing = repo
        .get(id)
        .await
        .map_err(|e| or_not_found(e, "Payment not found"))?;

    let status = body.status.unwrap_or(existing.status);
    let payment = repo
        .update_status(id, status, body.transaction_id.as_deref())
        .await
        .map_err(|e| or_not_found(e, "Payment not found"))?;

    if body.status == Some(PaymentStatus::Completed) {
        mark_order_paid_if_needed(&state, &payment).await?;
    }

    Ok(Json(payment))
}

/// Flip the payment's order to paid unless it already is.
async fn mark_order_paid_if_needed(state: &AppState, payment: &Payment) -> Result<()> {
    let orders = OrderRepository::new(state.pool());
    let order = orders
        .get(payment.order_id)
        .await
        .map_err(|e| or_not_found(e, "Order not found"))?;

    if !order.is_paid {
        let result = PaymentResult {
            id: payment
                .transaction_id
                .clone()
                .unwrap_or_else(|| "manual".to_owned()),
            status: payment.status.to_string(),
            update_time: Utc::now().to_rfc3339(),
            email_address: String::new(),
        };
        orders
            .mark_paid(order.id, &result)
            .await
            .map_err(|e| or_not_found(e, "Order not found"))?;
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageQuery {
    page_number: Option<i64>,
}

/// `GET /api/payments/admin` - all payments, paginated (admin).
async fn list_all_payments(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(query): Query<PageQuery>,
) -> Result<Json<PaymentPage>> {
    let page = PaymentRepository::new(state.pool())
        .list(query.page_number.unwrap_or(1))
        .await?;
    Ok(Json(page))
}
