//! Payment domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use orchard_core::{OrderId, PaymentId, PaymentStatus, UserId};

/// A recorded payment attempt against an order.
///
/// Completing a payment also flips the referenced order's paid flag; both
/// the order-pay endpoint and the payment endpoints route that through the
/// same `OrderRepository::mark_paid`.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    #[serde(rename = "user")]
    pub user_id: UserId,
    #[serde(rename = "order")]
    pub order_id: OrderId,
    pub payment_method: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub payment_details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One page of the admin payment listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPage {
    pub payments: Vec<Payment>,
    pub page: i64,
    pub pages: i64,
}
