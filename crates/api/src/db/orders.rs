//! Order repository.
//!
//! Order creation writes the order row and its item snapshots in one
//! transaction. Everything after creation only flips flags or status; the
//! snapshot itself never changes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use orchard_core::{AddressId, OrderId, OrderStatus, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Order, OrderItem, OrderPage, PaymentResult};
use crate::pricing::OrderTotals;

/// One checkout line before it becomes a row.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub image: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
}

/// New order fields for [`OrderRepository::create`].
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub user_id: UserId,
    pub items: &'a [NewOrderItem],
    pub shipping_address_id: AddressId,
    pub billing_address_id: AddressId,
    pub payment_method: &'a str,
    pub totals: OrderTotals,
}

/// Repository for orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create an order and its item snapshots.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure; the transaction
    /// rolls back and no partial order is left behind.
    pub async fn create(&self, new: &NewOrder<'_>) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(
            "INSERT INTO orders (user_id, shipping_address_id, billing_address_id,
                                 payment_method, items_price, tax_price,
                                 shipping_price, total_price)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(new.user_id)
        .bind(new.shipping_address_id)
        .bind(new.billing_address_id)
        .bind(new.payment_method)
        .bind(new.totals.items_price)
        .bind(new.totals.tax_price)
        .bind(new.totals.shipping_price)
        .bind(new.totals.total_price)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(new.items.len());
        for item in new.items {
            let saved = sqlx::query_as::<_, OrderItem>(
                "INSERT INTO order_items (order_id, product_id, name, image, price, quantity)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 RETURNING id, product_id, name, image, price, quantity",
            )
            .bind(row.id)
            .bind(item.product_id)
            .bind(&item.name)
            .bind(item.image.as_deref())
            .bind(item.price)
            .bind(item.quantity)
            .fetch_one(&mut *tx)
            .await?;
            items.push(saved);
        }

        tx.commit().await?;

        Ok(row.into_order(items))
    }

    /// Get an order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such order exists.
    pub async fn get(&self, id: OrderId) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let items = self.items(id).await?;
        Ok(row.into_order(items))
    }

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        self.with_items(rows).await
    }

    /// List all orders one page at a time, newest first. `page` is 1-based.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    pub async fn list(&self, page: i64) -> Result<OrderPage, RepositoryError> {
        let page = page.max(1);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(self.pool)
            .await?;

        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT * FROM orders ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(PAGE_SIZE)
        .bind((page - 1) * PAGE_SIZE)
        .fetch_all(self.pool)
        .await?;

        let orders = self.with_items(rows).await?;
        Ok(OrderPage {
            orders,
            page,
            pages: count.cast_unsigned().div_ceil(PAGE_SIZE.cast_unsigned()).cast_signed(),
        })
    }

    /// Mark an order paid, recording the gateway result. Both the order-pay
    /// endpoint and completed payments funnel through here.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such order exists.
    pub async fn mark_paid(
        &self,
        id: OrderId,
        result: &PaymentResult,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            "UPDATE orders SET
                is_paid = TRUE,
                paid_at = NOW(),
                payment_result_id = $2,
                payment_result_status = $3,
                payment_result_update_time = $4,
                payment_result_email = $5,
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&result.id)
        .bind(&result.status)
        .bind(&result.update_time)
        .bind(&result.email_address)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let items = self.items(id).await?;
        Ok(row.into_order(items))
    }

    /// Mark an order delivered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such order exists.
    pub async fn mark_delivered(&self, id: OrderId) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            "UPDATE orders SET
                is_delivered = TRUE,
                delivered_at = NOW(),
                status = 'Delivered',
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let items = self.items(id).await?;
        Ok(row.into_order(items))
    }

    /// Admin status update. Moving to `Delivered` also sets the delivered
    /// flag and timestamp. `None` fields keep their current value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such order exists.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: Option<OrderStatus>,
        tracking_number: Option<&str>,
        notes: Option<&str>,
    ) -> Result<Order, RepositoryError> {
        let delivered = status == Some(OrderStatus::Delivered);

        let row = sqlx::query_as::<_, OrderRow>(
            "UPDATE orders SET
                status = COALESCE($2, status),
                tracking_number = COALESCE($3, tracking_number),
                notes = COALESCE($4, notes),
                is_delivered = is_delivered OR $5,
                delivered_at = CASE WHEN $5 AND delivered_at IS NULL THEN NOW()
                               ELSE delivered_at END,
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(status.map(|s| s.as_str()))
        .bind(tracking_number)
        .bind(notes)
        .bind(delivered)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let items = self.items(id).await?;
        Ok(row.into_order(items))
    }

    async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT id, product_id, name, image, price, quantity
             FROM order_items WHERE order_id = $1 ORDER BY id ASC",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    async fn with_items(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.items(row.id).await?;
            orders.push(row.into_order(items));
        }
        Ok(orders)
    }
}

const PAGE_SIZE: i64 = 10;

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    shipping_address_id: AddressId,
    billing_address_id: AddressId,
    payment_method: String,
    items_price: Decimal,
    tax_price: Decimal,
    shipping_price: Decimal,
    total_price: Decimal,
    is_paid: bool,
    paid_at: Option<DateTime<Utc>>,
    is_delivered: bool,
    delivered_at: Option<DateTime<Utc>>,
    status: OrderStatus,
    tracking_number: Option<String>,
    notes: Option<String>,
    payment_result_id: Option<String>,
    payment_result_status: Option<String>,
    payment_result_update_time: Option<String>,
    payment_result_email: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, order_items: Vec<OrderItem>) -> Order {
        let payment_result = self.payment_result_id.map(|id| PaymentResult {
            id,
            status: self.payment_result_status.unwrap_or_default(),
            update_time: self.payment_result_update_time.unwrap_or_default(),
            email_address: self.payment_result_email.unwrap_or_default(),
        });

        Order {
            id: self.id,
            user_id: self.user_id,
            order_items,
            shipping_address_id: self.shipping_address_id,
            billing_address_id: self.billing_address_id,
            payment_method: self.payment_method,
            items_price: self.items_price,
            tax_price: self.tax_price,
            shipping_price: self.shipping_price,
            total_price: self.total_price,
            is_paid: self.is_paid,
            paid_at: self.paid_at,
            is_delivered: self.is_delivered,
            delivered_at: self.delivered_at,
            status: self.status,
            tracking_number: self.tracking_number,
            notes: self.notes,
            payment_result,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
