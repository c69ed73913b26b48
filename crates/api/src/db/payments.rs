//! Payment repository.

use rust_decimal::Decimal;
use sqlx::PgPool;

use orchard_core::{OrderId, PaymentId, PaymentStatus, UserId};

use super::RepositoryError;
use crate::models::{Payment, PaymentPage};

/// Repository for payment records.
pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    /// Create a new payment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's payments, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Payment>, RepositoryError> {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(payments)
    }

    /// List all payments one page at a time, newest first. `page` is
    /// 1-based.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    pub async fn list(&self, page: i64) -> Result<PaymentPage, RepositoryError> {
        let page = page.max(1);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments")
            .fetch_one(self.pool)
            .await?;

        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(PAGE_SIZE)
        .bind((page - 1) * PAGE_SIZE)
        .fetch_all(self.pool)
        .await?;

        Ok(PaymentPage {
            payments,
            page,
            pages: count.cast_unsigned().div_ceil(PAGE_SIZE.cast_unsigned()).cast_signed(),
        })
    }

    /// Get a payment by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such payment exists.
    pub async fn get(&self, id: PaymentId) -> Result<Payment, RepositoryError> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Record a payment attempt against an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        user_id: UserId,
        order_id: OrderId,
        payment_method: &str,
        amount: Decimal,
        currency: &str,
        status: PaymentStatus,
        transaction_id: Option<&str>,
        payment_details: Option<&serde_json::Value>,
    ) -> Result<Payment, RepositoryError> {
        let payment = sqlx::query_as::<_, Payment>(
            "INSERT INTO payments (user_id, order_id, payment_method, amount,
                                   currency, status, transaction_id, payment_details)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(user_id)
        .bind(order_id)
        .bind(payment_method)
        .bind(amount)
        .bind(currency)
        .bind(status)
        .bind(transaction_id)
        .bind(payment_details)
        .fetch_one(self.pool)
        .await?;

        Ok(payment)
    }

    /// Update a payment's status, optionally attaching a transaction ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such payment exists.
    pub async fn update_status(
        &self,
        id: PaymentId,
        status: PaymentStatus,
        transaction_id: Option<&str>,
    ) -> Result<Payment, RepositoryError> {
        sqlx::query_as::<_, Payment>(
            "UPDATE payments SET
                status = $2,
                transaction_id = COALESCE($3, transaction_id),
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(status)
        .bind(transaction_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }
}

const PAGE_SIZE: i64 = 10;
