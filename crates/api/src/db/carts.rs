//! Cart repository.
//!
//! Every mutation reloads the item rows, recomputes the derived totals with
//! [`CartTotals`] and writes them back, so the stored totals always match
//! the items as of the last save.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use orchard_core::{CartId, CartItemId, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Cart, CartItem, CartProduct, CartTotals};

/// Repository for per-user carts.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user's cart, creating an empty one on first access.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            "INSERT INTO carts (user_id) VALUES ($1)
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
             RETURNING *",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        self.assemble(row).await
    }

    /// Get a user's cart without creating one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no cart yet.
    pub async fn get(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>("SELECT * FROM carts WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        self.assemble(row).await
    }

    /// Add a product to a user's cart. If the product is already in the
    /// cart, its quantity is increased instead of adding a second line; a
    /// merged line keeps the snapshot price from the first add.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
        price: Decimal,
        attributes: &serde_json::Value,
    ) -> Result<Cart, RepositoryError> {
        let cart = self.get_or_create(user_id).await?;

        let existing = sqlx::query_scalar::<_, i32>(
            "SELECT id FROM cart_items WHERE cart_id = $1 AND product_id = $2",
        )
        .bind(cart.id)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;

        if let Some(item_id) = existing {
            sqlx::query(MERGE_ITEM_SQL)
                .bind(item_id)
                .bind(quantity)
                .execute(self.pool)
                .await?;
        } else {
            sqlx::query(
                "INSERT INTO cart_items (cart_id, product_id, quantity, price, attributes)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(cart.id)
            .bind(product_id)
            .bind(quantity)
            .bind(price)
            .bind(attributes)
            .execute(self.pool)
            .await?;
        }

        self.refresh(cart.id, user_id).await
    }

    /// Update an item's quantity and/or attributes. `None` keeps the
    /// current value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no cart or the
    /// item is not in it.
    pub async fn update_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: Option<i32>,
        attributes: Option<&serde_json::Value>,
    ) -> Result<Cart, RepositoryError> {
        let cart = self.get(user_id).await?;

        let result = sqlx::query(
            "UPDATE cart_items SET
                quantity = COALESCE($3, quantity),
                attributes = COALESCE($4, attributes)
             WHERE id = $1 AND cart_id = $2",
        )
        .bind(item_id)
        .bind(cart.id)
        .bind(quantity)
        .bind(attributes)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.refresh(cart.id, user_id).await
    }

    /// Remove an item from the cart. Removing an item that is not there is
    /// a no-op, not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no cart.
    pub async fn remove_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<Cart, RepositoryError> {
        let cart = self.get(user_id).await?;

        sqlx::query("DELETE FROM cart_items WHERE id = $1 AND cart_id = $2")
            .bind(item_id)
            .bind(cart.id)
            .execute(self.pool)
            .await?;

        self.refresh(cart.id, user_id).await
    }

    /// Remove every item from the cart and zero the totals.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user has no cart.
    pub async fn clear(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let cart = self.get(user_id).await?;

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart.id)
            .execute(self.pool)
            .await?;

        self.refresh(cart.id, user_id).await
    }

    /// Reload items, persist recomputed totals and return the full cart.
    async fn refresh(&self, cart_id: CartId, user_id: UserId) -> Result<Cart, RepositoryError> {
        let items = self.items(cart_id).await?;
        let totals = CartTotals::from_items(&items);

        let row = sqlx::query_as::<_, CartRow>(
            "UPDATE carts SET total_items = $2, total_price = $3, updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(cart_id)
        .bind(totals.total_items)
        .bind(totals.total_price)
        .fetch_one(self.pool)
        .await?;

        debug_assert_eq!(row.user_id, user_id);
        Ok(row.into_cart(items))
    }

    async fn assemble(&self, row: CartRow) -> Result<Cart, RepositoryError> {
        let items = self.items(row.id).await?;
        Ok(row.into_cart(items))
    }

    async fn items(&self, cart_id: CartId) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            "SELECT ci.id, ci.quantity, ci.price, ci.attributes, ci.created_at,
                    p.id AS product_id, p.name AS product_name, p.images AS product_images,
                    p.price AS product_price, p.count_in_stock AS product_count_in_stock
             FROM cart_items ci
             JOIN products p ON p.id = ci.product_id
             WHERE ci.cart_id = $1
             ORDER BY ci.created_at ASC",
        )
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(CartItemRow::into_item).collect())
    }
}

/// Merge statement for a product already in the cart. Only the quantity
/// moves; the line's snapshot price stays what it was on first add.
const MERGE_ITEM_SQL: &str =
    "UPDATE cart_items SET quantity = quantity + $2 WHERE id = $1";

#[derive(sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: UserId,
    total_items: i32,
    total_price: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CartRow {
    fn into_cart(self, items: Vec<CartItem>) -> Cart {
        Cart {
            id: self.id,
            user_id: self.user_id,
            items,
            total_items: self.total_items,
            total_price: self.total_price,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: CartItemId,
    quantity: i32,
    price: Decimal,
    attributes: serde_json::Value,
    created_at: DateTime<Utc>,
    product_id: ProductId,
    product_name: String,
    product_images: Vec<String>,
    product_price: Decimal,
    product_count_in_stock: i32,
}

impl CartItemRow {
    fn into_item(self) -> CartItem {
        CartItem {
            id: self.id,
            product: CartProduct {
                id: self.product_id,
                name: self.product_name,
                images: self.product_images,
                price: self.product_price,
                count_in_stock: self.product_count_in_stock,
            },
            quantity: self.quantity,
            price: self.price,
            attributes: self.attributes,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_first_add_price() {
        assert!(MERGE_ITEM_SQL.contains("quantity = quantity + $2"));
        assert!(!MERGE_ITEM_SQL.contains("price"));
    }
}
