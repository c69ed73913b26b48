//! Cart domain types and the derived-totals computation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use orchard_core::{CartId, CartItemId, ProductId, UserId};

/// Product summary embedded in cart items, mirroring what the client needs
/// to render a cart row without a second fetch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartProduct {
    pub id: ProductId,
    pub name: String,
    pub images: Vec<String>,
    /// Current catalog price. May differ from the snapshot price on the item.
    pub price: Decimal,
    pub count_in_stock: i32,
}

/// One line in a cart.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub product: CartProduct,
    pub quantity: i32,
    /// Unit price snapshot taken when the item was added.
    pub price: Decimal,
    pub attributes: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// A user's cart with derived totals.
///
/// Invariant: `total_items` / `total_price` equal the sums over `items` as of
/// the last save. They are not recomputed from live product prices.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: CartId,
    #[serde(rename = "user")]
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    pub total_items: i32,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Derived cart totals: `total_items = Σ quantity`,
/// `total_price = Σ price × quantity` over the current item list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartTotals {
    pub total_items: i32,
    pub total_price: Decimal,
}

impl CartTotals {
    /// Compute totals over `(quantity, unit price)` pairs.
    #[must_use]
    pub fn from_lines<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = (i32, Decimal)>,
    {
        let mut total_items = 0;
        let mut total_price = Decimal::ZERO;
        for (quantity, price) in lines {
            total_items += quantity;
            total_price += price * Decimal::from(quantity);
        }
        Self {
            total_items,
            total_price,
        }
    }

    /// Compute totals over cart items.
    #[must_use]
    pub fn from_items(items: &[CartItem]) -> Self {
        Self::from_lines(items.iter().map(|item| (item.quantity, item.price)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_totals_empty() {
        let totals = CartTotals::from_lines(Vec::new());
        assert_eq!(totals.total_items, 0);
        assert_eq!(totals.total_price, Decimal::ZERO);
    }

    #[test]
    fn test_totals_sum_quantities_and_line_prices() {
        let totals = CartTotals::from_lines(vec![(2, dec("10.00")), (1, dec("5.00"))]);
        assert_eq!(totals.total_items, 3);
        assert_eq!(totals.total_price, dec("25.00"));
    }

    #[test]
    fn test_totals_use_snapshot_price_per_line() {
        // The same product at different snapshot prices contributes each
        // line independently.
        let totals = CartTotals::from_lines(vec![(1, dec("9.99")), (3, dec("8.50"))]);
        assert_eq!(totals.total_items, 4);
        assert_eq!(totals.total_price, dec("35.49"));
    }
}
