//! Product domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use orchard_core::{CategoryId, ProductId};

/// A catalog product.
///
/// `rating` and `num_reviews` are derived from the reviews table and
/// rewritten whenever a review changes; they are never computed on read.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub rich_description: Option<String>,
    pub images: Vec<String>,
    pub brand: Option<String>,
    pub price: Decimal,
    /// Owning category.
    #[serde(rename = "category")]
    pub category_id: CategoryId,
    pub count_in_stock: i32,
    /// Mean of all review ratings, 0 when unreviewed.
    pub rating: Decimal,
    pub num_reviews: i32,
    pub is_featured: bool,
    pub is_active: bool,
    /// Free-form attribute map (size, color, ...).
    pub attributes: serde_json::Value,
    pub discount_price: Decimal,
    pub discount_percentage: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One page of a filtered product listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub products: Vec<Product>,
    /// 1-based page number.
    pub page: i64,
    /// Total number of pages.
    pub pages: i64,
    /// Total number of matching products.
    pub count: i64,
}

impl ProductPage {
    /// Page size used across all paginated listings.
    pub const PAGE_SIZE: i64 = 10;

    /// Assemble a page, computing `pages` from the total count.
    #[must_use]
    pub fn new(products: Vec<Product>, page: i64, count: i64) -> Self {
        Self {
            products,
            page,
            pages: count
                .cast_unsigned()
                .div_ceil(Self::PAGE_SIZE.cast_unsigned())
                .cast_signed(),
            count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count_rounds_up() {
        assert_eq!(ProductPage::new(Vec::new(), 1, 0).pages, 0);
        assert_eq!(ProductPage::new(Vec::new(), 1, 10).pages, 1);
        assert_eq!(ProductPage::new(Vec::new(), 1, 11).pages, 2);
        assert_eq!(ProductPage::new(Vec::new(), 2, 25).pages, 3);
    }
}
