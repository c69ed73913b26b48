//! Product repository.
//!
//! Listing builds its WHERE clause dynamically with [`sqlx::QueryBuilder`];
//! the same filter feeds both the page query and the count query so the two
//! can never disagree.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use orchard_core::{CategoryId, ProductId, Slug};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{Product, ProductPage, RatingSummary};

/// Sort key for product listings. Anything outside this whitelist falls back
/// to newest-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    Price,
    Rating,
    Name,
    #[default]
    CreatedAt,
}

impl ProductSort {
    /// Parse a client-supplied sort key.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "price" => Self::Price,
            "rating" => Self::Rating,
            "name" => Self::Name,
            _ => Self::CreatedAt,
        }
    }

    const fn column(self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Rating => "rating",
            Self::Name => "name",
            Self::CreatedAt => "created_at",
        }
    }
}

/// Sort direction for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Parse a client-supplied sort direction.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }

    const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Filter for the paginated product listing. All fields are optional; an
/// empty filter lists everything.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Substring match against name and description, case-insensitive.
    pub keyword: Option<String>,
    pub category: Option<CategoryId>,
    pub brand: Option<String>,
    /// Inclusive lower price bound.
    pub price_min: Option<Decimal>,
    /// Inclusive upper price bound.
    pub price_max: Option<Decimal>,
    pub sort_by: ProductSort,
    pub sort_order: SortOrder,
}

/// New product fields for [`ProductRepository::create`].
#[derive(Debug, Clone)]
pub struct NewProduct<'a> {
    pub name: &'a str,
    pub slug: &'a Slug,
    pub description: &'a str,
    pub rich_description: Option<&'a str>,
    pub images: &'a [String],
    pub brand: Option<&'a str>,
    pub price: Decimal,
    pub category_id: CategoryId,
    pub count_in_stock: i32,
    pub is_featured: bool,
    pub attributes: &'a serde_json::Value,
}

/// Partial update for [`ProductRepository::update`]. `None` keeps the
/// current value.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges<'a> {
    pub name: Option<&'a str>,
    pub slug: Option<&'a Slug>,
    pub description: Option<&'a str>,
    pub rich_description: Option<&'a str>,
    pub images: Option<&'a [String]>,
    pub brand: Option<&'a str>,
    pub price: Option<Decimal>,
    pub category_id: Option<CategoryId>,
    pub count_in_stock: Option<i32>,
    pub is_featured: Option<bool>,
    pub is_active: Option<bool>,
    pub attributes: Option<&'a serde_json::Value>,
    pub discount_price: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
}

/// Repository for catalog products.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching `filter`, one fixed-size page at a time.
    /// `page` is 1-based.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        page: i64,
    ) -> Result<ProductPage, RepositoryError> {
        let page = page.max(1);

        let mut count_query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM products");
        apply_filter(&mut count_query, filter);
        let count: i64 = count_query.build_query_scalar().fetch_one(self.pool).await?;

        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM products");
        apply_filter(&mut query, filter);
        query.push(format!(
            " ORDER BY {} {}",
            filter.sort_by.column(),
            filter.sort_order.keyword()
        ));
        query.push(" LIMIT ");
        query.push_bind(ProductPage::PAGE_SIZE);
        query.push(" OFFSET ");
        query.push_bind((page - 1) * ProductPage::PAGE_SIZE);

        let products = query.build_query_as::<Product>().fetch_all(self.pool).await?;

        Ok(ProductPage::new(products, page, count))
    }

    /// Top rated products, best first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    pub async fn top(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let products =
            sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY rating DESC LIMIT $1")
                .bind(limit)
                .fetch_all(self.pool)
                .await?;

        Ok(products)
    }

    /// Featured products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    pub async fn featured(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE is_featured ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such product exists.
    pub async fn get(&self, id: ProductId) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a product with the same slug
    /// already exists.
    pub async fn create(&self, new: &NewProduct<'_>) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            "INSERT INTO products (name, slug, description, rich_description, images,
                                   brand, price, category_id, count_in_stock,
                                   is_featured, attributes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING *",
        )
        .bind(new.name)
        .bind(new.slug.as_str())
        .bind(new.description)
        .bind(new.rich_description)
        .bind(new.images)
        .bind(new.brand)
        .bind(new.price)
        .bind(new.category_id)
        .bind(new.count_in_stock)
        .bind(new.is_featured)
        .bind(new.attributes)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "product name already exists"))?;

        Ok(product)
    }

    /// Apply a partial update to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such product exists, or
    /// `RepositoryError::Conflict` on a slug collision.
    pub async fn update(
        &self,
        id: ProductId,
        changes: &ProductChanges<'_>,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(
            "UPDATE products SET
                name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                rich_description = COALESCE($5, rich_description),
                images = COALESCE($6, images),
                brand = COALESCE($7, brand),
                price = COALESCE($8, price),
                category_id = COALESCE($9, category_id),
                count_in_stock = COALESCE($10, count_in_stock),
                is_featured = COALESCE($11, is_featured),
                is_active = COALESCE($12, is_active),
                attributes = COALESCE($13, attributes),
                discount_price = COALESCE($14, discount_price),
                discount_percentage = COALESCE($15, discount_percentage),
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.slug.map(Slug::as_str))
        .bind(changes.description)
        .bind(changes.rich_description)
        .bind(changes.images)
        .bind(changes.brand)
        .bind(changes.price)
        .bind(changes.category_id)
        .bind(changes.count_in_stock)
        .bind(changes.is_featured)
        .bind(changes.is_active)
        .bind(changes.attributes)
        .bind(changes.discount_price)
        .bind(changes.discount_percentage)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "product name already exists"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such product exists.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Decrement stock after an order line is placed. Oversell drives the
    /// count negative; nothing corrects it after the fact.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such product exists.
    pub async fn decrement_stock(
        &self,
        id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(DECREMENT_STOCK_SQL)
            .bind(id)
            .bind(quantity)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Overwrite a product's derived rating fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such product exists.
    pub async fn set_rating(
        &self,
        id: ProductId,
        summary: RatingSummary,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE products SET rating = $2, num_reviews = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(summary.rating)
        .bind(summary.num_reviews)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

const DECREMENT_STOCK_SQL: &str =
    "UPDATE products
     SET count_in_stock = count_in_stock - $2, updated_at = NOW()
     WHERE id = $1";

/// Append the WHERE clause for `filter` to a query.
fn apply_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    query.push(" WHERE TRUE");

    if let Some(keyword) = &filter.keyword {
        let pattern = format!("%{keyword}%");
        query.push(" AND (name ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR description ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
    if let Some(category) = filter.category {
        query.push(" AND category_id = ");
        query.push_bind(category);
    }
    if let Some(brand) = &filter.brand {
        query.push(" AND brand = ");
        query.push_bind(brand.clone());
    }
    if let Some(min) = filter.price_min {
        query.push(" AND price >= ");
        query.push_bind(min);
    }
    if let Some(max) = filter.price_max {
        query.push(" AND price <= ");
        query.push_bind(max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_whitelist() {
        assert_eq!(ProductSort::parse("price"), ProductSort::Price);
        assert_eq!(ProductSort::parse("rating"), ProductSort::Rating);
        assert_eq!(ProductSort::parse("name"), ProductSort::Name);
        assert_eq!(ProductSort::parse("createdAt"), ProductSort::CreatedAt);
        // Unknown keys fall back instead of reaching the SQL string.
        assert_eq!(
            ProductSort::parse("price; DROP TABLE products"),
            ProductSort::CreatedAt
        );
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(SortOrder::parse("asc"), SortOrder::Asc);
        assert_eq!(SortOrder::parse("ASC"), SortOrder::Asc);
        assert_eq!(SortOrder::parse("desc"), SortOrder::Desc);
        assert_eq!(SortOrder::parse("anything"), SortOrder::Desc);
    }

    fn filter_sql(filter: &ProductFilter) -> String {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM products");
        apply_filter(&mut query, filter);
        query.sql().to_owned()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert_eq!(
            filter_sql(&ProductFilter::default()),
            "SELECT * FROM products WHERE TRUE"
        );
    }

    #[test]
    fn test_price_bounds_inclusive() {
        let filter = ProductFilter {
            price_min: Some(Decimal::new(10, 0)),
            price_max: Some(Decimal::new(50, 0)),
            ..ProductFilter::default()
        };
        let sql = filter_sql(&filter);
        // A product priced exactly at either bound matches.
        assert!(sql.contains("price >= $1"));
        assert!(sql.contains("price <= $2"));
        assert!(!sql.contains("price > $"));
        assert!(!sql.contains("price < $"));
    }

    #[test]
    fn test_lone_price_bound() {
        let filter = ProductFilter {
            price_max: Some(Decimal::new(25, 0)),
            ..ProductFilter::default()
        };
        assert_eq!(
            filter_sql(&filter),
            "SELECT * FROM products WHERE TRUE AND price <= $1"
        );
    }

    #[test]
    fn test_keyword_binds_both_columns() {
        let filter = ProductFilter {
            keyword: Some("apple".to_owned()),
            ..ProductFilter::default()
        };
        let sql = filter_sql(&filter);
        assert!(sql.contains("name ILIKE $1"));
        assert!(sql.contains("description ILIKE $2"));
    }

    #[test]
    fn test_decrement_allows_negative_stock() {
        assert!(DECREMENT_STOCK_SQL.contains("count_in_stock - $2"));
        assert!(!DECREMENT_STOCK_SQL.contains("GREATEST"));
    }
}
