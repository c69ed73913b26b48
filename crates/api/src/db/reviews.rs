//! Review repository.
//!
//! Reviews are unique per (product, user); the database enforces it and the
//! insert surfaces it as `Conflict`. Callers recompute the owning product's
//! rating aggregate after every mutation via [`ratings_for_product`].
//!
//! [`ratings_for_product`]: ReviewRepository::ratings_for_product

use sqlx::PgPool;

use orchard_core::{ProductId, ReviewId, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::Review;

/// Repository for product reviews.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List reviews, optionally filtered by product and/or author, newest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    pub async fn list(
        &self,
        product_id: Option<ProductId>,
        user_id: Option<UserId>,
    ) -> Result<Vec<Review>, RepositoryError> {
        let reviews = sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews
             WHERE ($1::INTEGER IS NULL OR product_id = $1)
               AND ($2::INTEGER IS NULL OR user_id = $2)
             ORDER BY created_at DESC",
        )
        .bind(product_id)
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(reviews)
    }

    /// Get a review by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such review exists.
    pub async fn get(&self, id: ReviewId) -> Result<Review, RepositoryError> {
        sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Create a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if this user already reviewed the
    /// product.
    pub async fn create(
        &self,
        user_id: UserId,
        product_id: ProductId,
        rating: i32,
        title: &str,
        comment: &str,
    ) -> Result<Review, RepositoryError> {
        let review = sqlx::query_as::<_, Review>(
            "INSERT INTO reviews (user_id, product_id, rating, title, comment)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(rating)
        .bind(title)
        .bind(comment)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "product already reviewed"))?;

        Ok(review)
    }

    /// Update a review's rating, title or comment. `None` keeps the current
    /// value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such review exists.
    pub async fn update(
        &self,
        id: ReviewId,
        rating: Option<i32>,
        title: Option<&str>,
        comment: Option<&str>,
    ) -> Result<Review, RepositoryError> {
        sqlx::query_as::<_, Review>(
            "UPDATE reviews SET
                rating = COALESCE($2, rating),
                title = COALESCE($3, title),
                comment = COALESCE($4, comment),
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(rating)
        .bind(title)
        .bind(comment)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such review exists.
    pub async fn delete(&self, id: ReviewId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Mark a review approved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such review exists.
    pub async fn approve(&self, id: ReviewId) -> Result<Review, RepositoryError> {
        sqlx::query_as::<_, Review>(
            "UPDATE reviews SET is_approved = TRUE, updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// All ratings for a product, for recomputing its aggregate.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    pub async fn ratings_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<i32>, RepositoryError> {
        let ratings = sqlx::query_scalar::<_, i32>(
            "SELECT rating FROM reviews WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(ratings)
    }
}
