//! Category repository.

use sqlx::PgPool;

use orchard_core::{CategoryId, Slug};

use super::{RepositoryError, conflict_on_unique};
use crate::models::Category;

/// Repository for catalog categories.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all categories, name ascending.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name ASC")
                .fetch_all(self.pool)
                .await?;

        Ok(categories)
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such category exists.
    pub async fn get(&self, id: CategoryId) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Create a category. The slug is derived from the name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a category with the same name
    /// already exists, or `RepositoryError::NotFound` if `parent_id` does
    /// not reference an existing category.
    pub async fn create(
        &self,
        name: &str,
        slug: &Slug,
        description: Option<&str>,
        image: Option<&str>,
        parent_id: Option<CategoryId>,
    ) -> Result<Category, RepositoryError> {
        if let Some(parent) = parent_id {
            self.get(parent).await?;
        }

        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, slug, description, image, parent_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(name)
        .bind(slug.as_str())
        .bind(description)
        .bind(image)
        .bind(parent_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "category name already exists"))?;

        Ok(category)
    }

    /// Update a category. `None` fields keep their current value; a new name
    /// also rewrites the slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such category exists, or
    /// `RepositoryError::Conflict` on a name collision.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: CategoryId,
        name: Option<&str>,
        slug: Option<&Slug>,
        description: Option<&str>,
        image: Option<&str>,
        parent_id: Option<CategoryId>,
        is_active: Option<bool>,
    ) -> Result<Category, RepositoryError> {
        if let Some(parent) = parent_id {
            self.get(parent).await?;
        }

        sqlx::query_as::<_, Category>(
            "UPDATE categories SET
                name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                image = COALESCE($5, image),
                parent_id = COALESCE($6, parent_id),
                is_active = COALESCE($7, is_active),
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(slug.map(Slug::as_str))
        .bind(description)
        .bind(image)
        .bind(parent_id)
        .bind(is_active)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "category name already exists"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a category. Child categories have their parent cleared by the
    /// schema; the delete fails while products still reference the category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such category exists.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
