//! Address book repository.

use sqlx::PgPool;

use orchard_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::Address;

/// New address fields for [`AddressRepository::create`].
#[derive(Debug, Clone)]
pub struct NewAddress<'a> {
    pub name: &'a str,
    pub address_line1: &'a str,
    pub address_line2: Option<&'a str>,
    pub city: &'a str,
    pub state: &'a str,
    pub postal_code: &'a str,
    pub country: &'a str,
    pub phone: &'a str,
    pub is_default: bool,
}

/// Partial update for [`AddressRepository::update`]. `None` keeps the
/// current value.
#[derive(Debug, Clone, Default)]
pub struct AddressChanges<'a> {
    pub name: Option<&'a str>,
    pub address_line1: Option<&'a str>,
    pub address_line2: Option<&'a str>,
    pub city: Option<&'a str>,
    pub state: Option<&'a str>,
    pub postal_code: Option<&'a str>,
    pub country: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub is_default: Option<bool>,
}

/// Repository for user address books.
///
/// The single-default invariant is kept at this layer: anything that sets a
/// default first clears every default the user has.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's addresses, default first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let addresses = sqlx::query_as::<_, Address>(
            "SELECT * FROM addresses WHERE user_id = $1
             ORDER BY is_default DESC, created_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(addresses)
    }

    /// Get an address by ID. Callers check ownership against the returned
    /// `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such address exists.
    pub async fn get(&self, id: AddressId) -> Result<Address, RepositoryError> {
        sqlx::query_as::<_, Address>("SELECT * FROM addresses WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Create an address. Creating a default clears any existing default
    /// first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    pub async fn create(
        &self,
        user_id: UserId,
        new: &NewAddress<'_>,
    ) -> Result<Address, RepositoryError> {
        if new.is_default {
            self.clear_defaults(user_id).await?;
        }

        let address = sqlx::query_as::<_, Address>(
            "INSERT INTO addresses (user_id, name, address_line1, address_line2, city,
                                    state, postal_code, country, phone, is_default)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING *",
        )
        .bind(user_id)
        .bind(new.name)
        .bind(new.address_line1)
        .bind(new.address_line2)
        .bind(new.city)
        .bind(new.state)
        .bind(new.postal_code)
        .bind(new.country)
        .bind(new.phone)
        .bind(new.is_default)
        .fetch_one(self.pool)
        .await?;

        Ok(address)
    }

    /// Apply a partial update. Promoting an address to default clears other
    /// defaults first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address does not exist or
    /// belongs to a different user.
    pub async fn update(
        &self,
        user_id: UserId,
        id: AddressId,
        changes: &AddressChanges<'_>,
    ) -> Result<Address, RepositoryError> {
        if promotes_to_default(changes.is_default) {
            self.clear_defaults(user_id).await?;
        }

        sqlx::query_as::<_, Address>(
            "UPDATE addresses SET
                name = COALESCE($3, name),
                address_line1 = COALESCE($4, address_line1),
                address_line2 = COALESCE($5, address_line2),
                city = COALESCE($6, city),
                state = COALESCE($7, state),
                postal_code = COALESCE($8, postal_code),
                country = COALESCE($9, country),
                phone = COALESCE($10, phone),
                is_default = COALESCE($11, is_default),
                updated_at = NOW()
             WHERE id = $1 AND user_id = $2
             RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .bind(changes.name)
        .bind(changes.address_line1)
        .bind(changes.address_line2)
        .bind(changes.city)
        .bind(changes.state)
        .bind(changes.postal_code)
        .bind(changes.country)
        .bind(changes.phone)
        .bind(changes.is_default)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete an address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address does not exist or
    /// belongs to a different user.
    pub async fn delete(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Make an address the user's single default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address does not exist or
    /// belongs to a different user.
    pub async fn set_default(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Address, RepositoryError> {
        self.clear_defaults(user_id).await?;

        sqlx::query_as::<_, Address>(SET_DEFAULT_SQL)
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn clear_defaults(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query(CLEAR_DEFAULTS_SQL)
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}

/// Whether a partial update must demote the user's current default before
/// the write. Only an explicit `true` does; `None` and `Some(false)` leave
/// the existing default alone.
const fn promotes_to_default(is_default: Option<bool>) -> bool {
    matches!(is_default, Some(true))
}

const CLEAR_DEFAULTS_SQL: &str =
    "UPDATE addresses SET is_default = FALSE WHERE user_id = $1 AND is_default";

const SET_DEFAULT_SQL: &str =
    "UPDATE addresses SET is_default = TRUE, updated_at = NOW()
     WHERE id = $1 AND user_id = $2
     RETURNING *";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_promotion_decision() {
        assert!(promotes_to_default(Some(true)));
        assert!(!promotes_to_default(Some(false)));
        assert!(!promotes_to_default(None));
    }

    #[test]
    fn test_set_default_single_winner() {
        // The demotion sweeps every default the user has; the promotion
        // targets exactly one row, scoped to the same user.
        assert!(CLEAR_DEFAULTS_SQL.contains("is_default = FALSE"));
        assert!(CLEAR_DEFAULTS_SQL.contains("user_id = $1"));
        assert!(SET_DEFAULT_SQL.contains("is_default = TRUE"));
        assert!(SET_DEFAULT_SQL.contains("id = $1 AND user_id = $2"));
    }
}
