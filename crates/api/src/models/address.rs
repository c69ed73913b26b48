//! Address domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use orchard_core::{AddressId, UserId};

/// A shipping/billing address in a user's address book.
///
/// Invariant: at most one address per user has `is_default` set. The flip is
/// a clear-all-then-set-one sequence; a crash in between leaves zero
/// defaults, which callers treat as "no default".
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    #[serde(rename = "user")]
    pub user_id: UserId,
    /// Recipient name.
    pub name: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
