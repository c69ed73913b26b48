//! Category domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use orchard_core::CategoryId;

/// A catalog category. Categories form a tree via `parent`; depth is not
/// enforced anywhere.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    /// Parent category, if any.
    #[serde(rename = "parent")]
    pub parent_id: Option<CategoryId>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
