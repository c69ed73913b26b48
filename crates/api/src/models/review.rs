//! Review domain types and the rating aggregation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use orchard_core::{ProductId, ReviewId, UserId};

/// A product review. Unique per (user, product), enforced by the database.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    #[serde(rename = "user")]
    pub user_id: UserId,
    #[serde(rename = "product")]
    pub product_id: ProductId,
    /// 1 to 5 inclusive.
    pub rating: i32,
    pub title: String,
    pub comment: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Derived product rating: the arithmetic mean of all review ratings plus
/// the review count. Recomputed in full on every review mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingSummary {
    pub rating: Decimal,
    pub num_reviews: i32,
}

impl RatingSummary {
    /// Aggregate a product's review ratings.
    ///
    /// Zero reviews resets both fields to 0. The mean is rounded to two
    /// decimal places.
    #[must_use]
    pub fn of(ratings: &[i32]) -> Self {
        if ratings.is_empty() {
            return Self {
                rating: Decimal::ZERO,
                num_reviews: 0,
            };
        }

        let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
        let mean = Decimal::from(sum) / Decimal::from(ratings.len() as u64);

        Self {
            rating: mean.round_dp(2),
            num_reviews: i32::try_from(ratings.len()).unwrap_or(i32::MAX),
        }
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
    fn test_empty_resets_to_zero() {
        let summary = RatingSummary::of(&[]);
        assert_eq!(summary.rating, Decimal::ZERO);
        assert_eq!(summary.num_reviews, 0);
    }

    #[test]
    fn test_single_review() {
        let summary = RatingSummary::of(&[4]);
        assert_eq!(summary.rating, dec("4"));
        assert_eq!(summary.num_reviews, 1);
    }

    #[test]
    fn test_mean_of_several() {
        let summary = RatingSummary::of(&[5, 4, 3]);
        assert_eq!(summary.rating, dec("4"));
        assert_eq!(summary.num_reviews, 3);
    }

    #[test]
    fn test_mean_rounded_to_two_places() {
        // (5 + 4 + 4) / 3 = 4.333...
        let summary = RatingSummary::of(&[5, 4, 4]);
        assert_eq!(summary.rating, dec("4.33"));
    }
}
