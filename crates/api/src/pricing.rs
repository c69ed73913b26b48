//! Order pricing.
//!
//! Totals are computed server-side from the submitted items at checkout;
//! client-sent numbers are ignored. Tax is a flat 15%, shipping is free for
//! orders over 100 and a flat 10 otherwise.

use rust_decimal::{Decimal, RoundingStrategy};

/// Tax rate applied to the items subtotal.
const TAX_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 2); // 0.15

/// Orders with a subtotal above this ship for free.
const FREE_SHIPPING_OVER: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Flat shipping charge below the free-shipping threshold.
const FLAT_SHIPPING: Decimal = Decimal::from_parts(10, 0, 0, false, 0);

/// The price breakdown of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub items_price: Decimal,
    pub tax_price: Decimal,
    pub shipping_price: Decimal,
    pub total_price: Decimal,
}

impl OrderTotals {
    /// Compute order totals from `(unit price, quantity)` pairs.
    ///
    /// Tax is rounded to two decimal places, half away from zero, matching
    /// how the storefront client displays it.
    #[must_use]
    pub fn compute<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = (Decimal, i32)>,
    {
        let items_price: Decimal = lines
            .into_iter()
            .map(|(price, quantity)| price * Decimal::from(quantity))
            .sum();

        let tax_price = (items_price * TAX_RATE)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let shipping_price = if items_price > FREE_SHIPPING_OVER {
            Decimal::ZERO
        } else {
            FLAT_SHIPPING
        };
        let total_price = items_price + tax_price + shipping_price;

        Self {
            items_price,
            tax_price,
            shipping_price,
            total_price,
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
    fn test_totals_breakdown() {
        // [{price: 10, qty: 2}, {price: 5, qty: 1}] => items 25,
        // shipping 10, tax 3.75, total 38.75
        let totals = OrderTotals::compute(vec![(dec("10"), 2), (dec("5"), 1)]);
        assert_eq!(totals.items_price, dec("25"));
        assert_eq!(totals.shipping_price, dec("10"));
        assert_eq!(totals.tax_price, dec("3.75"));
        assert_eq!(totals.total_price, dec("38.75"));
    }

    #[test]
    fn test_free_shipping_over_threshold() {
        let totals = OrderTotals::compute(vec![(dec("50.50"), 2)]);
        assert_eq!(totals.items_price, dec("101.00"));
        assert_eq!(totals.shipping_price, Decimal::ZERO);
        assert_eq!(totals.tax_price, dec("15.15"));
        assert_eq!(totals.total_price, dec("116.15"));
    }

    #[test]
    fn test_exactly_at_threshold_still_pays_shipping() {
        let totals = OrderTotals::compute(vec![(dec("100"), 1)]);
        assert_eq!(totals.shipping_price, dec("10"));
    }

    #[test]
    fn test_empty_order() {
        let totals = OrderTotals::compute(Vec::new());
        assert_eq!(totals.items_price, Decimal::ZERO);
        assert_eq!(totals.tax_price, Decimal::ZERO);
        assert_eq!(totals.shipping_price, dec("10"));
        assert_eq!(totals.total_price, dec("10"));
    }

    #[test]
    fn test_tax_rounding_half_away_from_zero() {
        // 0.15 * 0.1 = 0.015 -> 0.02
        let totals = OrderTotals::compute(vec![(dec("0.10"), 1)]);
        assert_eq!(totals.tax_price, dec("0.02"));
    }
}
