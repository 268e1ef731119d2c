//! Type-safe price representation using decimal arithmetic.
//!
//! The backend stores prices as `numeric` columns and returns them as JSON
//! numbers. They are decoded into [`Decimal`] so cart totals are summed
//! without floating point drift.

use std::iter::Sum;
use std::ops::{Add, Mul};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A USD price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal dollar amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from an integer number of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The dollar amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whole dollars, rounded down. Used for loyalty accrual (1 point per dollar).
    #[must_use]
    pub fn whole_dollars(&self) -> i64 {
        self.0.trunc().to_i64().unwrap_or(0)
    }

    /// Format for display, e.g. `$4.50`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("${:.2}", self.0.round_dp(2))
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self::Output {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pads_cents() {
        assert_eq!(Price::from_cents(450).display(), "$4.50");
        assert_eq!(Price::from_cents(5).display(), "$0.05");
        assert_eq!(Price::ZERO.to_string(), "$0.00");
    }

    #[test]
    fn test_line_totals_sum_exactly() {
        let total: Price = [Price::from_cents(425) * 3, Price::from_cents(110) * 1]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_cents(1385));
    }

    #[test]
    fn test_whole_dollars_truncates() {
        assert_eq!(Price::from_cents(1999).whole_dollars(), 19);
        assert_eq!(Price::from_cents(99).whole_dollars(), 0);
    }

    #[test]
    fn test_deserializes_json_number() {
        let price: Price = serde_json::from_str("4.75").unwrap();
        assert_eq!(price, Price::from_cents(475));
    }
}
