//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are Turkish lira amounts. Stored payloads may carry them as JSON
//! numbers or numeric strings; both decode to the same [`Price`].

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price in the storefront currency (TL).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// A zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Get the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units at this unit price.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<u32> for Price {
    fn from(amount: u32) -> Self {
        Self(Decimal::from(amount))
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} TL", self.0.normalize())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_times_and_sum() {
        let lines = [Price::from(100).times(2), Price::from(15).times(3)];
        let total: Price = lines.into_iter().sum();
        assert_eq!(total, Price::from(245));
    }

    #[test]
    fn test_decode_number_or_string() {
        let from_number: Price = serde_json::from_str("19.90").unwrap();
        let from_text: Price = serde_json::from_str("\"19.90\"").unwrap();
        assert_eq!(from_number, from_text);
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::from(200).to_string(), "200 TL");
        assert_eq!(Price::new(Decimal::new(1250, 2)).to_string(), "12.5 TL");
    }
}
