//! Payment-token amounts.
//!
//! Amounts are whole base units of the payment token. The marketplace never
//! divides or scales prices, so there is no decimal representation here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

/// An amount of payment tokens, in base units.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount {
    units: u64,
}

impl Amount {
    /// Zero tokens.
    pub const ZERO: Self = Self { units: 0 };

    /// Maximum amount (`u64::MAX` units).
    pub const MAX: Self = Self { units: u64::MAX };

    /// Create an amount from base units.
    #[must_use]
    pub const fn new(units: u64) -> Self {
        Self { units }
    }

    /// Get the amount in base units.
    #[must_use]
    pub const fn units(&self) -> u64 {
        self.units
    }

    /// Check if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.units == 0
    }

    /// Saturating addition.
    #[must_use]
    pub const fn saturating_add(&self, other: Self) -> Self {
        Self {
            units: self.units.saturating_add(other.units),
        }
    }

    /// Saturating subtraction.
    #[must_use]
    pub const fn saturating_sub(&self, other: Self) -> Self {
        Self {
            units: self.units.saturating_sub(other.units),
        }
    }

    /// Checked addition.
    #[must_use]
    pub const fn checked_add(&self, other: Self) -> Option<Self> {
        match self.units.checked_add(other.units) {
            Some(units) => Some(Self { units }),
            None => None,
        }
    }

    /// Checked subtraction.
    #[must_use]
    pub const fn checked_sub(&self, other: Self) -> Option<Self> {
        match self.units.checked_sub(other.units) {
            Some(units) => Some(Self { units }),
            None => None,
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.units)
    }
}

impl From<u64> for Amount {
    fn from(units: u64) -> Self {
        Self::new(units)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, a| acc.saturating_add(a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero() {
        assert!(Amount::ZERO.is_zero());
        assert_eq!(Amount::ZERO.units(), 0);
        assert_eq!(Amount::default(), Amount::ZERO);
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Amount::new(7);
        assert_eq!(a.checked_add(Amount::new(3)), Some(Amount::new(10)));
        assert_eq!(a.checked_sub(Amount::new(8)), None);
        assert_eq!(Amount::MAX.checked_add(Amount::new(1)), None);
    }

    #[test]
    fn test_saturating_arithmetic() {
        assert_eq!(Amount::MAX.saturating_add(Amount::new(1)), Amount::MAX);
        assert!(Amount::new(1).saturating_sub(Amount::new(2)).is_zero());
    }

    #[test]
    fn test_sum() {
        let total: Amount = [1, 2, 3].into_iter().map(Amount::new).sum();
        assert_eq!(total, Amount::new(6));
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount::new(1_000_000).to_string(), "1000000");
    }

    #[test]
    fn test_serializes_as_plain_number() {
        let json = serde_json::to_string(&Amount::new(99_000)).expect("serialize");
        assert_eq!(json, "99000");
        let parsed: Amount = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, Amount::new(99_000));
    }
}
