//! Fixed-point money value object.
//!
//! Amounts are stored in the smallest currency unit (cents) and rendered with
//! two decimals. No floating point anywhere near order totals.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// A non-negative monetary amount in cents.
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Construct from a cent amount. Negative amounts are rejected.
    pub fn from_cents(cents: i64) -> DomainResult<Self> {
        if cents < 0 {
            return Err(DomainError::validation("amount cannot be negative"));
        }
        Ok(Self(cents))
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Checked addition; overflow is a validation failure, not a panic.
    pub fn checked_add(self, other: Money) -> DomainResult<Money> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or_else(|| DomainError::validation("amount overflow"))
    }

    /// Checked multiplication by a quantity.
    pub fn checked_mul(self, qty: i64) -> DomainResult<Money> {
        if qty < 0 {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        self.0
            .checked_mul(qty)
            .map(Money)
            .ok_or_else(|| DomainError::validation("amount overflow"))
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_amounts() {
        assert!(Money::from_cents(-1).is_err());
        assert_eq!(Money::from_cents(0).unwrap(), Money::ZERO);
    }

    #[test]
    fn renders_two_decimals() {
        assert_eq!(Money::from_cents(1234).unwrap().to_string(), "12.34");
        assert_eq!(Money::from_cents(5).unwrap().to_string(), "0.05");
    }

    #[test]
    fn checked_arithmetic_catches_overflow() {
        let max = Money::from_cents(i64::MAX).unwrap();
        assert!(max.checked_add(Money::from_cents(1).unwrap()).is_err());
        assert!(max.checked_mul(2).is_err());
        assert_eq!(
            Money::from_cents(250).unwrap().checked_mul(3).unwrap(),
            Money::from_cents(750).unwrap()
        );
    }
}
