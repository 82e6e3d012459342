use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};

/// A signed, currency-agnostic amount with two decimal places.
///
/// Statement amounts never carry a currency code: the symbol printed next to
/// a figure is discarded at tokenization and currency assignment is left to
/// the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// Cents, or `None` when the value does not fit in an `i64`.
    pub fn to_cents(self) -> Option<i64> {
        (self.0 * Decimal::from(100)).round().to_i64()
    }

    pub fn from_decimal(decimal: Decimal) -> Self {
        Money(decimal.round_dp(2))
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Self;
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |a, b| a + b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn cents_roundtrip() {
        assert_eq!(Money::from_cents(-12100).to_cents(), Some(-12100));
        assert_eq!(Money::from_cents(0).to_cents(), Some(0));
    }

    #[test]
    fn from_decimal_rounds_to_two_places() {
        let m = Money::from_decimal(Decimal::from_str("1.005").unwrap());
        assert_eq!(m.to_string(), "1.00");
        let m = Money::from_decimal(Decimal::from_str("114216.5").unwrap());
        assert_eq!(m.to_string(), "114216.50");
    }

    #[test]
    fn sign_helpers() {
        assert!(Money::from_cents(-1).is_negative());
        assert!(!Money::from_cents(1).is_negative());
        assert!(!Money::zero().is_negative());
        assert_eq!(Money::from_cents(-750).abs(), Money::from_cents(750));
        assert_eq!(-Money::from_cents(750), Money::from_cents(-750));
    }

    #[test]
    fn sum_of_amounts() {
        let total: Money = [Money::from_cents(-12100), Money::from_cents(5000)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_cents(-7100));
    }

    #[test]
    fn display_has_no_currency_symbol() {
        assert_eq!(Money::from_cents(-12100).to_string(), "-121.00");
    }
}
