//! Lossless decimal numeric type backed by rust_decimal.
//!
//! All quantities, prices and amounts in the ledger go through this type so
//! that lot splitting and averaging never accumulate binary float drift.

use rust_decimal::{Decimal as RustDecimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::str::FromStr;

/// Lossless decimal numeric type for cost-basis calculations.
///
/// Serializes to a JSON number (not a string).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Decimal(#[serde(with = "rust_decimal::serde::float")] RustDecimal);

impl Decimal {
    pub fn new(value: RustDecimal) -> Self {
        Decimal(value)
    }

    /// Parse a plain or scientific-notation number.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s)
            .or_else(|_| RustDecimal::from_scientific(s))
            .map(Decimal)
    }

    /// Format without exponent notation and without trailing zeros.
    pub fn to_canonical_string(&self) -> String {
        format!("{}", self.0.normalize())
    }

    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    pub fn zero() -> Self {
        Decimal(RustDecimal::ZERO)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the value is > 0.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    /// Returns true if the value is < 0.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    pub fn abs(&self) -> Self {
        Decimal(self.0.abs())
    }

    /// Returns `None` if the sum overflows.
    pub fn checked_add(self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_add(rhs.0).map(Decimal)
    }

    /// Returns `None` if the difference overflows.
    pub fn checked_sub(self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_sub(rhs.0).map(Decimal)
    }

    /// Returns `None` if the product overflows.
    pub fn checked_mul(self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_mul(rhs.0).map(Decimal)
    }

    /// Returns `None` on a zero divisor or an overflowing quotient.
    pub fn checked_div(self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_div(rhs.0).map(Decimal)
    }

    /// Sum of `values`, or `None` as soon as the running total overflows.
    pub fn checked_sum<I>(values: I) -> Option<Decimal>
    where
        I: IntoIterator<Item = Decimal>,
    {
        values
            .into_iter()
            .try_fold(Decimal::zero(), |acc, x| acc.checked_add(x))
    }

    /// `self / rhs`, or zero when `rhs` is zero.
    pub fn checked_div_or_zero(self, rhs: Decimal) -> Decimal {
        self.0
            .checked_div(rhs.0)
            .map(Decimal)
            .unwrap_or_else(Decimal::zero)
    }

    /// Round half away from zero to `dp` decimal places, for display.
    pub fn round_for_display(&self, dp: u32) -> Self {
        Decimal(
            self.0
                .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero),
        )
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Decimal {
    fn from(value: RustDecimal) -> Self {
        Decimal(value)
    }
}

impl From<Decimal> for RustDecimal {
    fn from(value: Decimal) -> Self {
        value.0
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal(RustDecimal::from(value))
    }
}

impl std::ops::Add for Decimal {
    type Output = Decimal;

    fn add(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Decimal {
    fn add_assign(&mut self, rhs: Decimal) {
        self.0 += rhs.0;
    }
}

impl std::ops::Sub for Decimal {
    type Output = Decimal;

    fn sub(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 - rhs.0)
    }
}

impl std::ops::SubAssign for Decimal {
    fn sub_assign(&mut self, rhs: Decimal) {
        self.0 -= rhs.0;
    }
}

impl std::ops::Mul for Decimal {
    type Output = Decimal;

    fn mul(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 * rhs.0)
    }
}

impl std::ops::Div for Decimal {
    type Output = Decimal;

    /// Panics on a zero divisor or overflow; the engines use
    /// [`Decimal::checked_div`] instead.
    fn div(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 / rhs.0)
    }
}

impl std::ops::Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        Decimal(-self.0)
    }
}

impl Sum for Decimal {
    fn sum<I: Iterator<Item = Decimal>>(iter: I) -> Decimal {
        iter.fold(Decimal::zero(), |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Decimal> for Decimal {
    fn sum<I: Iterator<Item = &'a Decimal>>(iter: I) -> Decimal {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    #[test]
    fn test_decimal_parse_plain_and_scientific() {
        assert_eq!(d("123.456").to_canonical_string(), "123.456");
        assert_eq!(d("1.5e3").to_canonical_string(), "1500");
        assert_eq!(d("2E-2").to_canonical_string(), "0.02");
        assert!(Decimal::from_str_canonical("abc").is_err());
    }

    #[test]
    fn test_decimal_canonical_strips_trailing_zeros() {
        assert_eq!(d("10.500").to_canonical_string(), "10.5");
        assert_eq!(d("100").to_string(), "100");
    }

    #[test]
    fn test_decimal_arithmetic() {
        let a = d("10.5");
        let b = d("2.5");

        assert_eq!((a + b).to_canonical_string(), "13");
        assert_eq!((a - b).to_canonical_string(), "8");
        assert_eq!((a * b).to_canonical_string(), "26.25");
        assert_eq!((a / b).to_canonical_string(), "4.2");

        let mut acc = Decimal::zero();
        acc += a;
        acc -= b;
        assert_eq!(acc, d("8"));
    }

    #[test]
    fn test_checked_div_or_zero_guards_zero_divisor() {
        assert_eq!(d("100").checked_div_or_zero(d("10")), d("10"));
        assert_eq!(d("100").checked_div_or_zero(Decimal::zero()), Decimal::zero());
    }

    #[test]
    fn test_checked_ops_report_overflow() {
        let big = d("4e28");
        assert_eq!(d("2").checked_mul(d("3")), Some(d("6")));
        assert_eq!(big.checked_mul(d("100")), None);
        assert_eq!(big.checked_add(big), None);
        assert_eq!((-big).checked_sub(big), None);
        assert_eq!(big.checked_sub(big), Some(Decimal::zero()));
        assert_eq!(big.checked_div(d("0.0001")), None);
        assert_eq!(d("1").checked_div(Decimal::zero()), None);
    }

    #[test]
    fn test_checked_sum() {
        assert_eq!(Decimal::checked_sum(vec![d("1"), d("2.5")]), Some(d("3.5")));
        assert_eq!(Decimal::checked_sum(Vec::new()), Some(Decimal::zero()));
        let big = d("5e28");
        assert_eq!(Decimal::checked_sum(vec![big, big]), None);
    }

    #[test]
    fn test_round_for_display() {
        assert_eq!(d("10.666666").round_for_display(2), d("10.67"));
        assert_eq!(d("-0.125").round_for_display(2), d("-0.13"));
        assert_eq!(d("7").round_for_display(2), d("7"));
    }

    #[test]
    fn test_decimal_sum_and_sign() {
        let values = vec![d("1.5"), d("-0.5"), d("2")];
        let total: Decimal = values.iter().sum();
        assert_eq!(total, d("3"));
        assert!(total.is_positive());
        assert!(d("-1").is_negative());
        assert!(!Decimal::zero().is_positive());
        assert!(!Decimal::zero().is_negative());
    }

    #[test]
    fn test_decimal_json_serialization() {
        let json = serde_json::to_value(d("123.456")).unwrap();
        assert!(json.is_number());
        assert_eq!(json.to_string(), "123.456");
    }
}
