//! Arbitrary-precision decimal helpers built on `bigdecimal::BigDecimal`.
//!
//! Every division and fractional power is rounded back to
//! [`crate::config::DECIMAL_PRECISION_DIGITS`] significant digits so a run
//! never silently loses precision below the language's guarantee.

use crate::config::DECIMAL_PRECISION_DIGITS;
use bigdecimal::BigDecimal;
use num_traits::{FromPrimitive, ToPrimitive, Zero};
use std::fmt;

fn precision() -> u64 {
    DECIMAL_PRECISION_DIGITS as u64
}

pub fn round_to_precision(d: &BigDecimal) -> BigDecimal {
    d.with_prec(precision())
}

pub fn divide(a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
    round_to_precision(&(a / b))
}

pub fn is_integer_value(d: &BigDecimal) -> bool {
    d.normalized().scale() <= 0
}

pub fn is_negative(d: &BigDecimal) -> bool {
    d < &BigDecimal::zero()
}

/// Exact repeated-squaring power for an integer exponent. Negative exponents
/// take the reciprocal of the positive power, rounded to precision.
pub fn pow_integer(base: &BigDecimal, exponent: i64) -> BigDecimal {
    if exponent == 0 {
        return BigDecimal::from(1);
    }
    let mut result = BigDecimal::from(1);
    let mut b = base.clone();
    let mut e = exponent.unsigned_abs();
    while e > 0 {
        if e & 1 == 1 {
            result = round_to_precision(&(&result * &b));
        }
        e >>= 1;
        if e > 0 {
            b = round_to_precision(&(&b * &b));
        }
    }
    if exponent < 0 {
        divide(&BigDecimal::from(1), &result)
    } else {
        result
    }
}

/// Fallback power for a non-integer exponent on a non-negative real base,
/// computed through `f64` since no pure-Rust crate in this tower offers
/// arbitrary-precision transcendental functions.
pub fn pow_fractional(base: &BigDecimal, exponent: &BigDecimal) -> Option<BigDecimal> {
    let b = base.to_f64()?;
    let e = exponent.to_f64()?;
    let result = b.powf(e);
    if !result.is_finite() {
        return None;
    }
    BigDecimal::from_f64(result).map(|d| round_to_precision(&d))
}

pub fn exponent_as_i64(exponent: &BigDecimal) -> Option<i64> {
    if !is_integer_value(exponent) {
        return None;
    }
    exponent.to_i64()
}

pub fn format_decimal(d: &BigDecimal) -> String {
    let normalized = d.normalized();
    let s = normalized.to_string();
    if s.contains('.') || s.contains('e') || s.contains('E') {
        s
    } else {
        format!("{s}.0")
    }
}

/// A `Decimal` value, which is either an exact arbitrary-precision number or
/// one of the two non-finite sentinels the global table seeds as `inf`/`nan`.
/// `BigDecimal` has no representation for infinity or NaN, so arithmetic
/// touching a sentinel bridges through `f64` (which natively has both) the
/// same way [`pow_fractional`] already bridges transcendental powers; two
/// finite operands always stay on the exact `BigDecimal` path.
#[derive(Debug, Clone)]
pub enum Decimal {
    Finite(BigDecimal),
    /// Always `is_nan()` or `is_infinite()`.
    Special(f64),
}

impl Decimal {
    pub fn infinity() -> Decimal {
        Decimal::Special(f64::INFINITY)
    }

    pub fn neg_infinity() -> Decimal {
        Decimal::Special(f64::NEG_INFINITY)
    }

    pub fn nan() -> Decimal {
        Decimal::Special(f64::NAN)
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Decimal::Finite(d) if d.is_zero())
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Decimal::Special(f) if f.is_nan())
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Decimal::Finite(d) => is_negative(d),
            Decimal::Special(f) => f.is_sign_negative() && !f.is_nan(),
        }
    }

    fn to_f64_lossy(&self) -> f64 {
        match self {
            Decimal::Finite(d) => d.to_f64().unwrap_or(f64::NAN),
            Decimal::Special(f) => *f,
        }
    }

    /// Lossy conversion to `f64`, for builtins that only need an
    /// approximate real value (`sin`, `cos`). `None` only when a `Finite`
    /// value is out of `f64`'s range.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Decimal::Finite(d) => d.to_f64(),
            Decimal::Special(f) => Some(*f),
        }
    }

    fn from_f64_result(f: f64) -> Decimal {
        if f.is_finite() {
            BigDecimal::from_f64(f).map(|d| Decimal::Finite(round_to_precision(&d))).unwrap_or(Decimal::Special(f64::NAN))
        } else {
            Decimal::Special(f)
        }
    }

    pub fn add(&self, other: &Decimal) -> Decimal {
        match (self, other) {
            (Decimal::Finite(a), Decimal::Finite(b)) => Decimal::Finite(a + b),
            _ => Decimal::from_f64_result(self.to_f64_lossy() + other.to_f64_lossy()),
        }
    }

    pub fn sub(&self, other: &Decimal) -> Decimal {
        match (self, other) {
            (Decimal::Finite(a), Decimal::Finite(b)) => Decimal::Finite(a - b),
            _ => Decimal::from_f64_result(self.to_f64_lossy() - other.to_f64_lossy()),
        }
    }

    pub fn mul(&self, other: &Decimal) -> Decimal {
        match (self, other) {
            (Decimal::Finite(a), Decimal::Finite(b)) => Decimal::Finite(round_to_precision(&(a * b))),
            _ => Decimal::from_f64_result(self.to_f64_lossy() * other.to_f64_lossy()),
        }
    }

    pub fn div(&self, other: &Decimal) -> Decimal {
        match (self, other) {
            (Decimal::Finite(a), Decimal::Finite(b)) => Decimal::Finite(divide(a, b)),
            _ => Decimal::from_f64_result(self.to_f64_lossy() / other.to_f64_lossy()),
        }
    }

    pub fn pow(&self, exponent: &Decimal) -> Decimal {
        Decimal::from_f64_result(self.to_f64_lossy().powf(exponent.to_f64_lossy()))
    }

    pub fn negate(&self) -> Decimal {
        match self {
            Decimal::Finite(d) => Decimal::Finite(-d),
            Decimal::Special(f) => Decimal::Special(-f),
        }
    }

    pub fn is_less_than(&self, other: &Decimal) -> Option<bool> {
        self.ordering_safe(other, |a, b| a < b, |a, b| a < b)
    }

    pub fn is_greater_than(&self, other: &Decimal) -> Option<bool> {
        self.ordering_safe(other, |a, b| a > b, |a, b| a > b)
    }

    pub fn is_less_or_equal(&self, other: &Decimal) -> Option<bool> {
        self.ordering_safe(other, |a, b| a <= b, |a, b| a <= b)
    }

    pub fn is_greater_or_equal(&self, other: &Decimal) -> Option<bool> {
        self.ordering_safe(other, |a, b| a >= b, |a, b| a >= b)
    }

    fn ordering_safe(&self, other: &Decimal, finite_cmp: impl Fn(&BigDecimal, &BigDecimal) -> bool, float_cmp: impl Fn(f64, f64) -> bool) -> Option<bool> {
        if self.is_nan() || other.is_nan() {
            return None;
        }
        match (self, other) {
            (Decimal::Finite(a), Decimal::Finite(b)) => Some(finite_cmp(a, b)),
            _ => Some(float_cmp(self.to_f64_lossy(), other.to_f64_lossy())),
        }
    }

    /// Truncates a finite decimal towards zero for use as a list/string
    /// index or repeat count. `None` for non-finite values.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Decimal::Finite(d) => d.to_i64(),
            Decimal::Special(_) => None,
        }
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Decimal::Finite(a), Decimal::Finite(b)) => a == b,
            (Decimal::Special(a), Decimal::Special(b)) => a == b,
            (Decimal::Finite(a), Decimal::Special(b)) | (Decimal::Special(b), Decimal::Finite(a)) => a.to_f64().map(|af| af == *b).unwrap_or(false),
        }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decimal::Finite(d) => write!(f, "{}", format_decimal(d)),
            Decimal::Special(v) if v.is_nan() => write!(f, "nan"),
            Decimal::Special(v) if v.is_sign_negative() => write!(f, "-inf"),
            Decimal::Special(_) => write!(f, "inf"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn divide_rounds_to_precision() {
        let a = BigDecimal::from(1);
        let b = BigDecimal::from(3);
        let result = divide(&a, &b);
        assert!(result.to_string().starts_with("0.333333"));
    }

    #[test]
    fn pow_integer_handles_negative_exponent() {
        let base = BigDecimal::from(2);
        let result = pow_integer(&base, -1);
        assert_eq!(result, BigDecimal::from_str("0.5").unwrap());
    }

    #[test]
    fn pow_integer_zero_is_one() {
        let base = BigDecimal::from(5);
        assert_eq!(pow_integer(&base, 0), BigDecimal::from(1));
    }

    #[test]
    fn is_integer_value_detects_whole_numbers() {
        assert!(is_integer_value(&BigDecimal::from_str("4.00").unwrap()));
        assert!(!is_integer_value(&BigDecimal::from_str("4.5").unwrap()));
    }

    #[test]
    fn format_decimal_always_shows_a_point() {
        assert_eq!(format_decimal(&BigDecimal::from(7)), "7.0");
        assert_eq!(format_decimal(&BigDecimal::from_str("3.50").unwrap()), "3.5");
    }

    #[test]
    fn infinity_plus_finite_is_infinity() {
        let result = Decimal::infinity().add(&Decimal::Finite(BigDecimal::from(5)));
        assert_eq!(result, Decimal::infinity());
    }

    #[test]
    fn infinity_minus_infinity_is_nan() {
        let result = Decimal::infinity().sub(&Decimal::infinity());
        assert!(result.is_nan());
    }

    #[test]
    fn nan_is_never_equal_to_itself() {
        assert_ne!(Decimal::nan(), Decimal::nan());
    }

    #[test]
    fn nan_comparisons_are_always_none() {
        assert_eq!(Decimal::nan().is_less_than(&Decimal::Finite(BigDecimal::from(1))), None);
    }

    #[test]
    fn finite_divided_by_infinity_is_zero() {
        let result = Decimal::Finite(BigDecimal::from(1)).div(&Decimal::infinity());
        assert_eq!(result, Decimal::Finite(BigDecimal::from(0)));
    }

    #[test]
    fn display_renders_sentinels_as_lowercase_words() {
        assert_eq!(Decimal::infinity().to_string(), "inf");
        assert_eq!(Decimal::neg_infinity().to_string(), "-inf");
        assert_eq!(Decimal::nan().to_string(), "nan");
    }
}
