//! `sin` and `cos`, defined through the same complex exponential the
//! power operator already has (`e^(ix)`), rather than reaching for a
//! separate trig routine — real input collapses back to `Decimal` once the
//! imaginary component is negligible.

use crate::numeric::complex::Complex;
use crate::numeric::decimal::{round_to_precision, Decimal};
use crate::value::Value;
use bigdecimal::BigDecimal;
use num_traits::{FromPrimitive, ToPrimitive, Zero};

fn euler_e() -> BigDecimal {
    round_to_precision(&BigDecimal::from_f64(std::f64::consts::E).unwrap())
}

fn operand(positional: &[Value], named: &[(String, Value)], builtin_name: &str) -> Result<Complex, String> {
    let value = super::arg(positional, named, 0, "theta").ok_or_else(|| format!("{builtin_name}() requires one argument"))?;
    value.as_numeric_complex().ok_or_else(|| format!("{builtin_name}() requires a numeric argument, got {}", value.type_name()))
}

/// `(sin, cos)` of `z`, via `sin(z) = (e^(iz) - e^(-iz)) / 2i` and
/// `cos(z) = (e^(iz) + e^(-iz)) / 2`.
fn sin_cos(z: &Complex) -> Option<(Complex, Complex)> {
    let i = Complex::new(BigDecimal::zero(), BigDecimal::from(1));
    let iz = i.mul(z);
    let neg_iz = iz.neg();

    let e = Complex::from_real(euler_e());
    let exp_pos = e.pow(&iz)?;
    let exp_neg = e.pow(&neg_iz)?;

    let two_i = Complex::new(BigDecimal::zero(), BigDecimal::from(2));
    let two = Complex::from_real(BigDecimal::from(2));

    let sin = exp_pos.sub(&exp_neg).div(&two_i)?;
    let cos = exp_pos.add(&exp_neg).div(&two)?;
    Some((sin, cos))
}

/// Collapses a result back to `Decimal` when its imaginary part is
/// negligible, so `sin`/`cos` of a real argument reads like a real number.
fn collapse(c: Complex) -> Value {
    match c.im.to_f64() {
        Some(im) if im.abs() < 1e-9 => Value::Decimal(Decimal::Finite(c.re)),
        _ => Value::Complex(c),
    }
}

pub fn sin(positional: &[Value], named: &[(String, Value)]) -> Result<Value, String> {
    let z = operand(positional, named, "sin")?;
    let (s, _) = sin_cos(&z).ok_or_else(|| "sin() is undefined for this argument".to_string())?;
    Ok(collapse(s))
}

pub fn cos(positional: &[Value], named: &[(String, Value)]) -> Result<Value, String> {
    let z = operand(positional, named, "cos")?;
    let (_, c) = sin_cos(&z).ok_or_else(|| "cos() is undefined for this argument".to_string())?;
    Ok(collapse(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn sin_of_zero_is_zero() {
        let result = sin(&[Value::integer(0)], &[]).unwrap();
        match result {
            Value::Decimal(d) => assert!(d.to_f64().unwrap().abs() < 1e-6),
            other => panic!("expected Decimal, got {other:?}"),
        }
    }

    #[test]
    fn cos_of_zero_is_one() {
        let result = cos(&[Value::integer(0)], &[]).unwrap();
        match result {
            Value::Decimal(d) => assert!((d.to_f64().unwrap() - 1.0).abs() < 1e-6),
            other => panic!("expected Decimal, got {other:?}"),
        }
    }

    #[test]
    fn sin_of_pi_is_near_zero() {
        let pi = Value::Decimal(Decimal::Finite(BigDecimal::from_str("3.14159265358979").unwrap()));
        let result = sin(&[pi], &[]).unwrap();
        match result {
            Value::Decimal(d) => assert!(d.to_f64().unwrap().abs() < 1e-6),
            other => panic!("expected Decimal, got {other:?}"),
        }
    }
}
