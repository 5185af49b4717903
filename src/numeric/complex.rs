//! A minimal complex number built on two `BigDecimal` components.
//!
//! Addition, subtraction, multiplication and division stay exact (they are
//! just `BigDecimal` arithmetic). Power goes through `f64`, the same
//! fallback `decimal::pow_fractional` uses, since no crate in this tower
//! offers arbitrary-precision complex transcendentals.

use crate::numeric::decimal::{format_decimal, round_to_precision};
use bigdecimal::BigDecimal;
use num_traits::{FromPrimitive, ToPrimitive, Zero};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Complex {
    pub re: BigDecimal,
    pub im: BigDecimal,
}

impl Complex {
    pub fn new(re: BigDecimal, im: BigDecimal) -> Self {
        Complex { re, im }
    }

    pub fn from_real(re: BigDecimal) -> Self {
        Complex { re, im: BigDecimal::zero() }
    }

    pub fn is_zero(&self) -> bool {
        self.re.is_zero() && self.im.is_zero()
    }

    pub fn add(&self, other: &Complex) -> Complex {
        Complex::new(&self.re + &other.re, &self.im + &other.im)
    }

    pub fn sub(&self, other: &Complex) -> Complex {
        Complex::new(&self.re - &other.re, &self.im - &other.im)
    }

    pub fn mul(&self, other: &Complex) -> Complex {
        let re = round_to_precision(&(&self.re * &other.re - &self.im * &other.im));
        let im = round_to_precision(&(&self.re * &other.im + &self.im * &other.re));
        Complex::new(re, im)
    }

    /// `None` when `other` is zero; caller raises the division-by-zero error.
    pub fn div(&self, other: &Complex) -> Option<Complex> {
        if other.is_zero() {
            return None;
        }
        let denom = &other.re * &other.re + &other.im * &other.im;
        let re = round_to_precision(&((&self.re * &other.re + &self.im * &other.im) / &denom));
        let im = round_to_precision(&((&self.im * &other.re - &self.re * &other.im) / &denom));
        Some(Complex::new(re, im))
    }

    pub fn neg(&self) -> Complex {
        Complex::new(-&self.re, -&self.im)
    }

    fn to_f64_pair(&self) -> Option<(f64, f64)> {
        Some((self.re.to_f64()?, self.im.to_f64()?))
    }

    fn from_f64_pair(re: f64, im: f64) -> Option<Complex> {
        let re = BigDecimal::from_f64(re)?;
        let im = BigDecimal::from_f64(im)?;
        Some(Complex::new(round_to_precision(&re), round_to_precision(&im)))
    }

    /// `self ^ exponent`, computed as `exp(exponent * ln(self))`.
    pub fn pow(&self, exponent: &Complex) -> Option<Complex> {
        if self.is_zero() {
            return if exponent.is_zero() { Some(Complex::from_real(BigDecimal::from(1))) } else { Some(self.clone()) };
        }
        let (br, bi) = self.to_f64_pair()?;
        let (er, ei) = exponent.to_f64_pair()?;

        let modulus = (br * br + bi * bi).sqrt();
        let arg = bi.atan2(br);
        let ln_re = modulus.ln();
        let ln_im = arg;

        let exp_re = er * ln_re - ei * ln_im;
        let exp_im = er * ln_im + ei * ln_re;

        let scale = exp_re.exp();
        let re = scale * exp_im.cos();
        let im = scale * exp_im.sin();
        if !re.is_finite() || !im.is_finite() {
            return None;
        }
        Complex::from_f64_pair(re, im)
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let re = format_decimal(&self.re);
        let im_abs = format_decimal(&self.im.abs());
        let sign = if self.im < BigDecimal::zero() { "-" } else { "+" };
        write!(f, "({re} {sign} {im_abs}i)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn c(re: &str, im: &str) -> Complex {
        Complex::new(BigDecimal::from_str(re).unwrap(), BigDecimal::from_str(im).unwrap())
    }

    #[test]
    fn add_and_mul_are_exact() {
        let a = c("1", "2");
        let b = c("3", "4");
        assert_eq!(a.add(&b), c("4", "6"));
        // (1+2i)(3+4i) = 3+4i+6i+8i^2 = -5+10i
        assert_eq!(a.mul(&b), c("-5", "10"));
    }

    #[test]
    fn div_by_zero_is_none() {
        let a = c("1", "1");
        let zero = Complex::from_real(BigDecimal::zero());
        assert!(a.div(&zero).is_none());
    }

    #[test]
    fn sqrt_of_negative_real_is_positive_imaginary() {
        let base = Complex::from_real(BigDecimal::from(-4));
        let half = Complex::from_real(BigDecimal::from_str("0.5").unwrap());
        let result = base.pow(&half).unwrap();
        assert!(result.re.to_f64().unwrap().abs() < 1e-6);
        assert!((result.im.to_f64().unwrap() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn display_formats_with_sign() {
        assert_eq!(c("0", "2").to_string(), "(0.0 + 2.0i)");
        assert_eq!(c("1", "-2").to_string(), "(1.0 - 2.0i)");
    }
}
