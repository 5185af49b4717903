//! Runtime values and the binary/unary operation tables that give each pair
//! of types its coercion behavior.

use crate::ast::{Node, Param};
use crate::env::{Context, Environment};
use crate::numeric::complex::Complex;
use crate::numeric::decimal::{self, format_decimal, Decimal};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullKind {
    Null,
    None,
    Undefined,
}

impl NullKind {
    pub fn word(&self) -> &'static str {
        match self {
            NullKind::Null => "null",
            NullKind::None => "none",
            NullKind::Undefined => "undefined",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FunctionData {
    pub name: Option<String>,
    pub params: Vec<Param>,
    /// Default values for `params`, evaluated once in the defining scope
    /// when the function was created, parallel to `params` by index.
    pub defaults: Vec<Option<Value>>,
    pub body: Node,
    pub should_auto_return: bool,
    pub closure: Rc<Environment>,
    pub context: Rc<Context>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(BigInt),
    Decimal(Decimal),
    Complex(Complex),
    Boolean(bool),
    Null(NullKind),
    String(String),
    List(Vec<Value>),
    Function(Rc<FunctionData>),
    BuiltIn(String),
}

impl PartialEq for FunctionData {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Value {
    pub fn boolean(b: bool) -> Value {
        Value::Boolean(b)
    }

    pub fn null() -> Value {
        Value::Null(NullKind::Null)
    }

    pub fn integer(i: i64) -> Value {
        Value::Integer(BigInt::from(i))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "Integer",
            Value::Decimal(_) => "Decimal",
            Value::Complex(_) => "Complex",
            Value::Boolean(_) => "Boolean",
            Value::Null(_) => "Null",
            Value::String(_) => "String",
            Value::List(_) => "List",
            Value::Function(_) => "Function",
            Value::BuiltIn(_) => "BuiltInFunction",
        }
    }

    /// Truthiness used by `if`/`while` conditions and `and`/`or`/`not`.
    pub fn is_true(&self) -> bool {
        match self {
            Value::Integer(v) => !v.is_zero(),
            Value::Decimal(v) => !v.is_zero(),
            Value::Complex(v) => !v.is_zero(),
            Value::Boolean(b) => *b,
            Value::Null(_) => false,
            Value::String(s) => !s.is_empty(),
            Value::List(l) => !l.is_empty(),
            Value::Function(_) | Value::BuiltIn(_) => true,
        }
    }

    /// Finite-only coercion to `BigDecimal`. `None` for `Complex`,
    /// non-numeric values, and the `inf`/`nan` sentinels (which have no
    /// `BigDecimal` representation).
    fn as_decimal(&self) -> Option<BigDecimal> {
        match self {
            Value::Integer(v) => Some(BigDecimal::from(v.clone())),
            Value::Decimal(Decimal::Finite(v)) => Some(v.clone()),
            Value::Decimal(Decimal::Special(_)) => None,
            Value::Boolean(b) => Some(BigDecimal::from(if *b { 1 } else { 0 })),
            _ => None,
        }
    }

    /// Coerces a numeric value to `Decimal`, including the `inf`/`nan`
    /// sentinels. `None` for `Complex` and non-numeric values.
    fn as_decimal_sentinel(&self) -> Option<Decimal> {
        match self {
            Value::Integer(v) => Some(Decimal::Finite(BigDecimal::from(v.clone()))),
            Value::Decimal(v) => Some(v.clone()),
            Value::Boolean(b) => Some(Decimal::Finite(BigDecimal::from(if *b { 1 } else { 0 }))),
            _ => None,
        }
    }

    fn as_complex(&self) -> Option<Complex> {
        match self {
            Value::Complex(c) => Some(c.clone()),
            other => other.as_decimal().map(Complex::from_real),
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Decimal(_) | Value::Complex(_) | Value::Boolean(_))
    }

    /// Coerces a numeric value to `BigDecimal`, for builtins (`sin`, `cos`)
    /// that need a plain real operand. `None` for `Complex`, non-numeric
    /// values, and the `inf`/`nan` sentinels.
    pub fn as_real(&self) -> Option<BigDecimal> {
        self.as_decimal()
    }

    /// Coerces any numeric value to `Complex`, for builtins that apply
    /// uniformly to real and complex operands.
    pub fn as_numeric_complex(&self) -> Option<Complex> {
        self.as_complex()
    }

    pub fn add(&self, other: &Value) -> OpResult {
        match (self, other) {
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
            (Value::List(a), Value::List(b)) => {
                let mut v = a.clone();
                v.extend(b.clone());
                Ok(Value::List(v))
            }
            (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a + b)),
            _ if self.is_numeric() && other.is_numeric() => {
                if matches!(self, Value::Complex(_)) || matches!(other, Value::Complex(_)) {
                    let a = self.as_complex().ok_or_else(|| illegal_operation(self, Some(other)))?;
                    let b = other.as_complex().ok_or_else(|| illegal_operation(self, Some(other)))?;
                    Ok(Value::Complex(a.add(&b)))
                } else {
                    let a = self.as_decimal_sentinel().unwrap();
                    let b = other.as_decimal_sentinel().unwrap();
                    Ok(Value::Decimal(a.add(&b)))
                }
            }
            _ => Err(illegal_operation(self, Some(other))),
        }
    }

    pub fn sub(&self, other: &Value) -> OpResult {
        match (self, other) {
            (Value::List(a), b) => {
                let idx = value_as_index(b).ok_or_else(|| illegal_operation(self, Some(other)))?;
                let mut v = a.clone();
                if idx < 0 || idx as usize >= v.len() {
                    return Err(OpError::IndexOutOfBounds);
                }
                v.remove(idx as usize);
                Ok(Value::List(v))
            }
            (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a - b)),
            _ if self.is_numeric() && other.is_numeric() => {
                if matches!(self, Value::Complex(_)) || matches!(other, Value::Complex(_)) {
                    let a = self.as_complex().ok_or_else(|| illegal_operation(self, Some(other)))?;
                    let b = other.as_complex().ok_or_else(|| illegal_operation(self, Some(other)))?;
                    Ok(Value::Complex(a.sub(&b)))
                } else {
                    let a = self.as_decimal_sentinel().unwrap();
                    let b = other.as_decimal_sentinel().unwrap();
                    Ok(Value::Decimal(a.sub(&b)))
                }
            }
            _ => Err(illegal_operation(self, Some(other))),
        }
    }

    pub fn mul(&self, other: &Value) -> OpResult {
        match (self, other) {
            (Value::String(s), n) | (n, Value::String(s)) if value_as_index(n).is_some() => {
                let count = value_as_index(n).unwrap().max(0) as usize;
                Ok(Value::String(s.repeat(count)))
            }
            (Value::List(a), n) | (n, Value::List(a)) if value_as_index(n).is_some() => {
                let count = value_as_index(n).unwrap().max(0) as usize;
                let mut v = Vec::with_capacity(a.len() * count);
                for _ in 0..count {
                    v.extend(a.clone());
                }
                Ok(Value::List(v))
            }
            (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a * b)),
            _ if self.is_numeric() && other.is_numeric() => {
                if matches!(self, Value::Complex(_)) || matches!(other, Value::Complex(_)) {
                    let a = self.as_complex().ok_or_else(|| illegal_operation(self, Some(other)))?;
                    let b = other.as_complex().ok_or_else(|| illegal_operation(self, Some(other)))?;
                    Ok(Value::Complex(a.mul(&b)))
                } else {
                    let a = self.as_decimal_sentinel().unwrap();
                    let b = other.as_decimal_sentinel().unwrap();
                    Ok(Value::Decimal(a.mul(&b)))
                }
            }
            _ => Err(illegal_operation(self, Some(other))),
        }
    }

    pub fn div(&self, other: &Value) -> OpResult {
        if other.is_numeric() && !matches!(other, Value::Complex(_)) {
            let b = other.as_decimal_sentinel().unwrap();
            if b.is_zero() {
                return Err(OpError::DivisionByZero);
            }
        }
        if matches!(other, Value::Complex(c) if c.is_zero()) {
            return Err(OpError::DivisionByZero);
        }
        match (self, other) {
            _ if self.is_numeric() && other.is_numeric() => {
                if matches!(self, Value::Complex(_)) || matches!(other, Value::Complex(_)) {
                    let a = self.as_complex().ok_or_else(|| illegal_operation(self, Some(other)))?;
                    let b = other.as_complex().ok_or_else(|| illegal_operation(self, Some(other)))?;
                    let result = a.div(&b).ok_or(OpError::DivisionByZero)?;
                    Ok(Value::Complex(result))
                } else {
                    let a = self.as_decimal_sentinel().unwrap();
                    let b = other.as_decimal_sentinel().unwrap();
                    Ok(Value::Decimal(a.div(&b)))
                }
            }
            _ => Err(illegal_operation(self, Some(other))),
        }
    }

    pub fn pow(&self, other: &Value) -> OpResult {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) if !a.is_negative() => {
                if let Some(e) = b.to_i64() {
                    if let Ok(e_u32) = u32::try_from(e) {
                        return Ok(Value::Integer(a.pow(e_u32)));
                    }
                }
                self.pow_via_decimal(other)
            }
            _ if self.is_numeric() && other.is_numeric() => self.pow_via_decimal(other),
            _ => Err(illegal_operation(self, Some(other))),
        }
    }

    fn pow_via_decimal(&self, other: &Value) -> OpResult {
        if matches!(self, Value::Complex(_)) || matches!(other, Value::Complex(_)) {
            let a = self.as_complex().ok_or_else(|| illegal_operation(self, Some(other)))?;
            let b = other.as_complex().ok_or_else(|| illegal_operation(self, Some(other)))?;
            return a.pow(&b).map(Value::Complex).ok_or(OpError::MathDomain);
        }

        let base = self.as_decimal_sentinel().unwrap();
        let exponent = other.as_decimal_sentinel().unwrap();

        let (base, exponent) = match (base, exponent) {
            (Decimal::Finite(base), Decimal::Finite(exponent)) => (base, exponent),
            (base, exponent) => return Ok(Value::Decimal(base.pow(&exponent))),
        };

        if let Some(e) = decimal::exponent_as_i64(&exponent) {
            // Integer exponent keeps a negative base real, per the power
            // invariant: only a non-integer exponent on a negative base
            // goes complex.
            return Ok(Value::Decimal(Decimal::Finite(decimal::pow_integer(&base, e))));
        }

        if decimal::is_negative(&base) {
            let a = Complex::from_real(base);
            let b = Complex::from_real(exponent);
            return a.pow(&b).map(Value::Complex).ok_or(OpError::MathDomain);
        }

        decimal::pow_fractional(&base, &exponent)
            .map(|d| Value::Decimal(Decimal::Finite(d)))
            .ok_or(OpError::MathDomain)
    }

    pub fn subscript(&self, other: &Value) -> OpResult {
        match self {
            Value::List(items) => {
                let idx = value_as_index(other).ok_or_else(|| illegal_operation(self, Some(other)))?;
                let len = items.len() as i64;
                let normalized = if idx < 0 { idx + len } else { idx };
                items
                    .get(normalized as usize)
                    .cloned()
                    .ok_or(OpError::IndexOutOfBounds)
            }
            Value::String(s) => {
                let idx = value_as_index(other).ok_or_else(|| illegal_operation(self, Some(other)))?;
                let chars: Vec<char> = s.chars().collect();
                let len = chars.len() as i64;
                let normalized = if idx < 0 { idx + len } else { idx };
                chars
                    .get(normalized as usize)
                    .map(|c| Value::String(c.to_string()))
                    .ok_or(OpError::IndexOutOfBounds)
            }
            _ => Err(illegal_operation(self, Some(other))),
        }
    }

    pub fn eq_value(&self, other: &Value) -> Value {
        Value::Boolean(self.values_equal(other))
    }

    pub fn ne_value(&self, other: &Value) -> Value {
        Value::Boolean(!self.values_equal(other))
    }

    fn values_equal(&self, other: &Value) -> bool {
        match (self, other) {
            _ if self.is_numeric() && other.is_numeric() => {
                if matches!(self, Value::Complex(_)) || matches!(other, Value::Complex(_)) {
                    self.as_complex() == other.as_complex()
                } else {
                    self.as_decimal_sentinel() == other.as_decimal_sentinel()
                }
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Null(_), Value::Null(_)) => true,
            _ => false,
        }
    }

    fn comparison_decimals(&self, other: &Value) -> Option<(Decimal, Decimal)> {
        if self.is_numeric() && other.is_numeric() && !matches!(self, Value::Complex(_)) && !matches!(other, Value::Complex(_)) {
            Some((self.as_decimal_sentinel().unwrap(), other.as_decimal_sentinel().unwrap()))
        } else {
            None
        }
    }

    // A NaN-involved comparison is never an error: IEEE semantics say every
    // such comparison is simply false.
    pub fn lt(&self, other: &Value) -> OpResult {
        self.comparison_decimals(other)
            .map(|(a, b)| Value::Boolean(a.is_less_than(&b).unwrap_or(false)))
            .ok_or_else(|| illegal_operation(self, Some(other)))
    }

    pub fn gt(&self, other: &Value) -> OpResult {
        self.comparison_decimals(other)
            .map(|(a, b)| Value::Boolean(a.is_greater_than(&b).unwrap_or(false)))
            .ok_or_else(|| illegal_operation(self, Some(other)))
    }

    pub fn lte(&self, other: &Value) -> OpResult {
        self.comparison_decimals(other)
            .map(|(a, b)| Value::Boolean(a.is_less_or_equal(&b).unwrap_or(false)))
            .ok_or_else(|| illegal_operation(self, Some(other)))
    }

    pub fn gte(&self, other: &Value) -> OpResult {
        self.comparison_decimals(other)
            .map(|(a, b)| Value::Boolean(a.is_greater_or_equal(&b).unwrap_or(false)))
            .ok_or_else(|| illegal_operation(self, Some(other)))
    }

    pub fn and(&self, other: &Value) -> Value {
        Value::Boolean(self.is_true() && other.is_true())
    }

    pub fn or(&self, other: &Value) -> Value {
        Value::Boolean(self.is_true() || other.is_true())
    }

    pub fn not(&self) -> Value {
        Value::Boolean(!self.is_true())
    }

    pub fn negate(&self) -> OpResult {
        match self {
            Value::Integer(v) => Ok(Value::Integer(-v)),
            Value::Decimal(v) => Ok(Value::Decimal(v.negate())),
            Value::Complex(v) => Ok(Value::Complex(v.neg())),
            Value::Boolean(b) => Ok(Value::Integer(BigInt::from(if *b { -1 } else { 0 }))),
            _ => Err(illegal_operation(self, None)),
        }
    }

    pub fn length(&self) -> Option<i64> {
        match self {
            Value::String(s) => Some(s.chars().count() as i64),
            Value::List(l) => Some(l.len() as i64),
            _ => None,
        }
    }
}

fn value_as_index(v: &Value) -> Option<i64> {
    match v {
        Value::Integer(i) => i.to_i64(),
        Value::Boolean(b) => Some(if *b { 1 } else { 0 }),
        Value::Decimal(d) => d.to_i64(),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpError {
    IllegalOperation { left_type: &'static str, right_type: Option<&'static str> },
    DivisionByZero,
    IndexOutOfBounds,
    MathDomain,
}

impl OpError {
    pub fn message(&self) -> String {
        match self {
            OpError::IllegalOperation { left_type, right_type } => match right_type {
                Some(r) => format!("Illegal operation between {left_type} and {r}"),
                None => format!("Illegal operation on {left_type}"),
            },
            OpError::DivisionByZero => "Division by zero".to_string(),
            OpError::IndexOutOfBounds => "Index out of bounds".to_string(),
            OpError::MathDomain => "Math domain error".to_string(),
        }
    }
}

fn illegal_operation(left: &Value, right: Option<&Value>) -> OpError {
    OpError::IllegalOperation { left_type: left.type_name(), right_type: right.map(Value::type_name) }
}

pub type OpResult = Result<Value, OpError>;

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::Complex(v) => write!(f, "{v}"),
            Value::Boolean(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Null(k) => write!(f, "{}", k.word()),
            Value::String(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match item {
                        Value::String(s) => write!(f, "\"{s}\"")?,
                        other => write!(f, "{other}")?,
                    }
                }
                write!(f, "]")
            }
            Value::Function(data) => write!(f, "<function {}>", data.name.as_deref().unwrap_or("<anonymous>")),
            Value::BuiltIn(name) => write!(f, "<built-in function {name}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_addition_is_exact() {
        let a = Value::integer(2);
        let b = Value::integer(3);
        assert_eq!(a.add(&b).unwrap(), Value::integer(5));
    }

    #[test]
    fn integer_division_promotes_to_decimal() {
        let a = Value::integer(7);
        let b = Value::integer(2);
        match a.div(&b).unwrap() {
            Value::Decimal(d) => assert_eq!(d.to_string(), "3.5"),
            other => panic!("expected Decimal, got {other:?}"),
        }
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let a = Value::integer(1);
        let b = Value::integer(0);
        assert_eq!(a.div(&b), Err(OpError::DivisionByZero));
    }

    #[test]
    fn negative_base_fractional_exponent_is_complex() {
        let base = Value::integer(-4);
        let half = Value::Decimal(Decimal::Finite(BigDecimal::from(1) / BigDecimal::from(2)));
        match base.pow(&half).unwrap() {
            Value::Complex(_) => {}
            other => panic!("expected Complex, got {other:?}"),
        }
    }

    #[test]
    fn negative_base_integer_exponent_stays_real() {
        let base = Value::integer(-2);
        let two = Value::integer(2);
        assert_eq!(base.pow(&two).unwrap(), Value::Decimal(Decimal::Finite(BigDecimal::from(4))));
    }

    #[test]
    fn list_subscript_supports_negative_indices() {
        let list = Value::List(vec![Value::integer(1), Value::integer(2), Value::integer(3)]);
        assert_eq!(list.subscript(&Value::integer(-1)).unwrap(), Value::integer(3));
    }

    #[test]
    fn list_subscript_out_of_bounds_errors() {
        let list = Value::List(vec![Value::integer(1)]);
        assert_eq!(list.subscript(&Value::integer(5)), Err(OpError::IndexOutOfBounds));
    }

    #[test]
    fn boolean_coerces_to_integer_in_arithmetic() {
        let t = Value::boolean(true);
        let one = Value::integer(1);
        assert_eq!(t.add(&one).unwrap(), Value::integer(2));
    }

    #[test]
    fn display_shows_lowercase_booleans() {
        assert_eq!(Value::boolean(true).to_string(), "true");
        assert_eq!(Value::boolean(false).to_string(), "false");
    }

    #[test]
    fn infinity_plus_one_stays_infinity() {
        let inf = Value::Decimal(Decimal::infinity());
        assert_eq!(inf.add(&Value::integer(1)).unwrap(), Value::Decimal(Decimal::infinity()));
    }

    #[test]
    fn nan_compares_false_against_everything() {
        let nan = Value::Decimal(Decimal::nan());
        assert_eq!(nan.lt(&Value::integer(1)).unwrap(), Value::Boolean(false));
        assert_eq!(nan.gt(&Value::integer(1)).unwrap(), Value::Boolean(false));
        assert_eq!(nan.eq_value(&nan), Value::Boolean(false));
    }

    #[test]
    fn decimal_repeats_a_string_by_truncating() {
        let result = Value::String("ab".to_string()).mul(&Value::Decimal(Decimal::Finite(BigDecimal::from(3)))).unwrap();
        assert_eq!(result, Value::String("ababab".to_string()));
    }

    #[test]
    fn list_plus_non_list_is_illegal() {
        let list = Value::List(vec![Value::integer(1)]);
        assert!(list.add(&Value::integer(1)).is_err());
    }
}
