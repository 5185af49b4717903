//! The arbitrary-precision numeric tower: exact decimals and a minimal
//! complex type built on top of them.

pub mod complex;
pub mod decimal;
