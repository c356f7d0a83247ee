use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// A numeric deck token.
///
/// Decks distinguish `1800` from `1800.0` only cosmetically, but keeping the
/// written form means a parsed deck serializes back to the same text.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Real(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(v) => v as f64,
            Number::Real(v) => v,
        }
    }

    /// Converts a fixed-size array of plain numbers, e.g. `Number::array([1.0, 2.0, 0.5])`.
    pub fn array<T: Into<Number>, const N: usize>(values: [T; N]) -> [Number; N] {
        values.map(Into::into)
    }

    pub fn is_int(self) -> bool {
        matches!(self, Number::Int(_))
    }

    pub fn ensure_finite(self, what: &str) -> CoreResult<Self> {
        match self {
            Number::Real(v) if !v.is_finite() => Err(CoreError::NonFinite {
                what: what.to_string(),
                value: v,
            }),
            _ => Ok(self),
        }
    }
}

impl Default for Number {
    fn default() -> Self {
        Number::Int(0)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(v) => write!(f, "{v}"),
            // Debug gives the shortest round-trip form and keeps a trailing
            // ".0" on integral values.
            Number::Real(v) => write!(f, "{v:?}"),
        }
    }
}

impl FromStr for Number {
    type Err = CoreError;

    fn from_str(token: &str) -> CoreResult<Self> {
        let token = token.trim();
        let digits = token.strip_prefix(['+', '-']).unwrap_or(token);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(v) = token.parse::<i64>() {
                return Ok(Number::Int(v));
            }
        }

        // Fortran double-precision exponents (1.5D0)
        let normalized = token.replace(['d', 'D'], "e");
        let looks_numeric = normalized
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
        if !looks_numeric || !normalized.bytes().any(|b| b.is_ascii_digit()) {
            return Err(CoreError::InvalidNumber {
                token: token.to_string(),
            });
        }
        match normalized.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Number::Real(v)),
            _ => Err(CoreError::InvalidNumber {
                token: token.to_string(),
            }),
        }
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Number::Int(v)
    }
}

impl From<i32> for Number {
    fn from(v: i32) -> Self {
        Number::Int(v.into())
    }
}

impl From<u32> for Number {
    fn from(v: u32) -> Self {
        Number::Int(v.into())
    }
}

impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Number::Real(v)
    }
}
