//! Dynamically typed field values.
//!
//! `Value` is what a deck field holds before it is mapped onto a typed entity
//! field, and what keyed entity access hands out and accepts.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult, Number};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// An optional field with nothing set. Never rendered into a deck.
    Unset,
    Bool(bool),
    Num(Number),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Unset => "unset",
            Value::Bool(_) => "boolean",
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::List(_) => "list",
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Value::Unset)
    }

    /// A single-element list reads as its element; decks do not distinguish
    /// `KEY = 1` from a one-item list.
    fn scalar(&self) -> &Value {
        match self {
            Value::List(items) if items.len() == 1 => &items[0],
            other => other,
        }
    }

    fn items(&self) -> &[Value] {
        match self {
            Value::List(items) => items,
            other => core::slice::from_ref(other),
        }
    }

    fn mismatch(&self, expected: &'static str) -> CoreError {
        CoreError::TypeMismatch {
            expected,
            found: self.kind_name(),
        }
    }

    pub fn to_text(&self) -> CoreResult<String> {
        match self.scalar() {
            Value::Str(s) => Ok(s.clone()),
            other => Err(other.mismatch("string")),
        }
    }

    pub fn to_number(&self) -> CoreResult<Number> {
        match self.scalar() {
            Value::Num(n) => Ok(*n),
            other => Err(other.mismatch("number")),
        }
    }

    /// Accepts `.TRUE.`-style booleans and the bare words `T`, `F`, `TRUE`,
    /// `FALSE` in any case.
    pub fn to_bool(&self) -> CoreResult<bool> {
        match self.scalar() {
            Value::Bool(b) => Ok(*b),
            Value::Str(s) => match s.to_ascii_uppercase().trim_matches('.') {
                "T" | "TRUE" => Ok(true),
                "F" | "FALSE" => Ok(false),
                _ => Err(CoreError::TypeMismatch {
                    expected: "boolean",
                    found: "string",
                }),
            },
            other => Err(other.mismatch("boolean")),
        }
    }

    /// A string naming one member of a closed keyword set.
    pub fn to_keyword<T>(&self) -> CoreResult<T>
    where
        T: FromStr<Err = &'static str>,
    {
        let text = self.to_text()?;
        text.parse().map_err(|expected| CoreError::InvalidKeyword {
            token: text.clone(),
            expected,
        })
    }

    pub fn to_numbers(&self) -> CoreResult<Vec<Number>> {
        self.items()
            .iter()
            .map(|item| match item {
                Value::Num(n) => Ok(*n),
                other => Err(other.mismatch("number")),
            })
            .collect()
    }

    pub fn to_texts(&self) -> CoreResult<Vec<String>> {
        self.items()
            .iter()
            .map(|item| match item {
                Value::Str(s) => Ok(s.clone()),
                other => Err(other.mismatch("string")),
            })
            .collect()
    }

    pub fn to_number_array<const N: usize>(&self) -> CoreResult<[Number; N]> {
        let numbers = self.to_numbers()?;
        let found = numbers.len();
        numbers
            .try_into()
            .map_err(|_| CoreError::Arity { expected: N, found })
    }

    pub fn to_text_array<const N: usize>(&self) -> CoreResult<[String; N]> {
        let texts = self.to_texts()?;
        let found = texts.len();
        texts
            .try_into()
            .map_err(|_| CoreError::Arity { expected: N, found })
    }

    /// Nested numeric rows, e.g. a fire data table. A flat list is one row.
    pub fn to_number_rows(&self) -> CoreResult<Vec<Vec<Number>>> {
        match self {
            Value::List(items) if items.iter().all(|i| matches!(i, Value::List(_))) => {
                items.iter().map(Value::to_numbers).collect()
            }
            other => Ok(vec![other.to_numbers()?]),
        }
    }

    /// `Unset` maps to `None`, anything else through `f`.
    pub fn optional<T>(&self, f: impl FnOnce(&Value) -> CoreResult<T>) -> CoreResult<Option<T>> {
        if self.is_unset() { Ok(None) } else { f(self).map(Some) }
    }
}

impl fmt::Display for Value {
    /// Deck token form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unset => Ok(()),
            Value::Bool(true) => f.write_str(".TRUE."),
            Value::Bool(false) => f.write_str(".FALSE."),
            Value::Num(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Number> for Value {
    fn from(v: Number) -> Self {
        Value::Num(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Num(Number::Real(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Num(Number::Int(v))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Num(Number::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Str(v.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Unset, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value> + Clone> From<&[T]> for Value {
    fn from(v: &[T]) -> Self {
        Value::List(v.iter().cloned().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(v: [T; N]) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}
