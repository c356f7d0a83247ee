//! Keyed field access.
//!
//! Every entity exposes a closed list of field names. Reads hand out a
//! [`Value`]; writes go through the same validation as construction and are
//! all-or-nothing: a rejected write leaves the entity exactly as it was.

use cf_core::{CoreResult, Number, Value, check_identifier};

use crate::{ModelError, ModelResult};

pub trait Fields: Clone {
    /// Entity name used in error messages.
    const ENTITY: &'static str;

    /// Field names accepted by [`Fields::get`] and [`Fields::set`].
    fn field_names(&self) -> &'static [&'static str];

    fn get(&self, key: &str) -> ModelResult<Value>;

    /// Stores one converted value without checking cross-field invariants.
    fn assign(&mut self, key: &str, value: Value) -> ModelResult<()>;

    /// Checks every invariant of the entity.
    fn check(&self) -> ModelResult<()>;

    fn has_field(&self, key: &str) -> bool {
        self.field_names().contains(&key)
    }

    fn set(&mut self, key: &str, value: impl Into<Value>) -> ModelResult<()> {
        self.set_many([(key, value.into())])
    }

    /// Applies several writes as one; either all land or none do.
    fn set_many<'a, I>(&mut self, changes: I) -> ModelResult<()>
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        let mut next = self.clone();
        for (key, value) in changes {
            next.assign(key, value)?;
        }
        next.check()?;
        *self = next;
        Ok(())
    }
}

pub(crate) fn unknown(entity: &'static str, key: &str) -> ModelError {
    ModelError::UnknownField {
        entity,
        key: key.to_string(),
    }
}

/// Attaches entity and field context to a conversion error.
pub(crate) fn typed<T>(entity: &'static str, field: &str, result: CoreResult<T>) -> ModelResult<T> {
    result.map_err(|source| ModelError::InvalidType {
        entity,
        field: field.to_string(),
        source,
    })
}

/// Invariant checks for one entity instance.
pub(crate) struct Checker<'a> {
    entity: &'static str,
    id: &'a str,
}

impl<'a> Checker<'a> {
    pub(crate) fn new(entity: &'static str, id: &'a str) -> Self {
        Self { entity, id }
    }

    pub(crate) fn fail(&self, reason: impl Into<String>) -> ModelError {
        ModelError::invalid(self.entity, self.id, reason)
    }

    pub(crate) fn ensure(&self, cond: bool, reason: impl FnOnce() -> String) -> ModelResult<()> {
        if cond { Ok(()) } else { Err(self.fail(reason())) }
    }

    pub(crate) fn identifier(&self, field: &str, id: &str) -> ModelResult<()> {
        typed(self.entity, field, check_identifier(id))
    }

    pub(crate) fn finite(&self, field: &str, n: Number) -> ModelResult<f64> {
        typed(self.entity, field, n.ensure_finite(field)).map(Number::as_f64)
    }

    pub(crate) fn all_finite(&self, field: &str, values: &[Number]) -> ModelResult<()> {
        for n in values {
            self.finite(field, *n)?;
        }
        Ok(())
    }

    pub(crate) fn positive(&self, field: &str, n: Number) -> ModelResult<()> {
        let v = self.finite(field, n)?;
        self.ensure(v > 0.0, || format!("{field} must be positive (got {n})"))
    }

    pub(crate) fn non_negative(&self, field: &str, n: Number) -> ModelResult<()> {
        let v = self.finite(field, n)?;
        self.ensure(v >= 0.0, || format!("{field} must not be negative (got {n})"))
    }

    pub(crate) fn fraction(&self, field: &str, n: Number) -> ModelResult<()> {
        let v = self.finite(field, n)?;
        self.ensure((0.0..=1.0).contains(&v), || {
            format!("{field} must be between 0 and 1 (got {n})")
        })
    }
}
