//! Typed, consumption-tracking access to one record's fields.

use std::str::FromStr;

use cf_core::{CoreError, CoreResult, Value};
use cf_model::ModelResult;

use crate::scanner::RawRecord;
use crate::{DeckError, DeckResult};

/// Hands out fields of a record by key and remembers which were read, so
/// anything left over can be reported as unknown.
pub(crate) struct FieldReader<'r> {
    record: &'r RawRecord,
    taken: Vec<bool>,
}

impl<'r> FieldReader<'r> {
    pub fn new(record: &'r RawRecord) -> Self {
        Self {
            record,
            taken: vec![false; record.fields.len()],
        }
    }

    pub fn line(&self) -> usize {
        self.record.line
    }

    pub fn keyword(&self) -> &str {
        &self.record.keyword
    }

    pub fn has(&self, key: &str) -> bool {
        self.record.get(key).is_some()
    }

    fn take(&mut self, key: &str) -> Option<&'r Value> {
        let record = self.record;
        let at = record.fields.iter().position(|(k, _)| k == key)?;
        self.taken[at] = true;
        Some(&record.fields[at].1)
    }

    pub fn invalid(&self, key: &'static str, source: CoreError) -> DeckError {
        DeckError::InvalidField {
            line: self.line(),
            keyword: self.keyword().to_string(),
            key,
            source,
        }
    }

    pub fn opt<T>(
        &mut self,
        key: &'static str,
        convert: impl FnOnce(&Value) -> CoreResult<T>,
    ) -> DeckResult<Option<T>> {
        match self.take(key) {
            None => Ok(None),
            Some(value) => convert(value)
                .map(Some)
                .map_err(|source| self.invalid(key, source)),
        }
    }

    pub fn req<T>(
        &mut self,
        key: &'static str,
        convert: impl FnOnce(&Value) -> CoreResult<T>,
    ) -> DeckResult<T> {
        self.opt(key, convert)?.ok_or_else(|| DeckError::MissingField {
            line: self.line(),
            keyword: self.keyword().to_string(),
            key,
        })
    }

    /// Overwrites `slot` only when the field is present; the default stays
    /// otherwise.
    pub fn fill<T>(
        &mut self,
        key: &'static str,
        slot: &mut T,
        convert: impl FnOnce(&Value) -> CoreResult<T>,
    ) -> DeckResult<()> {
        if let Some(v) = self.opt(key, convert)? {
            *slot = v;
        }
        Ok(())
    }

    /// Marks a field as read without interpreting it.
    pub fn skip(&mut self, key: &str) {
        self.take(key);
    }

    pub fn unresolved(&self, kind: &'static str, id: &str) -> DeckError {
        DeckError::UnresolvedReference {
            line: self.line(),
            keyword: self.keyword().to_string(),
            kind,
            id: id.to_string(),
        }
    }

    /// Attaches the record position to an entity construction failure.
    pub fn entity<T>(&self, built: ModelResult<T>) -> DeckResult<T> {
        built.map_err(|source| DeckError::InvalidRecord {
            line: self.line(),
            keyword: self.keyword().to_string(),
            source,
        })
    }

    /// Fails on the first field nothing asked for.
    pub fn finish(self) -> DeckResult<()> {
        match self.taken.iter().position(|t| !t) {
            None => Ok(()),
            Some(at) => Err(DeckError::UnknownField {
                line: self.line(),
                keyword: self.keyword().to_string(),
                key: self.record.fields[at].0.clone(),
            }),
        }
    }
}

/// A fixed-size list of keyword tokens, e.g. a duct's two orientations.
pub(crate) fn keyword_array<T, const N: usize>(value: &Value) -> CoreResult<[T; N]>
where
    T: FromStr<Err = &'static str>,
{
    let texts = value.to_text_array::<N>()?;
    let mut parsed = Vec::with_capacity(N);
    for text in texts {
        let token = text.parse().map_err(|expected| CoreError::InvalidKeyword {
            token: text.clone(),
            expected,
        })?;
        parsed.push(token);
    }
    parsed.try_into().map_err(|_| CoreError::Arity {
        expected: N,
        found: N,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan;
    use cf_core::Number;

    fn record(text: &str) -> RawRecord {
        scan(text).unwrap().remove(0)
    }

    #[test]
    fn leftover_fields_are_unknown() {
        let rec = record("&MATL ID = 'A' COLOUR = 'red' /");
        let mut r = FieldReader::new(&rec);
        assert_eq!(r.req("ID", Value::to_text).unwrap(), "A");
        let err = r.finish().unwrap_err();
        assert!(matches!(err, DeckError::UnknownField { ref key, .. } if key == "COLOUR"));
    }

    #[test]
    fn missing_and_invalid() {
        let rec = record("&COMP WIDTH = 'wide' /");
        let mut r = FieldReader::new(&rec);
        assert!(matches!(
            r.req("ID", Value::to_text),
            Err(DeckError::MissingField { key: "ID", .. })
        ));
        assert!(matches!(
            r.opt("WIDTH", Value::to_number),
            Err(DeckError::InvalidField { key: "WIDTH", line: 1, .. })
        ));
    }

    #[test]
    fn fill_keeps_default_when_absent() {
        let rec = record("&MATL EMISSIVITY = 0.8 /");
        let mut r = FieldReader::new(&rec);
        let mut emissivity = Number::Real(0.9);
        let mut thickness = Number::Real(0.1);
        r.fill("EMISSIVITY", &mut emissivity, Value::to_number).unwrap();
        r.fill("THICKNESS", &mut thickness, Value::to_number).unwrap();
        assert_eq!(emissivity, Number::Real(0.8));
        assert_eq!(thickness, Number::Real(0.1));
        r.finish().unwrap();
    }

    #[test]
    fn keyword_arrays() {
        use cf_model::Orientation;
        let v = Value::from(vec!["vertical", "HORIZONTAL"]);
        let pair: [Orientation; 2] = keyword_array(&v).unwrap();
        assert_eq!(pair, [Orientation::Vertical, Orientation::Horizontal]);
        assert!(keyword_array::<Orientation, 2>(&Value::from(vec!["UP", "DOWN"])).is_err());
        assert!(keyword_array::<Orientation, 2>(&Value::from("VERTICAL")).is_err());
    }
}
