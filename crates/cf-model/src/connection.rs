//! Heat conduction links between compartment surfaces.

use core::fmt;

use cf_core::{Number, Record, RecordStyle, Value};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::fields::{Checker, Fields, typed, unknown};
use crate::kinds::ConnectionType;
use crate::render::card;
use crate::ModelResult;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConnectionParams {
    #[serde(rename = "type")]
    pub conn_type: ConnectionType,
    /// Source compartment; the upper one for a floor connection.
    pub comp_id: String,
    /// Destination compartment.
    pub comp_ids: String,
    /// Share of the source wall area that conducts, `WALL` only.
    pub fraction: Option<Number>,
}

impl Default for SurfaceConnectionParams {
    fn default() -> Self {
        Self {
            conn_type: ConnectionType::Wall,
            comp_id: String::new(),
            comp_ids: String::new(),
            fraction: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SurfaceConnectionParams", into = "SurfaceConnectionParams")]
pub struct SurfaceConnection {
    params: SurfaceConnectionParams,
}

validated_entity!(SurfaceConnection, SurfaceConnectionParams);

const FIELDS: &[&str] = &["type", "comp_id", "comp_ids", "fraction"];

impl SurfaceConnection {
    pub fn wall_connection(
        comp_id: impl Into<String>,
        comp_ids: impl Into<String>,
        fraction: impl Into<Number>,
    ) -> ModelResult<Self> {
        Self::new(SurfaceConnectionParams {
            conn_type: ConnectionType::Wall,
            comp_id: comp_id.into(),
            comp_ids: comp_ids.into(),
            fraction: Some(fraction.into()),
        })
    }

    pub fn ceiling_floor_connection(
        upper: impl Into<String>,
        lower: impl Into<String>,
    ) -> ModelResult<Self> {
        Self::new(SurfaceConnectionParams {
            conn_type: ConnectionType::Floor,
            comp_id: upper.into(),
            comp_ids: lower.into(),
            fraction: None,
        })
    }

    /// `SOURCE->DEST`, used to name a connection in errors.
    pub fn label(&self) -> String {
        label(&self.params)
    }

    fn validate(p: &SurfaceConnectionParams) -> ModelResult<()> {
        let id = label(p);
        let c = Checker::new(Self::ENTITY, &id);
        c.identifier("comp_id", &p.comp_id)?;
        c.identifier("comp_ids", &p.comp_ids)?;
        c.ensure(p.comp_id != p.comp_ids, || {
            format!("cannot connect '{}' to itself", p.comp_id)
        })?;
        match (p.conn_type, p.fraction) {
            (ConnectionType::Wall, None) => Err(c.fail("a WALL connection needs a fraction")),
            (ConnectionType::Wall, Some(f)) => {
                let v = c.finite("fraction", f)?;
                c.ensure(v > 0.0 && v <= 1.0, || {
                    format!("fraction must be in (0, 1] (got {f})")
                })
            }
            (ConnectionType::Floor, _) => Ok(()),
        }
    }

    pub fn record(&self) -> Record {
        let mut rec = Record::new("CONN")
            .field("TYPE", self.conn_type.key())
            .field("COMP_ID", &self.comp_id)
            .field("COMP_IDS", &self.comp_ids);
        match self.conn_type {
            ConnectionType::Wall => rec.push("F", self.fraction),
            ConnectionType::Floor if self.fraction.is_some() => {
                warn!(connection = %self.label(), "fraction is ignored for FLOOR connections");
            }
            ConnectionType::Floor => {}
        }
        rec
    }

    pub fn to_input_string(&self) -> String {
        self.record().render(RecordStyle::Compact)
    }

    pub fn to_html(&self) -> String {
        let mut rows = vec![
            ("Type", self.conn_type.to_string()),
            ("From", self.comp_id.clone()),
            ("To", self.comp_ids.clone()),
        ];
        if let (ConnectionType::Wall, Some(f)) = (self.conn_type, self.fraction) {
            rows.push(("Fraction", f.to_string()));
        }
        card("Surface connection", &self.label(), &rows)
    }
}

fn label(p: &SurfaceConnectionParams) -> String {
    format!("{}->{}", p.comp_id, p.comp_ids)
}

impl Fields for SurfaceConnection {
    const ENTITY: &'static str = "SurfaceConnection";

    fn field_names(&self) -> &'static [&'static str] {
        FIELDS
    }

    fn get(&self, key: &str) -> ModelResult<Value> {
        let p = &self.params;
        Ok(match key {
            "type" => p.conn_type.key().into(),
            "comp_id" => p.comp_id.clone().into(),
            "comp_ids" => p.comp_ids.clone().into(),
            "fraction" => p.fraction.into(),
            _ => return Err(unknown(Self::ENTITY, key)),
        })
    }

    fn assign(&mut self, key: &str, value: Value) -> ModelResult<()> {
        let e = Self::ENTITY;
        let p = &mut self.params;
        match key {
            "type" => p.conn_type = typed(e, key, value.to_keyword())?,
            "comp_id" => p.comp_id = typed(e, key, value.to_text())?,
            "comp_ids" => p.comp_ids = typed(e, key, value.to_text())?,
            "fraction" => p.fraction = typed(e, key, value.optional(Value::to_number))?,
            _ => return Err(unknown(e, key)),
        }
        Ok(())
    }

    fn check(&self) -> ModelResult<()> {
        Self::validate(&self.params)
    }
}

impl fmt::Display for SurfaceConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.conn_type, self.fraction) {
            (ConnectionType::Wall, Some(fr)) => write!(
                f,
                "Wall connection {} → {} ({fr} of the wall)",
                self.comp_id, self.comp_ids
            ),
            _ => write!(
                f,
                "Ceiling/floor connection {} → {}",
                self.comp_id, self.comp_ids
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModelError;

    #[test]
    fn wall_record_carries_fraction() {
        let c = SurfaceConnection::wall_connection("ROOM1", "ROOM2", 0.25).unwrap();
        assert_eq!(
            c.to_input_string(),
            "&CONN TYPE = 'WALL' COMP_ID = 'ROOM1' COMP_IDS = 'ROOM2' F = 0.25 /\n"
        );
    }

    #[test]
    fn floor_record_has_no_fraction() {
        let mut c = SurfaceConnection::ceiling_floor_connection("UPPER", "LOWER").unwrap();
        assert_eq!(
            c.to_input_string(),
            "&CONN TYPE = 'FLOOR' COMP_ID = 'UPPER' COMP_IDS = 'LOWER' /\n"
        );
        c.set("fraction", 0.5).unwrap();
        assert!(!c.to_input_string().contains("F ="));
    }

    #[test]
    fn wall_fraction_bounds() {
        for bad in [0.0, 1.5, -0.2] {
            assert!(matches!(
                SurfaceConnection::wall_connection("A", "B", bad),
                Err(ModelError::InvalidValue { .. })
            ));
        }
        assert!(SurfaceConnection::wall_connection("A", "B", 1).is_ok());
    }

    #[test]
    fn switching_to_wall_needs_fraction() {
        let mut c = SurfaceConnection::ceiling_floor_connection("UPPER", "LOWER").unwrap();
        let before = c.clone();
        assert!(c.set("type", "WALL").is_err());
        assert_eq!(c, before);
        c.set_many([("type", Value::from("WALL")), ("fraction", Value::from(0.3))])
            .unwrap();
        assert!(c.to_input_string().ends_with("F = 0.3 /\n"));
    }

    #[test]
    fn self_connection_rejected() {
        assert!(SurfaceConnection::ceiling_floor_connection("A", "A").is_err());
    }
}
