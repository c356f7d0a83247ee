use core::fmt;

use cf_core::{Number, Record, RecordStyle, Value};
use serde::{Deserialize, Serialize};

use super::check_comps;
use super::control::{CONTROL_FIELDS, VentControl};
use crate::fields::{Checker, Fields, typed, unknown};
use crate::kinds::{CeilingFloorKind, VentShape};
use crate::render::{card, join};
use crate::ModelResult;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CeilingFloorVentParams {
    pub id: String,
    /// Upper compartment first, then the lower one.
    pub comps_ids: Vec<String>,
    /// m².
    pub area: Number,
    #[serde(rename = "type")]
    pub vent_type: CeilingFloorKind,
    pub shape: VentShape,
    /// Kept with the vent but not written; the solver sizes these vents by area.
    pub width: Option<Number>,
    /// Position of the vent centre in the first compartment, m.
    pub offsets: [Number; 2],
    #[serde(flatten)]
    pub control: VentControl,
}

impl Default for CeilingFloorVentParams {
    fn default() -> Self {
        Self {
            id: String::new(),
            comps_ids: Vec::new(),
            area: Number::Int(0),
            vent_type: CeilingFloorKind::Floor,
            shape: VentShape::Round,
            width: None,
            offsets: [Number::Int(0), Number::Int(0)],
            control: VentControl::default(),
        }
    }
}

impl CeilingFloorVentParams {
    pub fn new(id: impl Into<String>, upper: impl Into<String>, lower: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            comps_ids: vec![upper.into(), lower.into()],
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CeilingFloorVentParams", into = "CeilingFloorVentParams")]
pub struct CeilingFloorVent {
    params: CeilingFloorVentParams,
}

validated_entity!(CeilingFloorVent, CeilingFloorVentParams);

const FIELDS: &[&str] = &[
    "id",
    "comps_ids",
    "area",
    "type",
    "shape",
    "width",
    "offsets",
    CONTROL_FIELDS[0],
    CONTROL_FIELDS[1],
    CONTROL_FIELDS[2],
    CONTROL_FIELDS[3],
    CONTROL_FIELDS[4],
    CONTROL_FIELDS[5],
    CONTROL_FIELDS[6],
];

impl CeilingFloorVent {
    fn validate(p: &CeilingFloorVentParams) -> ModelResult<()> {
        let c = Checker::new(Self::ENTITY, &p.id);
        c.identifier("id", &p.id)?;
        check_comps(&c, &p.comps_ids)?;
        c.non_negative("area", p.area)?;
        if let Some(width) = p.width {
            c.positive("width", width)?;
        }
        c.all_finite("offsets", &p.offsets)?;
        p.control.check(&c)
    }

    pub fn record(&self) -> Record {
        let mut rec = Record::new("VENT")
            .field("TYPE", self.vent_type.key())
            .field("ID", &self.id)
            .field("COMP_IDS", self.comps_ids.clone())
            .field("AREA", self.area)
            .field("SHAPE", self.shape.key());
        self.control.push_fields(&mut rec);
        rec.push("OFFSETS", self.offsets);
        rec
    }

    pub fn to_input_string(&self) -> String {
        self.record().render(RecordStyle::Compact)
    }

    pub fn to_html(&self) -> String {
        card(
            "Ceiling/floor vent",
            &self.id,
            &[
                ("Connects", join(&self.comps_ids)),
                ("Opening", format!("{} {} m² ({})", self.shape, self.area, self.vent_type)),
                ("Offsets", join(&self.offsets)),
            ],
        )
    }
}

impl Fields for CeilingFloorVent {
    const ENTITY: &'static str = "CeilingFloorVent";

    fn field_names(&self) -> &'static [&'static str] {
        FIELDS
    }

    fn get(&self, key: &str) -> ModelResult<Value> {
        if let Some(v) = self.control.get(key) {
            return Ok(v);
        }
        let p = &self.params;
        Ok(match key {
            "id" => p.id.clone().into(),
            "comps_ids" => p.comps_ids.clone().into(),
            "area" => p.area.into(),
            "type" => p.vent_type.key().into(),
            "shape" => p.shape.key().into(),
            "width" => p.width.into(),
            "offsets" => p.offsets.into(),
            _ => return Err(unknown(Self::ENTITY, key)),
        })
    }

    fn assign(&mut self, key: &str, value: Value) -> ModelResult<()> {
        let e = Self::ENTITY;
        let p = &mut self.params;
        if let Some(result) = p.control.assign(e, key, &value) {
            return result;
        }
        match key {
            "id" => p.id = typed(e, key, value.to_text())?,
            "comps_ids" => p.comps_ids = typed(e, key, value.to_texts())?,
            "area" => p.area = typed(e, key, value.to_number())?,
            "type" => p.vent_type = typed(e, key, value.to_keyword())?,
            "shape" => p.shape = typed(e, key, value.to_keyword())?,
            "width" => p.width = typed(e, key, value.optional(Value::to_number))?,
            "offsets" => p.offsets = typed(e, key, value.to_number_array())?,
            _ => return Err(unknown(e, key)),
        }
        Ok(())
    }

    fn check(&self) -> ModelResult<()> {
        Self::validate(&self.params)
    }
}

impl fmt::Display for CeilingFloorVent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} vent '{}' ({} ↔ {}): {} m², {}",
            self.vent_type,
            self.id,
            self.comps_ids[0],
            self.comps_ids[1],
            self.area,
            self.shape
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModelError;

    fn hatch() -> CeilingFloorVent {
        CeilingFloorVent::new(CeilingFloorVentParams {
            area: 1.0.into(),
            ..CeilingFloorVentParams::new("HATCH", "A", "B")
        })
        .unwrap()
    }

    #[test]
    fn default_record() {
        let text = hatch().to_input_string();
        assert_eq!(
            text,
            "&VENT TYPE = 'FLOOR' ID = 'HATCH' COMP_IDS = 'A', 'B' AREA = 1.0 SHAPE = 'ROUND' OFFSETS = 0, 0 /\n"
        );
    }

    #[test]
    fn one_or_three_compartments_rejected() {
        for comps in [vec!["A"], vec!["A", "B", "C"]] {
            let params = CeilingFloorVentParams {
                comps_ids: comps.into_iter().map(String::from).collect(),
                ..CeilingFloorVentParams::new("V", "A", "B")
            };
            assert!(matches!(
                CeilingFloorVent::new(params),
                Err(ModelError::InvalidValue { .. })
            ));
        }
    }

    #[test]
    fn rejected_writes_roll_back() {
        let mut v = hatch();
        let before = v.clone();
        assert!(v.set("comps_ids", vec!["A"]).is_err());
        assert!(v.set("time", vec![0, 10]).is_err());
        assert!(v.set("shape", "TRIANGLE").is_err());
        assert!(v.set("offsets", vec![1.0, 2.0, 3.0]).is_err());
        assert_eq!(v, before);
    }

    #[test]
    fn width_is_kept_but_not_written() {
        let mut v = hatch();
        v.set("width", 0.8).unwrap();
        assert_eq!(v.get("width").unwrap(), Value::from(0.8));
        assert!(!v.to_input_string().contains("WIDTH"));
    }

    #[test]
    fn ceiling_square_vent() {
        let mut v = hatch();
        v.set_many([("type", Value::from("ceiling")), ("shape", Value::from("SQUARE"))])
            .unwrap();
        assert!(v.to_input_string().starts_with("&VENT TYPE = 'CEILING'"));
        assert!(v.to_input_string().contains("SHAPE = 'SQUARE'"));
    }
}
