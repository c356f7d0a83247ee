use core::fmt;

use cf_core::{Number, OUTSIDE, Record, RecordStyle, Value};
use serde::{Deserialize, Serialize};

use super::check_comps;
use super::control::{CONTROL_FIELDS, VentControl};
use crate::fields::{Checker, Fields, typed, unknown};
use crate::kinds::WallFace;
use crate::render::{card, join};
use crate::ModelResult;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallVentParams {
    pub id: String,
    /// The vent sits in a wall of the first compartment.
    pub comps_ids: Vec<String>,
    /// Sill height above the floor, m.
    pub bottom: Number,
    /// m.
    pub height: Number,
    /// m.
    pub width: Number,
    pub face: Option<WallFace>,
    /// Distance from the left edge of the face, m.
    pub offset: Number,
    #[serde(flatten)]
    pub control: VentControl,
}

impl Default for WallVentParams {
    fn default() -> Self {
        Self {
            id: String::new(),
            comps_ids: Vec::new(),
            bottom: Number::Int(0),
            height: Number::Int(0),
            width: Number::Int(0),
            face: None,
            offset: Number::Int(0),
            control: VentControl::default(),
        }
    }
}

impl WallVentParams {
    pub fn new(id: impl Into<String>, first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            comps_ids: vec![first.into(), second.into()],
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WallVentParams", into = "WallVentParams")]
pub struct WallVent {
    params: WallVentParams,
}

validated_entity!(WallVent, WallVentParams);

const FIELDS: &[&str] = &[
    "id",
    "comps_ids",
    "bottom",
    "height",
    "width",
    "face",
    "offset",
    CONTROL_FIELDS[0],
    CONTROL_FIELDS[1],
    CONTROL_FIELDS[2],
    CONTROL_FIELDS[3],
    CONTROL_FIELDS[4],
    CONTROL_FIELDS[5],
    CONTROL_FIELDS[6],
];

impl WallVent {
    fn validate(p: &WallVentParams) -> ModelResult<()> {
        let c = Checker::new(Self::ENTITY, &p.id);
        c.identifier("id", &p.id)?;
        check_comps(&c, &p.comps_ids)?;
        c.ensure(p.comps_ids[0] != OUTSIDE, || {
            format!("'{OUTSIDE}' cannot be the first compartment of a wall vent")
        })?;
        c.non_negative("bottom", p.bottom)?;
        c.non_negative("height", p.height)?;
        c.non_negative("width", p.width)?;
        c.non_negative("offset", p.offset)?;
        p.control.check(&c)
    }

    pub fn record(&self) -> Record {
        let mut rec = Record::new("VENT")
            .field("TYPE", "WALL")
            .field("ID", &self.id)
            .field("COMP_IDS", self.comps_ids.clone())
            .field("BOTTOM", self.bottom)
            .field("HEIGHT", self.height)
            .field("WIDTH", self.width);
        self.control.push_fields(&mut rec);
        rec.push("FACE", self.face.map(|f| f.key()));
        rec.push("OFFSET", self.offset);
        rec
    }

    pub fn to_input_string(&self) -> String {
        self.record().render(RecordStyle::Compact)
    }

    /// Opening area at full open, m².
    pub fn area(&self) -> f64 {
        self.width.as_f64() * self.height.as_f64()
    }

    pub fn to_html(&self) -> String {
        let mut rows = vec![
            ("Connects", join(&self.comps_ids)),
            (
                "Opening",
                format!("{} m wide × {} m high, sill at {} m", self.width, self.height, self.bottom),
            ),
        ];
        if let Some(face) = self.face {
            rows.push(("Face", format!("{face}, offset {} m", self.offset)));
        }
        if let Some(criterion) = self.control.open_close_criterion {
            rows.push(("Criterion", criterion.to_string()));
        }
        card("Wall vent", &self.id, &rows)
    }
}

impl Fields for WallVent {
    const ENTITY: &'static str = "WallVent";

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
            "bottom" => p.bottom.into(),
            "height" => p.height.into(),
            "width" => p.width.into(),
            "face" => p.face.map(|f| f.key()).into(),
            "offset" => p.offset.into(),
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
            "bottom" => p.bottom = typed(e, key, value.to_number())?,
            "height" => p.height = typed(e, key, value.to_number())?,
            "width" => p.width = typed(e, key, value.to_number())?,
            "face" => p.face = typed(e, key, value.optional(Value::to_keyword::<WallFace>))?,
            "offset" => p.offset = typed(e, key, value.to_number())?,
            _ => return Err(unknown(e, key)),
        }
        Ok(())
    }

    fn check(&self) -> ModelResult<()> {
        Self::validate(&self.params)
    }
}

impl fmt::Display for WallVent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wall vent '{}' ({} ↔ {}): {} × {} m, bottom {} m",
            self.id, self.comps_ids[0], self.comps_ids[1], self.width, self.height, self.bottom
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::Criterion;
    use crate::ModelError;

    fn door() -> WallVent {
        WallVent::new(WallVentParams {
            width: 1.0.into(),
            height: 2.0.into(),
            face: Some(WallFace::Front),
            offset: 0.5.into(),
            ..WallVentParams::new("DOOR", "ROOM1", "OUTSIDE")
        })
        .unwrap()
    }

    #[test]
    fn record_layout() {
        assert_eq!(
            door().to_input_string(),
            "&VENT TYPE = 'WALL' ID = 'DOOR' COMP_IDS = 'ROOM1', 'OUTSIDE' BOTTOM = 0 HEIGHT = 2.0 \
             WIDTH = 1.0 FACE = 'FRONT' OFFSET = 0.5 /\n"
        );
    }

    #[test]
    fn criterion_block_precedes_face() {
        let mut v = door();
        v.set_many([
            ("open_close_criterion", Value::from("TIME")),
            ("time", Value::from(vec![0, 60])),
            ("fraction", Value::from(vec![1, 0])),
        ])
        .unwrap();
        assert_eq!(v.control.open_close_criterion, Some(Criterion::Time));
        let text = v.to_input_string();
        assert!(text.contains(
            "CRITERION = 'TIME' PRE_FRACTION = 1 POST_FRACTION = 1 T = 0, 60 F = 1, 0 FACE = 'FRONT'"
        ));
    }

    #[test]
    fn exactly_two_compartments() {
        for comps in [vec!["ROOM1"], vec!["ROOM1", "ROOM2", "ROOM3"]] {
            let params = WallVentParams {
                comps_ids: comps.into_iter().map(String::from).collect(),
                ..WallVentParams::new("V", "A", "B")
            };
            assert!(matches!(
                WallVent::new(params),
                Err(ModelError::InvalidValue { .. })
            ));
        }
    }

    #[test]
    fn outside_cannot_come_first() {
        assert!(WallVent::new(WallVentParams::new("V", "OUTSIDE", "ROOM1")).is_err());
    }

    #[test]
    fn mismatched_schedule_rolls_back() {
        let mut v = door();
        let before = v.clone();
        let err = v
            .set_many([
                ("time", Value::from(vec![0, 60, 120])),
                ("fraction", Value::from(vec![1, 0])),
            ])
            .unwrap_err();
        assert!(err.to_string().contains("equal length"));
        assert_eq!(v, before);
    }

    #[test]
    fn bad_face_is_a_type_error() {
        let mut v = door();
        let err = v.set("face", "UP").unwrap_err();
        assert!(matches!(err, ModelError::InvalidType { .. }));
        assert_eq!(v.get("face").unwrap(), Value::from("FRONT"));
    }
}
