use core::fmt;

use cf_core::{CoreError, Number, Record, RecordStyle, Value};
use serde::{Deserialize, Serialize};

use super::check_comps;
use super::control::{CONTROL_FIELDS, VentControl};
use crate::fields::{Checker, Fields, typed, unknown};
use crate::kinds::Orientation;
use crate::render::{card, join};
use crate::ModelResult;

/// Per-end values are indexed like `comps_ids`: `[0]` is the first
/// compartment's end of the duct, `[1]` the second's.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MechanicalVentParams {
    pub id: String,
    pub comps_ids: Vec<String>,
    /// Duct opening area at each end, m².
    pub area: [Number; 2],
    /// Height of each end above its compartment floor, m.
    pub heights: [Number; 2],
    pub orientations: [Orientation; 2],
    /// Volume flow, m³/s.
    pub flow: Number,
    /// Pressures where the fan starts and finishes dropping off, Pa.
    pub cutoffs: [Number; 2],
    pub offsets: [Number; 2],
    /// s.
    pub filter_time: Number,
    /// Percent.
    pub filter_efficiency: Number,
    #[serde(flatten)]
    pub control: VentControl,
}

impl Default for MechanicalVentParams {
    fn default() -> Self {
        Self {
            id: String::new(),
            comps_ids: Vec::new(),
            area: [Number::Int(0), Number::Int(0)],
            heights: [Number::Int(0), Number::Int(0)],
            orientations: [Orientation::Vertical, Orientation::Vertical],
            flow: Number::Int(0),
            cutoffs: [Number::Int(200), Number::Int(300)],
            offsets: [Number::Int(0), Number::Int(0)],
            filter_time: Number::Int(0),
            filter_efficiency: Number::Int(0),
            control: VentControl::default(),
        }
    }
}

impl MechanicalVentParams {
    pub fn new(id: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            comps_ids: vec![from.into(), to.into()],
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MechanicalVentParams", into = "MechanicalVentParams")]
pub struct MechanicalVent {
    params: MechanicalVentParams,
}

validated_entity!(MechanicalVent, MechanicalVentParams);

const FIELDS: &[&str] = &[
    "id",
    "comps_ids",
    "area",
    "heights",
    "orientations",
    "flow",
    "cutoffs",
    "offsets",
    "filter_time",
    "filter_efficiency",
    CONTROL_FIELDS[0],
    CONTROL_FIELDS[1],
    CONTROL_FIELDS[2],
    CONTROL_FIELDS[3],
    CONTROL_FIELDS[4],
    CONTROL_FIELDS[5],
    CONTROL_FIELDS[6],
];

fn orientations(value: &Value) -> Result<[Orientation; 2], CoreError> {
    let [a, b] = value.to_text_array::<2>()?;
    let parse = |token: String| {
        token
            .parse::<Orientation>()
            .map_err(|expected| CoreError::InvalidKeyword { token, expected })
    };
    Ok([parse(a)?, parse(b)?])
}

impl MechanicalVent {
    fn validate(p: &MechanicalVentParams) -> ModelResult<()> {
        let c = Checker::new(Self::ENTITY, &p.id);
        c.identifier("id", &p.id)?;
        check_comps(&c, &p.comps_ids)?;
        for a in p.area {
            c.non_negative("area", a)?;
        }
        c.all_finite("heights", &p.heights)?;
        c.finite("flow", p.flow)?;
        for cutoff in p.cutoffs {
            c.non_negative("cutoffs", cutoff)?;
        }
        c.ensure(p.cutoffs[1].as_f64() >= p.cutoffs[0].as_f64(), || {
            format!(
                "cutoffs must not decrease ({} then {})",
                p.cutoffs[0], p.cutoffs[1]
            )
        })?;
        c.all_finite("offsets", &p.offsets)?;
        c.non_negative("filter_time", p.filter_time)?;
        let eff = c.finite("filter_efficiency", p.filter_efficiency)?;
        c.ensure((0.0..=100.0).contains(&eff), || {
            format!("filter_efficiency must be a percentage (got {eff})")
        })?;
        p.control.check(&c)
    }

    pub fn record(&self) -> Record {
        let mut rec = Record::new("VENT")
            .field("TYPE", "MECHANICAL")
            .field("ID", &self.id)
            .field("COMP_IDS", self.comps_ids.clone())
            .field("AREAS", self.area)
            .field("HEIGHTS", self.heights)
            .field("ORIENTATIONS", self.orientations.map(|o| o.key()))
            .field("FLOW", self.flow)
            .field("CUTOFFS", self.cutoffs)
            .field("OFFSETS", self.offsets);
        self.control.push_fields(&mut rec);
        rec.push("FILTER_TIME", self.filter_time);
        rec.push("FILTER_EFFICIENCY", self.filter_efficiency);
        rec
    }

    pub fn to_input_string(&self) -> String {
        self.record().render(RecordStyle::Compact)
    }

    pub fn to_html(&self) -> String {
        card(
            "Mechanical vent",
            &self.id,
            &[
                ("Connects", join(&self.comps_ids)),
                ("Flow", format!("{} m³/s", self.flow)),
                ("Areas", format!("{} m²", join(&self.area))),
                ("Cutoffs", format!("{} Pa", join(&self.cutoffs))),
            ],
        )
    }
}

impl Fields for MechanicalVent {
    const ENTITY: &'static str = "MechanicalVent";

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
            "heights" => p.heights.into(),
            "orientations" => p.orientations.map(|o| o.key()).into(),
            "flow" => p.flow.into(),
            "cutoffs" => p.cutoffs.into(),
            "offsets" => p.offsets.into(),
            "filter_time" => p.filter_time.into(),
            "filter_efficiency" => p.filter_efficiency.into(),
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
            "area" => p.area = typed(e, key, value.to_number_array())?,
            "heights" => p.heights = typed(e, key, value.to_number_array())?,
            "orientations" => p.orientations = typed(e, key, orientations(&value))?,
            "flow" => p.flow = typed(e, key, value.to_number())?,
            "cutoffs" => p.cutoffs = typed(e, key, value.to_number_array())?,
            "offsets" => p.offsets = typed(e, key, value.to_number_array())?,
            "filter_time" => p.filter_time = typed(e, key, value.to_number())?,
            "filter_efficiency" => p.filter_efficiency = typed(e, key, value.to_number())?,
            _ => return Err(unknown(e, key)),
        }
        Ok(())
    }

    fn check(&self) -> ModelResult<()> {
        Self::validate(&self.params)
    }
}

impl fmt::Display for MechanicalVent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Mechanical vent '{}' ({} → {}): {} m³/s",
            self.id, self.comps_ids[0], self.comps_ids[1], self.flow
        )
    }
}
