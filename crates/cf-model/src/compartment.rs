//! Compartments: the enclosed volumes of a scenario.

use core::fmt;

use cf_core::{Number, OUTSIDE, Record, RecordStyle, Value};
use serde::{Deserialize, Serialize};

use crate::fields::{Checker, Fields, typed, unknown};
use crate::render::{card, join};
use crate::ModelResult;

/// Fixed visualization grid written for every compartment.
pub const GRID: [i64; 3] = [50, 50, 50];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompartmentParams {
    pub id: String,
    /// m.
    pub width: Number,
    /// m.
    pub depth: Number,
    /// m.
    pub height: Number,
    pub ceiling_mat_id: Option<String>,
    pub ceiling_thickness: Option<Number>,
    pub wall_mat_id: Option<String>,
    pub wall_thickness: Option<Number>,
    pub floor_mat_id: Option<String>,
    pub floor_thickness: Option<Number>,
    pub origin_x: Number,
    pub origin_y: Number,
    pub origin_z: Number,
    /// Single well-mixed layer for tall spaces.
    pub shaft: bool,
    /// Corridor flow model.
    pub hall: bool,
    /// Wall and floor leakage area ratios.
    pub leak_area_ratio: Option<[Number; 2]>,
    pub cross_sect_areas: Option<Vec<Number>>,
    pub cross_sect_heights: Option<Vec<Number>>,
}

impl Default for CompartmentParams {
    fn default() -> Self {
        Self {
            id: String::new(),
            width: Number::Real(3.6),
            depth: Number::Real(2.4),
            height: Number::Real(2.4),
            ceiling_mat_id: None,
            ceiling_thickness: None,
            wall_mat_id: None,
            wall_thickness: None,
            floor_mat_id: None,
            floor_thickness: None,
            origin_x: Number::Int(0),
            origin_y: Number::Int(0),
            origin_z: Number::Int(0),
            shaft: false,
            hall: false,
            leak_area_ratio: None,
            cross_sect_areas: None,
            cross_sect_heights: None,
        }
    }
}

impl CompartmentParams {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CompartmentParams", into = "CompartmentParams")]
pub struct Compartment {
    params: CompartmentParams,
}

validated_entity!(Compartment, CompartmentParams);

const FIELDS: &[&str] = &[
    "id",
    "width",
    "depth",
    "height",
    "ceiling_mat_id",
    "ceiling_thickness",
    "wall_mat_id",
    "wall_thickness",
    "floor_mat_id",
    "floor_thickness",
    "origin_x",
    "origin_y",
    "origin_z",
    "shaft",
    "hall",
    "leak_area_ratio",
    "cross_sect_areas",
    "cross_sect_heights",
];

impl Compartment {
    fn validate(p: &CompartmentParams) -> ModelResult<()> {
        let c = Checker::new(Self::ENTITY, &p.id);
        c.identifier("id", &p.id)?;
        c.ensure(p.id != OUTSIDE, || format!("'{OUTSIDE}' is reserved for the exterior"))?;
        c.positive("width", p.width)?;
        c.positive("depth", p.depth)?;
        c.positive("height", p.height)?;
        for (surface, mat, thickness) in p.surfaces() {
            if let Some(mat) = mat {
                c.identifier(surface, mat)?;
            }
            if let Some(t) = thickness {
                c.ensure(mat.is_some(), || {
                    format!("{surface} thickness given without a {surface} material")
                })?;
                c.positive(&format!("{surface}_thickness"), t)?;
            }
        }
        c.all_finite("origin", &[p.origin_x, p.origin_y, p.origin_z])?;
        c.ensure(!(p.shaft && p.hall), || {
            "a compartment cannot be both a shaft and a hall".to_string()
        })?;
        if let Some(ratios) = &p.leak_area_ratio {
            for r in ratios {
                c.non_negative("leak_area_ratio", *r)?;
            }
        }
        match (&p.cross_sect_areas, &p.cross_sect_heights) {
            (None, None) => {}
            (Some(areas), Some(heights)) => {
                c.ensure(areas.len() == heights.len(), || {
                    format!(
                        "cross_sect_areas and cross_sect_heights must have equal length ({} vs {})",
                        areas.len(),
                        heights.len()
                    )
                })?;
                c.all_finite("cross_sect_areas", areas)?;
                c.all_finite("cross_sect_heights", heights)?;
            }
            _ => {
                return Err(c.fail(
                    "cross_sect_areas and cross_sect_heights must be given together",
                ));
            }
        }
        Ok(())
    }

    pub fn record(&self) -> Record {
        let mut rec = Record::new("COMP")
            .field("ID", &self.id)
            .field("DEPTH", self.depth)
            .field("HEIGHT", self.height)
            .field("WIDTH", self.width);
        if self.shaft {
            rec.push("SHAFT", true);
        } else if self.hall {
            rec.push("HALL", true);
        }
        for (key, (_, mat, thickness)) in ["CEILING", "WALL", "FLOOR"].iter().zip(self.surfaces()) {
            if let Some(mat) = mat {
                rec.push(&format!("{key}_MATL_ID"), mat);
                rec.push(&format!("{key}_THICKNESS"), thickness);
            }
        }
        rec.push("CROSS_SECT_AREAS", self.cross_sect_areas.clone());
        rec.push("CROSS_SECT_HEIGHTS", self.cross_sect_heights.clone());
        rec.push("ORIGIN", [self.origin_x, self.origin_y, self.origin_z]);
        rec.push("GRID", GRID.to_vec());
        rec.push("LEAK_AREA_RATIO", self.leak_area_ratio);
        rec
    }

    pub fn to_input_string(&self) -> String {
        self.record().render(RecordStyle::Compact)
    }

    pub fn volume(&self) -> f64 {
        self.width.as_f64() * self.depth.as_f64() * self.height.as_f64()
    }

    pub fn to_html(&self) -> String {
        let mut rows = vec![
            (
                "Size",
                format!("{} × {} × {} m", self.width, self.depth, self.height),
            ),
            ("Volume", format!("{:.1} m³", self.volume())),
            (
                "Origin",
                format!("({}, {}, {})", self.origin_x, self.origin_y, self.origin_z),
            ),
        ];
        let materials: Vec<String> = self
            .surfaces()
            .iter()
            .filter_map(|(surface, mat, _)| mat.map(|m| format!("{surface}: {m}")))
            .collect();
        if !materials.is_empty() {
            rows.push(("Materials", join(&materials)));
        }
        if self.shaft {
            rows.push(("Flow model", "shaft".to_string()));
        } else if self.hall {
            rows.push(("Flow model", "hall".to_string()));
        }
        card("Compartment", &self.id, &rows)
    }
}

impl CompartmentParams {
    /// `(surface, material id, thickness)` for ceiling, wall and floor.
    pub fn surfaces(&self) -> [(&'static str, Option<&str>, Option<Number>); 3] {
        [
            ("ceiling", self.ceiling_mat_id.as_deref(), self.ceiling_thickness),
            ("wall", self.wall_mat_id.as_deref(), self.wall_thickness),
            ("floor", self.floor_mat_id.as_deref(), self.floor_thickness),
        ]
    }
}

impl Fields for Compartment {
    const ENTITY: &'static str = "Compartment";

    fn field_names(&self) -> &'static [&'static str] {
        FIELDS
    }

    fn get(&self, key: &str) -> ModelResult<Value> {
        let p = &self.params;
        Ok(match key {
            "id" => p.id.clone().into(),
            "width" => p.width.into(),
            "depth" => p.depth.into(),
            "height" => p.height.into(),
            "ceiling_mat_id" => p.ceiling_mat_id.clone().into(),
            "ceiling_thickness" => p.ceiling_thickness.into(),
            "wall_mat_id" => p.wall_mat_id.clone().into(),
            "wall_thickness" => p.wall_thickness.into(),
            "floor_mat_id" => p.floor_mat_id.clone().into(),
            "floor_thickness" => p.floor_thickness.into(),
            "origin_x" => p.origin_x.into(),
            "origin_y" => p.origin_y.into(),
            "origin_z" => p.origin_z.into(),
            "shaft" => p.shaft.into(),
            "hall" => p.hall.into(),
            "leak_area_ratio" => p.leak_area_ratio.into(),
            "cross_sect_areas" => p.cross_sect_areas.clone().into(),
            "cross_sect_heights" => p.cross_sect_heights.clone().into(),
            _ => return Err(unknown(Self::ENTITY, key)),
        })
    }

    fn assign(&mut self, key: &str, value: Value) -> ModelResult<()> {
        let e = Self::ENTITY;
        let p = &mut self.params;
        let number = |v: &Value| typed(e, key, v.to_number());
        let optional_number = |v: &Value| typed(e, key, v.optional(Value::to_number));
        let optional_text = |v: &Value| typed(e, key, v.optional(Value::to_text));
        match key {
            "id" => p.id = typed(e, key, value.to_text())?,
            "width" => p.width = number(&value)?,
            "depth" => p.depth = number(&value)?,
            "height" => p.height = number(&value)?,
            "ceiling_mat_id" => p.ceiling_mat_id = optional_text(&value)?,
            "ceiling_thickness" => p.ceiling_thickness = optional_number(&value)?,
            "wall_mat_id" => p.wall_mat_id = optional_text(&value)?,
            "wall_thickness" => p.wall_thickness = optional_number(&value)?,
            "floor_mat_id" => p.floor_mat_id = optional_text(&value)?,
            "floor_thickness" => p.floor_thickness = optional_number(&value)?,
            "origin_x" => p.origin_x = number(&value)?,
            "origin_y" => p.origin_y = number(&value)?,
            "origin_z" => p.origin_z = number(&value)?,
            "shaft" => p.shaft = typed(e, key, value.to_bool())?,
            "hall" => p.hall = typed(e, key, value.to_bool())?,
            "leak_area_ratio" => {
                p.leak_area_ratio = typed(e, key, value.optional(Value::to_number_array::<2>))?
            }
            "cross_sect_areas" => {
                p.cross_sect_areas = typed(e, key, value.optional(Value::to_numbers))?
            }
            "cross_sect_heights" => {
                p.cross_sect_heights = typed(e, key, value.optional(Value::to_numbers))?
            }
            _ => return Err(unknown(e, key)),
        }
        Ok(())
    }

    fn check(&self) -> ModelResult<()> {
        Self::validate(&self.params)
    }
}

impl fmt::Display for Compartment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Compartment '{}' ({} × {} × {} m, volume {:.2} m³)",
            self.id,
            self.width,
            self.depth,
            self.height,
            self.volume()
        )
    }
}
