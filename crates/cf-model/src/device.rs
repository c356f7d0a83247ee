//! Sensors and targets.
//!
//! A device sits at a point in one compartment. Targets measure surface
//! temperature and flux; detectors and sprinklers activate at a set point.
//! Each kind carries its own fields, so devices are built through the
//! per-kind factories.

use core::fmt;

use cf_core::{Number, Record, RecordStyle, Value};
use serde::{Deserialize, Serialize};

use crate::fields::{Checker, Fields, typed, unknown};
use crate::kinds::{DepthUnits, TargetShape};
use crate::render::{card, join};
use crate::{ModelError, ModelResult};

/// How a target faces: an explicit normal or a named surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetOrientation {
    Normal([Number; 3]),
    Surface(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub shape: TargetShape,
    pub material_id: String,
    /// Exactly one orientation is required; `None` only while editing.
    pub orientation: Option<TargetOrientation>,
    /// m.
    pub thickness: Option<Number>,
    pub temperature_depth: Number,
    pub depth_units: DepthUnits,
}

impl Target {
    pub fn new(shape: TargetShape, material_id: impl Into<String>, orientation: TargetOrientation) -> Self {
        Self {
            shape,
            material_id: material_id.into(),
            orientation: Some(orientation),
            thickness: None,
            temperature_depth: Number::Real(0.5),
            depth_units: DepthUnits::Meters,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeviceKind {
    Target(Target),
    HeatDetector {
        /// °C.
        setpoint: Number,
        /// (m·s)^½.
        rti: Number,
    },
    SmokeDetector {
        /// %/m.
        obscuration: Number,
    },
    Sprinkler {
        setpoint: Number,
        rti: Number,
        /// mm/s.
        spray_density: Number,
    },
}

impl DeviceKind {
    /// Default smoke detector obscuration, %/m.
    pub const DEFAULT_OBSCURATION: f64 = 23.93;

    /// `TYPE` token of the `&DEVC` record.
    pub fn key(&self) -> &'static str {
        match self {
            DeviceKind::Target(t) => t.shape.key(),
            DeviceKind::HeatDetector { .. } => "HEAT_DETECTOR",
            DeviceKind::SmokeDetector { .. } => "SMOKE_DETECTOR",
            DeviceKind::Sprinkler { .. } => "SPRINKLER",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            DeviceKind::Target(_) => "Target",
            DeviceKind::HeatDetector { .. } => "Heat detector",
            DeviceKind::SmokeDetector { .. } => "Smoke detector",
            DeviceKind::Sprinkler { .. } => "Sprinkler",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceParams {
    pub id: String,
    pub comp_id: String,
    /// x, y, z in the compartment, m.
    pub location: [Number; 3],
    #[serde(flatten)]
    pub kind: DeviceKind,
    #[serde(default)]
    pub adiabatic: bool,
    #[serde(default)]
    pub convection_coefficients: Option<Vec<Number>>,
}

impl DeviceParams {
    pub fn new(
        id: impl Into<String>,
        comp_id: impl Into<String>,
        location: [Number; 3],
        kind: DeviceKind,
    ) -> Self {
        Self {
            id: id.into(),
            comp_id: comp_id.into(),
            location,
            kind,
            adiabatic: false,
            convection_coefficients: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DeviceParams", into = "DeviceParams")]
pub struct Device {
    params: DeviceParams,
}

validated_entity!(Device, DeviceParams);

const TARGET_FIELDS: &[&str] = &[
    "id",
    "comp_id",
    "location",
    "type",
    "material_id",
    "surface_orientation",
    "normal",
    "thickness",
    "temperature_depth",
    "depth_units",
    "adiabatic",
    "convection_coefficients",
];

const HEAT_FIELDS: &[&str] = &[
    "id",
    "comp_id",
    "location",
    "type",
    "setpoint",
    "rti",
    "adiabatic",
    "convection_coefficients",
];

const SMOKE_FIELDS: &[&str] = &[
    "id",
    "comp_id",
    "location",
    "type",
    "obscuration",
    "adiabatic",
    "convection_coefficients",
];

const SPRINKLER_FIELDS: &[&str] = &[
    "id",
    "comp_id",
    "location",
    "type",
    "setpoint",
    "rti",
    "spray_density",
    "adiabatic",
    "convection_coefficients",
];

impl Device {
    pub fn target(
        id: impl Into<String>,
        comp_id: impl Into<String>,
        location: [Number; 3],
        target: Target,
    ) -> ModelResult<Self> {
        Self::new(DeviceParams::new(id, comp_id, location, DeviceKind::Target(target)))
    }

    pub fn heat_detector(
        id: impl Into<String>,
        comp_id: impl Into<String>,
        location: [Number; 3],
        setpoint: impl Into<Number>,
        rti: impl Into<Number>,
    ) -> ModelResult<Self> {
        let kind = DeviceKind::HeatDetector {
            setpoint: setpoint.into(),
            rti: rti.into(),
        };
        Self::new(DeviceParams::new(id, comp_id, location, kind))
    }

    /// Obscuration defaults to [`DeviceKind::DEFAULT_OBSCURATION`].
    pub fn smoke_detector(
        id: impl Into<String>,
        comp_id: impl Into<String>,
        location: [Number; 3],
        obscuration: Option<Number>,
    ) -> ModelResult<Self> {
        let kind = DeviceKind::SmokeDetector {
            obscuration: obscuration.unwrap_or(Number::Real(DeviceKind::DEFAULT_OBSCURATION)),
        };
        Self::new(DeviceParams::new(id, comp_id, location, kind))
    }

    pub fn sprinkler(
        id: impl Into<String>,
        comp_id: impl Into<String>,
        location: [Number; 3],
        setpoint: impl Into<Number>,
        rti: impl Into<Number>,
        spray_density: impl Into<Number>,
    ) -> ModelResult<Self> {
        let kind = DeviceKind::Sprinkler {
            setpoint: setpoint.into(),
            rti: rti.into(),
            spray_density: spray_density.into(),
        };
        Self::new(DeviceParams::new(id, comp_id, location, kind))
    }

    /// Target material, if this device is a target.
    pub fn material_id(&self) -> Option<&str> {
        match &self.kind {
            DeviceKind::Target(t) => Some(&t.material_id),
            _ => None,
        }
    }

    fn validate(p: &DeviceParams) -> ModelResult<()> {
        let c = Checker::new(Self::ENTITY, &p.id);
        c.identifier("id", &p.id)?;
        c.identifier("comp_id", &p.comp_id)?;
        c.all_finite("location", &p.location)?;
        match &p.kind {
            DeviceKind::Target(t) => {
                c.identifier("material_id", &t.material_id)?;
                match &t.orientation {
                    None => {
                        return Err(
                            c.fail("a target needs either a normal or a surface_orientation")
                        );
                    }
                    Some(TargetOrientation::Normal(n)) => {
                        c.all_finite("normal", n)?;
                        c.ensure(n.iter().any(|v| v.as_f64() != 0.0), || {
                            "normal must not be the zero vector".to_string()
                        })?;
                    }
                    Some(TargetOrientation::Surface(s)) => {
                        c.ensure(!s.trim().is_empty() && !s.contains('\''), || {
                            format!("invalid surface_orientation '{s}'")
                        })?;
                    }
                }
                if let Some(th) = t.thickness {
                    c.positive("thickness", th)?;
                }
                c.non_negative("temperature_depth", t.temperature_depth)?;
                if t.depth_units == DepthUnits::Fraction {
                    c.fraction("temperature_depth", t.temperature_depth)?;
                }
            }
            DeviceKind::HeatDetector { setpoint, rti } => {
                c.finite("setpoint", *setpoint)?;
                c.positive("rti", *rti)?;
            }
            DeviceKind::SmokeDetector { obscuration } => {
                c.positive("obscuration", *obscuration)?;
            }
            DeviceKind::Sprinkler {
                setpoint,
                rti,
                spray_density,
            } => {
                c.finite("setpoint", *setpoint)?;
                c.positive("rti", *rti)?;
                c.positive("spray_density", *spray_density)?;
            }
        }
        if let Some(coeffs) = &p.convection_coefficients {
            c.ensure(!coeffs.is_empty(), || {
                "convection_coefficients must not be empty".to_string()
            })?;
            for h in coeffs {
                c.non_negative("convection_coefficients", *h)?;
            }
        }
        Ok(())
    }

    pub fn record(&self) -> Record {
        let mut rec = Record::new("DEVC")
            .field("ID", &self.id)
            .field("COMP_ID", &self.comp_id)
            .field("LOCATION", self.location)
            .field("TYPE", self.kind.key());
        match &self.kind {
            DeviceKind::Target(t) => {
                rec.push("MATL_ID", &t.material_id);
                match &t.orientation {
                    Some(TargetOrientation::Surface(s)) => rec.push("SURFACE_ORIENTATION", s),
                    Some(TargetOrientation::Normal(n)) => rec.push("NORMAL", *n),
                    None => {}
                }
                rec.push("THICKNESS", t.thickness);
                rec.push("TEMPERATURE_DEPTH", t.temperature_depth);
                rec.push("DEPTH_UNITS", t.depth_units.key());
            }
            DeviceKind::HeatDetector { setpoint, rti } => {
                rec.push("SETPOINT", *setpoint);
                rec.push("RTI", *rti);
            }
            DeviceKind::SmokeDetector { obscuration } => {
                rec.push("SETPOINTS", [*obscuration, *obscuration]);
            }
            DeviceKind::Sprinkler {
                setpoint,
                rti,
                spray_density,
            } => {
                rec.push("SETPOINT", *setpoint);
                rec.push("RTI", *rti);
                rec.push("SPRAY_DENSITY", *spray_density);
            }
        }
        if self.adiabatic {
            rec.push("ADIABATIC_TARGET", true);
        }
        rec.push("CONVECTION_COEFFICIENTS", self.convection_coefficients.clone());
        rec
    }

    pub fn to_input_string(&self) -> String {
        self.record().render(RecordStyle::Compact)
    }

    pub fn to_html(&self) -> String {
        let mut rows = vec![
            ("Type", self.kind.key().to_string()),
            ("Compartment", self.comp_id.clone()),
            ("Location", format!("{} m", join(&self.location))),
        ];
        match &self.kind {
            DeviceKind::Target(t) => {
                rows.push(("Material", t.material_id.clone()));
                rows.push((
                    "Depth",
                    format!("{} {}", t.temperature_depth, t.depth_units),
                ));
            }
            DeviceKind::HeatDetector { setpoint, rti } => {
                rows.push(("Set point", format!("{setpoint} °C")));
                rows.push(("RTI", rti.to_string()));
            }
            DeviceKind::SmokeDetector { obscuration } => {
                rows.push(("Obscuration", format!("{obscuration} %/m")));
            }
            DeviceKind::Sprinkler {
                setpoint,
                rti,
                spray_density,
            } => {
                rows.push(("Set point", format!("{setpoint} °C")));
                rows.push(("RTI", rti.to_string()));
                rows.push(("Spray density", format!("{spray_density} mm/s")));
            }
        }
        card(self.kind.label(), &self.id, &rows)
    }
}

impl Fields for Device {
    const ENTITY: &'static str = "Device";

    fn field_names(&self) -> &'static [&'static str] {
        match self.kind {
            DeviceKind::Target(_) => TARGET_FIELDS,
            DeviceKind::HeatDetector { .. } => HEAT_FIELDS,
            DeviceKind::SmokeDetector { .. } => SMOKE_FIELDS,
            DeviceKind::Sprinkler { .. } => SPRINKLER_FIELDS,
        }
    }

    fn get(&self, key: &str) -> ModelResult<Value> {
        let p = &self.params;
        match key {
            "id" => return Ok(p.id.clone().into()),
            "comp_id" => return Ok(p.comp_id.clone().into()),
            "location" => return Ok(p.location.into()),
            "type" => return Ok(p.kind.key().into()),
            "adiabatic" => return Ok(p.adiabatic.into()),
            "convection_coefficients" => return Ok(p.convection_coefficients.clone().into()),
            _ => {}
        }
        let value = match (&p.kind, key) {
            (DeviceKind::Target(t), "material_id") => t.material_id.clone().into(),
            (DeviceKind::Target(t), "surface_orientation") => match &t.orientation {
                Some(TargetOrientation::Surface(s)) => s.clone().into(),
                _ => Value::Unset,
            },
            (DeviceKind::Target(t), "normal") => match &t.orientation {
                Some(TargetOrientation::Normal(n)) => (*n).into(),
                _ => Value::Unset,
            },
            (DeviceKind::Target(t), "thickness") => t.thickness.into(),
            (DeviceKind::Target(t), "temperature_depth") => t.temperature_depth.into(),
            (DeviceKind::Target(t), "depth_units") => t.depth_units.key().into(),
            (
                DeviceKind::HeatDetector { setpoint, .. } | DeviceKind::Sprinkler { setpoint, .. },
                "setpoint",
            ) => (*setpoint).into(),
            (
                DeviceKind::HeatDetector { rti, .. } | DeviceKind::Sprinkler { rti, .. },
                "rti",
            ) => (*rti).into(),
            (DeviceKind::SmokeDetector { obscuration }, "obscuration") => (*obscuration).into(),
            (DeviceKind::Sprinkler { spray_density, .. }, "spray_density") => {
                (*spray_density).into()
            }
            _ => return Err(unknown(Self::ENTITY, key)),
        };
        Ok(value)
    }

    fn assign(&mut self, key: &str, value: Value) -> ModelResult<()> {
        let e = Self::ENTITY;
        if !self.has_field(key) {
            return Err(unknown(e, key));
        }
        let p = &mut self.params;
        match key {
            "id" => p.id = typed(e, key, value.to_text())?,
            "comp_id" => p.comp_id = typed(e, key, value.to_text())?,
            "location" => p.location = typed(e, key, value.to_number_array())?,
            "adiabatic" => p.adiabatic = typed(e, key, value.to_bool())?,
            "convection_coefficients" => {
                p.convection_coefficients = typed(e, key, value.optional(Value::to_numbers))?
            }
            "type" => {
                let id = p.id.clone();
                let token = typed(e, key, value.to_text())?.to_uppercase();
                match &mut p.kind {
                    DeviceKind::Target(t) => {
                        t.shape = token.parse::<TargetShape>().map_err(|_| {
                            ModelError::invalid(
                                e,
                                &id,
                                format!("a target can only change between PLATE and CYLINDER, not to {token}"),
                            )
                        })?;
                    }
                    kind if kind.key() == token => {}
                    kind => {
                        return Err(ModelError::invalid(
                            e,
                            &id,
                            format!("cannot change a {} into {token}; use the factory for that kind", kind.key()),
                        ));
                    }
                }
            }
            _ => match &mut p.kind {
                DeviceKind::Target(t) => match key {
                    "material_id" => t.material_id = typed(e, key, value.to_text())?,
                    "surface_orientation" => {
                        match typed(e, key, value.optional(Value::to_text))? {
                            Some(s) => t.orientation = Some(TargetOrientation::Surface(s)),
                            None if matches!(t.orientation, Some(TargetOrientation::Surface(_))) => {
                                t.orientation = None
                            }
                            None => {}
                        }
                    }
                    "normal" => match typed(e, key, value.optional(Value::to_number_array::<3>))? {
                        Some(n) => t.orientation = Some(TargetOrientation::Normal(n)),
                        None if matches!(t.orientation, Some(TargetOrientation::Normal(_))) => {
                            t.orientation = None
                        }
                        None => {}
                    },
                    "thickness" => t.thickness = typed(e, key, value.optional(Value::to_number))?,
                    "temperature_depth" => t.temperature_depth = typed(e, key, value.to_number())?,
                    "depth_units" => t.depth_units = typed(e, key, value.to_keyword())?,
                    _ => return Err(unknown(e, key)),
                },
                DeviceKind::HeatDetector { setpoint, rti } => match key {
                    "setpoint" => *setpoint = typed(e, key, value.to_number())?,
                    "rti" => *rti = typed(e, key, value.to_number())?,
                    _ => return Err(unknown(e, key)),
                },
                DeviceKind::SmokeDetector { obscuration } => match key {
                    "obscuration" => *obscuration = typed(e, key, value.to_number())?,
                    _ => return Err(unknown(e, key)),
                },
                DeviceKind::Sprinkler {
                    setpoint,
                    rti,
                    spray_density,
                } => match key {
                    "setpoint" => *setpoint = typed(e, key, value.to_number())?,
                    "rti" => *rti = typed(e, key, value.to_number())?,
                    "spray_density" => *spray_density = typed(e, key, value.to_number())?,
                    _ => return Err(unknown(e, key)),
                },
            },
        }
        Ok(())
    }

    fn check(&self) -> ModelResult<()> {
        Self::validate(&self.params)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' ({}) in '{}' at ({})",
            self.kind.label(),
            self.id,
            self.kind.key(),
            self.comp_id,
            join(&self.location)
        )?;
        match &self.kind {
            DeviceKind::Target(t) => write!(f, ", material {}", t.material_id),
            DeviceKind::HeatDetector { setpoint, .. } | DeviceKind::Sprinkler { setpoint, .. } => {
                write!(f, ", set point {setpoint} °C")
            }
            DeviceKind::SmokeDetector { obscuration } => write!(f, ", {obscuration} %/m"),
        }
    }
}
