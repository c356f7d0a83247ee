//! Deck parser: rebuilds a [`CfastModel`] from deck text in one forward
//! pass.
//!
//! Records are read in source order. Materials and compartments must be
//! declared before anything that names them. Fire instances are held until
//! the end of the deck so that their `&CHEM` and `&TABL` records, which may
//! follow any instance sharing the definition, can be folded in.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use cf_core::{CoreError, MATERIAL_OFF, Number, OUTSIDE, Record, Value};
use cf_model::{
    CeilingFloorKind, CeilingFloorVent, CeilingFloorVentParams, CfastModel, Compartment,
    CompartmentParams, ConnectionType, Criterion, DepthUnits, Device, DeviceKind, DeviceParams,
    Fire, FireParams, FireRow, Material, MaterialParams, MechanicalVent, MechanicalVentParams,
    SimulationEnvironment, SimulationEnvironmentParams, SurfaceConnection,
    SurfaceConnectionParams, Target, TargetOrientation, TargetShape, Vent, VentControl, VentKind,
    VentShape, WallFace, WallVent, WallVentParams,
};
use tracing::{debug, info, warn};

use crate::reader::{FieldReader, keyword_array};
use crate::scanner::{RawRecord, scan};
use crate::{DeckError, DeckResult};

/// Parses deck text. The model keeps the default file name.
pub fn parse_str(text: &str) -> DeckResult<CfastModel> {
    let records = scan(text)?;
    debug!(records = records.len(), "scanned deck");
    let mut state = DeckState::default();
    for raw in &records {
        state.record(raw)?;
    }
    let model = state.into_model()?;
    info!(
        compartments = model.compartments().len(),
        fires = model.fires().len(),
        devices = model.devices().len(),
        "parsed deck"
    );
    Ok(model)
}

/// Parses a deck file. The model is pointed at `<stem>_parsed.<ext>` next to
/// the source so that saving it never overwrites the original.
pub fn parse_file(path: impl AsRef<Path>) -> DeckResult<CfastModel> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| DeckError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let model = parse_str(&text)?;
    Ok(model.with_file_name(parsed_name(path)))
}

fn parsed_name(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cfast_input".to_string());
    let name = match path.extension() {
        Some(ext) => format!("{stem}_parsed.{}", ext.to_string_lossy()),
        None => format!("{stem}_parsed"),
    };
    path.with_file_name(name)
}

/// A `&DIAG` record as a single line. One-line source text is kept as
/// written; anything else is rewritten from its fields.
fn diag_line(raw: &RawRecord) -> String {
    if !raw.text.contains(['\n', '\r']) {
        return raw.text.clone();
    }
    let mut record = Record::new("DIAG");
    for (key, value) in &raw.fields {
        record.push(key, value.clone());
    }
    record.to_string()
}

/// Composition and table of one `fire_id`, gathered from `&CHEM`/`&TABL`.
#[derive(Default)]
struct FireDefinition {
    chemistry: Option<FireParams>,
    /// Position in [`FireRow::LABELS`] of each `DATA` column.
    columns: Option<Vec<usize>>,
    rows: Vec<FireRow>,
}

impl FireDefinition {
    fn apply(&self, p: &mut FireParams) {
        if let Some(chem) = &self.chemistry {
            p.carbon = chem.carbon;
            p.chlorine = chem.chlorine;
            p.hydrogen = chem.hydrogen;
            p.nitrogen = chem.nitrogen;
            p.oxygen = chem.oxygen;
            p.heat_of_combustion = chem.heat_of_combustion;
            p.radiative_fraction = chem.radiative_fraction;
        }
        if !self.rows.is_empty() {
            p.data_table = self.rows.clone();
        }
    }
}

#[derive(Default)]
struct DeckState {
    environment: SimulationEnvironmentParams,
    extra: Vec<String>,
    materials: Vec<Material>,
    compartments: Vec<Compartment>,
    vents: Vec<Vent>,
    fires: Vec<(usize, FireParams)>,
    definitions: HashMap<String, FireDefinition>,
    devices: Vec<Device>,
    connections: Vec<SurfaceConnection>,
}

impl DeckState {
    fn record(&mut self, raw: &RawRecord) -> DeckResult<()> {
        debug!(keyword = %raw.keyword, line = raw.line, "record");
        match raw.keyword.as_str() {
            "HEAD" | "TIME" | "INIT" | "MISC" => self.scenario(raw),
            "DIAG" => {
                self.extra.push(diag_line(raw));
                Ok(())
            }
            "MATL" => self.material(raw),
            "COMP" => self.compartment(raw),
            "VENT" => self.vent(raw),
            "FIRE" => self.fire(raw),
            "CHEM" => self.chemistry(raw),
            "TABL" => self.table(raw),
            "DEVC" => self.device(raw),
            "CONN" => self.connection(raw),
            "TAIL" => Ok(()),
            other => {
                warn!(keyword = other, line = raw.line, "skipping unsupported record");
                Ok(())
            }
        }
    }

    fn has_material(&self, id: &str) -> bool {
        self.materials.iter().any(|m| m.id == id)
    }

    fn has_compartment(&self, id: &str) -> bool {
        self.compartments.iter().any(|c| c.id == id)
    }

    fn compartment_ref(&self, r: &FieldReader<'_>, id: &str) -> DeckResult<()> {
        if self.has_compartment(id) {
            Ok(())
        } else {
            Err(r.unresolved("compartment", id))
        }
    }

    /// A surface material; `OFF` marks an adiabatic surface.
    fn surface_ref(&self, r: &mut FieldReader<'_>, key: &'static str) -> DeckResult<Option<String>> {
        let id = r.opt(key, Value::to_text)?;
        match id {
            Some(id) if id != MATERIAL_OFF && !self.has_material(&id) => {
                Err(r.unresolved("material", &id))
            }
            other => Ok(other),
        }
    }

    fn scenario(&mut self, raw: &RawRecord) -> DeckResult<()> {
        let mut r = FieldReader::new(raw);
        let env = &mut self.environment;
        match raw.keyword.as_str() {
            "HEAD" => {
                r.skip("VERSION");
                r.fill("TITLE", &mut env.title, Value::to_text)?;
            }
            "TIME" => {
                r.fill("SIMULATION", &mut env.time_simulation, Value::to_number)?;
                r.fill("PRINT", &mut env.print, Value::to_number)?;
                r.fill("SMOKEVIEW", &mut env.smokeview, Value::to_number)?;
                r.fill("SPREADSHEET", &mut env.spreadsheet, Value::to_number)?;
            }
            "INIT" => {
                r.fill("PRESSURE", &mut env.init_pressure, Value::to_number)?;
                r.fill("RELATIVE_HUMIDITY", &mut env.relative_humidity, Value::to_number)?;
                r.fill("INTERIOR_TEMPERATURE", &mut env.interior_temperature, Value::to_number)?;
                r.fill("EXTERIOR_TEMPERATURE", &mut env.exterior_temperature, Value::to_number)?;
            }
            _ => {
                if let Some(v) = r.opt("ADIABATIC", Value::to_bool)? {
                    env.adiabatic = Some(v);
                }
                if let Some(v) = r.opt("MAX_TIME_STEP", Value::to_number)? {
                    env.max_time_step = Some(v);
                }
                if let Some(v) = r.opt("LOWER_OXYGEN_LIMIT", Value::to_number)? {
                    env.lower_oxygen_limit = Some(v);
                }
            }
        }
        r.entity(SimulationEnvironment::new(env.clone()))?;
        r.finish()
    }

    fn material(&mut self, raw: &RawRecord) -> DeckResult<()> {
        let mut r = FieldReader::new(raw);
        let mut p = MaterialParams::new(
            r.req("ID", Value::to_text)?,
            r.req("MATERIAL", Value::to_text)?,
        );
        p.conductivity = r.opt("CONDUCTIVITY", Value::to_number)?;
        p.density = r.opt("DENSITY", Value::to_number)?;
        p.specific_heat = r.opt("SPECIFIC_HEAT", Value::to_number)?;
        p.thickness = r.opt("THICKNESS", Value::to_number)?;
        r.fill("EMISSIVITY", &mut p.emissivity, Value::to_number)?;
        let material = r.entity(Material::new(p))?;
        r.finish()?;
        self.materials.push(material);
        Ok(())
    }

    fn compartment(&mut self, raw: &RawRecord) -> DeckResult<()> {
        let mut r = FieldReader::new(raw);
        let mut p = CompartmentParams::new(r.req("ID", Value::to_text)?);
        r.fill("WIDTH", &mut p.width, Value::to_number)?;
        r.fill("DEPTH", &mut p.depth, Value::to_number)?;
        r.fill("HEIGHT", &mut p.height, Value::to_number)?;
        p.ceiling_mat_id = self.surface_ref(&mut r, "CEILING_MATL_ID")?;
        p.ceiling_thickness = r.opt("CEILING_THICKNESS", Value::to_number)?;
        p.wall_mat_id = self.surface_ref(&mut r, "WALL_MATL_ID")?;
        p.wall_thickness = r.opt("WALL_THICKNESS", Value::to_number)?;
        p.floor_mat_id = self.surface_ref(&mut r, "FLOOR_MATL_ID")?;
        p.floor_thickness = r.opt("FLOOR_THICKNESS", Value::to_number)?;
        r.fill("SHAFT", &mut p.shaft, Value::to_bool)?;
        r.fill("HALL", &mut p.hall, Value::to_bool)?;
        p.cross_sect_areas = r.opt("CROSS_SECT_AREAS", Value::to_numbers)?;
        p.cross_sect_heights = r.opt("CROSS_SECT_HEIGHTS", Value::to_numbers)?;
        p.leak_area_ratio = r.opt("LEAK_AREA_RATIO", Value::to_number_array::<2>)?;
        if let Some([x, y, z]) = r.opt("ORIGIN", Value::to_number_array::<3>)? {
            (p.origin_x, p.origin_y, p.origin_z) = (x, y, z);
        }
        // Always 50, 50, 50 on output.
        r.skip("GRID");
        let compartment = r.entity(Compartment::new(p))?;
        r.finish()?;
        self.compartments.push(compartment);
        Ok(())
    }

    fn vent(&mut self, raw: &RawRecord) -> DeckResult<()> {
        let mut r = FieldReader::new(raw);
        let token = r.opt("TYPE", Value::to_text)?;
        let kind = match token.as_deref().map(|t| t.trim().to_ascii_uppercase()) {
            Some(t) => match t.as_str() {
                "WALL" => VentKind::Wall,
                "FLOOR" | "CEILING" => VentKind::CeilingFloor,
                "MECHANICAL" => VentKind::Mechanical,
                _ => {
                    return Err(DeckError::UnknownVentType {
                        line: raw.line,
                        token: t,
                    });
                }
            },
            None => infer_vent_kind(&r).ok_or_else(|| DeckError::UnknownVentType {
                line: raw.line,
                token: String::new(),
            })?,
        };

        let id = r.req("ID", Value::to_text)?;
        let comps_ids = r.req("COMP_IDS", Value::to_texts)?;
        for comp in comps_ids.iter().filter(|c| c.as_str() != OUTSIDE) {
            self.compartment_ref(&r, comp)?;
        }
        let control = vent_control(&mut r)?;

        let vent = match kind {
            VentKind::Wall => {
                let mut p = WallVentParams {
                    id,
                    comps_ids,
                    control,
                    ..WallVentParams::default()
                };
                r.fill("BOTTOM", &mut p.bottom, Value::to_number)?;
                r.fill("HEIGHT", &mut p.height, Value::to_number)?;
                r.fill("WIDTH", &mut p.width, Value::to_number)?;
                r.fill("OFFSET", &mut p.offset, Value::to_number)?;
                p.face = r.opt("FACE", Value::to_keyword::<WallFace>)?;
                Vent::Wall(r.entity(WallVent::new(p))?)
            }
            VentKind::CeilingFloor => {
                let mut p = CeilingFloorVentParams {
                    id,
                    comps_ids,
                    control,
                    ..CeilingFloorVentParams::default()
                };
                if let Some(t) = token {
                    p.vent_type = t.parse::<CeilingFloorKind>().map_err(|expected| {
                        r.invalid(
                            "TYPE",
                            CoreError::InvalidKeyword {
                                token: t.clone(),
                                expected,
                            },
                        )
                    })?;
                }
                r.fill("AREA", &mut p.area, Value::to_number)?;
                r.fill("SHAPE", &mut p.shape, Value::to_keyword::<VentShape>)?;
                p.width = r.opt("WIDTH", Value::to_number)?;
                r.fill("OFFSETS", &mut p.offsets, Value::to_number_array::<2>)?;
                Vent::CeilingFloor(r.entity(CeilingFloorVent::new(p))?)
            }
            VentKind::Mechanical => {
                let mut p = MechanicalVentParams {
                    id,
                    comps_ids,
                    control,
                    ..MechanicalVentParams::default()
                };
                r.fill("AREAS", &mut p.area, Value::to_number_array::<2>)?;
                r.fill("HEIGHTS", &mut p.heights, Value::to_number_array::<2>)?;
                r.fill("ORIENTATIONS", &mut p.orientations, keyword_array)?;
                r.fill("FLOW", &mut p.flow, Value::to_number)?;
                r.fill("CUTOFFS", &mut p.cutoffs, Value::to_number_array::<2>)?;
                r.fill("OFFSETS", &mut p.offsets, Value::to_number_array::<2>)?;
                r.fill("FILTER_TIME", &mut p.filter_time, Value::to_number)?;
                r.fill("FILTER_EFFICIENCY", &mut p.filter_efficiency, Value::to_number)?;
                Vent::Mechanical(r.entity(MechanicalVent::new(p))?)
            }
        };
        r.finish()?;
        self.vents.push(vent);
        Ok(())
    }

    fn fire(&mut self, raw: &RawRecord) -> DeckResult<()> {
        let mut r = FieldReader::new(raw);
        let id = r.req("ID", Value::to_text)?;
        let comp_id = r.req("COMP_ID", Value::to_text)?;
        self.compartment_ref(&r, &comp_id)?;
        let fire_id = r.req("FIRE_ID", Value::to_text)?;
        let location = r.req("LOCATION", Value::to_number_array::<2>)?;

        let mut p = FireParams::new(id, comp_id, fire_id.clone(), location);
        p.ignition_criterion = r.opt("IGNITION_CRITERION", Value::to_keyword::<Criterion>)?;
        p.set_point = r.opt("SETPOINT", Value::to_number)?;
        p.device_id = r.opt("DEVC_ID", Value::to_text)?;
        if p.ignition_criterion.is_none() && (p.set_point.is_some() || p.device_id.is_some()) {
            p.ignition_criterion = Some(Criterion::Time);
        }
        r.finish()?;

        self.definitions.entry(fire_id).or_default();
        self.fires.push((raw.line, p));
        Ok(())
    }

    fn definition<'s>(
        &'s mut self,
        r: &mut FieldReader<'_>,
    ) -> DeckResult<&'s mut FireDefinition> {
        let id = r.req("ID", Value::to_text)?;
        match self.definitions.get_mut(&id) {
            Some(def) => Ok(def),
            None => Err(r.unresolved("fire", &id)),
        }
    }

    fn chemistry(&mut self, raw: &RawRecord) -> DeckResult<()> {
        let mut r = FieldReader::new(raw);
        let def = self.definition(&mut r)?;
        if def.chemistry.is_some() {
            warn!(line = raw.line, "repeated &CHEM replaces the earlier one");
        }
        let mut chem = FireParams::default();
        r.fill("CARBON", &mut chem.carbon, Value::to_number)?;
        r.fill("CHLORINE", &mut chem.chlorine, Value::to_number)?;
        r.fill("HYDROGEN", &mut chem.hydrogen, Value::to_number)?;
        r.fill("NITROGEN", &mut chem.nitrogen, Value::to_number)?;
        r.fill("OXYGEN", &mut chem.oxygen, Value::to_number)?;
        r.fill("HEAT_OF_COMBUSTION", &mut chem.heat_of_combustion, Value::to_number)?;
        r.fill("RADIATIVE_FRACTION", &mut chem.radiative_fraction, Value::to_number)?;
        def.chemistry = Some(chem);
        r.finish()
    }

    fn table(&mut self, raw: &RawRecord) -> DeckResult<()> {
        let mut r = FieldReader::new(raw);
        if !r.has("LABELS") && !r.has("DATA") {
            return Err(DeckError::MissingField {
                line: raw.line,
                keyword: raw.keyword.clone(),
                key: "DATA",
            });
        }
        let def = self.definition(&mut r)?;
        if let Some(labels) = r.opt("LABELS", Value::to_texts)? {
            let mut columns = Vec::with_capacity(labels.len());
            for label in labels {
                let Some(at) = FireRow::LABELS.iter().position(|l| l.eq_ignore_ascii_case(&label))
                else {
                    return Err(r.invalid(
                        "LABELS",
                        CoreError::InvalidKeyword {
                            token: label,
                            expected: "a fire table column",
                        },
                    ));
                };
                columns.push(at);
            }
            def.columns = Some(columns);
        }
        if let Some(data) = r.opt("DATA", Value::to_numbers)? {
            let row = match &def.columns {
                None => FireRow::from_slice(&data).map_err(|e| r.invalid("DATA", e))?,
                Some(columns) => {
                    if data.len() != columns.len() {
                        return Err(r.invalid(
                            "DATA",
                            CoreError::Arity {
                                expected: columns.len(),
                                found: data.len(),
                            },
                        ));
                    }
                    let mut values = [Number::Int(0); 9];
                    for (&at, value) in columns.iter().zip(data) {
                        values[at] = value;
                    }
                    FireRow::from(values)
                }
            };
            def.rows.push(row);
        }
        r.finish()
    }

    fn target(&self, r: &mut FieldReader<'_>, shape: TargetShape) -> DeckResult<Target> {
        let material_id = r.req("MATL_ID", Value::to_text)?;
        if !self.has_material(&material_id) {
            return Err(r.unresolved("material", &material_id));
        }
        let normal = r.opt("NORMAL", Value::to_number_array::<3>)?;
        let surface = r.opt("SURFACE_ORIENTATION", Value::to_text)?;
        let orientation = match (normal, surface) {
            (Some(_), Some(_)) => {
                return Err(DeckError::Syntax {
                    line: r.line(),
                    message: "&DEVC: NORMAL and SURFACE_ORIENTATION are mutually exclusive"
                        .to_string(),
                });
            }
            (Some(n), None) => Some(TargetOrientation::Normal(n)),
            (None, Some(s)) => Some(TargetOrientation::Surface(s)),
            (None, None) => None,
        };
        let mut target = Target {
            shape,
            material_id,
            orientation,
            thickness: r.opt("THICKNESS", Value::to_number)?,
            temperature_depth: Number::Real(0.5),
            depth_units: DepthUnits::Meters,
        };
        r.fill("TEMPERATURE_DEPTH", &mut target.temperature_depth, Value::to_number)?;
        r.fill("DEPTH_UNITS", &mut target.depth_units, Value::to_keyword::<DepthUnits>)?;
        Ok(target)
    }

    fn device(&mut self, raw: &RawRecord) -> DeckResult<()> {
        let mut r = FieldReader::new(raw);
        let id = r.req("ID", Value::to_text)?;
        let comp_id = r.req("COMP_ID", Value::to_text)?;
        self.compartment_ref(&r, &comp_id)?;
        let location = r.req("LOCATION", Value::to_number_array::<3>)?;
        let token = r.req("TYPE", Value::to_text)?;

        let kind = match token.trim().to_ascii_uppercase().as_str() {
            "PLATE" => DeviceKind::Target(self.target(&mut r, TargetShape::Plate)?),
            "CYLINDER" => DeviceKind::Target(self.target(&mut r, TargetShape::Cylinder)?),
            "HEAT_DETECTOR" => DeviceKind::HeatDetector {
                setpoint: r.req("SETPOINT", Value::to_number)?,
                rti: r.req("RTI", Value::to_number)?,
            },
            "SMOKE_DETECTOR" => {
                // Written as SETPOINTS; older decks use SETPOINT or OBSCURATION.
                let setpoints = r.opt("SETPOINTS", Value::to_numbers)?;
                let obscuration = r.opt("OBSCURATION", Value::to_number)?;
                let setpoint = r.opt("SETPOINT", Value::to_number)?;
                let obscuration = setpoints
                    .and_then(|v| v.first().copied())
                    .or(obscuration)
                    .or(setpoint)
                    .unwrap_or(Number::Real(DeviceKind::DEFAULT_OBSCURATION));
                DeviceKind::SmokeDetector { obscuration }
            }
            "SPRINKLER" => DeviceKind::Sprinkler {
                setpoint: r.req("SETPOINT", Value::to_number)?,
                rti: r.req("RTI", Value::to_number)?,
                spray_density: r.req("SPRAY_DENSITY", Value::to_number)?,
            },
            _ => {
                return Err(DeckError::UnknownDeviceType {
                    line: raw.line,
                    token,
                });
            }
        };

        let mut p = DeviceParams::new(id, comp_id, location, kind);
        r.fill("ADIABATIC_TARGET", &mut p.adiabatic, Value::to_bool)?;
        p.convection_coefficients = r.opt("CONVECTION_COEFFICIENTS", Value::to_numbers)?;
        let device = r.entity(Device::new(p))?;
        r.finish()?;
        self.devices.push(device);
        Ok(())
    }

    fn connection(&mut self, raw: &RawRecord) -> DeckResult<()> {
        let mut r = FieldReader::new(raw);
        let conn_type = r.req("TYPE", Value::to_keyword::<ConnectionType>)?;
        let comp_id = r.req("COMP_ID", Value::to_text)?;
        self.compartment_ref(&r, &comp_id)?;
        let comp_ids = r.req("COMP_IDS", Value::to_text)?;
        self.compartment_ref(&r, &comp_ids)?;
        let fraction = match conn_type {
            ConnectionType::Wall => Some(r.req("F", Value::to_number)?),
            ConnectionType::Floor => {
                if r.opt("F", Value::to_number)?.is_some() {
                    warn!(line = raw.line, "ignoring F on a FLOOR connection");
                }
                None
            }
        };
        let connection = r.entity(SurfaceConnection::new(SurfaceConnectionParams {
            conn_type,
            comp_id,
            comp_ids,
            fraction,
        }))?;
        r.finish()?;
        self.connections.push(connection);
        Ok(())
    }

    fn into_model(self) -> DeckResult<CfastModel> {
        let mut env = self.environment;
        if !self.extra.is_empty() {
            env.extra_custom = Some(self.extra.join("\n"));
        }
        let mut b = CfastModel::builder(SimulationEnvironment::new(env)?);
        for m in self.materials {
            b.material(m);
        }
        for c in self.compartments {
            b.compartment(c);
        }
        for v in self.vents {
            b.vent(v);
        }
        for (line, mut p) in self.fires {
            if let Some(def) = self.definitions.get(&p.fire_id) {
                def.apply(&mut p);
            }
            let fire = Fire::new(p).map_err(|source| DeckError::InvalidRecord {
                line,
                keyword: "FIRE".to_string(),
                source,
            })?;
            b.fire(fire);
        }
        for d in self.devices {
            b.device(d);
        }
        for c in self.connections {
            b.surface_connection(c);
        }
        Ok(b.build()?)
    }
}

/// Vent kind from the fields present when `TYPE` is absent.
fn infer_vent_kind(r: &FieldReader<'_>) -> Option<VentKind> {
    if ["AREAS", "FLOW", "CUTOFFS", "ORIENTATIONS"].iter().any(|k| r.has(k)) {
        Some(VentKind::Mechanical)
    } else if ["AREA", "SHAPE", "OFFSETS"].iter().any(|k| r.has(k)) {
        Some(VentKind::CeilingFloor)
    } else if ["BOTTOM", "WIDTH", "FACE", "OFFSET"].iter().any(|k| r.has(k)) {
        Some(VentKind::Wall)
    } else {
        None
    }
}

fn vent_control(r: &mut FieldReader<'_>) -> DeckResult<VentControl> {
    let mut control = VentControl {
        open_close_criterion: r.opt("CRITERION", Value::to_keyword::<Criterion>)?,
        set_point: r.opt("SETPOINT", Value::to_number)?,
        device_id: r.opt("DEVC_ID", Value::to_text)?,
        time: r.opt("T", Value::to_numbers)?,
        fraction: r.opt("F", Value::to_numbers)?,
        ..VentControl::default()
    };
    r.fill("PRE_FRACTION", &mut control.pre_fraction, Value::to_number)?;
    r.fill("POST_FRACTION", &mut control.post_fraction, Value::to_number)?;
    Ok(control)
}
