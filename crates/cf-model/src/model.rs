//! The scenario aggregate.
//!
//! A [`CfastModel`] is immutable from the outside: `update_*` and `add_*`
//! return a new, fully validated model and leave the receiver as it was.

use core::fmt;
use std::path::{Path, PathBuf};

use cf_core::{RecordStyle, Value};
use tracing::debug;

use crate::deck::render_deck;
use crate::render::card;
use crate::sink::{DeckSink, FileSink};
use crate::validate::validate_model;
use crate::vent::Vent;
use crate::{
    CeilingFloorVent, Compartment, Device, Fields, Fire, Material, MechanicalVent, ModelError,
    ModelResult, SimulationEnvironment, SurfaceConnection, WallVent,
};

/// Deck file name used when none is configured.
pub const DEFAULT_FILE_NAME: &str = "cfast_input.in";

/// Picks one entity out of a collection, by identifier or by position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Select {
    Id(String),
    Index(usize),
}

impl From<&str> for Select {
    fn from(id: &str) -> Self {
        Select::Id(id.to_string())
    }
}

impl From<String> for Select {
    fn from(id: String) -> Self {
        Select::Id(id)
    }
}

impl From<usize> for Select {
    fn from(index: usize) -> Self {
        Select::Index(index)
    }
}

impl fmt::Display for Select {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Select::Id(id) => f.write_str(id),
            Select::Index(i) => write!(f, "#{i}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CfastModel {
    environment: SimulationEnvironment,
    materials: Vec<Material>,
    compartments: Vec<Compartment>,
    wall_vents: Vec<WallVent>,
    ceiling_floor_vents: Vec<CeilingFloorVent>,
    mechanical_vents: Vec<MechanicalVent>,
    fires: Vec<Fire>,
    devices: Vec<Device>,
    surface_connections: Vec<SurfaceConnection>,
    file_name: PathBuf,
    cfast_exe: Option<PathBuf>,
    extra_arguments: Vec<String>,
}

/// Collects entities in declaration order, then validates them as a whole.
#[derive(Debug)]
pub struct ModelBuilder {
    model: CfastModel,
}

impl ModelBuilder {
    pub fn material(&mut self, m: Material) -> &mut Self {
        self.model.materials.push(m);
        self
    }

    pub fn compartment(&mut self, c: Compartment) -> &mut Self {
        self.model.compartments.push(c);
        self
    }

    pub fn wall_vent(&mut self, v: WallVent) -> &mut Self {
        self.model.wall_vents.push(v);
        self
    }

    pub fn ceiling_floor_vent(&mut self, v: CeilingFloorVent) -> &mut Self {
        self.model.ceiling_floor_vents.push(v);
        self
    }

    pub fn mechanical_vent(&mut self, v: MechanicalVent) -> &mut Self {
        self.model.mechanical_vents.push(v);
        self
    }

    /// Routes a vent of any kind to its collection.
    pub fn vent(&mut self, v: impl Into<Vent>) -> &mut Self {
        match v.into() {
            Vent::Wall(v) => self.wall_vent(v),
            Vent::CeilingFloor(v) => self.ceiling_floor_vent(v),
            Vent::Mechanical(v) => self.mechanical_vent(v),
        }
    }

    pub fn fire(&mut self, f: Fire) -> &mut Self {
        self.model.fires.push(f);
        self
    }

    pub fn device(&mut self, d: Device) -> &mut Self {
        self.model.devices.push(d);
        self
    }

    pub fn surface_connection(&mut self, c: SurfaceConnection) -> &mut Self {
        self.model.surface_connections.push(c);
        self
    }

    pub fn file_name(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.model.file_name = path.into();
        self
    }

    pub fn cfast_exe(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.model.cfast_exe = Some(path.into());
        self
    }

    pub fn extra_arguments<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.model.extra_arguments = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self) -> ModelResult<CfastModel> {
        validate_model(&self.model)?;
        debug!(
            compartments = self.model.compartments.len(),
            fires = self.model.fires.len(),
            devices = self.model.devices.len(),
            "model assembled"
        );
        Ok(self.model)
    }
}

fn locate<T>(
    items: &[T],
    kind: &'static str,
    select: &Select,
    by_id: impl Fn(&[T], &str) -> Option<usize>,
) -> ModelResult<usize> {
    let found = match select {
        Select::Index(i) => Some(*i).filter(|i| *i < items.len()),
        Select::Id(id) => by_id(items, id),
    };
    found.ok_or_else(|| ModelError::NotFound {
        kind,
        id: select.to_string(),
    })
}

macro_rules! id_lookup {
    ($entity:ty) => {
        |items: &[$entity], id: &str| items.iter().position(|e| e.id == id)
    };
}

impl CfastModel {
    pub fn builder(environment: SimulationEnvironment) -> ModelBuilder {
        ModelBuilder {
            model: CfastModel {
                environment,
                materials: Vec::new(),
                compartments: Vec::new(),
                wall_vents: Vec::new(),
                ceiling_floor_vents: Vec::new(),
                mechanical_vents: Vec::new(),
                fires: Vec::new(),
                devices: Vec::new(),
                surface_connections: Vec::new(),
                file_name: PathBuf::from(DEFAULT_FILE_NAME),
                cfast_exe: None,
                extra_arguments: Vec::new(),
            },
        }
    }

    pub fn environment(&self) -> &SimulationEnvironment {
        &self.environment
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn compartments(&self) -> &[Compartment] {
        &self.compartments
    }

    pub fn wall_vents(&self) -> &[WallVent] {
        &self.wall_vents
    }

    pub fn ceiling_floor_vents(&self) -> &[CeilingFloorVent] {
        &self.ceiling_floor_vents
    }

    pub fn mechanical_vents(&self) -> &[MechanicalVent] {
        &self.mechanical_vents
    }

    pub fn fires(&self) -> &[Fire] {
        &self.fires
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn surface_connections(&self) -> &[SurfaceConnection] {
        &self.surface_connections
    }

    pub fn file_name(&self) -> &Path {
        &self.file_name
    }

    pub fn cfast_exe(&self) -> Option<&Path> {
        self.cfast_exe.as_deref()
    }

    pub fn extra_arguments(&self) -> &[String] {
        &self.extra_arguments
    }

    /// A copy writing its deck to `path`.
    pub fn with_file_name(&self, path: impl Into<PathBuf>) -> CfastModel {
        CfastModel {
            file_name: path.into(),
            ..self.clone()
        }
    }

    pub fn with_cfast_exe(&self, path: impl Into<PathBuf>) -> CfastModel {
        CfastModel {
            cfast_exe: Some(path.into()),
            ..self.clone()
        }
    }

    fn updated<'a, T: Fields>(
        &self,
        pick: impl FnOnce(&mut CfastModel) -> &mut Vec<T>,
        kind: &'static str,
        select: Select,
        by_id: impl Fn(&[T], &str) -> Option<usize>,
        changes: impl IntoIterator<Item = (&'a str, Value)>,
    ) -> ModelResult<CfastModel> {
        let mut next = self.clone();
        let items = pick(&mut next);
        let index = locate(items, kind, &select, by_id)?;
        items[index].set_many(changes)?;
        validate_model(&next)?;
        debug!(kind, entity = %select, "updated");
        Ok(next)
    }

    fn added(&self, push: impl FnOnce(&mut CfastModel)) -> ModelResult<CfastModel> {
        let mut next = self.clone();
        push(&mut next);
        validate_model(&next)?;
        Ok(next)
    }

    pub fn update_simulation_params<'a>(
        &self,
        changes: impl IntoIterator<Item = (&'a str, Value)>,
    ) -> ModelResult<CfastModel> {
        let mut next = self.clone();
        next.environment.set_many(changes)?;
        Ok(next)
    }

    pub fn update_material_params<'a>(
        &self,
        material: impl Into<Select>,
        changes: impl IntoIterator<Item = (&'a str, Value)>,
    ) -> ModelResult<CfastModel> {
        self.updated(|m| &mut m.materials, "Material", material.into(), id_lookup!(Material), changes)
    }

    pub fn update_compartment_params<'a>(
        &self,
        compartment: impl Into<Select>,
        changes: impl IntoIterator<Item = (&'a str, Value)>,
    ) -> ModelResult<CfastModel> {
        self.updated(
            |m| &mut m.compartments,
            "Compartment",
            compartment.into(),
            id_lookup!(Compartment),
            changes,
        )
    }

    pub fn update_wall_vent_params<'a>(
        &self,
        vent: impl Into<Select>,
        changes: impl IntoIterator<Item = (&'a str, Value)>,
    ) -> ModelResult<CfastModel> {
        self.updated(|m| &mut m.wall_vents, "WallVent", vent.into(), id_lookup!(WallVent), changes)
    }

    pub fn update_ceiling_floor_vent_params<'a>(
        &self,
        vent: impl Into<Select>,
        changes: impl IntoIterator<Item = (&'a str, Value)>,
    ) -> ModelResult<CfastModel> {
        self.updated(
            |m| &mut m.ceiling_floor_vents,
            "CeilingFloorVent",
            vent.into(),
            id_lookup!(CeilingFloorVent),
            changes,
        )
    }

    pub fn update_mechanical_vent_params<'a>(
        &self,
        vent: impl Into<Select>,
        changes: impl IntoIterator<Item = (&'a str, Value)>,
    ) -> ModelResult<CfastModel> {
        self.updated(
            |m| &mut m.mechanical_vents,
            "MechanicalVent",
            vent.into(),
            id_lookup!(MechanicalVent),
            changes,
        )
    }

    /// A fire is found by its own id first, then by its definition id.
    /// Composition and table changes carry over to every fire sharing the
    /// edited fire's `fire_id`.
    pub fn update_fire_params<'a>(
        &self,
        fire: impl Into<Select>,
        changes: impl IntoIterator<Item = (&'a str, Value)>,
    ) -> ModelResult<CfastModel> {
        let select = fire.into();
        let mut next = self.clone();
        let index = locate(&next.fires, "Fire", &select, |fires: &[Fire], id: &str| {
            fires
                .iter()
                .position(|f| f.id == id)
                .or_else(|| fires.iter().position(|f| f.fire_id == id))
        })?;
        let fire_id = next.fires[index].fire_id.clone();
        next.fires[index].set_many(changes)?;
        let edited = next.fires[index].clone();
        if edited.fire_id == fire_id {
            for (i, other) in next.fires.iter_mut().enumerate() {
                if i != index && other.fire_id == fire_id {
                    other.adopt_definition(&edited)?;
                }
            }
        }
        validate_model(&next)?;
        debug!(kind = "Fire", entity = %select, "updated");
        Ok(next)
    }

    pub fn update_device_params<'a>(
        &self,
        device: impl Into<Select>,
        changes: impl IntoIterator<Item = (&'a str, Value)>,
    ) -> ModelResult<CfastModel> {
        self.updated(|m| &mut m.devices, "Device", device.into(), id_lookup!(Device), changes)
    }

    /// Connections have no identifier; they are picked by position.
    pub fn update_surface_connection_params<'a>(
        &self,
        index: usize,
        changes: impl IntoIterator<Item = (&'a str, Value)>,
    ) -> ModelResult<CfastModel> {
        self.updated(
            |m| &mut m.surface_connections,
            "SurfaceConnection",
            Select::Index(index),
            |_, _| None,
            changes,
        )
    }

    pub fn add_material(&self, material: Material) -> ModelResult<CfastModel> {
        self.added(|m| m.materials.push(material))
    }

    pub fn add_compartment(&self, compartment: Compartment) -> ModelResult<CfastModel> {
        self.added(|m| m.compartments.push(compartment))
    }

    pub fn add_wall_vent(&self, vent: WallVent) -> ModelResult<CfastModel> {
        self.added(|m| m.wall_vents.push(vent))
    }

    pub fn add_ceiling_floor_vent(&self, vent: CeilingFloorVent) -> ModelResult<CfastModel> {
        self.added(|m| m.ceiling_floor_vents.push(vent))
    }

    pub fn add_mechanical_vent(&self, vent: MechanicalVent) -> ModelResult<CfastModel> {
        self.added(|m| m.mechanical_vents.push(vent))
    }

    pub fn add_vent(&self, vent: impl Into<Vent>) -> ModelResult<CfastModel> {
        match vent.into() {
            Vent::Wall(v) => self.add_wall_vent(v),
            Vent::CeilingFloor(v) => self.add_ceiling_floor_vent(v),
            Vent::Mechanical(v) => self.add_mechanical_vent(v),
        }
    }

    pub fn add_fire(&self, fire: Fire) -> ModelResult<CfastModel> {
        self.added(|m| m.fires.push(fire))
    }

    pub fn add_device(&self, device: Device) -> ModelResult<CfastModel> {
        self.added(|m| m.devices.push(device))
    }

    pub fn add_surface_connection(&self, connection: SurfaceConnection) -> ModelResult<CfastModel> {
        self.added(|m| m.surface_connections.push(connection))
    }

    /// Checks identifiers and cross references.
    pub fn validate(&self) -> ModelResult<()> {
        validate_model(self)
    }

    pub fn to_input_string(&self) -> String {
        render_deck(self, RecordStyle::Compact)
    }

    /// The deck text; `pretty` puts one field per line with aligned keys.
    pub fn view_cfast_input_file(&self, pretty: bool) -> String {
        let style = if pretty {
            RecordStyle::Pretty
        } else {
            RecordStyle::Compact
        };
        render_deck(self, style)
    }

    /// Writes the deck to the configured file name and returns its
    /// absolute path.
    pub fn save(&self) -> ModelResult<PathBuf> {
        self.save_to(&FileSink, &self.file_name)
    }

    /// Writes the deck to `path` without changing the configured file name.
    pub fn save_as(&self, path: impl AsRef<Path>) -> ModelResult<PathBuf> {
        self.save_to(&FileSink, path.as_ref())
    }

    pub fn save_to(&self, sink: &dyn DeckSink, path: &Path) -> ModelResult<PathBuf> {
        let path = std::path::absolute(path).map_err(|source| ModelError::DeckWrite {
            path: path.to_path_buf(),
            source,
        })?;
        sink.write_deck(&path, &self.to_input_string())?;
        debug!(path = %path.display(), "deck written");
        Ok(path)
    }

    /// Multi-line overview of every collection.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Model: {}\nSimulation: '{}' ({}s)\n\nComponents:\n",
            self.file_name.display(),
            self.environment.title,
            self.environment.time_simulation
        );
        fn group<T: fmt::Display>(out: &mut String, label: &str, items: &[T]) {
            if items.is_empty() {
                return;
            }
            out.push_str(&format!("  {label} ({}):\n", items.len()));
            for item in items {
                out.push_str(&format!("    {item}\n"));
            }
        }
        group(&mut out, "Material Properties", &self.materials);
        group(&mut out, "Compartments", &self.compartments);
        group(&mut out, "Wall Vents", &self.wall_vents);
        group(&mut out, "Ceiling/Floor Vents", &self.ceiling_floor_vents);
        group(&mut out, "Mechanical Vents", &self.mechanical_vents);
        group(&mut out, "Fires", &self.fires);
        group(&mut out, "Devices", &self.devices);
        group(&mut out, "Surface Connections", &self.surface_connections);
        out
    }

    pub fn to_html(&self) -> String {
        let counts = [
            ("Materials", self.materials.len()),
            ("Compartments", self.compartments.len()),
            ("Wall vents", self.wall_vents.len()),
            ("Ceiling/floor vents", self.ceiling_floor_vents.len()),
            ("Mechanical vents", self.mechanical_vents.len()),
            ("Fires", self.fires.len()),
            ("Devices", self.devices.len()),
            ("Surface connections", self.surface_connections.len()),
        ];
        let rows: Vec<(&str, String)> = counts
            .iter()
            .filter(|(_, n)| *n > 0)
            .map(|(label, n)| (*label, n.to_string()))
            .collect();
        let mut html = card("Model", &self.file_name.display().to_string(), &rows);
        html.push_str(&self.environment.to_html());
        for part in self
            .materials
            .iter()
            .map(Material::to_html)
            .chain(self.compartments.iter().map(Compartment::to_html))
            .chain(self.wall_vents.iter().map(WallVent::to_html))
            .chain(self.ceiling_floor_vents.iter().map(CeilingFloorVent::to_html))
            .chain(self.mechanical_vents.iter().map(MechanicalVent::to_html))
            .chain(self.fires.iter().map(Fire::to_html))
            .chain(self.devices.iter().map(Device::to_html))
            .chain(self.surface_connections.iter().map(SurfaceConnection::to_html))
        {
            html.push_str(&part);
        }
        html
    }
}

impl fmt::Display for CfastModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CFAST model '{}' ({}): {} compartments, {} vents, {} fires, {} devices",
            self.environment.title,
            self.file_name.display(),
            self.compartments.len(),
            self.wall_vents.len() + self.ceiling_floor_vents.len() + self.mechanical_vents.len(),
            self.fires.len(),
            self.devices.len()
        )
    }
}
