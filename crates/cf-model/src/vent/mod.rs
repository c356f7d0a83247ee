//! Vents: wall openings, ceiling/floor openings and mechanical ducts.
//!
//! All three share the `&VENT` record and are told apart by its `TYPE`.

use core::fmt;

use cf_core::{Record, RecordStyle};

use crate::fields::Checker;
use crate::ModelResult;

pub mod ceiling_floor;
mod control;
pub mod mechanical;
pub mod wall;

pub use ceiling_floor::{CeilingFloorVent, CeilingFloorVentParams};
pub use control::VentControl;
pub use mechanical::{MechanicalVent, MechanicalVentParams};
pub use wall::{WallVent, WallVentParams};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VentKind {
    Wall,
    CeilingFloor,
    Mechanical,
}

impl VentKind {
    pub fn label(&self) -> &'static str {
        match self {
            VentKind::Wall => "wall vent",
            VentKind::CeilingFloor => "ceiling/floor vent",
            VentKind::Mechanical => "mechanical vent",
        }
    }
}

/// Any vent, as stored in one of the model's three vent collections.
#[derive(Clone, Debug, PartialEq)]
pub enum Vent {
    Wall(WallVent),
    CeilingFloor(CeilingFloorVent),
    Mechanical(MechanicalVent),
}

impl Vent {
    pub fn kind(&self) -> VentKind {
        match self {
            Vent::Wall(_) => VentKind::Wall,
            Vent::CeilingFloor(_) => VentKind::CeilingFloor,
            Vent::Mechanical(_) => VentKind::Mechanical,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Vent::Wall(v) => &v.id,
            Vent::CeilingFloor(v) => &v.id,
            Vent::Mechanical(v) => &v.id,
        }
    }

    pub fn comps_ids(&self) -> &[String] {
        match self {
            Vent::Wall(v) => &v.comps_ids,
            Vent::CeilingFloor(v) => &v.comps_ids,
            Vent::Mechanical(v) => &v.comps_ids,
        }
    }

    pub fn control(&self) -> &VentControl {
        match self {
            Vent::Wall(v) => &v.control,
            Vent::CeilingFloor(v) => &v.control,
            Vent::Mechanical(v) => &v.control,
        }
    }

    pub fn record(&self) -> Record {
        match self {
            Vent::Wall(v) => v.record(),
            Vent::CeilingFloor(v) => v.record(),
            Vent::Mechanical(v) => v.record(),
        }
    }

    pub fn to_input_string(&self) -> String {
        self.record().render(RecordStyle::Compact)
    }

    pub fn to_html(&self) -> String {
        match self {
            Vent::Wall(v) => v.to_html(),
            Vent::CeilingFloor(v) => v.to_html(),
            Vent::Mechanical(v) => v.to_html(),
        }
    }
}

impl fmt::Display for Vent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vent::Wall(v) => fmt::Display::fmt(v, f),
            Vent::CeilingFloor(v) => fmt::Display::fmt(v, f),
            Vent::Mechanical(v) => fmt::Display::fmt(v, f),
        }
    }
}

impl From<WallVent> for Vent {
    fn from(v: WallVent) -> Self {
        Vent::Wall(v)
    }
}

impl From<CeilingFloorVent> for Vent {
    fn from(v: CeilingFloorVent) -> Self {
        Vent::CeilingFloor(v)
    }
}

impl From<MechanicalVent> for Vent {
    fn from(v: MechanicalVent) -> Self {
        Vent::Mechanical(v)
    }
}

/// Exactly two distinct, well-formed compartment ids.
fn check_comps(c: &Checker<'_>, comps: &[String]) -> ModelResult<()> {
    c.ensure(comps.len() == 2, || {
        format!(
            "a vent must connect exactly 2 compartments (got {})",
            comps.len()
        )
    })?;
    for comp in comps {
        c.identifier("comps_ids", comp)?;
    }
    c.ensure(comps[0] != comps[1], || {
        format!("a vent cannot connect '{}' to itself", comps[0])
    })
}
