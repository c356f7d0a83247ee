//! cf-model: fire scenario entities and the model aggregate.
//!
//! Entities are validated on construction and on every write. The
//! [`CfastModel`] aggregate owns ordered collections of them, checks
//! identifiers and references across collections, and renders the full
//! input deck.

/// Shared plumbing for entities that wrap a validated `*Params` struct.
macro_rules! validated_entity {
    ($entity:ident, $params:ident) => {
        impl $entity {
            pub fn new(params: $params) -> $crate::ModelResult<Self> {
                Self::validate(&params)?;
                Ok(Self { params })
            }

            pub fn params(&self) -> &$params {
                &self.params
            }

            pub fn into_params(self) -> $params {
                self.params
            }

            /// Edits the parameters in place. A rejected edit leaves `self`
            /// untouched.
            pub fn modify(&mut self, f: impl FnOnce(&mut $params)) -> $crate::ModelResult<()> {
                let mut next = self.params.clone();
                f(&mut next);
                Self::validate(&next)?;
                self.params = next;
                Ok(())
            }
        }

        impl core::ops::Deref for $entity {
            type Target = $params;

            fn deref(&self) -> &$params {
                &self.params
            }
        }

        impl TryFrom<$params> for $entity {
            type Error = $crate::ModelError;

            fn try_from(params: $params) -> Result<Self, Self::Error> {
                Self::new(params)
            }
        }

        impl From<$entity> for $params {
            fn from(entity: $entity) -> Self {
                entity.params
            }
        }
    };
}

pub mod compartment;
pub mod connection;
pub mod deck;
pub mod device;
pub mod environment;
pub mod error;
pub mod fields;
pub mod fire;
pub mod kinds;
pub mod material;
pub mod model;
pub mod render;
pub mod sink;
pub mod validate;
pub mod vent;

pub use compartment::{Compartment, CompartmentParams};
pub use connection::{SurfaceConnection, SurfaceConnectionParams};
pub use deck::render_deck;
pub use device::{Device, DeviceKind, DeviceParams, Target, TargetOrientation};
pub use environment::{SimulationEnvironment, SimulationEnvironmentParams};
pub use error::{ModelError, ModelResult};
pub use fields::Fields;
pub use fire::{Fire, FireParams, FireRow};
pub use kinds::*;
pub use material::{Material, MaterialParams};
pub use model::{CfastModel, DEFAULT_FILE_NAME, ModelBuilder, Select};
pub use sink::{DeckSink, FileSink, MemorySink};
pub use vent::{
    CeilingFloorVent, CeilingFloorVentParams, MechanicalVent, MechanicalVentParams, Vent,
    VentControl, VentKind, WallVent, WallVentParams,
};

pub use cf_core::{Number, OUTSIDE, Record, RecordStyle, Value};
