//! Cross-entity checks for a whole model.
//!
//! Entities validate themselves; this module checks what only the aggregate
//! can see: identifier uniqueness within each collection and references
//! between collections.

use std::collections::{HashMap, HashSet};

use cf_core::{MATERIAL_OFF, OUTSIDE};

use crate::model::CfastModel;
use crate::vent::VentControl;
use crate::{ConnectionType, ModelError, ModelResult};

fn unique<'a>(ids: impl IntoIterator<Item = &'a str>, context: &str) -> ModelResult<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ModelError::DuplicateId {
                id: id.to_string(),
                context: context.to_string(),
            });
        }
    }
    Ok(())
}

fn resolve(known: &HashSet<&str>, id: &str, context: impl FnOnce() -> String) -> ModelResult<()> {
    if known.contains(id) {
        Ok(())
    } else {
        Err(ModelError::MissingReference {
            id: id.to_string(),
            context: context(),
        })
    }
}

pub fn validate_model(model: &CfastModel) -> ModelResult<()> {
    unique(model.materials().iter().map(|m| m.id.as_str()), "materials")?;
    unique(model.compartments().iter().map(|c| c.id.as_str()), "compartments")?;
    unique(model.wall_vents().iter().map(|v| v.id.as_str()), "wall vents")?;
    unique(
        model.ceiling_floor_vents().iter().map(|v| v.id.as_str()),
        "ceiling/floor vents",
    )?;
    unique(model.mechanical_vents().iter().map(|v| v.id.as_str()), "mechanical vents")?;
    unique(model.fires().iter().map(|f| f.id.as_str()), "fires")?;
    unique(model.devices().iter().map(|d| d.id.as_str()), "devices")?;

    let mut links = HashSet::new();
    for conn in model.surface_connections() {
        if !links.insert((conn.conn_type, conn.comp_id.as_str(), conn.comp_ids.as_str())) {
            return Err(ModelError::DuplicateId {
                id: format!("{} {}", conn.conn_type, conn.label()),
                context: "surface connections".to_string(),
            });
        }
    }

    let materials: HashSet<&str> = model.materials().iter().map(|m| m.id.as_str()).collect();
    let compartments: HashSet<&str> = model.compartments().iter().map(|c| c.id.as_str()).collect();
    let devices: HashSet<&str> = model.devices().iter().map(|d| d.id.as_str()).collect();

    for comp in model.compartments() {
        for (surface, mat, _) in comp.surfaces() {
            if let Some(mat) = mat.filter(|m| *m != MATERIAL_OFF) {
                resolve(&materials, mat, || {
                    format!("compartment '{}' {surface} material", comp.id)
                })?;
            }
        }
    }

    let check_vent = |kind: &str, id: &str, comps: &[String], control: &VentControl| {
        for comp in comps.iter().filter(|c| c.as_str() != OUTSIDE) {
            resolve(&compartments, comp, || format!("{kind} '{id}' comps_ids"))?;
        }
        if let Some(device) = &control.device_id {
            resolve(&devices, device, || format!("{kind} '{id}' device_id"))?;
        }
        Ok::<_, ModelError>(())
    };
    for v in model.wall_vents() {
        check_vent("wall vent", &v.id, &v.comps_ids, &v.control)?;
    }
    for v in model.ceiling_floor_vents() {
        check_vent("ceiling/floor vent", &v.id, &v.comps_ids, &v.control)?;
    }
    for v in model.mechanical_vents() {
        check_vent("mechanical vent", &v.id, &v.comps_ids, &v.control)?;
    }

    let mut definitions = HashMap::new();
    for fire in model.fires() {
        resolve(&compartments, &fire.comp_id, || format!("fire '{}' comp_id", fire.id))?;
        if let Some(device) = &fire.device_id {
            resolve(&devices, device, || format!("fire '{}' device_id", fire.id))?;
        }
        if let Some(first) = definitions.insert(fire.fire_id.as_str(), fire) {
            if !first.same_definition(fire) {
                return Err(ModelError::InvalidValue {
                    entity: "Fire",
                    id: fire.id.clone(),
                    reason: format!(
                        "fire_id '{}' is already defined differently by fire '{}'",
                        fire.fire_id, first.id
                    ),
                });
            }
        }
    }

    for device in model.devices() {
        resolve(&compartments, &device.comp_id, || {
            format!("device '{}' comp_id", device.id)
        })?;
        if let Some(mat) = device.material_id() {
            resolve(&materials, mat, || format!("device '{}' material_id", device.id))?;
        }
    }

    let mut wall_share: HashMap<&str, f64> = HashMap::new();
    for conn in model.surface_connections() {
        resolve(&compartments, &conn.comp_id, || {
            format!("surface connection '{}' comp_id", conn.label())
        })?;
        resolve(&compartments, &conn.comp_ids, || {
            format!("surface connection '{}' comp_ids", conn.label())
        })?;
        if let (ConnectionType::Wall, Some(f)) = (conn.conn_type, conn.fraction) {
            let total = wall_share.entry(conn.comp_id.as_str()).or_default();
            *total += f.as_f64();
            if *total > 1.0 + 1e-9 {
                return Err(ModelError::InvalidValue {
                    entity: "SurfaceConnection",
                    id: conn.label(),
                    reason: format!(
                        "wall fractions for '{}' add up to more than 1 ({total})",
                        conn.comp_id
                    ),
                });
            }
        }
    }

    Ok(())
}
