//! Model loading, saving and inspection.

use std::path::{Path, PathBuf};

use cf_model::CfastModel;
use serde::Serialize;

use crate::error::AppResult;

/// Per-collection counts for listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelSummary {
    pub title: String,
    pub materials: usize,
    pub compartments: usize,
    pub wall_vents: usize,
    pub ceiling_floor_vents: usize,
    pub mechanical_vents: usize,
    pub fires: usize,
    pub devices: usize,
    pub surface_connections: usize,
}

/// Parses a deck file. The returned model saves to `<stem>_parsed.<ext>`
/// beside the input.
pub fn load_model(path: &Path) -> AppResult<CfastModel> {
    Ok(cf_deck::parse_file(path)?)
}

/// Parses a deck file and keeps its path as the model's file name, so a
/// save or run writes over the input.
pub fn load_model_in_place(path: &Path) -> AppResult<CfastModel> {
    Ok(load_model(path)?.with_file_name(path))
}

pub fn save_model(model: &CfastModel, path: Option<&Path>) -> AppResult<PathBuf> {
    Ok(match path {
        Some(p) => model.save_as(p)?,
        None => model.save()?,
    })
}

pub fn summarize(model: &CfastModel) -> ModelSummary {
    ModelSummary {
        title: model.environment().title.clone(),
        materials: model.materials().len(),
        compartments: model.compartments().len(),
        wall_vents: model.wall_vents().len(),
        ceiling_floor_vents: model.ceiling_floor_vents().len(),
        mechanical_vents: model.mechanical_vents().len(),
        fires: model.fires().len(),
        devices: model.devices().len(),
        surface_connections: model.surface_connections().len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECK: &str = "&HEAD VERSION = 7700 TITLE = 'Small' /
&TIME SIMULATION = 600 PRINT = 60 SMOKEVIEW = 15 SPREADSHEET = 15 /
&COMP ID = 'ROOM' DEPTH = 3 HEIGHT = 2.4 WIDTH = 3 /
&VENT TYPE = 'WALL' ID = 'DOOR' COMP_IDS = 'ROOM', 'OUTSIDE' BOTTOM = 0 HEIGHT = 2 WIDTH = 1 /
&TAIL /
";

    #[test]
    fn load_then_save_beside_the_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("small.in");
        std::fs::write(&input, DECK).unwrap();

        let model = load_model(&input).unwrap();
        let saved = save_model(&model, None).unwrap();
        assert_eq!(saved, dir.path().join("small_parsed.in"));
        assert_eq!(std::fs::read_to_string(&input).unwrap(), DECK);

        let in_place = load_model_in_place(&input).unwrap();
        assert_eq!(save_model(&in_place, None).unwrap(), input);
    }

    #[test]
    fn summary_counts() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("small.in");
        std::fs::write(&input, DECK).unwrap();
        let s = summarize(&load_model(&input).unwrap());
        assert_eq!(s.title, "Small");
        assert_eq!((s.compartments, s.wall_vents, s.fires), (1, 1, 0));
    }
}
