mod common;

use cf_model::{
    CfastModel, Compartment, CompartmentParams, Device, Fields, MemorySink, ModelError, Number,
    SurfaceConnection, Value, WallVent, WallVentParams,
};
use common::{environment, two_rooms};

#[test]
fn update_returns_a_new_model() {
    let model = two_rooms();
    let next = model
        .update_fire_params("SOFA", [("heat_of_combustion", Value::from(23000))])
        .unwrap();
    assert_eq!(next.fires()[0].heat_of_combustion, Number::Int(23000));
    assert_eq!(model.fires()[0].heat_of_combustion, Number::Int(50000));
}

#[test]
fn fire_lookup_falls_back_to_definition_id() {
    let next = two_rooms()
        .update_fire_params("POLYURETHANE", [("radiative_fraction", Value::from(0.3))])
        .unwrap();
    assert_eq!(next.fires()[0].radiative_fraction, Number::Real(0.3));
}

#[test]
fn update_of_missing_fire_is_a_lookup_error() {
    let model = two_rooms();
    let err = model
        .update_fire_params("NOPE", [("carbon", Value::from(2))])
        .unwrap_err();
    assert!(matches!(err, ModelError::NotFound { kind: "Fire", .. }));
    assert_eq!(model.fires().len(), 1);

    let err = model
        .update_fire_params(5usize, [("carbon", Value::from(2))])
        .unwrap_err();
    assert!(err.to_string().contains("#5"));
}

#[test]
fn update_by_index() {
    let next = two_rooms()
        .update_compartment_params(1usize, [("height", Value::from(3.0))])
        .unwrap();
    assert_eq!(next.compartments()[1].height, Number::Real(3.0));
}

#[test]
fn update_rejects_dangling_reference() {
    let model = two_rooms();
    let err = model
        .update_device_params("TRG", [("comp_id", Value::from("ATTIC"))])
        .unwrap_err();
    assert!(err.is_referential());
    assert_eq!(model.devices()[0].comp_id, "UPPER");
}

#[test]
fn update_rejects_invalid_field_value() {
    let err = two_rooms()
        .update_material_params("GYPSUM", [("emissivity", Value::from(1.5))])
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn unknown_field_names_entity_and_key() {
    let err = two_rooms()
        .update_wall_vent_params("DOOR", [("colour", Value::from("red"))])
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("WallVent"));
    assert!(msg.contains("colour"));
}

#[test]
fn simulation_and_vent_updates() {
    let next = two_rooms()
        .update_simulation_params([("time_simulation", Value::from(3600))])
        .unwrap()
        .update_ceiling_floor_vent_params("HATCH", [("shape", Value::from("SQUARE"))])
        .unwrap()
        .update_mechanical_vent_params("FAN", [("flow", Value::from(0.6))])
        .unwrap()
        .update_surface_connection_params(0, [("comp_ids", Value::from("LOWER"))])
        .unwrap();
    let deck = next.to_input_string();
    assert!(deck.contains("&TIME SIMULATION = 3600"));
    assert!(deck.contains("SHAPE = 'SQUARE'"));
    assert!(deck.contains("FLOW = 0.6"));
}

#[test]
fn add_device_collision_keeps_collection() {
    let model = two_rooms();
    let dup = Device::heat_detector("TRG", "LOWER", Number::array([1, 1, 2]), 57, 100).unwrap();
    let err = model.add_device(dup).unwrap_err();
    assert!(matches!(err, ModelError::DuplicateId { ref id, .. } if id == "TRG"));
    assert_eq!(model.devices().len(), 1);

    let hd = Device::heat_detector("HD1", "LOWER", Number::array([1, 1, 2]), 57, 100).unwrap();
    let next = model.add_device(hd).unwrap();
    assert_eq!(next.devices().len(), 2);
    assert_eq!(model.devices().len(), 1);
}

#[test]
fn add_vent_dispatches_on_kind() {
    let window = WallVent::new(WallVentParams {
        width: 0.8.into(),
        height: 1.0.into(),
        bottom: 1.0.into(),
        ..WallVentParams::new("WINDOW", "UPPER", "OUTSIDE")
    })
    .unwrap();
    let next = two_rooms().add_vent(window).unwrap();
    assert_eq!(next.wall_vents().len(), 2);
    assert_eq!(next.wall_vents()[1].id, "WINDOW");
}

#[test]
fn build_rejects_unknown_material() {
    let model = two_rooms();
    let err = model
        .update_compartment_params("LOWER", [("wall_mat_id", Value::from("STEEL"))])
        .unwrap_err();
    assert!(matches!(err, ModelError::MissingReference { ref id, .. } if id == "STEEL"));
    // OFF means an adiabatic surface, not a material.
    model
        .update_compartment_params("LOWER", [("wall_mat_id", Value::from("OFF"))])
        .unwrap();
}

#[test]
fn vent_trigger_device_must_exist() {
    let err = two_rooms()
        .update_wall_vent_params(
            "DOOR",
            [
                ("open_close_criterion", Value::from("TEMPERATURE")),
                ("set_point", Value::from(100)),
                ("device_id", Value::from("GHOST")),
            ],
        )
        .unwrap_err();
    assert!(matches!(err, ModelError::MissingReference { ref id, .. } if id == "GHOST"));
}

#[test]
fn wall_fractions_cannot_exceed_one() {
    let attic = Compartment::new(CompartmentParams::new("ATTIC")).unwrap();
    let model = two_rooms()
        .add_compartment(attic)
        .unwrap()
        .add_surface_connection(SurfaceConnection::wall_connection("LOWER", "UPPER", 0.7).unwrap())
        .unwrap();
    let err = model
        .add_surface_connection(SurfaceConnection::wall_connection("LOWER", "ATTIC", 0.5).unwrap())
        .unwrap_err();
    assert!(matches!(err, ModelError::InvalidValue { entity: "SurfaceConnection", .. }));
    model
        .add_surface_connection(SurfaceConnection::wall_connection("LOWER", "ATTIC", 0.3).unwrap())
        .unwrap();
}

#[test]
fn duplicate_connection_rejected() {
    let err = two_rooms()
        .add_surface_connection(SurfaceConnection::ceiling_floor_connection("UPPER", "LOWER").unwrap())
        .unwrap_err();
    assert!(matches!(err, ModelError::DuplicateId { .. }));
}

#[test]
fn shared_fire_definitions_must_agree() {
    let model = two_rooms();
    let mut twin = model.fires()[0].clone();
    twin.set("id", "SOFA2").unwrap();
    let model = model.add_fire(twin.clone()).unwrap();
    let deck = model.to_input_string();
    assert_eq!(deck.matches("&CHEM ID = 'POLYURETHANE'").count(), 1);
    assert_eq!(deck.matches("&FIRE ").count(), 2);

    twin.set_many([("id", Value::from("SOFA3")), ("carbon", Value::from(6))])
        .unwrap();
    assert!(model.add_fire(twin).is_err());
}

#[test]
fn shared_definition_edits_reach_every_instance() {
    let model = two_rooms();
    let mut twin = model.fires()[0].clone();
    twin.set_many([("id", Value::from("SOFA2")), ("comp_id", Value::from("UPPER"))])
        .unwrap();
    let model = model.add_fire(twin).unwrap();

    for select in ["POLYURETHANE", "SOFA", "SOFA2"] {
        let next = model
            .update_fire_params(select, [("heat_of_combustion", Value::from(18000))])
            .unwrap();
        assert!(next.fires().iter().all(|f| f.heat_of_combustion == Number::Int(18000)));
        assert_eq!(next.fires()[1].comp_id, "UPPER");
    }

    let next = model
        .update_fire_params("SOFA2", [("comp_id", Value::from("LOWER"))])
        .unwrap();
    assert_eq!(next.fires()[0].comp_id, "LOWER");
    assert_eq!(next.fires()[1].comp_id, "LOWER");

    let split = model
        .update_fire_params("SOFA2", [("fire_id", Value::from("FOAM")), ("carbon", Value::from(6))])
        .unwrap();
    assert_eq!(split.fires()[0].carbon, Number::Int(1));
    assert_eq!(split.fires()[1].carbon, Number::Int(6));
    assert_eq!(split.to_input_string().matches("&CHEM ").count(), 2);
}

#[test]
fn shared_definitions_compare_numbers_by_value() {
    let model = two_rooms();
    let mut twin = model.fires()[0].clone();
    twin.set_many([("id", Value::from("SOFA2")), ("carbon", Value::from(1.0))])
        .unwrap();
    assert!(model.add_fire(twin).is_ok());
}

#[test]
fn save_writes_configured_file() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("nested").join("case.in");
    let model = two_rooms().with_file_name(&target);
    let written = model.save().unwrap();
    assert!(written.is_absolute());
    assert_eq!(std::fs::read_to_string(&written).unwrap(), model.to_input_string());
}

#[test]
fn save_as_leaves_file_name_alone() {
    let dir = tempfile::tempdir().unwrap();
    let model = two_rooms();
    let path = model.save_as(dir.path().join("backup.in")).unwrap();
    assert!(path.ends_with("backup.in"));
    assert_eq!(model.file_name().to_str(), Some("cfast_input.in"));
}

#[test]
fn save_to_memory_sink() {
    let sink = MemorySink::new();
    let model = two_rooms();
    let path = model
        .save_to(&sink, std::path::Path::new("/tmp/cf-model-test/case.in"))
        .unwrap();
    assert_eq!(sink.get(&path), Some(model.to_input_string()));
}

#[test]
fn summary_lists_every_collection() {
    let text = two_rooms().summary();
    assert!(text.starts_with("Model: cfast_input.in\nSimulation: 'Two rooms' (1800s)"));
    for label in [
        "Material Properties (2)",
        "Compartments (2)",
        "Wall Vents (1)",
        "Ceiling/Floor Vents (1)",
        "Mechanical Vents (1)",
        "Fires (1)",
        "Devices (1)",
        "Surface Connections (1)",
    ] {
        assert!(text.contains(label), "missing {label}");
    }
}

#[test]
fn html_contains_every_entity() {
    let html = two_rooms().to_html();
    for id in ["GYPSUM", "LOWER", "DOOR", "HATCH", "FAN", "SOFA", "TRG"] {
        assert!(html.contains(id), "missing {id}");
    }
}

#[test]
fn empty_model_builds() {
    let model = CfastModel::builder(environment()).build().unwrap();
    assert!(model.to_input_string().ends_with("!! Surface Connections\n\n&TAIL /\n"));
}
