use cf_model::{
    CeilingFloorVent, CeilingFloorVentParams, CfastModel, Compartment, CompartmentParams, Device,
    Fire, FireParams, FireRow, Material, MaterialParams, MechanicalVent, MechanicalVentParams,
    Number, SimulationEnvironment, SimulationEnvironmentParams, SurfaceConnection, Target,
    TargetOrientation, TargetShape, WallFace, WallVent, WallVentParams,
};

pub fn environment() -> SimulationEnvironment {
    SimulationEnvironment::new(SimulationEnvironmentParams {
        time_simulation: Number::Int(1800),
        print: Number::Int(30),
        smokeview: Number::Int(10),
        spreadsheet: Number::Int(10),
        ..SimulationEnvironmentParams::new("Two rooms")
    })
    .unwrap()
}

fn room(id: &str, origin_z: f64) -> Compartment {
    Compartment::new(CompartmentParams {
        width: 4.0.into(),
        depth: 3.0.into(),
        height: 2.5.into(),
        ceiling_mat_id: Some("GYPSUM".into()),
        wall_mat_id: Some("GYPSUM".into()),
        floor_mat_id: Some("CONCRETE".into()),
        origin_z: origin_z.into(),
        ..CompartmentParams::new(id)
    })
    .unwrap()
}

/// Two stacked rooms with one entity of every kind.
pub fn two_rooms() -> CfastModel {
    let mut b = CfastModel::builder(environment());
    b.material(
        Material::new(MaterialParams {
            conductivity: Some(0.16.into()),
            density: Some(790.into()),
            specific_heat: Some(0.9.into()),
            thickness: Some(0.016.into()),
            ..MaterialParams::new("GYPSUM", "Gypsum board")
        })
        .unwrap(),
    )
    .material(
        Material::new(MaterialParams {
            conductivity: Some(1.75.into()),
            density: Some(2200.into()),
            specific_heat: Some(1.0.into()),
            thickness: Some(0.15.into()),
            ..MaterialParams::new("CONCRETE", "Concrete")
        })
        .unwrap(),
    )
    .compartment(room("LOWER", 0.0))
    .compartment(room("UPPER", 2.5))
    .wall_vent(
        WallVent::new(WallVentParams {
            width: 1.0.into(),
            height: 2.0.into(),
            face: Some(WallFace::Front),
            offset: 1.5.into(),
            ..WallVentParams::new("DOOR", "LOWER", "OUTSIDE")
        })
        .unwrap(),
    )
    .ceiling_floor_vent(
        CeilingFloorVent::new(CeilingFloorVentParams {
            area: 0.5.into(),
            ..CeilingFloorVentParams::new("HATCH", "UPPER", "LOWER")
        })
        .unwrap(),
    )
    .mechanical_vent(
        MechanicalVent::new(MechanicalVentParams {
            area: Number::array([0.1, 0.1]),
            heights: Number::array([2.2, 2.2]),
            flow: 0.3.into(),
            ..MechanicalVentParams::new("FAN", "OUTSIDE", "UPPER")
        })
        .unwrap(),
    )
    .fire(
        Fire::new(FireParams {
            data_table: vec![
                FireRow::default(),
                FireRow {
                    time: 300.into(),
                    hrr: 500000.into(),
                    height: 0.3.into(),
                    area: 0.5.into(),
                    co_yield: 0.01.into(),
                    soot_yield: 0.02.into(),
                    ..FireRow::default()
                },
            ],
            ..FireParams::new("SOFA", "LOWER", "POLYURETHANE", Number::array([2.0, 1.5]))
        })
        .unwrap(),
    )
    .device(
        Device::target(
            "TRG",
            "UPPER",
            Number::array([2.0, 1.5, 2.4]),
            Target::new(
                TargetShape::Plate,
                "GYPSUM",
                TargetOrientation::Normal(Number::array([0, 0, -1])),
            ),
        )
        .unwrap(),
    )
    .surface_connection(SurfaceConnection::ceiling_floor_connection("UPPER", "LOWER").unwrap());
    b.build().unwrap()
}
