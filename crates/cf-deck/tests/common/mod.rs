use cf_model::{
    CeilingFloorVent, CeilingFloorVentParams, CfastModel, Compartment, CompartmentParams,
    Criterion, Device, Fire, FireParams, FireRow, Material, MaterialParams, MechanicalVent,
    MechanicalVentParams, Number, SimulationEnvironment, SimulationEnvironmentParams,
    SurfaceConnection, Target, TargetOrientation, TargetShape, VentControl, WallFace, WallVent,
    WallVentParams,
};

fn room(id: &str, origin_x: f64) -> Compartment {
    Compartment::new(CompartmentParams {
        width: 4.0.into(),
        depth: 3.0.into(),
        height: 2.5.into(),
        ceiling_mat_id: Some("GYPSUM".into()),
        wall_mat_id: Some("GYPSUM".into()),
        floor_mat_id: Some("CONCRETE".into()),
        origin_x: origin_x.into(),
        ..CompartmentParams::new(id)
    })
    .unwrap()
}

/// Two side-by-side rooms and a corridor with every entity kind and most
/// optional fields set.
pub fn office() -> CfastModel {
    let environment = SimulationEnvironment::new(SimulationEnvironmentParams {
        time_simulation: Number::Int(1800),
        print: Number::Int(30),
        smokeview: Number::Int(10),
        spreadsheet: Number::Int(10),
        max_time_step: Some(Number::Real(0.5)),
        extra_custom: Some("&DIAG RADSOLVER = 'DEFAULT' /".to_string()),
        ..SimulationEnvironmentParams::new("Office, 'east' wing")
    })
    .unwrap();

    let mut b = CfastModel::builder(environment);
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
            emissivity: 0.94.into(),
            ..MaterialParams::new("CONCRETE", "Concrete")
        })
        .unwrap(),
    )
    .compartment(room("OFFICE", 0.0))
    .compartment(room("STORE", 4.0))
    .compartment(
        Compartment::new(CompartmentParams {
            width: 12.0.into(),
            depth: 2.0.into(),
            height: 2.5.into(),
            hall: true,
            origin_y: (-2.0).into(),
            leak_area_ratio: Some(Number::array([0.00017, 5.2e-5])),
            ..CompartmentParams::new("CORRIDOR")
        })
        .unwrap(),
    )
    .wall_vent(
        WallVent::new(WallVentParams {
            width: 0.9.into(),
            height: 2.0.into(),
            face: Some(WallFace::Front),
            offset: 1.5.into(),
            control: VentControl::schedule(
                vec![0.into(), 120.into(), 121.into()],
                vec![1.into(), 1.into(), 0.into()],
            ),
            ..WallVentParams::new("DOOR", "OFFICE", "CORRIDOR")
        })
        .unwrap(),
    )
    .wall_vent(
        WallVent::new(WallVentParams {
            width: 1.2.into(),
            height: 1.0.into(),
            bottom: 1.0.into(),
            face: Some(WallFace::Rear),
            control: VentControl {
                open_close_criterion: Some(Criterion::Temperature),
                set_point: Some(300.into()),
                device_id: Some("GLASS".into()),
                pre_fraction: 0.into(),
                ..VentControl::default()
            },
            ..WallVentParams::new("WINDOW", "STORE", "OUTSIDE")
        })
        .unwrap(),
    )
    .ceiling_floor_vent(
        CeilingFloorVent::new(CeilingFloorVentParams {
            area: 0.25.into(),
            ..CeilingFloorVentParams::new("RISER", "OUTSIDE", "CORRIDOR")
        })
        .unwrap(),
    )
    .mechanical_vent(
        MechanicalVent::new(MechanicalVentParams {
            area: Number::array([0.1, 0.1]),
            heights: Number::array([2.2, 2.2]),
            flow: 0.3.into(),
            filter_efficiency: 50.into(),
            ..MechanicalVentParams::new("SUPPLY", "OUTSIDE", "OFFICE")
        })
        .unwrap(),
    )
    .fire(
        Fire::new(FireParams {
            carbon: 6.into(),
            hydrogen: 10.into(),
            oxygen: 5.into(),
            heat_of_combustion: 18000.into(),
            data_table: vec![
                FireRow::default(),
                FireRow {
                    time: 300.into(),
                    hrr: 500000.into(),
                    height: 0.3.into(),
                    area: 0.5.into(),
                    co_yield: 0.004.into(),
                    soot_yield: 0.015.into(),
                    ..FireRow::default()
                },
                FireRow {
                    time: 900.into(),
                    hrr: 0.into(),
                    height: 0.3.into(),
                    area: 0.5.into(),
                    ..FireRow::default()
                },
            ],
            ..FireParams::new("DESK", "OFFICE", "WOOD", Number::array([2.0, 1.5]))
        })
        .unwrap(),
    )
    .fire(
        Fire::new(FireParams {
            ignition_criterion: Some(Criterion::Temperature),
            set_point: Some(200.into()),
            device_id: Some("SHELF".into()),
            ..FireParams::new("CRATES", "STORE", "PALLETS", Number::array([1.0, 1.0]))
        })
        .unwrap(),
    )
    .device(
        Device::target(
            "GLASS",
            "STORE",
            Number::array([2.0, 2.9, 1.5]),
            Target::new(
                TargetShape::Plate,
                "GYPSUM",
                TargetOrientation::Normal(Number::array([0, 1, 0])),
            ),
        )
        .unwrap(),
    )
    .device(
        Device::target(
            "SHELF",
            "STORE",
            Number::array([1.0, 1.0, 1.0]),
            Target::new(
                TargetShape::Cylinder,
                "CONCRETE",
                TargetOrientation::Surface("CEILING".into()),
            ),
        )
        .unwrap(),
    )
    .device(Device::heat_detector("HD", "OFFICE", Number::array([2.0, 1.5, 2.4]), 57, 100).unwrap())
    .device(Device::smoke_detector("SD", "CORRIDOR", Number::array([6.0, 1.0, 2.4]), None).unwrap())
    .device(
        Device::sprinkler("SPK", "OFFICE", Number::array([2.0, 1.0, 2.4]), 68, 50, 7e-5).unwrap(),
    )
    .surface_connection(SurfaceConnection::wall_connection("OFFICE", "STORE", 0.5).unwrap())
    .surface_connection(SurfaceConnection::wall_connection("OFFICE", "CORRIDOR", 0.25).unwrap());
    b.build().unwrap()
}
