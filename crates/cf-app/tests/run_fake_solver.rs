#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cf_app::{AppError, RunModelExt, RunOptions};
use cf_model::{
    CeilingFloorVent, CeilingFloorVentParams, CfastModel, Compartment, CompartmentParams, Device,
    Fire, FireParams, FireRow, MechanicalVent, MechanicalVentParams, Number,
    SimulationEnvironment, SurfaceConnection, WallVent, WallVentParams,
};
use cf_results::OutputKind;

/// Writes every output file the real solver does, with the same header rows.
const SOLVER: &str = r#"#!/bin/sh
test -f "$1.in" || { echo "missing $1.in" >&2; exit 9; }
for kind in compartments devices masses vents walls; do
  printf 'Time,ULT_1\ns,C\n,\n,LOWER\n0,20\n30,45.5\n' > "$1_$kind.csv"
done
printf 'CFAST zone\nTime,Layer\n0,2.5\n30,1.8\n' > "$1_zone.csv"
echo "Normal exit from CFAST"
"#;

const FAILING: &str = r#"#!/bin/sh
echo "***Error: Compartment LOWER has zero volume" > "$1.log"
echo "stopping" >&2
exit 3
"#;

const HANGING: &str = "#!/bin/sh\necho started\nexec sleep 30\n";

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn room(id: &str, origin_z: f64) -> Compartment {
    Compartment::new(CompartmentParams {
        height: 2.5.into(),
        origin_z: origin_z.into(),
        ..CompartmentParams::new(id)
    })
    .unwrap()
}

/// Two stacked rooms with one fire, device, vent of each kind and a
/// connection.
fn minimal(deck: &Path, exe: &Path) -> CfastModel {
    let mut b = CfastModel::builder(SimulationEnvironment::with_title("Fake run").unwrap());
    b.compartment(room("LOWER", 0.0))
        .compartment(room("UPPER", 2.5))
        .wall_vent(
            WallVent::new(WallVentParams {
                width: 1.0.into(),
                height: 2.0.into(),
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
                        time: 120.into(),
                        hrr: 250.into(),
                        ..FireRow::default()
                    },
                ],
                ..FireParams::new("BIN", "LOWER", "TRASH", Number::array([1.0, 1.0]))
            })
            .unwrap(),
        )
        .device(Device::heat_detector("HD", "UPPER", Number::array([1.8, 1.2, 2.4]), 57, 100).unwrap())
        .surface_connection(SurfaceConnection::ceiling_floor_connection("UPPER", "LOWER").unwrap())
        .file_name(deck)
        .cfast_exe(exe);
    b.build().unwrap()
}

#[test]
fn run_returns_every_output_kind() {
    let dir = tempfile::tempdir().unwrap();
    let exe = script(dir.path(), "cfast", SOLVER);
    let model = minimal(&dir.path().join("fake.in"), &exe);

    let response = model
        .run(&RunOptions {
            timeout: Some(Duration::from_secs(60)),
            ..RunOptions::default()
        })
        .unwrap();

    for kind in [
        OutputKind::Compartments,
        OutputKind::Devices,
        OutputKind::Masses,
        OutputKind::Vents,
        OutputKind::Walls,
        OutputKind::Zone,
    ] {
        assert!(response.outputs.contains(kind), "missing {kind}");
    }
    assert!(!response.outputs.contains(OutputKind::Diagnostics));
    let compartments = response.outputs.get(OutputKind::Compartments).unwrap();
    assert_eq!(compartments.columns, ["Time", "ULT_1"]);
    assert_eq!(compartments.max("ULT_1"), Some(45.5));
    assert_eq!(response.stdout.trim(), "Normal exit from CFAST");
    assert!(fs::read_to_string(&response.deck).unwrap().ends_with("&TAIL /\n"));
}

#[test]
fn failed_run_surfaces_code_and_log() {
    let dir = tempfile::tempdir().unwrap();
    let exe = script(dir.path(), "cfast", FAILING);
    let model = minimal(&dir.path().join("broken.in"), &exe);

    match model.run(&RunOptions::default()).unwrap_err() {
        AppError::SolverFailed {
            code, stderr, log, ..
        } => {
            assert_eq!(code, Some(3));
            assert_eq!(stderr.trim(), "stopping");
            assert!(log.unwrap().contains("zero volume"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn hung_solver_is_killed() {
    let dir = tempfile::tempdir().unwrap();
    let exe = script(dir.path(), "cfast", HANGING);
    let model = minimal(&dir.path().join("slow.in"), &exe);

    let err = model
        .run(&RunOptions {
            timeout: Some(Duration::from_millis(300)),
            ..RunOptions::default()
        })
        .unwrap_err();
    match err {
        AppError::Timeout { after, stdout, .. } => {
            assert_eq!(after, Duration::from_millis(300));
            assert_eq!(stdout.trim(), "started");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn concurrent_isolated_runs_do_not_collide() {
    let dir = tempfile::tempdir().unwrap();
    let exe = script(dir.path(), "cfast", SOLVER);
    let model = minimal(&dir.path().join("sweep.in"), &exe);
    let options = RunOptions {
        isolate: true,
        ..RunOptions::default()
    };

    let decks: Vec<PathBuf> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4).map(|_| s.spawn(|| model.run(&options))).collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap().deck)
            .collect()
    });
    let mut dirs: Vec<_> = decks.iter().map(|d| d.parent().unwrap().to_path_buf()).collect();
    dirs.sort();
    dirs.dedup();
    assert_eq!(dirs.len(), 4);
}
