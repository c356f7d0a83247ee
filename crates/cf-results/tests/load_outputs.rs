use std::fs;

use cf_results::{OutputKind, ResultsError, load_outputs, output_path};

const METADATA: &str = "s,C\n,\n,ROOM\n";

fn write(dir: &std::path::Path, kind: OutputKind, body: &str) {
    let deck = dir.join("case.in");
    fs::write(output_path(&deck, kind), body).unwrap();
}

#[test]
fn loads_what_the_solver_wrote() {
    let dir = tempfile::tempdir().unwrap();
    for kind in [OutputKind::Compartments, OutputKind::Devices, OutputKind::Walls] {
        write(dir.path(), kind, &format!("Time,VALUE\n{METADATA}0,1\n30,2.5\n"));
    }
    write(dir.path(), OutputKind::Zone, "CFAST zone\nTime,Layer\n0,2.4\n");

    let outputs = load_outputs(&dir.path().join("case.in")).unwrap();
    assert_eq!(outputs.len(), 4);
    assert_eq!(outputs.get(OutputKind::Walls).unwrap().max("VALUE"), Some(2.5));
    assert_eq!(outputs.get(OutputKind::Zone).unwrap().columns, ["Time", "Layer"]);
    assert_eq!(outputs.missing(), [OutputKind::Masses, OutputKind::Vents]);
}

#[test]
fn empty_file_loads_as_empty_table() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), OutputKind::Masses, "");
    let outputs = load_outputs(&dir.path().join("case.in")).unwrap();
    assert!(outputs.get(OutputKind::Masses).unwrap().is_empty());
}

#[test]
fn malformed_file_names_its_path() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), OutputKind::Vents, &format!("Time,A\n{METADATA}0,1,2\n"));
    let err = load_outputs(&dir.path().join("case.in")).unwrap_err();
    match err {
        ResultsError::Malformed { path, line, .. } => {
            assert!(path.ends_with("case_vents.csv"));
            assert_eq!(line, 5);
        }
        other => panic!("unexpected {other:?}"),
    }
}
