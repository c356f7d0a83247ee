//! Reads the solver's CSV output files.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::types::{OutputKind, OutputTable, RunOutputs};
use crate::{ResultsError, ResultsResult};

/// `<dir>/<stem>_<kind>.csv` for the deck at `deck`.
pub fn output_path(deck: &Path, kind: OutputKind) -> PathBuf {
    let stem = deck
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    deck.with_file_name(format!("{stem}_{}.csv", kind.suffix()))
}

/// Loads every output file present next to `deck`. A missing required file
/// is logged and left out of the result.
pub fn load_outputs(deck: &Path) -> ResultsResult<RunOutputs> {
    let mut outputs = RunOutputs::default();
    for kind in OutputKind::ALL {
        let path = output_path(deck, kind);
        if !path.exists() {
            if kind.is_optional() {
                debug!(%kind, "optional output not written");
            } else {
                warn!(%kind, path = %path.display(), "output file not found");
            }
            continue;
        }
        outputs.insert(kind, load_table(&path, kind)?);
    }
    Ok(outputs)
}

pub fn load_table(path: &Path, kind: OutputKind) -> ResultsResult<OutputTable> {
    let text = fs::read_to_string(path).map_err(|source| ResultsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if text.trim().is_empty() {
        warn!(path = %path.display(), "output file is empty");
        return Ok(OutputTable::default());
    }
    let table = parse_table(&text, kind).map_err(|e| match e {
        ResultsError::Malformed { line, message, .. } => ResultsError::Malformed {
            path: path.to_path_buf(),
            line,
            message,
        },
        ResultsError::MissingHeader { .. } => ResultsError::MissingHeader {
            path: path.to_path_buf(),
        },
        other => other,
    })?;
    debug!(%kind, rows = table.len(), columns = table.columns.len(), "loaded output");
    Ok(table)
}

/// Parses CSV text laid out the way `kind` is. Errors carry an empty path;
/// [`load_table`] fills it in.
pub fn parse_table(text: &str, kind: OutputKind) -> ResultsResult<OutputTable> {
    let layout = kind.layout();
    let mut kept = text
        .lines()
        .enumerate()
        .filter(|(i, _)| !layout.skip.contains(i))
        .filter(|(_, l)| !l.trim().is_empty())
        .skip(layout.header);

    let Some((at, header)) = kept.next() else {
        return Err(ResultsError::MissingHeader {
            path: PathBuf::new(),
        });
    };
    let columns: Vec<String> = split_row(header)
        .map_err(|message| malformed(at + 1, message))?
        .into_iter()
        .map(|c| c.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (i, line) in kept {
        let cells = split_row(line).map_err(|message| malformed(i + 1, message))?;
        if cells.len() != columns.len() {
            return Err(malformed(
                i + 1,
                format!("expected {} cells, found {}", columns.len(), cells.len()),
            ));
        }
        rows.push(cells.iter().map(|c| c.trim().parse::<f64>().ok()).collect());
    }
    Ok(OutputTable { columns, rows })
}

fn malformed(line: usize, message: impl Into<String>) -> ResultsError {
    ResultsError::Malformed {
        path: PathBuf::new(),
        line,
        message: message.into(),
    }
}

/// Splits one line on commas. Double-quoted cells may hold commas and `""`.
fn split_row(line: &str) -> Result<Vec<String>, String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut chars = line.trim_end_matches('\r').chars().peekable();
    let mut quoted = false;
    while let Some(c) = chars.next() {
        match (c, quoted) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                cell.push('"');
            }
            ('"', _) => quoted = !quoted,
            (',', false) => cells.push(std::mem::take(&mut cell)),
            (c, _) => cell.push(c),
        }
    }
    if quoted {
        return Err("unterminated quoted cell".to_string());
    }
    cells.push(cell);
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPARTMENTS: &str = "\
Time,ULT_1,LLT_1,HGT_1
s,C,C,m
,,,
,ROOM1,ROOM1,ROOM1
0,20,20,2.4
10,85.5,21.2,1.9
";

    #[test]
    fn metadata_rows_are_skipped() {
        let t = parse_table(COMPARTMENTS, OutputKind::Compartments).unwrap();
        assert_eq!(t.columns, ["Time", "ULT_1", "LLT_1", "HGT_1"]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.rows[1], vec![Some(10.0), Some(85.5), Some(21.2), Some(1.9)]);
    }

    #[test]
    fn zone_header_is_second_row() {
        let text = "Zone file\nTime,Layer\n0,1.5\n5,1.2\n";
        let t = parse_table(text, OutputKind::Zone).unwrap();
        assert_eq!(t.columns, ["Time", "Layer"]);
        assert_eq!(t.time(), vec![Some(0.0), Some(5.0)]);
    }

    #[test]
    fn diagnostics_header_follows_skipped_rows() {
        let text = "banner\nx\ny\nz\nTime,Residual\n0,1e-6\n";
        let t = parse_table(text, OutputKind::Diagnostics).unwrap();
        assert_eq!(t.columns, ["Time", "Residual"]);
        assert_eq!(t.rows, vec![vec![Some(0.0), Some(1e-6)]]);
    }

    #[test]
    fn quoted_cells_and_blanks() {
        let text = "\"Time\",\"Name, with comma\"\na\nb\nc\n0,\n1,\"2\"\n";
        let t = parse_table(text, OutputKind::Devices).unwrap();
        assert_eq!(t.columns[1], "Name, with comma");
        assert_eq!(t.rows[0], vec![Some(0.0), None]);
        assert_eq!(t.rows[1], vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn ragged_row_names_its_line() {
        let text = "Time,A\na\nb\nc\n0,1\n5\n";
        let err = parse_table(text, OutputKind::Walls).unwrap_err();
        assert!(matches!(err, ResultsError::Malformed { line: 6, .. }));
    }

    #[test]
    fn header_only_file_has_no_rows() {
        let t = parse_table("Time,A\n", OutputKind::Masses).unwrap();
        assert!(t.is_empty());
        assert!(matches!(
            parse_table("title only\n", OutputKind::Zone),
            Err(ResultsError::MissingHeader { .. })
        ));
    }

    #[test]
    fn output_names_follow_the_deck_stem() {
        let p = output_path(Path::new("/runs/case_1.in"), OutputKind::Zone);
        assert_eq!(p, Path::new("/runs/case_1_zone.csv"));
    }
}
