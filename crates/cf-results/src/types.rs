//! Output table types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub type RunId = String;

/// One of the CSV files the solver writes next to the deck, named
/// `<stem>_<kind>.csv`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Compartments,
    Devices,
    Masses,
    Vents,
    Walls,
    Zone,
    /// Written only when the deck carries `&DIAG`.
    Diagnostics,
}

/// Where the column names sit in a file. `skip` lists physical rows dropped
/// before anything else; `header` then indexes the rows that remain, and the
/// data starts right after it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    pub header: usize,
    pub skip: &'static [usize],
}

impl OutputKind {
    pub const ALL: [OutputKind; 7] = [
        OutputKind::Compartments,
        OutputKind::Devices,
        OutputKind::Masses,
        OutputKind::Vents,
        OutputKind::Walls,
        OutputKind::Zone,
        OutputKind::Diagnostics,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            OutputKind::Compartments => "compartments",
            OutputKind::Devices => "devices",
            OutputKind::Masses => "masses",
            OutputKind::Vents => "vents",
            OutputKind::Walls => "walls",
            OutputKind::Zone => "zone",
            OutputKind::Diagnostics => "diagnostics",
        }
    }

    pub fn is_optional(self) -> bool {
        self == OutputKind::Diagnostics
    }

    /// The non-zone files open with four metadata rows (name, units,
    /// position, compartment); only the first is kept, as column names.
    pub fn layout(self) -> Layout {
        const METADATA: &[usize] = &[1, 2, 3];
        match self {
            OutputKind::Zone => Layout { header: 1, skip: &[] },
            OutputKind::Diagnostics => Layout {
                header: 1,
                skip: METADATA,
            },
            _ => Layout {
                header: 0,
                skip: METADATA,
            },
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl std::str::FromStr for OutputKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutputKind::ALL
            .into_iter()
            .find(|k| k.suffix().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown output kind '{s}'"))
    }
}

/// A time-indexed table. Blank or non-numeric cells read as `None`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<f64>>>,
}

impl OutputTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let at = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r.get(at).copied().flatten()).collect())
    }

    /// First column; the solver always writes simulation time there.
    pub fn time(&self) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.first().copied().flatten()).collect()
    }

    pub fn max(&self, name: &str) -> Option<f64> {
        self.column(name)?.into_iter().flatten().reduce(f64::max)
    }

    pub fn last(&self, name: &str) -> Option<f64> {
        self.column(name)?.into_iter().flatten().last()
    }
}

/// Tables of one run, keyed by kind. Only files the run produced appear.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunOutputs {
    tables: BTreeMap<OutputKind, OutputTable>,
}

impl RunOutputs {
    pub fn insert(&mut self, kind: OutputKind, table: OutputTable) {
        self.tables.insert(kind, table);
    }

    pub fn get(&self, kind: OutputKind) -> Option<&OutputTable> {
        self.tables.get(&kind)
    }

    pub fn contains(&self, kind: OutputKind) -> bool {
        self.tables.contains_key(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = OutputKind> + '_ {
        self.tables.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (OutputKind, &OutputTable)> {
        self.tables.iter().map(|(k, t)| (*k, t))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Required kinds the run did not produce.
    pub fn missing(&self) -> Vec<OutputKind> {
        OutputKind::ALL
            .into_iter()
            .filter(|k| !k.is_optional() && !self.contains(*k))
            .collect()
    }
}

/// What a finished run reports about itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub deck: String,
    pub solver: String,
    pub started_at: String,
    pub elapsed_s: f64,
    pub outputs: Vec<OutputKind>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> OutputTable {
        OutputTable {
            columns: vec!["Time".into(), "ULT_1".into(), "HGT_1".into()],
            rows: vec![
                vec![Some(0.0), Some(20.0), Some(2.4)],
                vec![Some(10.0), Some(85.5), None],
                vec![Some(20.0), Some(60.0), Some(1.1)],
            ],
        }
    }

    #[test]
    fn column_access() {
        let t = table();
        assert_eq!(t.len(), 3);
        assert_eq!(t.time(), vec![Some(0.0), Some(10.0), Some(20.0)]);
        assert_eq!(t.max("ULT_1"), Some(85.5));
        assert_eq!(t.last("HGT_1"), Some(1.1));
        assert_eq!(t.column("HGT_1").unwrap()[1], None);
        assert!(t.column("nope").is_none());
    }

    #[test]
    fn kinds_parse_by_suffix() {
        assert_eq!("Zone".parse::<OutputKind>().unwrap(), OutputKind::Zone);
        assert!("smoke".parse::<OutputKind>().is_err());
        for kind in OutputKind::ALL {
            assert_eq!(kind.to_string().parse::<OutputKind>().unwrap(), kind);
        }
    }

    #[test]
    fn missing_ignores_optional_kinds() {
        let mut outputs = RunOutputs::default();
        for kind in OutputKind::ALL.into_iter().filter(|k| !k.is_optional()) {
            outputs.insert(kind, OutputTable::default());
        }
        assert!(outputs.missing().is_empty());
        assert!(!outputs.contains(OutputKind::Diagnostics));
    }

    #[test]
    fn outputs_serialize_as_a_map() {
        let mut outputs = RunOutputs::default();
        outputs.insert(OutputKind::Walls, table());
        let json = serde_json::to_value(&outputs).unwrap();
        assert_eq!(json["walls"]["columns"][1], "ULT_1");
        assert!(json["walls"]["rows"][1][2].is_null());
    }
}
