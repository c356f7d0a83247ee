//! Where rendered decks are written.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::{ModelError, ModelResult};

pub trait DeckSink {
    fn write_deck(&self, path: &Path, text: &str) -> ModelResult<()>;
}

/// Writes decks to the file system, creating parent directories as needed.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileSink;

impl DeckSink for FileSink {
    fn write_deck(&self, path: &Path, text: &str) -> ModelResult<()> {
        let write = || {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)?;
            }
            fs::write(path, text)
        };
        write().map_err(|source| ModelError::DeckWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Keeps decks in memory, keyed by path.
#[derive(Debug, Default)]
pub struct MemorySink {
    decks: Mutex<BTreeMap<PathBuf, String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.decks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path.as_ref())
            .cloned()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.decks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl DeckSink for MemorySink {
    fn write_deck(&self, path: &Path, text: &str) -> ModelResult<()> {
        self.decks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_path_buf(), text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sink_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("case.in");
        FileSink.write_deck(&path, "&TAIL /\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "&TAIL /\n");
    }

    #[test]
    fn file_sink_reports_path_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let err = FileSink
            .write_deck(&blocker.join("case.in"), "")
            .unwrap_err();
        assert!(matches!(err, ModelError::DeckWrite { ref path, .. } if path.ends_with("case.in")));
    }

    #[test]
    fn memory_sink_overwrites() {
        let sink = MemorySink::new();
        sink.write_deck(Path::new("x.in"), "one").unwrap();
        sink.write_deck(Path::new("x.in"), "two").unwrap();
        assert_eq!(sink.get("x.in").as_deref(), Some("two"));
        assert_eq!(sink.paths(), vec![PathBuf::from("x.in")]);
    }
}
