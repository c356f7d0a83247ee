//! Deck paths with a run in progress.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock, PoisonError};

use tracing::debug;

use crate::error::{AppError, AppResult};

fn in_flight() -> &'static Mutex<HashSet<PathBuf>> {
    static IN_FLIGHT: OnceLock<Mutex<HashSet<PathBuf>>> = OnceLock::new();
    IN_FLIGHT.get_or_init(Default::default)
}

/// Exclusive claim on a deck for the life of one run. The solver names its
/// log and outputs after the deck stem, so the claim covers `<dir>/<stem>`
/// whatever the extension. Dropping the lease releases it.
#[derive(Debug)]
pub struct DeckLease {
    path: PathBuf,
    key: PathBuf,
}

impl DeckLease {
    /// Fails with [`AppError::DeckBusy`] while another lease holds a deck
    /// with the same directory and stem.
    pub fn acquire(path: &Path) -> AppResult<Self> {
        let path = std::path::absolute(path)?;
        let key = path.with_extension("");
        let mut set = in_flight().lock().unwrap_or_else(PoisonError::into_inner);
        if !set.insert(key.clone()) {
            return Err(AppError::DeckBusy { path });
        }
        debug!(deck = %path.display(), "deck leased");
        Ok(Self { path, key })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DeckLease {
    fn drop(&mut self) {
        in_flight()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_lease_on_a_path_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let deck = dir.path().join("case.in");
        let first = DeckLease::acquire(&deck).unwrap();
        assert!(matches!(
            DeckLease::acquire(&deck),
            Err(AppError::DeckBusy { .. })
        ));
        let other = DeckLease::acquire(&dir.path().join("other.in")).unwrap();
        drop(first);
        let again = DeckLease::acquire(&deck).unwrap();
        assert_eq!(again.path(), deck);
        drop(other);
    }

    #[test]
    fn decks_sharing_a_stem_collide() {
        let dir = tempfile::tempdir().unwrap();
        let held = DeckLease::acquire(&dir.path().join("case.in")).unwrap();
        for other in ["case.dat", "case"] {
            assert!(matches!(
                DeckLease::acquire(&dir.path().join(other)),
                Err(AppError::DeckBusy { .. })
            ));
        }
        let _sibling = DeckLease::acquire(&dir.path().join("case_2.in")).unwrap();
        drop(held);
        DeckLease::acquire(&dir.path().join("case.dat")).unwrap();
    }

    #[test]
    fn relative_and_absolute_spellings_collide() {
        let dir = std::env::current_dir().unwrap();
        let _held = DeckLease::acquire(Path::new("lease_relative_case.in")).unwrap();
        assert!(DeckLease::acquire(&dir.join("lease_relative_case.in")).is_err());
    }
}
