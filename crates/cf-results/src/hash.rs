//! Content-based hashing for run IDs.

use sha2::{Digest, Sha256};

/// Hashes the deck text together with the solver and its arguments, so two
/// runs of the same input against the same solver share an id.
pub fn compute_run_id(deck: &str, solver: &str, arguments: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(deck.as_bytes());
    hasher.update([0]);
    hasher.update(solver.as_bytes());

    let arguments_json = serde_json::to_string(arguments).unwrap_or_default();
    hasher.update(arguments_json.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}
