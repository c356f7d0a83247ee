//! Identifier rules shared by every entity kind.

use crate::{CoreError, CoreResult};

/// Pseudo-compartment naming the exterior of the building.
pub const OUTSIDE: &str = "OUTSIDE";

/// Surface material id meaning "no heat transfer through this surface".
pub const MATERIAL_OFF: &str = "OFF";

/// Solver limit on material identifiers.
pub const MAX_MATERIAL_ID_LEN: usize = 16;

/// Any identifier: non-empty, single line, no quote characters.
pub fn check_identifier(id: &str) -> CoreResult<()> {
    let reason = if id.trim().is_empty() {
        Some("must not be empty".to_string())
    } else if id.chars().any(|c| c.is_control()) {
        Some("must not contain control characters".to_string())
    } else if id.contains(['\'', '"']) {
        Some("must not contain quote characters".to_string())
    } else {
        None
    };
    match reason {
        Some(reason) => Err(CoreError::InvalidIdentifier {
            id: id.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// An identifier that must also fit within `max` characters.
pub fn check_short_identifier(id: &str, max: usize) -> CoreResult<()> {
    check_identifier(id)?;
    let len = id.chars().count();
    if len > max {
        return Err(CoreError::InvalidIdentifier {
            id: id.to_string(),
            reason: format!("must be at most {max} characters (got {len})"),
        });
    }
    Ok(())
}
