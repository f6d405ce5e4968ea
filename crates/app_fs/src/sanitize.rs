//! Entry name validation

use crate::{FsError, Result};

/// Synthetic back-navigation entry shown by the explorer. Never a real entry.
pub const BACK_ENTRY: &str = "..";

/// Names that can never be used for an entry
const RESERVED_NAMES: &[&str] = &[".", BACK_ENTRY];

/// Validate a name for a new or renamed entry
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(FsError::InvalidName("name is empty".into()));
    }

    if RESERVED_NAMES.contains(&name) {
        return Err(FsError::InvalidName(format!("'{}' is not a valid entry name", name)));
    }

    if name.contains('/') {
        return Err(FsError::InvalidName(format!("'{}' contains '/'", name)));
    }

    if name.chars().any(char::is_control) {
        return Err(FsError::InvalidName(format!("'{}' contains control characters", name.escape_debug())));
    }

    Ok(())
}

/// Check if a name is valid for an entry
pub fn is_valid_name(name: &str) -> bool {
    validate_name(name).is_ok()
}
