//! Pure translation between records and Central's representation.
//!
//! Nothing here touches the network. Enumerated fields go through the closed
//! tables in `rox_central::enums`; a value outside a table never aborts a
//! pass, it shows up as drift instead.

pub mod cluster;
pub mod init_bundle;

use rox_central::enums::{ALL_TABLES, EnumTable};

use crate::error::ProvisionerError;

/// Check every enum table once, before the first pass runs.
pub fn validate_tables() -> Result<(), ProvisionerError> {
    for table in ALL_TABLES {
        table.validate().map_err(ProvisionerError::InvalidEnumTable)?;
    }
    Ok(())
}

/// Code for a user-facing enum name. Empty and unknown names map to the
/// remote default.
pub(crate) fn code_for(table: &EnumTable, name: &str) -> i32 {
    if name.is_empty() {
        return 0;
    }
    table.code_of(name).unwrap_or_else(|| {
        tracing::warn!(field = table.field, name, "unknown enum name, sending default");
        0
    })
}

/// User-facing name for a remote code. Unknown codes map to an empty label.
pub(crate) fn label_for(table: &EnumTable, code: i32) -> String {
    match table.name_of(code) {
        Some(name) => name.to_string(),
        None => {
            tracing::warn!(field = table.field, code, "unknown enum code from Central");
            String::new()
        }
    }
}

/// The name the remote default code stands for, used when a record leaves an
/// enum field empty.
pub(crate) fn default_label(table: &EnumTable) -> String {
    table.name_of(0).unwrap_or_default().to_string()
}
