//! Bundle layout errors

use super::ChubError;

/// Creates a unit directory collision error
pub fn unit_dir_conflict(unit_dir: impl Into<String>) -> ChubError {
    ChubError::UnitDirConflict {
        unit_dir: unit_dir.into(),
    }
}

/// Creates an error for a unit directory that is not a single plain path component
pub fn invalid_unit_dir(unit_dir: impl Into<String>) -> ChubError {
    ChubError::InvalidUnitDir {
        unit_dir: unit_dir.into(),
    }
}

/// Creates a reserved name error
pub fn reserved_name(name: impl Into<String>) -> ChubError {
    ChubError::ReservedUnitName { name: name.into() }
}

/// Creates a missing source error; `kind` reads like "Include" or "Script"
pub fn source_not_found(kind: impl Into<String>, path: impl Into<String>) -> ChubError {
    ChubError::SourceNotFound {
        kind: kind.into(),
        path: path.into(),
    }
}

/// Creates a destination collision error
pub fn destination_conflict(
    destination: impl Into<String>,
    first: impl Into<String>,
    second: impl Into<String>,
) -> ChubError {
    ChubError::DestinationConflict {
        destination: destination.into(),
        first: first.into(),
        second: second.into(),
    }
}

/// Creates an invalid destination error
pub fn invalid_destination(destination: impl Into<String>, reason: impl Into<String>) -> ChubError {
    ChubError::InvalidDestination {
        destination: destination.into(),
        reason: reason.into(),
    }
}
