//! Config document errors

use super::ChubError;

/// Creates a config not found error
pub fn not_found(path: impl Into<String>) -> ChubError {
    ChubError::ConfigNotFound { path: path.into() }
}

/// Creates a config parse failed error
pub fn parse_failed(path: impl Into<String>, reason: impl Into<String>) -> ChubError {
    ChubError::ConfigParseFailed {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates an invalid record error for the record at `index` (1-based)
pub fn invalid_record(index: usize, reason: impl Into<String>) -> ChubError {
    ChubError::InvalidRecord {
        index,
        reason: reason.into(),
    }
}

/// Creates a duplicate unit identity error
pub fn duplicate_unit(name: impl Into<String>, version: impl Into<String>) -> ChubError {
    ChubError::DuplicateUnit {
        name: name.into(),
        version: version.into(),
    }
}

/// Creates an invalid project file error
pub fn invalid_project(path: impl Into<String>, reason: impl Into<String>) -> ChubError {
    ChubError::InvalidProjectFile {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates an invalid entrypoint error
pub fn invalid_entrypoint(entry: impl Into<String>, reason: impl Into<String>) -> ChubError {
    ChubError::InvalidEntrypoint {
        entry: entry.into(),
        reason: reason.into(),
    }
}
