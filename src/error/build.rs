//! Bundle assembly errors

use super::{ChubError, ErrorCategory};

/// Creates a dependency resolver failure
pub fn resolver_failed(archive: impl Into<String>, reason: impl Into<String>) -> ChubError {
    ChubError::ResolverFailed {
        archive: archive.into(),
        reason: reason.into(),
    }
}

/// Creates a missing wheel metadata error
pub fn metadata_missing(path: impl Into<String>, reason: impl Into<String>) -> ChubError {
    ChubError::WheelMetadataMissing {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates an archive read/write failure
pub fn archive_failed(path: impl Into<String>, reason: impl Into<String>) -> ChubError {
    ChubError::ArchiveFailed {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates an invalid `KEY=VALUE` metadata entry error
pub fn invalid_metadata_entry(entry: impl Into<String>) -> ChubError {
    ChubError::InvalidMetadataEntry {
        entry: entry.into(),
    }
}

/// Report an I/O failure met while assembling a bundle as a build failure
///
/// Errors of every other category pass through unchanged.
pub fn escalate_io(err: ChubError) -> ChubError {
    if err.category() == ErrorCategory::Io {
        ChubError::BuildIoFailed {
            reason: err.to_string(),
        }
    } else {
        err
    }
}
