//! File system errors

use std::path::Path;

use super::ChubError;

/// Creates a file not found error
pub fn not_found(path: &Path) -> ChubError {
    ChubError::FileNotFound {
        path: path.display().to_string(),
    }
}

/// Creates a file read failed error
pub fn read_failed(path: &Path, err: &std::io::Error) -> ChubError {
    ChubError::FileReadFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Creates a file write failed error
pub fn write_failed(path: &Path, err: &std::io::Error) -> ChubError {
    ChubError::FileWriteFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}
