//! Scratch directories for bundle extraction and assembly.
//!
//! Scratch space never lands under the current working directory, even when
//! `TMPDIR` is relative (e.g. `TMPDIR=tmp`).

use std::env;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{ChubError, Result};

/// Absolute base directory for scratch space
pub fn scratch_base() -> PathBuf {
    let t = env::temp_dir();
    if t.is_absolute() {
        return t;
    }
    #[cfg(windows)]
    {
        env::var("TEMP")
            .or_else(|_| env::var("TMP"))
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Windows\\Temp"))
    }
    #[cfg(not(windows))]
    {
        PathBuf::from("/tmp")
    }
}

/// Create a scratch directory under [`scratch_base`]
pub fn scratch_dir(prefix: &str) -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir_in(scratch_base())
        .map_err(|e| ChubError::IoError {
            message: format!("Failed to create scratch directory: {e}"),
        })
}

/// Create a scratch directory inside `parent`, so that renames out of it stay
/// on one filesystem
pub fn scratch_dir_in(parent: &Path, prefix: &str) -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir_in(parent)
        .map_err(|e| crate::error::fs::write_failed(parent, &e))
}
