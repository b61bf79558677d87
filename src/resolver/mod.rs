//! Dependency resolution for primary archives
//!
//! Resolution itself is delegated to an external tool. The bundle builder
//! only needs the list of dependency archives that land in a directory.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{self, Result};

/// Fetches the dependency archives of a primary archive
pub trait DependencyResolver {
    /// Download the dependencies of `archive` into `dest` and return their
    /// paths, excluding `archive` itself
    fn resolve(&self, archive: &Path, dest: &Path) -> Result<Vec<PathBuf>>;

    /// Short name for progress output
    fn name(&self) -> &'static str;
}

/// Resolver backed by `python -m pip download`
#[derive(Debug, Clone)]
pub struct PipResolver {
    python: String,
}

impl PipResolver {
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }
}

impl DependencyResolver for PipResolver {
    fn resolve(&self, archive: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
        let shown = archive.display().to_string();
        let before = wheel_files(dest)?;

        tracing::debug!("Running {} -m pip download {}", self.python, shown);
        let output = Command::new(&self.python)
            .args(["-m", "pip", "download", "--quiet", "--only-binary", ":all:"])
            .arg("--dest")
            .arg(dest)
            .arg(archive)
            .output()
            .map_err(|e| {
                error::build::resolver_failed(&shown, format!("cannot run {}: {e}", self.python))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
            let reason = tail.into_iter().rev().collect::<Vec<_>>().join("\n");
            return Err(error::build::resolver_failed(
                shown,
                if reason.is_empty() {
                    format!("pip exited with {}", output.status)
                } else {
                    reason
                },
            ));
        }

        let primary = archive.file_name();
        let resolved: Vec<PathBuf> = wheel_files(dest)?
            .difference(&before)
            .filter(|p| p.file_name() != primary)
            .cloned()
            .collect();
        tracing::debug!("Resolved {} dependency archive(s)", resolved.len());
        Ok(resolved)
    }

    fn name(&self) -> &'static str {
        "pip"
    }
}

/// Resolver that bundles the primary archive alone
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl DependencyResolver for NoResolver {
    fn resolve(&self, _archive: &Path, _dest: &Path) -> Result<Vec<PathBuf>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Sorted `.whl` files directly inside `dir`
fn wheel_files(dir: &Path) -> Result<BTreeSet<PathBuf>> {
    if !dir.is_dir() {
        return Ok(BTreeSet::new());
    }
    let entries = fs::read_dir(dir).map_err(|e| error::fs::read_failed(dir, &e))?;
    let mut files = BTreeSet::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file()
            && path.extension().and_then(|e| e.to_str()) == Some(crate::bundle::wheel::WHEEL_EXTENSION)
        {
            files.insert(path);
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{create_temp_dir, create_test_files};

    #[test]
    fn test_no_resolver_returns_nothing() {
        let temp = create_temp_dir();
        let resolved = NoResolver
            .resolve(&temp.path().join("a-1-py3-none-any.whl"), temp.path())
            .unwrap();
        assert!(resolved.is_empty());
    }

    #[test]
    fn test_wheel_files_filters_and_sorts() {
        let temp = create_temp_dir();
        create_test_files(
            temp.path(),
            &[
                ("b-1-py3-none-any.whl", ""),
                ("a-1-py3-none-any.whl", ""),
                ("notes.txt", ""),
            ],
        );
        let files: Vec<_> = wheel_files(temp.path())
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files, vec!["a-1-py3-none-any.whl", "b-1-py3-none-any.whl"]);
    }

    #[test]
    fn test_pip_resolver_reports_missing_interpreter() {
        let temp = create_temp_dir();
        let resolver = PipResolver::new("chub-no-such-python");
        let err = resolver
            .resolve(&temp.path().join("a-1-py3-none-any.whl"), temp.path())
            .unwrap_err();
        assert!(matches!(err, crate::error::ChubError::ResolverFailed { .. }));
    }
}
