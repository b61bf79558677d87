//! Extract stage: unpacking archives into a directory or installing them

use std::fs;
use std::path::{Path, PathBuf};

use crate::bundle::Bundle;
use crate::config::PackageUnit;
use crate::error::{ChubError, Result, runtime};
use crate::host::{Environment, EnvironmentProvisioner};
use crate::options::ArchiveScope;
use crate::temp;
use crate::transaction::Transaction;

/// One archive to copy out of the bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyStep {
    pub unit: String,
    pub archive: String,
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// The archives of one unit to hand to the installer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallStep {
    pub unit: String,
    pub archives: Vec<PathBuf>,
    pub with_dependencies: bool,
}

impl InstallStep {
    pub fn archive_names(&self) -> Vec<String> {
        self.archives
            .iter()
            .filter_map(|a| a.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect()
    }
}

/// Archive file names of `unit` that fall in `scope`
pub fn archives_in_scope(unit: &PackageUnit, scope: ArchiveScope) -> Vec<&str> {
    match scope {
        ArchiveScope::All => unit
            .primary_archives()
            .into_iter()
            .chain(unit.dependency_archives())
            .collect(),
        ArchiveScope::PrimaryOnly => unit.primary_archives(),
        ArchiveScope::DependenciesOnly => unit.dependency_archives(),
    }
}

/// Bundle paths of the archives in scope, failing if any is missing
fn located_archives(
    bundle: &Bundle,
    unit: &PackageUnit,
    scope: ArchiveScope,
) -> Result<Vec<(String, PathBuf)>> {
    archives_in_scope(unit, scope)
        .into_iter()
        .map(|name| {
            let path = bundle.archive_path(unit, name);
            if path.is_file() {
                Ok((name.to_string(), path))
            } else {
                Err(runtime::extraction_failed(
                    unit.unit_dir(),
                    format!("archive {name} is missing from the bundle"),
                ))
            }
        })
        .collect()
}

/// Plan the copies for unpack mode; an archive shared by several units is copied once
pub fn decide_unpack(
    bundle: &Bundle,
    units: &[&PackageUnit],
    scope: ArchiveScope,
    dest: &Path,
) -> Result<Vec<CopyStep>> {
    let mut steps: Vec<CopyStep> = Vec::new();
    for unit in units {
        for (archive, source) in located_archives(bundle, unit, scope)? {
            if steps.iter().any(|s| s.archive == archive) {
                continue;
            }
            steps.push(CopyStep {
                unit: unit.unit_dir(),
                destination: dest.join(&archive),
                archive,
                source,
            });
        }
    }
    Ok(steps)
}

/// Copy archives into `dest` through a staging area; nothing lands unless
/// every copy succeeds
pub fn apply_unpack(steps: &[CopyStep], dest: &Path) -> Result<()> {
    let mut transaction = Transaction::new();
    transaction.create_dir_all(dest)?;
    let staging = temp::scratch_dir_in(dest, ".chub-unpack-")?;

    for step in steps {
        fs::copy(&step.source, staging.path().join(&step.archive))
            .map_err(|e| runtime::extraction_failed(&step.unit, e.to_string()))?;
    }
    for step in steps {
        transaction
            .place_file(&staging.path().join(&step.archive), &step.destination)
            .map_err(|e| runtime::extraction_failed(&step.unit, e.to_string()))?;
    }

    transaction.commit();
    Ok(())
}

/// Plan one install per unit with archives in scope
pub fn decide_install(
    bundle: &Bundle,
    units: &[&PackageUnit],
    scope: ArchiveScope,
) -> Result<Vec<InstallStep>> {
    let mut steps = Vec::new();
    for unit in units {
        let archives: Vec<PathBuf> = located_archives(bundle, unit, scope)?
            .into_iter()
            .map(|(_, path)| path)
            .collect();
        if archives.is_empty() {
            continue;
        }
        steps.push(InstallStep {
            unit: unit.unit_dir(),
            archives,
            with_dependencies: scope != ArchiveScope::PrimaryOnly,
        });
    }
    Ok(steps)
}

/// Hand each unit's archives to the provisioner, in order
pub fn apply_install(
    steps: &[InstallStep],
    provisioner: &dyn EnvironmentProvisioner,
    env: &Environment,
) -> Result<()> {
    for step in steps {
        provisioner
            .install(env, &step.archives, step.with_dependencies)
            .map_err(|e| match e {
                ChubError::ExtractionFailed { reason, .. } => {
                    runtime::extraction_failed(&step.unit, reason)
                }
                other => other,
            })?;
    }
    Ok(())
}
