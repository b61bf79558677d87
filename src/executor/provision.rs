//! Provision stage: the environment installs and entrypoints target

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::host::{Environment, EnvironmentProvisioner, ProvisionAction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionStep {
    pub path: PathBuf,
    pub action: ProvisionAction,
}

/// Inspect the requested environment path without touching it
pub fn decide_provision(
    provisioner: &dyn EnvironmentProvisioner,
    path: Option<&Path>,
) -> Result<Option<ProvisionStep>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let action = provisioner.inspect(path)?;
    Ok(Some(ProvisionStep {
        path: path.to_path_buf(),
        action,
    }))
}

/// The environment later stages target, as it will be after provisioning
pub fn target_environment(
    provisioner: &dyn EnvironmentProvisioner,
    step: Option<&ProvisionStep>,
) -> Environment {
    match step {
        Some(step) => Environment::isolated(&step.path),
        None => provisioner.current(),
    }
}

pub fn apply_provision(
    provisioner: &dyn EnvironmentProvisioner,
    step: Option<&ProvisionStep>,
) -> Result<Environment> {
    match step {
        Some(step) => provisioner.create(&step.path),
        None => Ok(provisioner.current()),
    }
}
