//! Entry stage: what to invoke once everything else is done

use crate::config::{EntryReference, PackageUnit};
use crate::error::{ChubError, Result};
use crate::host::{Environment, ProcessLauncher};
use crate::options::EntryInvocation;

/// The entrypoint baked into the selection: the last selected unit that has one
pub fn baked_entry<'a>(units: &[&'a PackageUnit]) -> Option<&'a EntryReference> {
    units.iter().rev().find_map(|u| u.entrypoint.as_ref())
}

pub fn decide_entry(
    units: &[&PackageUnit],
    invocation: &EntryInvocation,
) -> Result<Option<EntryReference>> {
    match invocation {
        EntryInvocation::Never => Ok(None),
        EntryInvocation::Override(entry) => Ok(Some(entry.clone())),
        EntryInvocation::IfBaked => Ok(baked_entry(units).cloned()),
        EntryInvocation::Required => baked_entry(units)
            .cloned()
            .map(Some)
            .ok_or(ChubError::NoEntrypoint),
    }
}

/// Launch `entry`; a non-zero exit status is an error
pub fn apply_entry(
    entry: &EntryReference,
    env: &Environment,
    launcher: &dyn ProcessLauncher,
) -> Result<i32> {
    let status = launcher.launch(env, entry)?;
    if status == 0 {
        Ok(status)
    } else {
        Err(ChubError::EntryExited {
            entry: entry.to_string(),
            status,
        })
    }
}
