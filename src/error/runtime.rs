//! Runtime errors: options, selection, extraction, scripts, provisioning and entry

use super::ChubError;
use crate::config::ScriptKind;

/// Creates a flag conflict error
pub fn option_conflict(first: impl Into<String>, second: impl Into<String>) -> ChubError {
    ChubError::OptionConflict {
        first: first.into(),
        second: second.into(),
    }
}

/// Creates an error for an explicit flag that another flag disables
pub fn option_disabled(flag: impl Into<String>, rule: impl Into<String>) -> ChubError {
    ChubError::OptionDisabled {
        flag: flag.into(),
        rule: rule.into(),
    }
}

/// Creates an invalid flag value error
pub fn invalid_option_value(flag: impl Into<String>, reason: impl Into<String>) -> ChubError {
    ChubError::InvalidOptionValue {
        flag: flag.into(),
        reason: reason.into(),
    }
}

/// Creates an empty selection error
pub fn no_units_selected(selectors: &[String]) -> ChubError {
    let selectors = if selectors.is_empty() {
        "the bundle (it is empty)".to_string()
    } else {
        selectors
            .iter()
            .map(|s| format!("'{s}'"))
            .collect::<Vec<_>>()
            .join(", ")
    };
    ChubError::NoUnitsSelected { selectors }
}

/// Creates an extraction failure
pub fn extraction_failed(unit: impl Into<String>, reason: impl Into<String>) -> ChubError {
    ChubError::ExtractionFailed {
        unit: unit.into(),
        reason: reason.into(),
    }
}

/// Creates a non-zero script outcome error
pub fn script_failed(
    kind: ScriptKind,
    unit: impl Into<String>,
    script: impl Into<String>,
    status: i32,
) -> ChubError {
    ChubError::ScriptFailed {
        kind,
        unit: unit.into(),
        script: script.into(),
        status,
    }
}

/// Creates a script that could not be started
pub fn script_not_runnable(
    kind: ScriptKind,
    unit: impl Into<String>,
    script: impl Into<String>,
    reason: impl Into<String>,
) -> ChubError {
    ChubError::ScriptNotRunnable {
        kind,
        unit: unit.into(),
        script: script.into(),
        reason: reason.into(),
    }
}

/// Creates a provisioning failure
pub fn provision_failed(path: impl Into<String>, reason: impl Into<String>) -> ChubError {
    ChubError::ProvisionFailed {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates an entry invocation failure
pub fn entry_failed(entry: impl Into<String>, reason: impl Into<String>) -> ChubError {
    ChubError::EntryInvokeFailed {
        entry: entry.into(),
        reason: reason.into(),
    }
}
