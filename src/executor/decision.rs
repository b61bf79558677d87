//! Decisions made by the executor stages
//!
//! A decision is computed before anything is applied. Dry runs report the
//! decisions and stop; real runs report the same decisions and then apply
//! them.

use std::fmt;
use std::path::PathBuf;

use crate::config::ScriptKind;
use crate::host::ProvisionAction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Select {
        unit: String,
    },
    Provision {
        path: PathBuf,
        action: ProvisionAction,
    },
    Copy {
        unit: String,
        archive: String,
        destination: PathBuf,
    },
    Install {
        unit: String,
        archives: Vec<String>,
        environment: String,
        with_dependencies: bool,
    },
    RunScript {
        unit: String,
        kind: ScriptKind,
        script: String,
    },
    MissingScript {
        unit: String,
        kind: ScriptKind,
        script: String,
    },
    InvokeEntry {
        entry: String,
        environment: String,
    },
    ListUnit {
        unit: String,
        entrypoint: Option<String>,
        archives: Vec<String>,
        scripts: Vec<String>,
        includes: Vec<String>,
    },
    UnitInfo {
        unit: String,
        name: String,
        version: String,
        entrypoint: Option<String>,
        wheels: Vec<String>,
        dependencies: Vec<String>,
        includes: Vec<String>,
        pre_scripts: Vec<String>,
        post_scripts: Vec<String>,
        metadata: Vec<(String, String)>,
    },
    UnitScripts {
        unit: String,
        pre: Vec<String>,
        post: Vec<String>,
    },
    ShowVersion {
        tool: String,
        units: Vec<String>,
    },
}

impl Decision {
    /// Verb used when reporting this decision
    pub fn verb(&self) -> &'static str {
        match self {
            Decision::Select { .. } => "select",
            Decision::Provision {
                action: ProvisionAction::Create,
                ..
            } => "create",
            Decision::Provision {
                action: ProvisionAction::Reuse,
                ..
            } => "reuse",
            Decision::Copy { .. } => "copy",
            Decision::Install { .. } => "install",
            Decision::RunScript { .. } => "run",
            Decision::MissingScript { .. } => "skip",
            Decision::InvokeEntry { .. } => "invoke",
            Decision::ListUnit { .. } => "list",
            Decision::UnitInfo { .. } | Decision::UnitScripts { .. } | Decision::ShowVersion { .. } => {
                "show"
            }
        }
    }

    /// Per-file decisions only shown with `--verbose`
    pub fn is_detail(&self) -> bool {
        matches!(self, Decision::Select { .. } | Decision::Copy { .. })
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Select { unit } => write!(f, "{unit}"),
            Decision::Provision { path, .. } => write!(f, "environment at {}", path.display()),
            Decision::Copy {
                unit,
                archive,
                destination,
            } => write!(f, "{archive} ({unit}) to {}", destination.display()),
            Decision::Install {
                unit,
                archives,
                environment,
                with_dependencies,
            } => {
                write!(f, "{unit} ({} archive(s)) into {environment}", archives.len())?;
                if !with_dependencies {
                    f.write_str(" without dependencies")?;
                }
                Ok(())
            }
            Decision::RunScript { unit, kind, script } => write!(f, "{kind} script {script} of {unit}"),
            Decision::MissingScript { unit, kind, script } => {
                write!(f, "missing {kind} script {script} of {unit}")
            }
            Decision::InvokeEntry { entry, environment } => write!(f, "{entry} in {environment}"),
            Decision::ListUnit { unit, .. }
            | Decision::UnitInfo { unit, .. }
            | Decision::UnitScripts { unit, .. } => write!(f, "{unit}"),
            Decision::ShowVersion { tool, .. } => write!(f, "chub {tool}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_display() {
        let decision = Decision::Install {
            unit: "pkg-1.0".to_string(),
            archives: vec!["a.whl".to_string(), "b.whl".to_string()],
            environment: "current environment (python3)".to_string(),
            with_dependencies: false,
        };
        assert_eq!(decision.verb(), "install");
        assert_eq!(
            decision.to_string(),
            "pkg-1.0 (2 archive(s)) into current environment (python3) without dependencies"
        );
    }

    #[test]
    fn test_script_display_names_kind() {
        let decision = Decision::MissingScript {
            unit: "pkg-1.0".to_string(),
            kind: ScriptKind::Pre,
            script: "check.sh".to_string(),
        };
        assert_eq!(decision.verb(), "skip");
        assert_eq!(
            decision.to_string(),
            "missing pre-install script check.sh of pkg-1.0"
        );
    }

    #[test]
    fn test_copy_is_detail() {
        let decision = Decision::Copy {
            unit: "pkg-1.0".to_string(),
            archive: "a.whl".to_string(),
            destination: PathBuf::from("out/a.whl"),
        };
        assert!(decision.is_detail());
        assert_eq!(decision.to_string(), "a.whl (pkg-1.0) to out/a.whl");
    }
}
