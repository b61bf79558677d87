//! Script stage: pre- and post-install scripts, unit by unit

use std::path::PathBuf;

use crate::bundle::Bundle;
use crate::config::{PackageUnit, ScriptKind};
use crate::error::{ChubError, runtime};
use crate::host::{Environment, ScriptRunner};

/// The scripts of one kind for one unit, in run order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptStep {
    pub unit: String,
    pub kind: ScriptKind,
    pub scripts: Vec<(String, PathBuf)>,
    /// First script absent from the bundle; it and everything after it are skipped
    pub missing: Option<String>,
}

impl ScriptStep {
    /// The failure a missing script amounts to
    pub fn missing_failure(&self) -> Option<ChubError> {
        self.missing.as_ref().map(|script| {
            runtime::script_not_runnable(self.kind, &self.unit, script, "not found in the bundle")
        })
    }
}

/// A unit whose scripts did not complete
#[derive(Debug)]
pub struct ScriptFailure {
    pub unit: String,
    pub error: ChubError,
}

pub fn decide_scripts(bundle: &Bundle, units: &[&PackageUnit], kind: ScriptKind) -> Vec<ScriptStep> {
    units
        .iter()
        .filter(|u| !u.scripts(kind).is_empty())
        .map(|unit| {
            let mut scripts = Vec::new();
            let mut missing = None;
            for name in unit.scripts(kind) {
                let path = bundle.script_path(unit, kind, name);
                if !path.is_file() {
                    missing = Some(name.clone());
                    break;
                }
                scripts.push((name.clone(), path));
            }
            ScriptStep {
                unit: unit.unit_dir(),
                kind,
                scripts,
                missing,
            }
        })
        .collect()
}

/// Run every step; a failing script stops its own unit only.
///
/// Returns one failure per unit that did not complete.
pub fn apply_scripts(
    steps: &[ScriptStep],
    runner: &dyn ScriptRunner,
    env: &Environment,
) -> Vec<ScriptFailure> {
    let mut failures = Vec::new();
    for step in steps {
        if let Some(error) = run_unit(step, runner, env) {
            tracing::warn!("{}", error);
            failures.push(ScriptFailure {
                unit: step.unit.clone(),
                error,
            });
        }
    }
    failures
}

fn run_unit(step: &ScriptStep, runner: &dyn ScriptRunner, env: &Environment) -> Option<ChubError> {
    for (name, path) in &step.scripts {
        tracing::debug!("Running {} script {} for {}", step.kind, name, step.unit);
        match runner.run(path, env) {
            Ok(0) => {}
            Ok(status) => return Some(runtime::script_failed(step.kind, &step.unit, name, status)),
            Err(e) => {
                return Some(runtime::script_not_runnable(
                    step.kind,
                    &step.unit,
                    name,
                    e.to_string(),
                ));
            }
        }
    }
    step.missing_failure()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{create_temp_dir, create_test_files};
    use std::cell::RefCell;
    use std::path::Path;

    /// Runner that fails scripts whose name contains "fail"
    #[derive(Default)]
    struct FakeRunner {
        ran: RefCell<Vec<String>>,
    }

    impl ScriptRunner for FakeRunner {
        fn run(&self, script: &Path, _env: &Environment) -> crate::error::Result<i32> {
            let name = script.file_name().unwrap().to_string_lossy().into_owned();
            self.ran.borrow_mut().push(name.clone());
            Ok(if name.contains("fail") { 2 } else { 0 })
        }
    }

    const CONFIG: &str = "---
name: first
version: '1'
pre_install_scripts: [check.sh]
post_install_scripts: [a.sh, fail.sh, never.sh]
---
name: second
version: '1'
post_install_scripts: [b.sh]
---
name: third
version: '1'
post_install_scripts: [c.sh, gone.sh, d.sh]
";

    fn bundle_dir() -> tempfile::TempDir {
        let temp = create_temp_dir();
        create_test_files(
            temp.path(),
            &[
                (".chubconfig", CONFIG),
                ("first-1/scripts/pre/check.sh", ""),
                ("first-1/scripts/post/a.sh", ""),
                ("first-1/scripts/post/fail.sh", ""),
                ("first-1/scripts/post/never.sh", ""),
                ("second-1/scripts/post/b.sh", ""),
                ("third-1/scripts/post/c.sh", ""),
                ("third-1/scripts/post/d.sh", ""),
            ],
        );
        temp
    }

    #[test]
    fn test_decide_stops_at_missing_script() {
        let temp = bundle_dir();
        let bundle = Bundle::open(temp.path()).unwrap();
        let units: Vec<&PackageUnit> = bundle.document().units().iter().collect();

        let steps = decide_scripts(&bundle, &units, ScriptKind::Post);
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[2].scripts.len(), 1);
        assert_eq!(steps[2].missing.as_deref(), Some("gone.sh"));
    }

    #[test]
    fn test_decide_reads_scripts_of_one_kind() {
        let temp = bundle_dir();
        let bundle = Bundle::open(temp.path()).unwrap();
        let units: Vec<&PackageUnit> = bundle.document().units().iter().collect();

        let steps = decide_scripts(&bundle, &units, ScriptKind::Pre);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].kind, ScriptKind::Pre);
        assert_eq!(
            steps[0].scripts[0].1,
            bundle.root().join("first-1/scripts/pre/check.sh")
        );
        assert!(steps[0].missing.is_none());
    }

    #[test]
    fn test_failure_halts_unit_but_not_others() {
        let temp = bundle_dir();
        let bundle = Bundle::open(temp.path()).unwrap();
        let units: Vec<&PackageUnit> = bundle.document().units().iter().collect();
        let runner = FakeRunner::default();

        let steps = decide_scripts(&bundle, &units, ScriptKind::Post);
        let failures = apply_scripts(&steps, &runner, &Environment::host("python3"));

        assert_eq!(
            *runner.ran.borrow(),
            vec!["a.sh", "fail.sh", "b.sh", "c.sh"]
        );
        let units: Vec<&str> = failures.iter().map(|f| f.unit.as_str()).collect();
        assert_eq!(units, vec!["first-1", "third-1"]);
        assert!(matches!(
            failures[0].error,
            ChubError::ScriptFailed { kind: ScriptKind::Post, status: 2, .. }
        ));
        assert!(matches!(
            failures[1].error,
            ChubError::ScriptNotRunnable { ref script, .. } if script == "gone.sh"
        ));
    }
}
