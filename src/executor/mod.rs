//! Runtime executor
//!
//! Turns an [`InstallPlan`] into effects on a bundle. Every run goes through
//! two phases:
//! 1. Decide: select units, inspect the environment, locate archives and
//!    scripts, pick the entrypoint. Nothing is mutated, so an error here
//!    leaves the host untouched.
//! 2. Apply: skipped for dry runs, otherwise provision, run pre-install
//!    scripts, install, run post-install scripts and invoke the entrypoint in
//!    that order.
//!
//! Decisions are reported identically in both kinds of run.

pub mod decision;
pub mod entry;
pub mod extract;
pub mod provision;
pub mod scripts;
pub mod select;

use std::collections::BTreeSet;
use std::path::Path;

use crate::bundle::Bundle;
use crate::config::{PackageUnit, ScriptKind};
use crate::error::{ChubError, Result};
use crate::host::{EnvironmentProvisioner, ProcessLauncher, ScriptRunner};
use crate::options::{InstallPlan, Mode};
use crate::ui::Reporter;

pub use decision::Decision;

/// Everything an execution decided and what came of it
#[derive(Debug, Default)]
pub struct ExecutionReport {
    pub decisions: Vec<Decision>,
    /// Per-unit script failures; they do not abort other units
    pub failures: Vec<ChubError>,
    pub entry_status: Option<i32>,
    pub dry_run: bool,
}

impl ExecutionReport {
    fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    fn record(&mut self, reporter: &mut dyn Reporter, decision: Decision) {
        reporter.decision(&decision, self.dry_run);
        self.decisions.push(decision);
    }

    /// Fold per-unit failures into a single error
    pub fn into_result(self) -> Result<Self> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(ChubError::ScriptsFailed {
                count: self.failures.len(),
            })
        }
    }
}

/// Drives the stages against host collaborators
pub struct Executor<'a> {
    provisioner: &'a dyn EnvironmentProvisioner,
    scripts: &'a dyn ScriptRunner,
    launcher: &'a dyn ProcessLauncher,
}

impl<'a> Executor<'a> {
    pub fn new(
        provisioner: &'a dyn EnvironmentProvisioner,
        scripts: &'a dyn ScriptRunner,
        launcher: &'a dyn ProcessLauncher,
    ) -> Self {
        Self {
            provisioner,
            scripts,
            launcher,
        }
    }

    pub fn execute(
        &self,
        bundle: &Bundle,
        plan: &InstallPlan,
        reporter: &mut dyn Reporter,
    ) -> Result<ExecutionReport> {
        let mut report = ExecutionReport::new(plan.dry_run);

        for ignored in &plan.ignored {
            reporter.warn(&ignored.to_string());
        }

        if plan.mode == Mode::Version {
            let units = bundle.document().units().iter().map(|u| u.unit_dir()).collect();
            report.record(
                reporter,
                Decision::ShowVersion {
                    tool: env!("CARGO_PKG_VERSION").to_string(),
                    units,
                },
            );
            return Ok(report);
        }

        let selection = select::decide_select(bundle.document(), plan.target_units.as_deref())?;
        for selector in &selection.unmatched {
            reporter.warn(&format!("No bundled package matches '{selector}'"));
        }
        let units = selection.units;
        tracing::debug!("Selected {} unit(s)", units.len());

        let inspect: Option<fn(&PackageUnit) -> Decision> = match plan.mode {
            Mode::List => Some(list_decision),
            Mode::Info => Some(info_decision),
            Mode::ShowScripts => Some(scripts_decision),
            _ => None,
        };
        if let Some(decide) = inspect {
            for unit in &units {
                report.record(reporter, decide(unit));
            }
            return Ok(report);
        }

        for unit in &units {
            report.record(
                reporter,
                Decision::Select {
                    unit: unit.unit_dir(),
                },
            );
        }

        match &plan.mode {
            Mode::Unpack(dest) => self.unpack(bundle, plan, &units, dest, &mut report, reporter)?,
            Mode::Exec => self.exec(plan, &units, &mut report, reporter)?,
            _ => self.install(bundle, plan, &units, &mut report, reporter)?,
        }
        Ok(report)
    }

    fn unpack(
        &self,
        bundle: &Bundle,
        plan: &InstallPlan,
        units: &[&PackageUnit],
        dest: &Path,
        report: &mut ExecutionReport,
        reporter: &mut dyn Reporter,
    ) -> Result<()> {
        let steps = extract::decide_unpack(bundle, units, plan.archive_scope, dest)?;
        if steps.is_empty() {
            reporter.warn("No archives to unpack");
        }
        for step in &steps {
            report.record(
                reporter,
                Decision::Copy {
                    unit: step.unit.clone(),
                    archive: step.archive.clone(),
                    destination: step.destination.clone(),
                },
            );
        }

        if !plan.dry_run && !steps.is_empty() {
            extract::apply_unpack(&steps, dest)?;
        }
        Ok(())
    }

    fn exec(
        &self,
        plan: &InstallPlan,
        units: &[&PackageUnit],
        report: &mut ExecutionReport,
        reporter: &mut dyn Reporter,
    ) -> Result<()> {
        let env = self.provisioner.current();
        let Some(entry) = entry::decide_entry(units, &plan.entry)? else {
            reporter.warn("No entrypoint to run");
            return Ok(());
        };
        report.record(
            reporter,
            Decision::InvokeEntry {
                entry: entry.to_string(),
                environment: env.to_string(),
            },
        );

        if !plan.dry_run {
            report.entry_status = Some(entry::apply_entry(&entry, &env, self.launcher)?);
        }
        Ok(())
    }

    fn install(
        &self,
        bundle: &Bundle,
        plan: &InstallPlan,
        units: &[&PackageUnit],
        report: &mut ExecutionReport,
        reporter: &mut dyn Reporter,
    ) -> Result<()> {
        // Decide
        let provision_step =
            provision::decide_provision(self.provisioner, plan.provision_environment.as_deref())?;
        let target = provision::target_environment(self.provisioner, provision_step.as_ref());
        let installs = extract::decide_install(bundle, units, plan.archive_scope)?;
        let pre_steps = if plan.run_pre_scripts {
            scripts::decide_scripts(bundle, units, ScriptKind::Pre)
        } else {
            Vec::new()
        };
        let post_steps = if plan.run_post_scripts {
            scripts::decide_scripts(bundle, units, ScriptKind::Post)
        } else {
            Vec::new()
        };
        let entry = entry::decide_entry(units, &plan.entry)?;

        if let Some(step) = &provision_step {
            report.record(
                reporter,
                Decision::Provision {
                    path: step.path.clone(),
                    action: step.action,
                },
            );
        }
        record_scripts(&pre_steps, report, reporter);
        for step in &installs {
            report.record(
                reporter,
                Decision::Install {
                    unit: step.unit.clone(),
                    archives: step.archive_names(),
                    environment: target.to_string(),
                    with_dependencies: step.with_dependencies,
                },
            );
        }
        record_scripts(&post_steps, report, reporter);
        if let Some(entry) = &entry {
            report.record(
                reporter,
                Decision::InvokeEntry {
                    entry: entry.to_string(),
                    environment: target.to_string(),
                },
            );
        }

        if plan.dry_run {
            report.failures = pre_steps
                .iter()
                .chain(post_steps.iter())
                .filter_map(|s| s.missing_failure())
                .collect();
            return Ok(());
        }

        // Apply
        let env = provision::apply_provision(self.provisioner, provision_step.as_ref())?;

        // A unit whose pre-install scripts fail is neither installed nor post-processed
        let pre_failures = scripts::apply_scripts(&pre_steps, self.scripts, &env);
        let blocked: BTreeSet<&str> = pre_failures.iter().map(|f| f.unit.as_str()).collect();
        for unit in &blocked {
            reporter.warn(&format!(
                "Not installing {unit}: its pre-install scripts failed"
            ));
        }
        let installs: Vec<_> = installs
            .into_iter()
            .filter(|s| !blocked.contains(s.unit.as_str()))
            .collect();
        extract::apply_install(&installs, self.provisioner, &env)?;
        let post_steps: Vec<_> = post_steps
            .into_iter()
            .filter(|s| !blocked.contains(s.unit.as_str()))
            .collect();
        let post_failures = scripts::apply_scripts(&post_steps, self.scripts, &env);

        report.failures = pre_failures
            .into_iter()
            .chain(post_failures)
            .map(|f| f.error)
            .collect();
        for failure in &report.failures {
            reporter.warn(&failure.to_string());
        }

        if let Some(entry) = &entry {
            if report.failures.is_empty() {
                report.entry_status = Some(entry::apply_entry(entry, &env, self.launcher)?);
            } else {
                reporter.warn(&format!(
                    "Not invoking {entry}: install scripts failed"
                ));
            }
        }
        Ok(())
    }
}

fn record_scripts(
    steps: &[scripts::ScriptStep],
    report: &mut ExecutionReport,
    reporter: &mut dyn Reporter,
) {
    for step in steps {
        for (script, _) in &step.scripts {
            report.record(
                reporter,
                Decision::RunScript {
                    unit: step.unit.clone(),
                    kind: step.kind,
                    script: script.clone(),
                },
            );
        }
        if let Some(script) = &step.missing {
            report.record(
                reporter,
                Decision::MissingScript {
                    unit: step.unit.clone(),
                    kind: step.kind,
                    script: script.clone(),
                },
            );
        }
    }
}

fn list_decision(unit: &PackageUnit) -> Decision {
    Decision::ListUnit {
        unit: unit.unit_dir(),
        entrypoint: unit.entrypoint.as_ref().map(|e| e.to_string()),
        archives: unit
            .primary_archives()
            .into_iter()
            .chain(unit.dependency_archives())
            .map(str::to_string)
            .collect(),
        scripts: [ScriptKind::Pre, ScriptKind::Post]
            .into_iter()
            .flat_map(|kind| unit.scripts(kind).iter().map(move |s| format!("{s} ({kind})")))
            .collect(),
        includes: unit.includes.iter().map(|i| i.to_string()).collect(),
    }
}

fn info_decision(unit: &PackageUnit) -> Decision {
    let owned = |items: Vec<&str>| items.into_iter().map(str::to_string).collect();
    Decision::UnitInfo {
        unit: unit.unit_dir(),
        name: unit.name.clone(),
        version: unit.version.clone(),
        entrypoint: unit.entrypoint.as_ref().map(|e| e.to_string()),
        wheels: owned(unit.primary_archives()),
        dependencies: owned(unit.dependency_archives()),
        includes: unit.includes.iter().map(|i| i.to_string()).collect(),
        pre_scripts: unit.pre_install_scripts.clone(),
        post_scripts: unit.post_install_scripts.clone(),
        metadata: unit
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect(),
    }
}

fn scripts_decision(unit: &PackageUnit) -> Decision {
    Decision::UnitScripts {
        unit: unit.unit_dir(),
        pre: unit.pre_install_scripts.clone(),
        post: unit.post_install_scripts.clone(),
    }
}
