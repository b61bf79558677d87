//! Run command implementation
//!
//! Converts the runtime flags into an install plan, opens the bundle and
//! drives the executor with the host collaborators.

use crate::bundle::Bundle;
use crate::cli::RunArgs;
use crate::error::Result;
use crate::executor::Executor;
use crate::host::{PythonLauncher, SubprocessScriptRunner, VenvProvisioner};
use crate::options::{self, Flag, FlagKind};
use crate::ui::ConsoleReporter;

/// Run run command
pub fn run(args: RunArgs) -> Result<()> {
    // Options are checked before the bundle is touched
    let plan = options::resolve(&flags(&args))?;
    tracing::debug!("Resolved plan: {:?}", plan);

    let bundle = Bundle::open(&args.bundle)?;
    tracing::debug!("Bundle root: {}", bundle.root().display());
    let provisioner = VenvProvisioner::new(&args.python);
    let mut reporter = ConsoleReporter::new(plan.verbosity);

    let report = Executor::new(&provisioner, &SubprocessScriptRunner, &PythonLauncher).execute(
        &bundle,
        &plan,
        &mut reporter,
    )?;
    report.into_result()?;
    Ok(())
}

/// Flags as supplied, in a fixed order
fn flags(args: &RunArgs) -> Vec<Flag> {
    let switches = [
        (args.list, FlagKind::List),
        (args.info, FlagKind::Info),
        (args.show_scripts, FlagKind::ShowScripts),
        (args.show_version, FlagKind::Version),
        (args.dry_run, FlagKind::DryRun),
        (args.exec, FlagKind::Exec),
        (args.no_scripts, FlagKind::NoScripts),
        (args.no_pre_scripts, FlagKind::NoPreScripts),
        (args.no_post_scripts, FlagKind::NoPostScripts),
        (args.no_deps, FlagKind::NoDeps),
        (args.only_deps, FlagKind::OnlyDeps),
        (args.quiet, FlagKind::Quiet),
        (args.verbose, FlagKind::Verbose),
    ];
    let mut flags: Vec<Flag> = switches
        .into_iter()
        .filter(|(on, _)| *on)
        .map(|(_, kind)| Flag::new(kind))
        .collect();

    if let Some(dir) = &args.unpack {
        flags.push(Flag::with_value(FlagKind::Unpack, dir));
    }
    if let Some(entry) = &args.run {
        flags.push(Flag::with_value(FlagKind::Run, entry));
    }
    if let Some(venv) = &args.venv {
        flags.push(Flag::with_value(FlagKind::Venv, venv.to_string_lossy()));
    }
    for names in &args.only {
        flags.push(Flag::with_value(FlagKind::Only, names));
    }
    flags
}
