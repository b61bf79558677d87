//! Runtime option resolution
//!
//! Turns the raw flags of one `chub run` invocation into an [`InstallPlan`].
//! Resolution is table driven (see [`rules`]):
//!
//! 1. normalize repeated flags
//! 2. apply implications to a fixed point
//! 3. reject the first conflicting pair
//! 4. drop flags a terminal mode does not honour
//! 5. apply precedence
//!
//! Flags are held in a map keyed by kind, so the order in which they were
//! supplied never changes the plan.

pub mod rules;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use crate::config::EntryReference;
use crate::error::{Result, runtime};

use rules::{CONFLICTS, Effect, IMPLICATIONS, PRECEDENCE, TERMINAL_MODES};

/// Every runtime flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FlagKind {
    DryRun,
    Exec,
    Info,
    List,
    NoScripts,
    NoPreScripts,
    NoPostScripts,
    NoDeps,
    Only,
    OnlyDeps,
    Quiet,
    Run,
    ShowScripts,
    Unpack,
    Venv,
    Verbose,
    Version,
}

impl FlagKind {
    /// Long flag name without dashes
    pub fn name(self) -> &'static str {
        match self {
            FlagKind::DryRun => "dry-run",
            FlagKind::Exec => "exec",
            FlagKind::Info => "info",
            FlagKind::List => "list",
            FlagKind::NoScripts => "no-scripts",
            FlagKind::NoPreScripts => "no-pre-scripts",
            FlagKind::NoPostScripts => "no-post-scripts",
            FlagKind::NoDeps => "no-deps",
            FlagKind::Only => "only",
            FlagKind::OnlyDeps => "only-deps",
            FlagKind::Quiet => "quiet",
            FlagKind::Run => "run",
            FlagKind::ShowScripts => "show-scripts",
            FlagKind::Unpack => "unpack",
            FlagKind::Venv => "venv",
            FlagKind::Verbose => "verbose",
            FlagKind::Version => "version",
        }
    }
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--{}", self.name())
    }
}

/// One flag as supplied on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    pub kind: FlagKind,
    pub value: Option<String>,
}

impl Flag {
    pub fn new(kind: FlagKind) -> Self {
        Self { kind, value: None }
    }

    pub fn with_value(kind: FlagKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: Some(value.into()),
        }
    }
}

/// What the invocation does once the bundle is open
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Install into an environment around its scripts, then maybe the entrypoint
    Install,
    /// Copy archives into a directory
    Unpack(PathBuf),
    /// Invoke the entrypoint without installing
    Exec,
    List,
    /// Show unit details and metadata
    Info,
    /// Show the install scripts of each unit
    ShowScripts,
    Version,
}

/// Which archives of a unit take part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveScope {
    All,
    PrimaryOnly,
    DependenciesOnly,
}

/// Whether and what to invoke at the end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryInvocation {
    Never,
    /// The baked-in entrypoint, when a selected unit has one
    IfBaked,
    /// The baked-in entrypoint; failing when there is none
    Required,
    Override(EntryReference),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

/// A supplied or implied flag that had no effect on the plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredFlag {
    pub flag: FlagKind,
    pub reason: String,
}

impl fmt::Display for IgnoredFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ignored: {}", self.flag, self.reason)
    }
}

/// Resolved, self-consistent intent of one runtime invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlan {
    pub mode: Mode,
    /// Unit selectors; `None` selects every unit
    pub target_units: Option<Vec<String>>,
    pub archive_scope: ArchiveScope,
    pub run_pre_scripts: bool,
    pub run_post_scripts: bool,
    pub provision_environment: Option<PathBuf>,
    pub entry: EntryInvocation,
    pub dry_run: bool,
    pub verbosity: Verbosity,
    pub ignored: Vec<IgnoredFlag>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Explicit,
    Implied,
}

#[derive(Debug, Clone)]
struct FlagState {
    origin: Origin,
    values: Vec<String>,
}

type FlagSet = BTreeMap<FlagKind, FlagState>;

/// Resolve raw flags into an [`InstallPlan`]
pub fn resolve(flags: &[Flag]) -> Result<InstallPlan> {
    let mut set = normalize(flags)?;
    let disabled = apply_implications(&mut set)?;
    check_conflicts(&set)?;
    let mut ignored = apply_terminal_mode(&mut set);
    ignored.extend(apply_precedence(&mut set));
    for flag in &ignored {
        tracing::debug!("{}", flag);
    }
    build_plan(&set, &disabled, ignored)
}

fn normalize(flags: &[Flag]) -> Result<FlagSet> {
    let mut set = FlagSet::new();
    for flag in flags {
        let state = set.entry(flag.kind).or_insert_with(|| FlagState {
            origin: Origin::Explicit,
            values: Vec::new(),
        });
        let value = flag.value.as_deref().map(str::trim).filter(|v| !v.is_empty());

        if flag.kind == FlagKind::Only {
            let Some(value) = value else {
                return Err(runtime::invalid_option_value(
                    flag.kind.name(),
                    "expects at least one package name",
                ));
            };
            state.values.extend(
                value
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            );
            continue;
        }

        if let Some(value) = value {
            match state.values.first() {
                Some(existing) if existing != value => {
                    let mut pair = [existing.as_str(), value];
                    pair.sort_unstable();
                    return Err(runtime::invalid_option_value(
                        flag.kind.name(),
                        format!("given both '{}' and '{}'", pair[0], pair[1]),
                    ));
                }
                Some(_) => {}
                None => state.values.push(value.to_string()),
            }
        }
    }

    if let Some(only) = set.get_mut(&FlagKind::Only) {
        only.values.sort();
        only.values.dedup();
    }
    Ok(set)
}

/// Expand the set to its closure; returns every flag a rule disabled
fn apply_implications(set: &mut FlagSet) -> Result<BTreeSet<FlagKind>> {
    let mut disabled = BTreeSet::new();
    loop {
        let mut changed = false;
        for implication in IMPLICATIONS {
            if !set.contains_key(&implication.when) {
                continue;
            }
            match implication.effect {
                Effect::Implies(target) => {
                    if !set.contains_key(&target) && !disabled.contains(&target) {
                        set.insert(
                            target,
                            FlagState {
                                origin: Origin::Implied,
                                values: Vec::new(),
                            },
                        );
                        changed = true;
                    }
                }
                Effect::Disables(target) => {
                    disabled.insert(target);
                    if let Some(state) = set.get(&target) {
                        if state.origin == Origin::Explicit {
                            return Err(runtime::option_disabled(
                                target.name(),
                                implication.rule,
                            ));
                        }
                        set.remove(&target);
                        changed = true;
                    }
                }
            }
        }
        if !changed {
            return Ok(disabled);
        }
    }
}

fn check_conflicts(set: &FlagSet) -> Result<()> {
    match CONFLICTS
        .iter()
        .find(|(a, b)| set.contains_key(a) && set.contains_key(b))
    {
        Some((a, b)) => Err(runtime::option_conflict(a.name(), b.name())),
        None => Ok(()),
    }
}

fn apply_terminal_mode(set: &mut FlagSet) -> Vec<IgnoredFlag> {
    let Some(mode) = TERMINAL_MODES.iter().find(|m| set.contains_key(&m.flag)) else {
        return Vec::new();
    };
    let dropped: Vec<FlagKind> = set
        .keys()
        .copied()
        .filter(|k| *k != mode.flag && !mode.compatible.contains(k))
        .collect();
    dropped
        .into_iter()
        .map(|flag| {
            set.remove(&flag);
            IgnoredFlag {
                flag,
                reason: format!("has no effect with {}", mode.flag),
            }
        })
        .collect()
}

fn apply_precedence(set: &mut FlagSet) -> Vec<IgnoredFlag> {
    let mut ignored = Vec::new();
    for (winner, loser) in PRECEDENCE {
        if set.contains_key(winner) && set.remove(loser).is_some() {
            ignored.push(IgnoredFlag {
                flag: *loser,
                reason: format!("overridden by {winner}"),
            });
        }
    }
    ignored
}

fn value_of(set: &FlagSet, kind: FlagKind) -> Option<&str> {
    set.get(&kind)
        .and_then(|s| s.values.first())
        .map(String::as_str)
}

fn build_plan(
    set: &FlagSet,
    disabled: &BTreeSet<FlagKind>,
    ignored: Vec<IgnoredFlag>,
) -> Result<InstallPlan> {
    let has = |kind: FlagKind| set.contains_key(&kind);

    let mode = if has(FlagKind::Unpack) {
        Mode::Unpack(PathBuf::from(value_of(set, FlagKind::Unpack).unwrap_or(".")))
    } else if has(FlagKind::List) {
        Mode::List
    } else if has(FlagKind::Version) {
        Mode::Version
    } else if has(FlagKind::Info) {
        Mode::Info
    } else if has(FlagKind::ShowScripts) {
        Mode::ShowScripts
    } else if has(FlagKind::Exec) {
        Mode::Exec
    } else {
        Mode::Install
    };

    let archive_scope = if has(FlagKind::NoDeps) {
        ArchiveScope::PrimaryOnly
    } else if has(FlagKind::OnlyDeps) {
        ArchiveScope::DependenciesOnly
    } else {
        ArchiveScope::All
    };

    let provision_environment = if has(FlagKind::Venv) {
        let path = value_of(set, FlagKind::Venv)
            .ok_or_else(|| runtime::invalid_option_value("venv", "expects a path"))?;
        Some(PathBuf::from(path))
    } else {
        None
    };

    let entry = match set.get(&FlagKind::Run) {
        Some(state) if state.origin == Origin::Explicit => {
            match value_of(set, FlagKind::Run) {
                Some(text) => EntryInvocation::Override(
                    EntryReference::parse(text)
                        .map_err(|e| runtime::invalid_option_value("run", e.to_string()))?,
                ),
                None => EntryInvocation::Required,
            }
        }
        Some(_) => EntryInvocation::IfBaked,
        None if mode == Mode::Install && !disabled.contains(&FlagKind::Run) => {
            EntryInvocation::IfBaked
        }
        None => EntryInvocation::Never,
    };

    let verbosity = if has(FlagKind::Quiet) {
        Verbosity::Quiet
    } else if has(FlagKind::Verbose) {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    };

    Ok(InstallPlan {
        run_pre_scripts: mode == Mode::Install && !has(FlagKind::NoPreScripts),
        run_post_scripts: mode == Mode::Install && !has(FlagKind::NoPostScripts),
        target_units: set.get(&FlagKind::Only).map(|s| s.values.clone()),
        archive_scope,
        provision_environment,
        entry,
        dry_run: has(FlagKind::DryRun),
        verbosity,
        ignored,
        mode,
    })
}
