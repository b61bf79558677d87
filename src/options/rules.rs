//! Compatibility tables for runtime flags
//!
//! Every rule the option resolver applies is data in this file. Table order
//! is significant: the first matching conflict is the one reported.

use super::FlagKind;

/// What a present flag does to another flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Add the flag (without a value) if it is absent
    Implies(FlagKind),
    /// Remove the flag; an explicitly supplied one is an error
    Disables(FlagKind),
}

#[derive(Debug, Clone, Copy)]
pub struct Implication {
    pub when: FlagKind,
    pub effect: Effect,
    pub rule: &'static str,
}

pub const IMPLICATIONS: &[Implication] = &[
    Implication {
        when: FlagKind::Exec,
        effect: Effect::Implies(FlagKind::Run),
        rule: "--exec runs the entrypoint",
    },
    Implication {
        when: FlagKind::Exec,
        effect: Effect::Implies(FlagKind::NoScripts),
        rule: "--exec skips install scripts",
    },
    Implication {
        when: FlagKind::NoScripts,
        effect: Effect::Implies(FlagKind::NoPreScripts),
        rule: "--no-scripts skips pre-install scripts",
    },
    Implication {
        when: FlagKind::NoScripts,
        effect: Effect::Implies(FlagKind::NoPostScripts),
        rule: "--no-scripts skips post-install scripts",
    },
    Implication {
        when: FlagKind::NoDeps,
        effect: Effect::Disables(FlagKind::Run),
        rule: "--no-deps disables --run",
    },
    Implication {
        when: FlagKind::NoDeps,
        effect: Effect::Disables(FlagKind::Exec),
        rule: "--no-deps disables --exec",
    },
    Implication {
        when: FlagKind::Only,
        effect: Effect::Disables(FlagKind::Run),
        rule: "--only disables --run",
    },
    Implication {
        when: FlagKind::Only,
        effect: Effect::Disables(FlagKind::Exec),
        rule: "--only disables --exec",
    },
    Implication {
        when: FlagKind::OnlyDeps,
        effect: Effect::Disables(FlagKind::Run),
        rule: "--only-deps disables --run",
    },
    Implication {
        when: FlagKind::OnlyDeps,
        effect: Effect::Disables(FlagKind::Exec),
        rule: "--only-deps disables --exec",
    },
];

/// Pairs that may not both survive implication
pub const CONFLICTS: &[(FlagKind, FlagKind)] = &[
    (FlagKind::NoDeps, FlagKind::OnlyDeps),
    (FlagKind::Exec, FlagKind::Venv),
    (FlagKind::Exec, FlagKind::Unpack),
    (FlagKind::List, FlagKind::Unpack),
    (FlagKind::Version, FlagKind::Unpack),
    (FlagKind::List, FlagKind::Version),
    (FlagKind::Exec, FlagKind::List),
    (FlagKind::Exec, FlagKind::Version),
    (FlagKind::Info, FlagKind::Unpack),
    (FlagKind::ShowScripts, FlagKind::Unpack),
    (FlagKind::Info, FlagKind::List),
    (FlagKind::Info, FlagKind::Version),
    (FlagKind::Info, FlagKind::ShowScripts),
    (FlagKind::List, FlagKind::ShowScripts),
    (FlagKind::ShowScripts, FlagKind::Version),
    (FlagKind::Exec, FlagKind::Info),
    (FlagKind::Exec, FlagKind::ShowScripts),
];

/// A mode that ends the invocation early, with the flags it still honours
#[derive(Debug, Clone, Copy)]
pub struct TerminalMode {
    pub flag: FlagKind,
    pub compatible: &'static [FlagKind],
}

pub const TERMINAL_MODES: &[TerminalMode] = &[
    TerminalMode {
        flag: FlagKind::Unpack,
        compatible: &[
            FlagKind::DryRun,
            FlagKind::NoDeps,
            FlagKind::Only,
            FlagKind::OnlyDeps,
            FlagKind::Quiet,
            FlagKind::Verbose,
        ],
    },
    TerminalMode {
        flag: FlagKind::List,
        compatible: &[FlagKind::Quiet, FlagKind::Verbose, FlagKind::Only],
    },
    TerminalMode {
        flag: FlagKind::Version,
        compatible: &[FlagKind::Quiet, FlagKind::Verbose],
    },
    TerminalMode {
        flag: FlagKind::Info,
        compatible: &[FlagKind::Quiet, FlagKind::Verbose, FlagKind::Only],
    },
    TerminalMode {
        flag: FlagKind::ShowScripts,
        compatible: &[FlagKind::Quiet, FlagKind::Verbose, FlagKind::Only],
    },
];

/// `(winner, loser)`: when both are present the loser is dropped
pub const PRECEDENCE: &[(FlagKind, FlagKind)] = &[(FlagKind::Quiet, FlagKind::Verbose)];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_pairs_are_distinct_kinds() {
        for (a, b) in CONFLICTS {
            assert_ne!(a, b);
        }
    }

    #[test]
    fn test_terminal_modes_exclude_each_other() {
        for (i, a) in TERMINAL_MODES.iter().enumerate() {
            for b in &TERMINAL_MODES[i + 1..] {
                assert!(
                    CONFLICTS.contains(&(a.flag, b.flag)) || CONFLICTS.contains(&(b.flag, a.flag)),
                    "{} and {} need a conflict rule",
                    a.flag,
                    b.flag
                );
            }
        }
    }

    #[test]
    fn test_terminal_modes_do_not_list_themselves() {
        for mode in TERMINAL_MODES {
            assert!(!mode.compatible.contains(&mode.flag));
        }
    }
}
