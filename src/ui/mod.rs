//! UI/progress presentation layer
//!
//! The executor reports every decision through the [`Reporter`] trait, so a
//! dry run and a real run produce the same output apart from the
//! `[DRY RUN] Would ...` phrasing. Implementations differ by verbosity:
//! - [`ConsoleReporter`] prints styled lines for the chosen verbosity
//! - `SilentReporter` and `RecordingReporter` stand in for it in tests

use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::executor::Decision;
use crate::options::Verbosity;

/// Receives executor decisions and warnings as they are made
pub trait Reporter {
    fn decision(&mut self, decision: &Decision, dry_run: bool);

    fn warn(&mut self, message: &str);
}

/// Reporter writing to the terminal
pub struct ConsoleReporter {
    verbosity: Verbosity,
}

impl ConsoleReporter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    fn quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    fn print_unit(&self, decision: &Decision) {
        let Decision::ListUnit {
            unit,
            entrypoint,
            archives,
            scripts,
            includes,
        } = decision
        else {
            return;
        };

        println!("{}", Style::new().bold().yellow().apply_to(unit));
        if self.quiet() {
            return;
        }
        if let Some(entry) = entrypoint {
            println!("  {} {}", Style::new().bold().apply_to("Entrypoint:"), entry);
        }
        for (label, items) in [
            ("Archives:", archives),
            ("Scripts:", scripts),
            ("Includes:", includes),
        ] {
            if items.is_empty() {
                continue;
            }
            println!("  {}", Style::new().bold().apply_to(label));
            for item in items {
                println!("    {item}");
            }
        }
    }

    fn print_info(&self, decision: &Decision) {
        let Decision::UnitInfo {
            unit,
            name,
            version,
            entrypoint,
            wheels,
            dependencies,
            includes,
            pre_scripts,
            post_scripts,
            metadata,
        } = decision
        else {
            return;
        };

        println!("{}", Style::new().bold().yellow().apply_to(unit));
        if self.quiet() {
            return;
        }
        let label = |text: &str| Style::new().bold().apply_to(text.to_string());
        println!("  {} {}", label("Name:"), name);
        println!("  {} {}", label("Version:"), version);
        println!(
            "  {} {}",
            label("Entrypoint:"),
            entrypoint.as_deref().unwrap_or("(none)")
        );
        for (title, items) in [
            ("Wheels:", wheels),
            ("Dependencies:", dependencies),
            ("Includes:", includes),
            ("Pre-install scripts:", pre_scripts),
            ("Post-install scripts:", post_scripts),
        ] {
            if items.is_empty() {
                continue;
            }
            println!("  {}", label(title));
            for item in items {
                println!("    {item}");
            }
        }
        if !metadata.is_empty() {
            println!("  {}", label("Metadata:"));
            for (key, value) in metadata {
                println!("    {key}: {value}");
            }
        }
    }

    fn print_scripts(&self, decision: &Decision) {
        let Decision::UnitScripts { unit, pre, post } = decision else {
            return;
        };
        println!("{}", Style::new().bold().yellow().apply_to(unit));
        for (title, items) in [("pre:", pre), ("post:", post)] {
            let shown = if items.is_empty() {
                "(none)".to_string()
            } else {
                items.join(", ")
            };
            println!("  {} {}", Style::new().bold().apply_to(title), shown);
        }
    }

    fn print_version(&self, decision: &Decision) {
        let Decision::ShowVersion { tool, units } = decision else {
            return;
        };
        println!("chub {tool}");
        if self.quiet() {
            return;
        }
        println!("{}", Style::new().bold().apply_to("Bundled packages:"));
        if units.is_empty() {
            println!("  (none)");
        }
        for unit in units {
            println!("  - {unit}");
        }
    }
}

impl Reporter for ConsoleReporter {
    fn decision(&mut self, decision: &Decision, dry_run: bool) {
        match decision {
            Decision::ListUnit { .. } => self.print_unit(decision),
            Decision::UnitInfo { .. } => self.print_info(decision),
            Decision::UnitScripts { .. } => self.print_scripts(decision),
            Decision::ShowVersion { .. } => self.print_version(decision),
            _ if self.quiet() => {}
            _ if decision.is_detail() && self.verbosity != Verbosity::Verbose => {}
            _ if dry_run => println!("[DRY RUN] Would {} {}", decision.verb(), decision),
            _ => println!(
                "{} {}",
                Style::new().green().bold().apply_to(capitalize(decision.verb())),
                decision
            ),
        }
    }

    fn warn(&mut self, message: &str) {
        if !self.quiet() {
            eprintln!("{} {}", Style::new().yellow().bold().apply_to("Warning:"), message);
        }
    }
}

/// Reporter that discards everything
#[cfg(test)]
#[derive(Default)]
pub struct SilentReporter;

#[cfg(test)]
impl Reporter for SilentReporter {
    fn decision(&mut self, _decision: &Decision, _dry_run: bool) {
        // No-op for silent mode
    }

    fn warn(&mut self, _message: &str) {
        // No-op for silent mode
    }
}

/// Reporter that keeps everything it receives
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub decisions: Vec<(Decision, bool)>,
    pub warnings: Vec<String>,
}

#[cfg(test)]
impl Reporter for RecordingReporter {
    fn decision(&mut self, decision: &Decision, dry_run: bool) {
        self.decisions.push((decision.clone(), dry_run));
    }

    fn warn(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }
}

/// Steady spinner for a long-running external step
pub fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_reporter_no_ops() {
        let mut reporter = SilentReporter;

        // All methods should do nothing and not panic
        reporter.decision(
            &Decision::Select {
                unit: "pkg-1.0".to_string(),
            },
            false,
        );
        reporter.warn("ignored");
    }

    #[test]
    fn test_console_reporter_quiet_prints_without_panicking() {
        let mut reporter = ConsoleReporter::new(Verbosity::Quiet);
        reporter.decision(
            &Decision::ShowVersion {
                tool: "0.0.0".to_string(),
                units: vec![],
            },
            true,
        );
        reporter.warn("hidden");
    }

    #[test]
    fn test_console_reporter_prints_inspection_decisions() {
        let mut reporter = ConsoleReporter::new(Verbosity::Normal);
        reporter.decision(
            &Decision::UnitScripts {
                unit: "pkg-1.0".to_string(),
                pre: vec!["check.sh".to_string()],
                post: vec![],
            },
            false,
        );
        reporter.decision(
            &Decision::UnitInfo {
                unit: "pkg-1.0".to_string(),
                name: "pkg".to_string(),
                version: "1.0".to_string(),
                entrypoint: None,
                wheels: vec!["pkg-1.0-py3-none-any.whl".to_string()],
                dependencies: vec![],
                includes: vec![],
                pre_scripts: vec![],
                post_scripts: vec![],
                metadata: vec![("owner".to_string(), "me".to_string())],
            },
            false,
        );
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("install"), "Install");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_spinner_carries_message() {
        let pb = spinner("Resolving".to_string());
        assert_eq!(pb.message(), "Resolving");
        pb.finish_and_clear();
    }
}
