//! Chub - Python wheel bundler
//!
//! Builds `.chub` bundles out of wheels and their dependencies, and lists,
//! unpacks, installs or runs them on the target host.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod bundle;
mod cli;
mod commands;
mod config;
mod error;
mod executor;
mod host;
mod options;
mod resolver;
mod temp;
#[cfg(test)]
mod test_fixtures;
mod transaction;
mod ui;

use cli::{Cli, Commands};

/// Environment variable holding the log filter
const LOG_ENV: &str = "CHUB_LOG";

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::Build(args) => args.verbose,
        Commands::Run(args) => args.verbose,
        _ => false,
    };
    init_logging(verbose);

    let result = match cli.command {
        Commands::Build(args) => commands::build::run(args),
        Commands::Run(args) => commands::run::run(args),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}
