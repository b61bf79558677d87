//! CLI definitions using clap derive API

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Chub - Python wheel bundler
///
/// Bundle wheels with their dependencies into a single `.chub` archive and
/// install or run them anywhere.
#[derive(Parser, Debug)]
#[command(
    name = "chub",
    author,
    version,
    color = clap::ColorChoice::Always,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Bundle Python wheels into portable .chub archives",
    long_about = "Chub bundles a wheel, its resolved dependencies, install scripts and \
                  extra files into one .chub archive. A bundle can be listed, unpacked, \
                  installed into the current or a fresh virtual environment, or run \
                  directly through its entrypoint.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n    \
                  chub build dist/app-1.0-py3-none-any.whl -e app.cli:main\n    \
                  chub run app-1.0.chub --list\n    \
                  chub run app-1.0.chub --venv .venv\n    \
                  python app-1.0.chub --dry-run"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a wheel into a new or existing bundle
    Build(BuildArgs),

    /// List, unpack, install or run a bundle
    Run(RunArgs),

    /// Show version information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Dependency resolvers available at build time
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolverKind {
    /// Download dependencies with `python -m pip download`
    #[default]
    Pip,
    /// Bundle the wheel alone
    None,
}

/// Arguments for the build command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Build a bundle next to the wheel:\n    chub build dist/app-1.0-py3-none-any.whl\n\n\
                   Choose the output path:\n    chub build app.whl --chub out/app.chub\n\n\
                   Append a second wheel to an existing bundle:\n    chub build tool.whl --chub out/app.chub\n\n\
                   Bake in an entrypoint:\n    chub build app.whl -e app.cli:main\n\n\
                   Carry extra files:\n    chub build app.whl -i README.md config.yaml::etc/\n\n\
                   Add install scripts and metadata:\n    chub build app.whl -p check.sh -s setup.sh -m tags=cli,tools\n\n\
                   Build from a project file:\n    chub build --chubproject chubproject.toml\n\n\
                   Save the options used for later builds:\n    chub build app.whl -e app.cli:main --chubproject-save chubproject.toml\n\n\
                   Skip dependency resolution:\n    chub build app.whl --resolver none")]
pub struct BuildArgs {
    /// Wheel to bundle; may come from --chubproject instead
    pub wheel: Option<PathBuf>,

    /// Output bundle; appended to when it already exists
    #[arg(long, short = 'c', value_name = "PATH")]
    pub chub: Option<PathBuf>,

    /// Entrypoint baked into the bundle (module[:callable] [ARG])
    #[arg(long, short = 'e', value_name = "REF")]
    pub entrypoint: Option<String>,

    /// Extra files as FILE or FILE::DEST
    #[arg(long, short = 'i', value_name = "FILE[::DEST]", num_args = 1..)]
    pub includes: Vec<String>,

    /// Pre-install scripts, run in the given order before the wheel is installed
    #[arg(long, short = 'p', value_name = "SCRIPT", num_args = 1..)]
    pub pre_scripts: Vec<PathBuf>,

    /// Post-install scripts, run in the given order
    #[arg(long, short = 's', visible_alias = "post-scripts", value_name = "SCRIPT", num_args = 1..)]
    pub scripts: Vec<PathBuf>,

    /// Extra metadata as KEY=VALUE; commas make a list
    #[arg(long = "metadata-entry", short = 'm', value_name = "KEY=VALUE", num_args = 1..)]
    pub metadata: Vec<String>,

    /// Read build options from a TOML project file; flags given here win
    #[arg(long, value_name = "PATH")]
    pub chubproject: Option<PathBuf>,

    /// Write the effective build options to a TOML project file
    #[arg(long, value_name = "PATH")]
    pub chubproject_save: Option<PathBuf>,

    /// How dependencies are resolved
    #[arg(long, value_enum, default_value_t = ResolverKind::Pip)]
    pub resolver: ResolverKind,

    /// Python interpreter used for resolution
    #[arg(long, env = "CHUB_PYTHON", default_value = "python3")]
    pub python: String,

    /// Suppress progress output
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  List bundled packages:\n    chub run app.chub --list\n\n\
                  Show package details and scripts:\n    chub run app.chub --info\n    chub run app.chub --show-scripts\n\n\
                  Install everything and run the entrypoint:\n    chub run app.chub\n\n\
                  Install into a new virtual environment:\n    chub run app.chub --venv .venv\n\n\
                  Preview without changing anything:\n    chub run app.chub --dry-run\n\n\
                  Copy primary wheels into a directory:\n    chub run app.chub --no-deps --unpack wheels\n\n\
                  Run a different entrypoint:\n    chub run app.chub --run 'app.admin:main --help'\n\n\
                  Only act on some packages:\n    chub run app.chub --only app,tool")]
pub struct RunArgs {
    /// Bundle archive or unpacked bundle directory
    #[arg(default_value = ".")]
    pub bundle: PathBuf,

    /// List bundled packages
    #[arg(long, short = 'l')]
    pub list: bool,

    /// Show details of bundled packages
    #[arg(long, short = 'i')]
    pub info: bool,

    /// Show the install scripts of bundled packages
    #[arg(long)]
    pub show_scripts: bool,

    /// Copy archives into DIR instead of installing
    #[arg(long, short = 'u', value_name = "DIR", num_args = 0..=1, default_missing_value = ".")]
    pub unpack: Option<String>,

    /// Show tool and bundled package versions
    #[arg(long = "version")]
    pub show_version: bool,

    /// Report what would happen without doing it
    #[arg(long, short = 'd')]
    pub dry_run: bool,

    /// Run the entrypoint without installing
    #[arg(long, short = 'e')]
    pub exec: bool,

    /// Skip pre- and post-install scripts
    #[arg(long)]
    pub no_scripts: bool,

    /// Skip pre-install scripts
    #[arg(long)]
    pub no_pre_scripts: bool,

    /// Skip post-install scripts
    #[arg(long)]
    pub no_post_scripts: bool,

    /// Only primary archives, no dependencies
    #[arg(long)]
    pub no_deps: bool,

    /// Only these packages (comma or space separated)
    #[arg(long, short = 'o', value_name = "NAMES", num_args = 1..)]
    pub only: Vec<String>,

    /// Only dependency archives
    #[arg(long)]
    pub only_deps: bool,

    /// Print as little as possible
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Run the baked-in entrypoint, or ENTRY instead
    #[arg(long, short = 'r', value_name = "ENTRY", num_args = 0..=1, default_missing_value = "")]
    pub run: Option<String>,

    /// Install into a virtual environment at PATH, creating it if needed
    #[arg(long, value_name = "PATH")]
    pub venv: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Python interpreter of the current environment
    #[arg(long, env = "CHUB_PYTHON", default_value = "python3")]
    pub python: String,
}

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    chub completions --shell bash > ~/.bash_completion.d/chub\n\n\
                  Generate zsh completions:\n    chub completions --shell zsh > ~/.zfunc/_chub\n\n\
                  Generate fish completions:\n    chub completions --shell fish > ~/.config/fish/completions/chub.fish")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    #[arg(long)]
    pub shell: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(args: &[&str]) -> RunArgs {
        let argv = ["chub", "run"].iter().chain(args).copied();
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Run(args) => args,
            other => panic!("Expected Run command, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parsing_build() {
        let cli = Cli::try_parse_from([
            "chub",
            "build",
            "app-1.0-py3-none-any.whl",
            "-e",
            "app.cli:main",
            "-i",
            "README.md",
            "conf.yaml::etc/",
            "-m",
            "tags=a,b",
            "--resolver",
            "none",
        ])
        .unwrap();
        match cli.command {
            Commands::Build(args) => {
                assert_eq!(args.wheel, Some(PathBuf::from("app-1.0-py3-none-any.whl")));
                assert_eq!(args.entrypoint.as_deref(), Some("app.cli:main"));
                assert_eq!(args.includes, vec!["README.md", "conf.yaml::etc/"]);
                assert_eq!(args.metadata, vec!["tags=a,b"]);
                assert_eq!(args.resolver, ResolverKind::None);
                assert!(args.chub.is_none());
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_parsing_build_defaults_to_pip() {
        let cli = Cli::try_parse_from(["chub", "build", "app.whl"]).unwrap();
        match cli.command {
            Commands::Build(args) => assert_eq!(args.resolver, ResolverKind::Pip),
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_parsing_build_scripts_and_project() {
        let cli = Cli::try_parse_from([
            "chub",
            "build",
            "-p",
            "check.sh",
            "--post-scripts",
            "setup.sh",
            "--chubproject",
            "chubproject.toml",
            "--chubproject-save",
            "saved.toml",
        ])
        .unwrap();
        match cli.command {
            Commands::Build(args) => {
                assert!(args.wheel.is_none());
                assert_eq!(args.pre_scripts, vec![PathBuf::from("check.sh")]);
                assert_eq!(args.scripts, vec![PathBuf::from("setup.sh")]);
                assert_eq!(args.chubproject, Some(PathBuf::from("chubproject.toml")));
                assert_eq!(args.chubproject_save, Some(PathBuf::from("saved.toml")));
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_parsing_run_defaults() {
        let args = run_args(&[]);
        assert_eq!(args.bundle, PathBuf::from("."));
        assert!(args.unpack.is_none());
        assert!(args.run.is_none());
        assert!(args.only.is_empty());
    }

    #[test]
    fn test_cli_parsing_run_optional_values() {
        let args = run_args(&["app.chub", "--unpack", "--run"]);
        assert_eq!(args.bundle, PathBuf::from("app.chub"));
        assert_eq!(args.unpack.as_deref(), Some("."));
        assert_eq!(args.run.as_deref(), Some(""));

        let args = run_args(&["app.chub", "--unpack=out", "--run=app.cli:main"]);
        assert_eq!(args.unpack.as_deref(), Some("out"));
        assert_eq!(args.run.as_deref(), Some("app.cli:main"));
    }

    #[test]
    fn test_cli_parsing_run_flags() {
        let args = run_args(&[
            "app.chub", "-d", "-q", "--no-deps", "--only", "a,b", "c", "--venv", "env",
        ]);
        assert!(args.dry_run);
        assert!(args.quiet);
        assert!(args.no_deps);
        assert_eq!(args.only, vec!["a,b", "c"]);
        assert_eq!(args.venv, Some(PathBuf::from("env")));
    }

    #[test]
    fn test_cli_parsing_run_inspection_and_script_flags() {
        let args = run_args(&["app.chub", "-i", "--show-scripts", "--no-pre-scripts"]);
        assert!(args.info);
        assert!(args.show_scripts);
        assert!(args.no_pre_scripts);
        assert!(!args.no_post_scripts);
    }

    #[test]
    fn test_cli_parsing_run_version_flag() {
        let args = run_args(&["app.chub", "--version"]);
        assert!(args.show_version);
    }

    #[test]
    fn test_cli_parsing_version() {
        let cli = Cli::try_parse_from(["chub", "version"]).unwrap();
        assert!(matches!(cli.command, Commands::Version));
    }

    #[test]
    fn test_cli_parsing_completions() {
        let cli = Cli::try_parse_from(["chub", "completions", "--shell", "bash"]).unwrap();
        match cli.command {
            Commands::Completions(args) => {
                assert_eq!(args.shell, "bash");
            }
            _ => panic!("Expected Completions command"),
        }
    }
}
