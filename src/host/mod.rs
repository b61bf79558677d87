//! Host collaborators: environments, scripts and entrypoint processes
//!
//! The executor only decides; everything that touches the host interpreter
//! goes through these traits. [`python`] holds the default implementations.

pub mod python;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::EntryReference;
use crate::error::Result;

pub use python::{PythonLauncher, SubprocessScriptRunner, VenvProvisioner};

/// A runtime environment packages are installed into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    /// Root of an isolated environment; `None` for the host interpreter
    pub root: Option<PathBuf>,
    pub interpreter: PathBuf,
}

impl Environment {
    /// The interpreter found on `PATH` (or named by `CHUB_PYTHON`)
    pub fn host(interpreter: impl Into<PathBuf>) -> Self {
        Self {
            root: None,
            interpreter: interpreter.into(),
        }
    }

    /// A virtual environment rooted at `root`
    pub fn isolated(root: &Path) -> Self {
        #[cfg(windows)]
        let interpreter = root.join("Scripts").join("python.exe");
        #[cfg(not(windows))]
        let interpreter = root.join("bin").join("python");
        Self {
            root: Some(root.to_path_buf()),
            interpreter,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            Some(root) => write!(f, "environment at {}", root.display()),
            None => write!(f, "current environment ({})", self.interpreter.display()),
        }
    }
}

/// What provisioning would do at a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionAction {
    Create,
    Reuse,
}

/// Creates environments and installs archives into them
pub trait EnvironmentProvisioner {
    /// The environment installs go to when none is provisioned
    fn current(&self) -> Environment;

    /// Inspect `path` without changing it
    ///
    /// Fails when `path` holds something that is not a compatible environment.
    fn inspect(&self, path: &Path) -> Result<ProvisionAction>;

    /// Create (or reuse) an environment at `path`
    fn create(&self, path: &Path) -> Result<Environment>;

    /// Install `archives` into `env`; `with_dependencies` lets the installer
    /// pull in requirements that are not among `archives`
    fn install(&self, env: &Environment, archives: &[PathBuf], with_dependencies: bool)
    -> Result<()>;
}

/// Runs one post-install script and reports its exit status
pub trait ScriptRunner {
    fn run(&self, script: &Path, env: &Environment) -> Result<i32>;
}

/// Invokes an entrypoint in a child process and reports its exit status
pub trait ProcessLauncher {
    fn launch(&self, env: &Environment, entry: &EntryReference) -> Result<i32>;
}
