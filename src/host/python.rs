//! Default collaborators backed by a Python interpreter

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use crate::config::EntryReference;
use crate::error::{self, ChubError, Result};
use crate::transaction::Transaction;

use super::{Environment, EnvironmentProvisioner, ProcessLauncher, ProvisionAction, ScriptRunner};

/// Marker file every virtual environment carries at its root
const PYVENV_CFG: &str = "pyvenv.cfg";

/// Imports `module`, walks `callable`, and exits with its return value
const LAUNCH_SHIM: &str = "import importlib, sys
_, module, func, *args = sys.argv
target = importlib.import_module(module)
for part in func.split('.'):
    target = getattr(target, part)
sys.argv = [module + ':' + func, *args]
result = target()
sys.exit(result if isinstance(result, int) else 0)
";

/// Provisions with `python -m venv` and installs with `python -m pip`
#[derive(Debug, Clone)]
pub struct VenvProvisioner {
    python: String,
}

impl VenvProvisioner {
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }
}

impl EnvironmentProvisioner for VenvProvisioner {
    fn current(&self) -> Environment {
        Environment::host(&self.python)
    }

    fn inspect(&self, path: &Path) -> Result<ProvisionAction> {
        if !path.exists() {
            return Ok(ProvisionAction::Create);
        }
        if path.join(PYVENV_CFG).is_file() {
            return Ok(ProvisionAction::Reuse);
        }
        if is_empty_dir(path) {
            return Ok(ProvisionAction::Create);
        }
        Err(ChubError::IncompatibleEnvironment {
            path: path.display().to_string(),
        })
    }

    fn create(&self, path: &Path) -> Result<Environment> {
        if self.inspect(path)? == ProvisionAction::Reuse {
            tracing::debug!("Reusing environment at {}", path.display());
            return Ok(Environment::isolated(path));
        }

        let mut transaction = Transaction::new();
        if path.exists() {
            transaction.track_tree_filled(path);
        } else {
            transaction.track_tree_created(path);
        }

        tracing::debug!("Running {} -m venv {}", self.python, path.display());
        let output = Command::new(&self.python)
            .args(["-m", "venv"])
            .arg(path)
            .output()
            .map_err(|e| {
                error::runtime::provision_failed(
                    path.display().to_string(),
                    format!("cannot run {}: {e}", self.python),
                )
            })?;
        if !output.status.success() {
            return Err(error::runtime::provision_failed(
                path.display().to_string(),
                stderr_tail(&output.stderr, output.status),
            ));
        }

        transaction.commit();
        Ok(Environment::isolated(path))
    }

    fn install(
        &self,
        env: &Environment,
        archives: &[PathBuf],
        with_dependencies: bool,
    ) -> Result<()> {
        if archives.is_empty() {
            return Ok(());
        }

        let mut command = Command::new(&env.interpreter);
        command.args(["-m", "pip", "install", "--disable-pip-version-check"]);
        if with_dependencies {
            command.arg("--no-index");
            let mut dirs: Vec<&Path> = archives.iter().filter_map(|a| a.parent()).collect();
            dirs.sort();
            dirs.dedup();
            for dir in dirs {
                command.arg("--find-links").arg(dir);
            }
        } else {
            command.arg("--no-deps");
        }
        command.args(archives);

        let names = archive_names(archives);
        tracing::debug!("Installing {} into {}", names, env);
        let output = command.output().map_err(|e| {
            error::runtime::extraction_failed(
                &names,
                format!("cannot run {}: {e}", env.interpreter.display()),
            )
        })?;
        if output.status.success() {
            Ok(())
        } else {
            Err(error::runtime::extraction_failed(
                names,
                stderr_tail(&output.stderr, output.status),
            ))
        }
    }
}

/// Runs scripts as child processes inside the target environment
#[derive(Debug, Clone, Copy, Default)]
pub struct SubprocessScriptRunner;

impl ScriptRunner for SubprocessScriptRunner {
    fn run(&self, script: &Path, env: &Environment) -> Result<i32> {
        let mut command = if script.extension().and_then(|e| e.to_str()) == Some("py") {
            let mut c = Command::new(&env.interpreter);
            c.arg(script);
            c
        } else {
            Command::new(script)
        };
        apply_environment(&mut command, env);
        if let Some(dir) = script.parent() {
            command.current_dir(dir);
        }

        let status = command.status().map_err(|e| ChubError::IoError {
            message: format!("cannot start {}: {e}", script.display()),
        })?;
        Ok(exit_code(status))
    }
}

/// Launches entrypoints with the environment's interpreter
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonLauncher;

impl ProcessLauncher for PythonLauncher {
    fn launch(&self, env: &Environment, entry: &EntryReference) -> Result<i32> {
        let mut command = Command::new(&env.interpreter);
        match &entry.callable {
            Some(callable) => {
                command
                    .arg("-c")
                    .arg(LAUNCH_SHIM)
                    .arg(&entry.module)
                    .arg(callable);
            }
            None => {
                command.arg("-m").arg(&entry.module);
            }
        }
        if let Some(arg) = &entry.argument {
            command.arg(arg);
        }
        apply_environment(&mut command, env);

        tracing::debug!("Launching {} with {}", entry, env);
        let status = command
            .status()
            .map_err(|e| error::runtime::entry_failed(entry.to_string(), e.to_string()))?;
        Ok(exit_code(status))
    }
}

/// Point child processes at `env`
fn apply_environment(command: &mut Command, env: &Environment) {
    command.env("CHUB_PYTHON", &env.interpreter);
    let Some(root) = &env.root else {
        return;
    };
    command.env("VIRTUAL_ENV", root);
    if let Some(bin) = env.interpreter.parent() {
        let mut paths = vec![bin.to_path_buf()];
        if let Some(existing) = std::env::var_os("PATH") {
            paths.extend(std::env::split_paths(&existing));
        }
        if let Ok(joined) = std::env::join_paths(paths) {
            command.env("PATH", joined);
        }
    }
    command.env_remove("PYTHONHOME");
}

fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut d| d.next().is_none())
        .unwrap_or(false)
}

fn archive_names(archives: &[PathBuf]) -> String {
    archives
        .iter()
        .filter_map(|a| a.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(", ")
}

fn stderr_tail(stderr: &[u8], status: ExitStatus) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return format!("exited with {status}");
    }
    let start = lines.len().saturating_sub(5);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{create_temp_dir, create_test_files};

    #[test]
    fn test_inspect_fresh_path_creates() {
        let temp = create_temp_dir();
        let provisioner = VenvProvisioner::new("python3");
        assert_eq!(
            provisioner.inspect(&temp.path().join("venv")).unwrap(),
            ProvisionAction::Create
        );
        assert_eq!(provisioner.inspect(temp.path()).unwrap(), ProvisionAction::Create);
    }

    #[test]
    fn test_inspect_existing_venv_reuses() {
        let temp = create_temp_dir();
        create_test_files(temp.path(), &[("venv/pyvenv.cfg", "home = /usr/bin\n")]);
        let provisioner = VenvProvisioner::new("python3");
        assert_eq!(
            provisioner.inspect(&temp.path().join("venv")).unwrap(),
            ProvisionAction::Reuse
        );
    }

    #[test]
    fn test_inspect_rejects_foreign_directory() {
        let temp = create_temp_dir();
        create_test_files(temp.path(), &[("project/main.rs", "fn main() {}")]);
        let provisioner = VenvProvisioner::new("python3");
        let err = provisioner.inspect(&temp.path().join("project")).unwrap_err();
        assert!(matches!(err, ChubError::IncompatibleEnvironment { .. }));
        assert_eq!(err.exit_code(), 6);
    }

    #[test]
    fn test_create_failure_leaves_no_directory() {
        let temp = create_temp_dir();
        let target = temp.path().join("venv");
        let provisioner = VenvProvisioner::new("chub-no-such-python");
        let err = provisioner.create(&target).unwrap_err();
        assert!(matches!(err, ChubError::ProvisionFailed { .. }));
        assert!(!target.exists());
    }

    #[test]
    fn test_install_nothing_is_noop() {
        let provisioner = VenvProvisioner::new("chub-no-such-python");
        provisioner
            .install(&provisioner.current(), &[], true)
            .unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_script_runner_reports_exit_status() {
        use std::os::unix::fs::PermissionsExt;

        let temp = create_temp_dir();
        create_test_files(temp.path(), &[("fail.sh", "#!/bin/sh\nexit 3\n")]);
        let script = temp.path().join("fail.sh");
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let status = SubprocessScriptRunner
            .run(&script, &Environment::host("python3"))
            .unwrap();
        assert_eq!(status, 3);
    }

    #[test]
    fn test_script_runner_missing_script() {
        let temp = create_temp_dir();
        let result =
            SubprocessScriptRunner.run(&temp.path().join("absent.sh"), &Environment::host("python3"));
        assert!(result.is_err());
    }
}
