//! Common test utilities for chub integration tests

use std::io::Write;
use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;
use zip::write::FileOptions;

/// A scratch directory holding wheels, bundles and outputs for one test
#[allow(dead_code)]
pub struct TestWorkspace {
    /// Temporary directory
    #[allow(dead_code)]
    pub temp: TempDir,
    /// Path to workspace root
    pub path: PathBuf,
}

impl TestWorkspace {
    /// Create a new test workspace
    #[allow(dead_code)]
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = dunce::canonicalize(temp.path()).expect("Failed to canonicalize temp directory");
        Self { temp, path }
    }

    /// Write a minimal wheel with METADATA and one module
    #[allow(dead_code)]
    pub fn write_wheel(&self, name: &str, version: &str) -> PathBuf {
        let dist = name.replace('-', "_");
        self.write_wheel_named(&format!("{dist}-{version}-py3-none-any.whl"), name, version)
    }

    /// Write a wheel whose file name and METADATA may disagree
    #[allow(dead_code)]
    pub fn write_wheel_named(&self, file_name: &str, name: &str, version: &str) -> PathBuf {
        let dist = name.replace('-', "_");
        let path = self.path.join(file_name);
        let file = std::fs::File::create(&path).expect("Failed to create wheel");
        let mut zip = zip::ZipWriter::new(file);
        let options = FileOptions::default();

        zip.start_file(format!("{dist}.dist-info/METADATA"), options)
            .expect("Failed to start METADATA");
        write!(zip, "Metadata-Version: 2.1\nName: {name}\nVersion: {version}\n")
            .expect("Failed to write METADATA");
        zip.start_file(format!("{dist}/__init__.py"), options)
            .expect("Failed to start module");
        zip.write_all(b"def main():\n    return 0\n")
            .expect("Failed to write module");
        zip.finish().expect("Failed to finish wheel");
        path
    }

    /// Write a file in workspace
    #[allow(dead_code)]
    pub fn write_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    /// Build `wheel` into `bundle` without dependency resolution
    #[allow(dead_code)]
    pub fn build(&self, wheel: &PathBuf, bundle: &PathBuf, extra: &[&str]) {
        chub_cmd()
            .current_dir(&self.path)
            .arg("build")
            .arg(wheel)
            .arg("--chub")
            .arg(bundle)
            .args(["--resolver", "none", "--quiet"])
            .args(extra)
            .assert()
            .success();
    }

    /// Read the config document out of a built bundle
    #[allow(dead_code)]
    pub fn read_config(&self, bundle: &PathBuf) -> String {
        let file = std::fs::File::open(bundle).expect("Failed to open bundle");
        let mut archive = zip::ZipArchive::new(file).expect("Bundle is not a zip archive");
        let mut entry = archive
            .by_name(".chubconfig")
            .expect("Bundle has no .chubconfig");
        let mut text = String::new();
        std::io::Read::read_to_string(&mut entry, &mut text).expect("Failed to read config");
        text
    }

    /// Names of every file in a built bundle
    #[allow(dead_code)]
    pub fn bundle_entries(&self, bundle: &PathBuf) -> Vec<String> {
        let file = std::fs::File::open(bundle).expect("Failed to open bundle");
        let archive = zip::ZipArchive::new(file).expect("Bundle is not a zip archive");
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    /// Sorted file names directly inside `dir`
    #[allow(dead_code)]
    pub fn list_dir(&self, dir: &str) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.path.join(dir))
            .expect("Failed to read directory")
            .map(|e| e.expect("Bad entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Path of the built chub binary
#[allow(deprecated, dead_code)]
pub fn chub_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("chub")
}

/// First `python3` on PATH
#[allow(dead_code)]
pub fn find_python() -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join("python3"))
        .find(|candidate| candidate.is_file())
}

/// The chub binary with logging and interpreter overrides cleared
#[allow(deprecated)]
pub fn chub_cmd() -> Command {
    let mut cmd = Command::cargo_bin("chub").unwrap();
    cmd.env_remove("CHUB_LOG");
    cmd.env_remove("CHUB_PYTHON");
    cmd
}
