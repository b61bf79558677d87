//! Test fixtures shared by unit tests.
//!
//! ```ignore
//! use crate::test_fixtures::{create_temp_dir, write_wheel};
//!
//! let temp = create_temp_dir();
//! let wheel = write_wheel(temp.path(), "demo", "1.0.0");
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use zip::write::FileOptions;

/// Create a temp directory in the system temp location.
///
/// # Panics
///
/// Panics if the temp directory cannot be created.
#[must_use]
pub fn create_temp_dir() -> TempDir {
    TempDir::new_in(crate::temp::scratch_base()).expect("Failed to create temp directory")
}

/// Write a minimal wheel named `<name>-<version>-py3-none-any.whl` into `dir`.
///
/// The archive carries a `METADATA` file with `Name` and `Version` headers
/// and one module file.
///
/// # Panics
///
/// Panics if the archive cannot be written.
#[must_use]
pub fn write_wheel(dir: &Path, name: &str, version: &str) -> PathBuf {
    let dist = name.replace('-', "_");
    write_wheel_with_metadata(
        dir,
        &format!("{dist}-{version}-py3-none-any.whl"),
        name,
        version,
    )
}

/// Write a wheel called `file_name` whose METADATA claims `name` and `version`.
///
/// # Panics
///
/// Panics if the archive cannot be written.
#[must_use]
pub fn write_wheel_with_metadata(dir: &Path, file_name: &str, name: &str, version: &str) -> PathBuf {
    let dist = name.replace('-', "_");
    let path = dir.join(file_name);
    let file = fs::File::create(&path).expect("Failed to create wheel");
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default();

    zip.start_file(format!("{dist}.dist-info/METADATA"), options)
        .expect("Failed to start METADATA");
    write!(
        zip,
        "Metadata-Version: 2.1\nName: {name}\nVersion: {version}\nSummary: test\n\nbody\n"
    )
    .expect("Failed to write METADATA");

    zip.start_file(format!("{dist}/__init__.py"), options)
        .expect("Failed to start module");
    zip.write_all(b"def main():\n    return 0\n")
        .expect("Failed to write module");

    zip.finish().expect("Failed to finish wheel");
    path
}

/// Create files under `dir` from `(relative path, content)` pairs.
///
/// # Panics
///
/// Panics if any file cannot be created.
pub fn create_test_files(dir: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let full_path = dir.join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&full_path, content).expect("Failed to write test file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_temp_dir() {
        let temp = create_temp_dir();
        assert!(temp.path().exists());
    }

    #[test]
    fn test_write_wheel() {
        let temp = create_temp_dir();
        let wheel = write_wheel(temp.path(), "my-pkg", "2.0");
        assert_eq!(
            wheel.file_name().unwrap().to_string_lossy(),
            "my_pkg-2.0-py3-none-any.whl"
        );
        let archive = zip::ZipArchive::new(fs::File::open(&wheel).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
    }

    #[test]
    fn test_create_test_files() {
        let temp = create_temp_dir();
        create_test_files(temp.path(), &[("a/b.txt", "hello")]);
        assert_eq!(
            fs::read_to_string(temp.path().join("a/b.txt")).unwrap(),
            "hello"
        );
    }
}
