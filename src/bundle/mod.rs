//! Bundle artifacts: layout planning, assembly and opening
//!
//! A bundle root holds the `.chubconfig` document, the `__main__.py`
//! bootstrap and one `<name>-<version>/` directory per package unit with
//! `libs/` (archives and default includes) and `scripts/pre/` plus
//! `scripts/post/`.

pub mod archive;
pub mod builder;
pub mod layout;
pub mod wheel;

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::{CHUBCONFIG_FILENAME, ConfigDocument, PackageUnit, ScriptKind};
use crate::error::{self, Result};

pub use builder::{BuildRequest, BundleArtifact, BundleBuilder};
pub use layout::{IncludeSpec, ScriptSpec};

/// Archive area inside a unit directory
pub const LIBS_DIR: &str = "libs";

/// Script area inside a unit directory
pub const SCRIPTS_DIR: &str = "scripts";

pub const BOOTSTRAP_FILENAME: &str = "__main__.py";

pub const BUNDLE_EXTENSION: &str = "chub";

/// Root entries that no unit may shadow
pub const RESERVED_ROOT_NAMES: &[&str] = &[CHUBCONFIG_FILENAME, BOOTSTRAP_FILENAME];

/// Bootstrap that hands `python <bundle>` over to the runtime CLI
///
/// `CHUB_BIN` overrides the binary looked up on `PATH`. Exits with the I/O
/// failure code when no chub binary can be started.
pub const BOOTSTRAP_SOURCE: &str = r#"import os
import subprocess
import sys

bundle = os.path.dirname(os.path.abspath(__file__))
chub = os.environ.get("CHUB_BIN") or "chub"
try:
    status = subprocess.call([chub, "run", bundle] + sys.argv[1:])
except OSError as e:
    sys.stderr.write(
        "Error: cannot start '%s' to open this bundle: %s\n"
        "Install chub on PATH or point CHUB_BIN at the chub binary.\n" % (chub, e.strerror or e)
    )
    status = 1
sys.exit(status)
"#;

/// An opened bundle, either an unpacked directory or an extracted archive
#[derive(Debug)]
pub struct Bundle {
    root: PathBuf,
    document: ConfigDocument,
    /// Holds the extraction of an archived bundle for as long as it is open
    _scratch: Option<TempDir>,
}

impl Bundle {
    /// Open a bundle directory or `.chub` archive
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(error::fs::not_found(path));
        }

        if path.is_dir() {
            let root = dunce::canonicalize(path).map_err(|e| error::fs::read_failed(path, &e))?;
            let document = ConfigDocument::load(&root)?;
            return Ok(Self {
                root,
                document,
                _scratch: None,
            });
        }

        let scratch = crate::temp::scratch_dir("chub-open-")?;
        archive::extract(path, scratch.path())?;
        let document = ConfigDocument::load(scratch.path())?;
        tracing::debug!(
            "Opened {} with {} unit(s) at {}",
            path.display(),
            document.len(),
            scratch.path().display()
        );
        Ok(Self {
            root: scratch.path().to_path_buf(),
            document,
            _scratch: Some(scratch),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn document(&self) -> &ConfigDocument {
        &self.document
    }

    /// Directory of `unit` inside this bundle
    pub fn unit_root(&self, unit: &PackageUnit) -> PathBuf {
        self.root.join(unit.unit_dir())
    }

    /// Path of an archive file of `unit`
    pub fn archive_path(&self, unit: &PackageUnit, file_name: &str) -> PathBuf {
        self.unit_root(unit).join(LIBS_DIR).join(file_name)
    }

    /// Path of a script of `unit`
    pub fn script_path(&self, unit: &PackageUnit, kind: ScriptKind, script: &str) -> PathBuf {
        self.unit_root(unit)
            .join(SCRIPTS_DIR)
            .join(kind.dir_name())
            .join(script)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{create_temp_dir, create_test_files};

    const CONFIG: &str = "---\nname: demo\nversion: 1.0.0\nwheels:\n  demo-1.0.0-py3-none-any.whl: []\n";

    #[test]
    fn test_open_directory() {
        let temp = create_temp_dir();
        create_test_files(temp.path(), &[(".chubconfig", CONFIG)]);

        let bundle = Bundle::open(temp.path()).unwrap();
        assert_eq!(bundle.document().len(), 1);
        let unit = &bundle.document().units()[0];
        assert!(
            bundle
                .archive_path(unit, "demo-1.0.0-py3-none-any.whl")
                .ends_with("demo-1.0.0/libs/demo-1.0.0-py3-none-any.whl")
        );
    }

    #[test]
    fn test_open_archive_extracts_to_scratch() {
        let src = create_temp_dir();
        create_test_files(src.path(), &[(".chubconfig", CONFIG)]);
        let out = create_temp_dir();
        let path = out.path().join("demo-1.0.0.chub");
        archive::write_tree(src.path(), std::fs::File::create(&path).unwrap()).unwrap();

        let root;
        {
            let bundle = Bundle::open(&path).unwrap();
            root = bundle.root().to_path_buf();
            assert!(root.join(".chubconfig").exists());
        }
        assert!(!root.exists());
    }

    #[test]
    fn test_bootstrap_names_override_and_exit_code() {
        assert!(BOOTSTRAP_SOURCE.contains("os.environ.get(\"CHUB_BIN\")"));
        assert!(BOOTSTRAP_SOURCE.contains("except OSError"));
        assert!(BOOTSTRAP_SOURCE.contains("status = 1"));
    }

    #[test]
    fn test_open_missing_path() {
        let temp = create_temp_dir();
        let err = Bundle::open(&temp.path().join("absent.chub")).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }
}
