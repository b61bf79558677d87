//! Build project files
//!
//! A project file holds the same inputs as the `chub build` flags so a build
//! can be repeated without retyping them. Options are read from the first of
//! these tables that exists:
//!
//! 1. `[tool.chub.package]`
//! 2. `[chub.package]`
//! 3. `[package]`
//! 4. the top-level table
//!
//! A `pyproject.toml` is only read through `[tool.chub.package]`.
//!
//! ```toml
//! [tool.chub.package]
//! wheel = "dist/app-1.0-py3-none-any.whl"
//! entrypoint = "app.cli:main"
//! includes = ["README.md", "app.toml::etc/"]
//!
//! [tool.chub.package.scripts]
//! pre = ["check.sh"]
//! post = ["setup.sh"]
//!
//! [tool.chub.package.metadata]
//! tags = ["cli", "tools"]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::unit::{INCLUDE_SEPARATOR, MetadataValue};
use crate::error::{Result, config, fs};

/// The table a saved project file writes its options under
pub const PROJECT_TABLE: [&str; 3] = ["tool", "chub", "package"];

const PYPROJECT_FILENAME: &str = "pyproject.toml";

/// Scripts of a project, by when they run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectScripts {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pre: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub post: Vec<String>,
}

impl ProjectScripts {
    pub fn is_empty(&self) -> bool {
        self.pre.is_empty() && self.post.is_empty()
    }
}

/// Build options as stored in a project file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChubProject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wheel: Option<String>,

    /// Output bundle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chub: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<String>,

    /// `FILE` or `FILE::DEST`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<String>,

    #[serde(skip_serializing_if = "ProjectScripts::is_empty")]
    pub scripts: ProjectScripts,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, MetadataValue>,
}

impl ChubProject {
    /// Parse project file text; `pyproject` restricts lookup to `[tool.chub.package]`
    pub fn parse(text: &str, pyproject: bool) -> std::result::Result<Self, String> {
        let document: toml::Table = toml::from_str(text).map_err(|e| e.to_string())?;
        let table = select_table(document, pyproject)?;
        toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| e.to_string())
    }

    /// Read a project file; relative paths in it are taken from the file's directory
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(fs::not_found(path));
        }
        let text = std::fs::read_to_string(path).map_err(|e| fs::read_failed(path, &e))?;
        let pyproject = path
            .file_name()
            .is_some_and(|n| n == PYPROJECT_FILENAME);
        let project = Self::parse(&text, pyproject)
            .map_err(|reason| config::invalid_project(path.display().to_string(), reason))?;

        let base = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => {
                dunce::canonicalize(dir).map_err(|e| fs::read_failed(dir, &e))?
            }
            _ => PathBuf::new(),
        };
        tracing::debug!("Loaded build options from {}", path.display());
        Ok(project.rebased(&base))
    }

    /// Write the options under `[tool.chub.package]`, replacing any existing file
    pub fn save(&self, path: &Path) -> Result<()> {
        let invalid = |reason: String| config::invalid_project(path.display().to_string(), reason);
        let mut value = toml::Value::try_from(self).map_err(|e| invalid(e.to_string()))?;
        for key in PROJECT_TABLE.iter().rev() {
            let mut table = toml::Table::new();
            table.insert((*key).to_string(), value);
            value = toml::Value::Table(table);
        }
        let text = toml::to_string_pretty(&value).map_err(|e| invalid(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| fs::write_failed(parent, &e))?;
        }
        std::fs::write(path, text).map_err(|e| fs::write_failed(path, &e))?;
        tracing::debug!("Saved build options to {}", path.display());
        Ok(())
    }

    /// Options of `self` replaced by every option `overrides` sets
    ///
    /// Lists and scripts are replaced as a whole; metadata keys are merged
    /// with the keys of `overrides` winning.
    #[must_use]
    pub fn override_with(self, overrides: ChubProject) -> ChubProject {
        let mut metadata = self.metadata;
        metadata.extend(overrides.metadata);
        ChubProject {
            wheel: overrides.wheel.or(self.wheel),
            chub: overrides.chub.or(self.chub),
            entrypoint: overrides.entrypoint.or(self.entrypoint),
            includes: if overrides.includes.is_empty() {
                self.includes
            } else {
                overrides.includes
            },
            scripts: if overrides.scripts.is_empty() {
                self.scripts
            } else {
                overrides.scripts
            },
            metadata,
        }
    }

    fn rebased(self, base: &Path) -> ChubProject {
        let path = |text: String| rebase(base, &text);
        ChubProject {
            wheel: self.wheel.map(path),
            chub: self.chub.map(path),
            entrypoint: self.entrypoint,
            includes: self
                .includes
                .into_iter()
                .map(|inc| match inc.rsplit_once(INCLUDE_SEPARATOR) {
                    Some((source, dest)) => {
                        format!("{}{INCLUDE_SEPARATOR}{dest}", rebase(base, source))
                    }
                    None => rebase(base, &inc),
                })
                .collect(),
            scripts: ProjectScripts {
                pre: self.scripts.pre.into_iter().map(path).collect(),
                post: self.scripts.post.into_iter().map(path).collect(),
            },
            metadata: self.metadata,
        }
    }
}

fn rebase(base: &Path, text: &str) -> String {
    let path = Path::new(text);
    if path.is_absolute() || base.as_os_str().is_empty() {
        text.to_string()
    } else {
        base.join(path).display().to_string()
    }
}

fn select_table(document: toml::Table, pyproject: bool) -> std::result::Result<toml::Table, String> {
    let nested = |keys: &[&str]| -> Option<toml::Table> {
        let mut current = &document;
        for key in keys {
            current = current.get(*key)?.as_table()?;
        }
        Some(current.clone())
    };

    if let Some(table) = nested(&PROJECT_TABLE) {
        return Ok(table);
    }
    if pyproject {
        return Err("no [tool.chub.package] table".to_string());
    }
    Ok(nested(&["chub", "package"])
        .or_else(|| nested(&["package"]))
        .unwrap_or(document))
}
