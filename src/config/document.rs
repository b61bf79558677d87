//! The bundle's config document (`.chubconfig`)
//!
//! An ordered sequence of [`PackageUnit`] records stored as multi-document
//! YAML, one document per unit:
//!
//! ```yaml
//! ---
//! name: requests
//! version: 2.31.0
//! entrypoint: requests.cli:main
//! pre_install_scripts:
//!   - check_python.sh
//! post_install_scripts:
//!   - install_cert.sh
//! includes:
//!   - extra.cfg
//!   - config.json::conf
//! wheels:
//!   requests-2.31.0-py3-none-any.whl:
//!     - idna-3.7-py3-none-any.whl
//! metadata:
//!   tags: [http, client]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::config::entry::EntryReference;
use crate::config::unit::{Include, MetadataValue, PackageUnit, is_plain_component};
use crate::error::{ChubError, Result, config, fs};

/// File name of the config document at the bundle root
pub const CHUBCONFIG_FILENAME: &str = ".chubconfig";

/// Ordered package unit records of one bundle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDocument {
    units: Vec<PackageUnit>,
}

/// A record as written on disk, before validation
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    name: Option<serde_yaml::Value>,
    #[serde(default)]
    version: Option<serde_yaml::Value>,
    #[serde(default)]
    entrypoint: Option<String>,
    #[serde(default)]
    pre_install_scripts: Option<Vec<String>>,
    #[serde(default)]
    post_install_scripts: Option<Vec<String>>,
    #[serde(default)]
    includes: Option<Vec<String>>,
    #[serde(default)]
    wheels: Option<BTreeMap<String, Option<Vec<String>>>>,
    #[serde(default)]
    metadata: Option<BTreeMap<String, MetadataValue>>,
}

/// A version must be written as a string; `1.10` read as a number would come back as `1.1`
fn version_text(value: Option<serde_yaml::Value>) -> std::result::Result<Option<String>, String> {
    match value {
        None | Some(serde_yaml::Value::Null) => Ok(None),
        Some(serde_yaml::Value::String(s)) => Ok(Some(s.trim().to_string()).filter(|s| !s.is_empty())),
        Some(other) => Err(format!(
            "'version' must be a string, found {}; quote it",
            serde_yaml::to_string(&other)
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        )),
    }
}

fn scalar_text(value: Option<serde_yaml::Value>) -> Option<String> {
    match value? {
        serde_yaml::Value::String(s) => Some(s.trim().to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
    .filter(|s| !s.is_empty())
}

impl RawRecord {
    fn into_unit(self, index: usize) -> Result<PackageUnit> {
        let name = scalar_text(self.name)
            .ok_or_else(|| config::invalid_record(index, "missing required field 'name'"))?;
        let version = version_text(self.version)
            .map_err(|reason| config::invalid_record(index, reason))?
            .ok_or_else(|| {
                config::invalid_record(index, format!("'{name}' is missing required field 'version'"))
            })?;
        let unit_dir = format!("{name}-{version}");
        if !is_plain_component(&unit_dir) {
            return Err(config::invalid_record(
                index,
                format!("'{unit_dir}' is not a valid unit directory name"),
            ));
        }

        let entrypoint = self
            .entrypoint
            .filter(|e| !e.trim().is_empty())
            .map(|e| EntryReference::parse(&e))
            .transpose()?;

        let mut wheels = BTreeMap::new();
        for (wheel, deps) in self.wheels.unwrap_or_default() {
            let deps = deps.unwrap_or_default();
            if let Some(bad) = std::iter::once(&wheel)
                .chain(deps.iter())
                .find(|w| !w.ends_with(".whl") || !is_plain_component(w))
            {
                return Err(config::invalid_record(
                    index,
                    format!("wheel entry must be a .whl file name: {bad}"),
                ));
            }
            wheels.insert(wheel, deps);
        }

        let pre_install_scripts = self.pre_install_scripts.unwrap_or_default();
        let post_install_scripts = self.post_install_scripts.unwrap_or_default();
        if let Some(bad) = pre_install_scripts
            .iter()
            .chain(post_install_scripts.iter())
            .find(|s| !is_plain_component(s))
        {
            return Err(config::invalid_record(
                index,
                format!("script entry must be a file name: {bad}"),
            ));
        }

        Ok(PackageUnit {
            name,
            version,
            entrypoint,
            pre_install_scripts,
            post_install_scripts,
            includes: self
                .includes
                .unwrap_or_default()
                .iter()
                .map(|i| Include::parse(i))
                .collect(),
            wheels,
            metadata: self.metadata.unwrap_or_default(),
        })
    }
}

impl ConfigDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a multi-document YAML config
    ///
    /// Empty documents are skipped. Fails on records missing `name` or
    /// `version`, on repeated `(name, version)` pairs and on malformed
    /// entrypoints.
    pub fn parse(text: &str) -> Result<Self> {
        let mut document = Self::new();
        for (position, de) in serde_yaml::Deserializer::from_str(text).enumerate() {
            let index = position + 1;
            let raw = Option::<RawRecord>::deserialize(de)
                .map_err(|e| config::invalid_record(index, e.to_string()))?;
            let Some(raw) = raw else {
                continue;
            };
            let unit = raw.into_unit(index)?;
            document.push_unique(unit)?;
        }
        Ok(document)
    }

    /// Read and parse the config document of a bundle root
    pub fn load(bundle_root: &Path) -> Result<Self> {
        let path = bundle_root.join(CHUBCONFIG_FILENAME);
        if !path.is_file() {
            return Err(config::not_found(path.display().to_string()));
        }
        let text = std::fs::read_to_string(&path).map_err(|e| fs::read_failed(&path, &e))?;
        Self::parse(&text).map_err(|e| match e {
            ChubError::ConfigParseFailed { reason, .. } => {
                config::parse_failed(path.display().to_string(), reason)
            }
            other => other,
        })
    }

    /// Serialize to multi-document YAML, one `---` document per unit
    pub fn serialize(&self) -> Result<String> {
        let mut out = String::new();
        for unit in &self.units {
            out.push_str("---\n");
            out.push_str(&serde_yaml::to_string(unit)?);
        }
        Ok(out)
    }

    /// Return a new document with `unit` appended last
    ///
    /// The receiver is left untouched. A unit whose `(name, version)` is
    /// already present is rejected rather than overwritten.
    pub fn append(&self, unit: PackageUnit) -> Result<Self> {
        let mut next = self.clone();
        next.push_unique(unit)?;
        Ok(next)
    }

    fn push_unique(&mut self, unit: PackageUnit) -> Result<()> {
        if self.find(&unit.name, &unit.version).is_some() {
            return Err(config::duplicate_unit(unit.name, unit.version));
        }
        self.units.push(unit);
        Ok(())
    }

    /// Find a unit by identity
    pub fn find(&self, name: &str, version: &str) -> Option<&PackageUnit> {
        self.units.iter().find(|u| u.is(name, version))
    }

    pub fn units(&self) -> &[PackageUnit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
