//! Package unit records of the config document

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::entry::EntryReference;

/// Separator between the source and destination of an include
pub const INCLUDE_SEPARATOR: &str = "::";

/// Normalize a package name the way wheel metadata is compared
///
/// Lowercases and folds `_`, `.` and spaces into `-`.
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '_' | '.' | ' ' => '-',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Whether `text` names exactly one entry inside its parent directory
///
/// Unit directories, archive names and script names are joined onto bundle
/// paths, so anything with separators, `.` or `..` is refused.
pub fn is_plain_component(text: &str) -> bool {
    if text.is_empty() || text.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(text).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// When a bundled script runs relative to the install of its unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScriptKind {
    Pre,
    Post,
}

impl ScriptKind {
    /// Subdirectory of the unit's script area
    pub fn dir_name(self) -> &'static str {
        match self {
            ScriptKind::Pre => "pre",
            ScriptKind::Post => "post",
        }
    }
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptKind::Pre => f.write_str("pre-install"),
            ScriptKind::Post => f.write_str("post-install"),
        }
    }
}

/// A scalar metadata value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Str(s) => f.write_str(s),
        }
    }
}

/// A metadata value: a scalar or a list of scalars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl MetadataValue {
    /// Parse a command line value; comma separated values become a list
    pub fn from_cli(value: &str) -> Self {
        let parts: Vec<&str> = value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if parts.len() > 1 {
            MetadataValue::List(
                parts
                    .into_iter()
                    .map(|p| Scalar::Str(p.to_string()))
                    .collect(),
            )
        } else {
            MetadataValue::Scalar(Scalar::Str(
                parts.first().map(|s| (*s).to_string()).unwrap_or_default(),
            ))
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Scalar(s) => write!(f, "{s}"),
            MetadataValue::List(items) => {
                let joined: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", joined.join(", "))
            }
        }
    }
}

/// An extra file carried by a unit: `source` or `source::destination`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    pub source: String,
    pub destination: Option<String>,
}

impl Include {
    /// Parse `source`, `source::` or `source::destination`
    ///
    /// The last separator splits, so a source containing `::` survives when
    /// written with a trailing separator.
    pub fn parse(text: &str) -> Self {
        match text.rsplit_once(INCLUDE_SEPARATOR) {
            Some((source, dest)) if !dest.is_empty() => Self {
                source: source.to_string(),
                destination: Some(dest.to_string()),
            },
            Some((source, _)) => Self {
                source: source.to_string(),
                destination: None,
            },
            None => Self {
                source: text.to_string(),
                destination: None,
            },
        }
    }
}

impl fmt::Display for Include {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.destination {
            Some(dest) => write!(f, "{}{}{}", self.source, INCLUDE_SEPARATOR, dest),
            None if self.source.contains(INCLUDE_SEPARATOR) => {
                write!(f, "{}{}", self.source, INCLUDE_SEPARATOR)
            }
            None => f.write_str(&self.source),
        }
    }
}

impl Serialize for Include {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Include {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Ok(Self::parse(&text))
    }
}

/// One bundled package: a primary archive plus its dependencies, scripts and includes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageUnit {
    pub name: String,

    pub version: String,

    /// Code to invoke after install or with `--exec`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<EntryReference>,

    /// Script file names run before the unit's archives are installed, in run order
    pub pre_install_scripts: Vec<String>,

    /// Script file names run after the unit's archives are installed, in run order
    pub post_install_scripts: Vec<String>,

    pub includes: Vec<Include>,

    /// Primary archive file name to its dependency archive file names
    pub wheels: BTreeMap<String, Vec<String>>,

    pub metadata: BTreeMap<String, MetadataValue>,
}

impl PackageUnit {
    /// Create a unit with no entrypoint, scripts, includes or metadata
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            entrypoint: None,
            pre_install_scripts: Vec::new(),
            post_install_scripts: Vec::new(),
            includes: Vec::new(),
            wheels: BTreeMap::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Directory name of this unit under the bundle root
    pub fn unit_dir(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// Scripts of one kind, in run order
    pub fn scripts(&self, kind: ScriptKind) -> &[String] {
        match kind {
            ScriptKind::Pre => &self.pre_install_scripts,
            ScriptKind::Post => &self.post_install_scripts,
        }
    }

    /// Whether `(name, version)` identifies this unit
    pub fn is(&self, name: &str, version: &str) -> bool {
        normalize_name(&self.name) == normalize_name(name) && self.version == version
    }

    /// File names of the unit's own archives
    pub fn primary_archives(&self) -> Vec<&str> {
        self.wheels.keys().map(String::as_str).collect()
    }

    /// File names of the unit's dependency archives, deduplicated, in record order
    pub fn dependency_archives(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for dep in self.wheels.values().flatten() {
            if !seen.contains(&dep.as_str()) && !self.wheels.contains_key(dep) {
                seen.push(dep.as_str());
            }
        }
        seen
    }
}
