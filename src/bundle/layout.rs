//! Layout planning for one package unit inside a bundle
//!
//! Planning is pure: it checks sources exist and computes where every file
//! lands, but writes nothing.

use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::config::{INCLUDE_SEPARATOR, PackageUnit, ScriptKind, is_plain_component};
use crate::error::{self, Result};

use super::{LIBS_DIR, RESERVED_ROOT_NAMES, SCRIPTS_DIR};

/// An include requested at build time: a source file and where it lands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeSpec {
    pub source: PathBuf,
    pub destination: Option<String>,
}

impl IncludeSpec {
    /// Parse `FILE` or `FILE::DEST`; the last separator splits
    pub fn parse(text: &str) -> Self {
        match text.rsplit_once(INCLUDE_SEPARATOR) {
            Some((source, dest)) => Self {
                source: PathBuf::from(source),
                destination: Some(dest.to_string()).filter(|d| !d.is_empty()),
            },
            None => Self {
                source: PathBuf::from(text),
                destination: None,
            },
        }
    }
}

/// A pre- or post-install script requested at build time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSpec {
    pub kind: ScriptKind,
    pub source: PathBuf,
    pub name: String,
}

impl ScriptSpec {
    pub fn new(kind: ScriptKind, path: impl Into<PathBuf>) -> Self {
        let source = path.into();
        let name = sanitize_script_name(&source);
        Self { kind, source, name }
    }

    pub fn pre(path: impl Into<PathBuf>) -> Self {
        Self::new(ScriptKind::Pre, path)
    }

    pub fn post(path: impl Into<PathBuf>) -> Self {
        Self::new(ScriptKind::Post, path)
    }

    /// Destination relative to the unit directory
    pub fn destination(&self) -> PathBuf {
        script_destination(self.kind, &self.name)
    }
}

fn script_destination(kind: ScriptKind, name: &str) -> PathBuf {
    Path::new(SCRIPTS_DIR).join(kind.dir_name()).join(name)
}

/// File name of `path` with every character outside `[A-Za-z0-9._-]` replaced by `_`
pub fn sanitize_script_name(path: &Path) -> String {
    let raw = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "script".to_string()
    } else {
        cleaned
    }
}

/// A file to copy into the bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub source: PathBuf,
    /// Destination relative to the unit directory
    pub destination: PathBuf,
}

/// Where every file of one unit lands, relative to the bundle root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleLayout {
    pub unit_dir: String,
    pub archives: Vec<PlannedFile>,
    pub scripts: Vec<PlannedFile>,
    pub includes: Vec<PlannedFile>,
}

impl BundleLayout {
    /// Layout of a unit already recorded in a bundle
    pub fn existing(unit: &PackageUnit) -> Self {
        let unit_dir = unit.unit_dir();
        let archives = unit
            .primary_archives()
            .into_iter()
            .chain(unit.dependency_archives())
            .map(|name| PlannedFile {
                source: PathBuf::from(name),
                destination: Path::new(LIBS_DIR).join(name),
            })
            .collect();
        let scripts = [ScriptKind::Pre, ScriptKind::Post]
            .into_iter()
            .flat_map(|kind| {
                unit.scripts(kind).iter().map(move |name| PlannedFile {
                    source: PathBuf::from(name),
                    destination: script_destination(kind, name),
                })
            })
            .collect();
        let includes = unit
            .includes
            .iter()
            .map(|inc| PlannedFile {
                source: PathBuf::from(&inc.source),
                destination: inc
                    .destination
                    .as_deref()
                    .and_then(|d| normalize_destination(d).ok())
                    .unwrap_or_else(|| default_include_destination(Path::new(&inc.source))),
            })
            .collect();
        Self {
            unit_dir,
            archives,
            scripts,
            includes,
        }
    }

    /// All planned files, archives first
    pub fn files(&self) -> impl Iterator<Item = &PlannedFile> {
        self.archives
            .iter()
            .chain(self.scripts.iter())
            .chain(self.includes.iter())
    }
}

impl fmt::Display for BundleLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} archive(s), {} script(s), {} include(s))",
            self.unit_dir,
            self.archives.len(),
            self.scripts.len(),
            self.includes.len()
        )
    }
}

/// Compute the layout of `unit` against the layouts already in the bundle
pub fn plan(
    existing: &[BundleLayout],
    unit: &PackageUnit,
    resolved_archives: &[PathBuf],
    includes: &[IncludeSpec],
    scripts: &[ScriptSpec],
) -> Result<BundleLayout> {
    let unit_dir = unit.unit_dir();
    if !is_plain_component(&unit_dir) {
        return Err(error::plan::invalid_unit_dir(unit_dir));
    }
    if RESERVED_ROOT_NAMES
        .iter()
        .any(|r| *r == unit.name || *r == unit_dir)
    {
        return Err(error::plan::reserved_name(&unit.name));
    }
    if existing.iter().any(|l| l.unit_dir == unit_dir) {
        return Err(error::plan::unit_dir_conflict(unit_dir));
    }

    let archives = resolved_archives
        .iter()
        .map(|source| {
            require_source("Archive", source)?;
            Ok(PlannedFile {
                source: source.clone(),
                destination: Path::new(LIBS_DIR).join(file_name(source)),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let scripts = scripts
        .iter()
        .map(|spec| {
            require_source("Script", &spec.source)?;
            Ok(PlannedFile {
                source: spec.source.clone(),
                destination: spec.destination(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let includes = includes
        .iter()
        .map(|spec| {
            require_source("Include", &spec.source)?;
            let destination = match spec.destination.as_deref() {
                Some(dest) => {
                    let mut resolved = normalize_destination(dest)?;
                    if dest.ends_with('/') || dest.ends_with('\\') {
                        resolved.push(file_name(&spec.source));
                    }
                    resolved
                }
                None => default_include_destination(&spec.source),
            };
            Ok(PlannedFile {
                source: spec.source.clone(),
                destination,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let layout = BundleLayout {
        unit_dir,
        archives,
        scripts,
        includes,
    };
    check_collisions(&layout)?;
    tracing::debug!("Planned {}", layout);
    Ok(layout)
}

fn check_collisions(layout: &BundleLayout) -> Result<()> {
    let mut seen: HashMap<&Path, &Path> = HashMap::new();
    for file in layout.files() {
        if let Some(first) = seen.insert(&file.destination, &file.source) {
            return Err(error::plan::destination_conflict(
                Path::new(&layout.unit_dir)
                    .join(&file.destination)
                    .display()
                    .to_string(),
                first.display().to_string(),
                file.source.display().to_string(),
            ));
        }
    }
    Ok(())
}

fn require_source(kind: &str, path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(error::plan::source_not_found(kind, path.display().to_string()))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn default_include_destination(source: &Path) -> PathBuf {
    Path::new(LIBS_DIR).join(file_name(source))
}

/// Relative destination with `.` segments removed
///
/// Absolute paths, `..` segments and the include separator are rejected.
pub fn normalize_destination(dest: &str) -> Result<PathBuf> {
    if dest.contains(INCLUDE_SEPARATOR) {
        return Err(error::plan::invalid_destination(
            dest,
            format!("must not contain '{INCLUDE_SEPARATOR}'"),
        ));
    }
    let mut out = PathBuf::new();
    for component in Path::new(dest).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(error::plan::invalid_destination(
                    dest,
                    "must not contain '..'",
                ));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(error::plan::invalid_destination(dest, "must be relative"));
            }
        }
    }
    if out.as_os_str().is_empty() {
        return Err(error::plan::invalid_destination(dest, "names no file"));
    }
    Ok(out)
}
