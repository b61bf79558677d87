//! Wheel identity: name and version of a primary archive

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::config::{is_plain_component, normalize_name};
use crate::error::{self, Result};

pub const WHEEL_EXTENSION: &str = "whl";

/// Name and version of a wheel on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelInfo {
    pub name: String,
    pub version: String,
    pub path: PathBuf,
}

impl WheelInfo {
    /// File name of the wheel
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Read the identity of the wheel at `path`.
///
/// The `*.dist-info/METADATA` headers win; the file name is the fallback.
pub fn inspect(path: &Path) -> Result<WheelInfo> {
    if !path.is_file() {
        return Err(error::plan::source_not_found("Archive", path.display().to_string()));
    }
    let shown = path.display().to_string();
    if path.extension().and_then(|e| e.to_str()) != Some(WHEEL_EXTENSION) {
        return Err(error::build::metadata_missing(shown, "not a .whl file"));
    }

    let from_metadata = read_metadata(path).ok().and_then(|text| parse_metadata(&text));
    let (name, version) = match from_metadata {
        Some(found) => found,
        None => parse_file_name(path).ok_or_else(|| {
            error::build::metadata_missing(
                shown.clone(),
                "no METADATA headers and the file name is not <name>-<version>-...",
            )
        })?,
    };

    let name = normalize_name(&name);
    let unit_dir = format!("{name}-{version}");
    if !is_plain_component(&unit_dir) {
        return Err(error::plan::invalid_unit_dir(unit_dir));
    }

    tracing::debug!("Wheel {} is {} {}", shown, name, version);
    Ok(WheelInfo {
        name,
        version,
        path: path.to_path_buf(),
    })
}

fn read_metadata(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| error::fs::read_failed(path, &e))?;
    let mut zip = zip::ZipArchive::new(file)?;
    let metadata_name = zip
        .file_names()
        .find(|n| {
            n.ends_with("/METADATA")
                && n.split('/').count() == 2
                && n.split('/').next().is_some_and(|d| d.ends_with(".dist-info"))
        })
        .map(str::to_string)
        .ok_or_else(|| {
            error::build::metadata_missing(path.display().to_string(), "no dist-info METADATA")
        })?;

    let mut text = String::new();
    zip.by_name(&metadata_name)?.read_to_string(&mut text)?;
    Ok(text)
}

/// `Name` and `Version` from the header block of a METADATA file
fn parse_metadata(text: &str) -> Option<(String, String)> {
    let mut name = None;
    let mut version = None;
    for line in text.lines() {
        if line.trim().is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            match key.trim() {
                "Name" => name = Some(value.trim().to_string()),
                "Version" => version = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }
    match (name, version) {
        (Some(n), Some(v)) if !n.is_empty() && !v.is_empty() => Some((n, v)),
        _ => None,
    }
}

/// `{distribution}-{version}(-{build})?-{python}-{abi}-{platform}.whl`
fn parse_file_name(path: &Path) -> Option<(String, String)> {
    let stem = path.file_stem()?.to_str()?;
    let parts: Vec<&str> = stem.split('-').collect();
    if parts.len() < 5 || parts[0].is_empty() || parts[1].is_empty() {
        return None;
    }
    Some((parts[0].to_string(), parts[1].to_string()))
}
