//! Bundle assembly
//!
//! A build works in a scratch directory next to the output and only touches
//! the output path with a final atomic rename. Appending to an existing
//! bundle extracts it into the scratch directory first, so earlier units are
//! carried over unchanged.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::{
    CHUBCONFIG_FILENAME, ConfigDocument, EntryReference, Include, MetadataValue, PackageUnit,
    ScriptKind,
};
use crate::error::{self, Result};
use crate::resolver::DependencyResolver;
use crate::temp;

use super::layout::{self, BundleLayout, IncludeSpec, PlannedFile, ScriptSpec};
use super::wheel::{self, WheelInfo};
use super::{BOOTSTRAP_FILENAME, BOOTSTRAP_SOURCE, BUNDLE_EXTENSION, archive};

/// Everything needed to add one unit to a bundle
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub archive: PathBuf,
    pub entrypoint: Option<EntryReference>,
    pub includes: Vec<IncludeSpec>,
    pub scripts: Vec<ScriptSpec>,
    pub metadata: BTreeMap<String, MetadataValue>,
}

impl BuildRequest {
    pub fn new(archive: impl Into<PathBuf>) -> Self {
        Self {
            archive: archive.into(),
            entrypoint: None,
            includes: Vec::new(),
            scripts: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Parse a `KEY=VALUE` metadata entry; comma separated values become lists
    pub fn parse_metadata_entry(text: &str) -> Result<(String, MetadataValue)> {
        match text.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), MetadataValue::from_cli(value)))
            }
            _ => Err(error::build::invalid_metadata_entry(text)),
        }
    }
}

/// A bundle written to disk
#[derive(Debug, Clone)]
pub struct BundleArtifact {
    pub path: PathBuf,
    /// The unit this build added
    pub unit: PackageUnit,
    pub layout: BundleLayout,
    /// Units in the bundle after the build
    pub unit_count: usize,
}

/// Assembles bundles, delegating dependency resolution
pub struct BundleBuilder<'a> {
    resolver: &'a dyn DependencyResolver,
    show_progress: bool,
}

impl<'a> BundleBuilder<'a> {
    pub fn new(resolver: &'a dyn DependencyResolver) -> Self {
        Self {
            resolver,
            show_progress: false,
        }
    }

    /// Show a spinner while the resolver runs
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// `<archive dir>/<name>-<version>.chub`
    pub fn default_output(request: &BuildRequest) -> Result<PathBuf> {
        let info = wheel::inspect(&request.archive)?;
        let dir = request
            .archive
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(dir.join(format!("{}-{}.{}", info.name, info.version, BUNDLE_EXTENSION)))
    }

    /// Build `request` into `output`, appending to `append_to` (or to
    /// `output` itself when it already exists)
    ///
    /// I/O failures are reported as build failures.
    pub fn build(
        &self,
        request: &BuildRequest,
        output: &Path,
        append_to: Option<&Path>,
    ) -> Result<BundleArtifact> {
        self.assemble(request, output, append_to)
            .map_err(error::build::escalate_io)
    }

    fn assemble(
        &self,
        request: &BuildRequest,
        output: &Path,
        append_to: Option<&Path>,
    ) -> Result<BundleArtifact> {
        let info = wheel::inspect(&request.archive)?;
        let mut unit = unit_for(&info, request);

        let out_dir = match output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let base = append_to
            .map(Path::to_path_buf)
            .or_else(|| output.exists().then(|| output.to_path_buf()));

        fs::create_dir_all(&out_dir).map_err(|e| error::fs::write_failed(&out_dir, &e))?;
        let work = temp::scratch_dir_in(&out_dir, ".chub-build-")?;

        let document = match &base {
            Some(existing) => {
                tracing::debug!("Appending to {}", existing.display());
                load_base(existing, work.path())?
            }
            None => ConfigDocument::new(),
        };
        let existing: Vec<BundleLayout> =
            document.units().iter().map(BundleLayout::existing).collect();

        // Catch layout errors before paying for resolution
        layout::plan(
            &existing,
            &unit,
            std::slice::from_ref(&request.archive),
            &request.includes,
            &request.scripts,
        )?;

        let resolve_dir = temp::scratch_dir("chub-resolve-")?;
        let dependencies = self.resolve(&info, resolve_dir.path())?;

        let mut archives = vec![request.archive.clone()];
        archives.extend(dependencies.iter().cloned());
        unit.wheels.insert(
            info.file_name(),
            dependencies.iter().map(|d| file_name(d)).collect(),
        );

        let planned = layout::plan(
            &existing,
            &unit,
            &archives,
            &request.includes,
            &request.scripts,
        )?;
        unit.includes = planned
            .includes
            .iter()
            .map(|file| Include {
                source: file_name(&file.source),
                destination: Some(slash_path(&file.destination)),
            })
            .collect();
        let document = document.append(unit.clone())?;

        let unit_root = work.path().join(&planned.unit_dir);
        for file in planned.files() {
            stage(file, &unit_root)?;
        }
        write_text(&work.path().join(CHUBCONFIG_FILENAME), &document.serialize()?)?;
        write_text(&work.path().join(BOOTSTRAP_FILENAME), BOOTSTRAP_SOURCE)?;

        persist(work.path(), &out_dir, output)?;
        tracing::debug!("Wrote {} with {} unit(s)", output.display(), document.len());

        Ok(BundleArtifact {
            path: output.to_path_buf(),
            unit,
            layout: planned,
            unit_count: document.len(),
        })
    }

    fn resolve(&self, info: &WheelInfo, dest: &Path) -> Result<Vec<PathBuf>> {
        let spinner = self.show_progress.then(|| {
            crate::ui::spinner(format!(
                "Resolving dependencies of {} with {}",
                info.file_name(),
                self.resolver.name()
            ))
        });
        let result = self.resolver.resolve(&info.path, dest);
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }
        let mut resolved = result?;
        resolved.sort();
        Ok(resolved)
    }
}

fn unit_for(info: &WheelInfo, request: &BuildRequest) -> PackageUnit {
    let mut unit = PackageUnit::new(&info.name, &info.version);
    unit.entrypoint.clone_from(&request.entrypoint);
    let names = |kind: ScriptKind| {
        request
            .scripts
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.name.clone())
            .collect()
    };
    unit.pre_install_scripts = names(ScriptKind::Pre);
    unit.post_install_scripts = names(ScriptKind::Post);
    unit.metadata.clone_from(&request.metadata);
    unit
}

/// Bring an existing bundle (archive or directory) into `work`
fn load_base(path: &Path, work: &Path) -> Result<ConfigDocument> {
    if path.is_dir() {
        copy_tree(path, work)?;
    } else if archive::is_zip(path) {
        archive::extract(path, work)?;
    } else {
        return Err(error::build::archive_failed(
            path.display().to_string(),
            "not a bundle archive",
        ));
    }
    ConfigDocument::load(work)
}

fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| error::fs::write_failed(&target, &e))?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| error::fs::write_failed(&target, &e))?;
        }
    }
    Ok(())
}

fn stage(file: &PlannedFile, unit_root: &Path) -> Result<()> {
    let target = unit_root.join(&file.destination);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| error::fs::write_failed(parent, &e))?;
    }
    fs::copy(&file.source, &target).map_err(|e| error::fs::write_failed(&target, &e))?;
    Ok(())
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).map_err(|e| error::fs::write_failed(path, &e))
}

/// Zip `work` into a temp file beside `output`, then rename it into place
fn persist(work: &Path, out_dir: &Path, output: &Path) -> Result<()> {
    let mut staged = tempfile::Builder::new()
        .prefix(".chub-")
        .suffix(".tmp")
        .tempfile_in(out_dir)
        .map_err(|e| error::fs::write_failed(out_dir, &e))?;
    archive::write_tree(work, staged.as_file_mut())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(staged.path(), fs::Permissions::from_mode(0o644))
            .map_err(|e| error::fs::write_failed(staged.path(), &e))?;
    }

    staged
        .persist(output)
        .map_err(|e| error::fs::write_failed(output, &e.error))?;
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
