//! Zip container for bundles
//!
//! A bundle on disk is a zip of its directory tree. Entries are written in
//! sorted order so the same tree always produces the same entry list.

use std::fs::{self, File};
use std::io::{self, Seek, Write};
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;
use zip::write::FileOptions;

use crate::error::{self, ChubError, Result};

/// Zip every file and directory under `root` into `writer`
pub fn write_tree<W: Write + Seek>(root: &Path, writer: W) -> Result<W> {
    let mut zip = zip::ZipWriter::new(writer);
    let base = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let name = entry_name(root, entry.path())?;
        let options = base.unix_permissions(file_mode(entry.path()));

        if entry.file_type().is_dir() {
            zip.add_directory(format!("{name}/"), options)
                .map_err(|e| archive_error(entry.path(), &e))?;
        } else {
            zip.start_file(name, options)
                .map_err(|e| archive_error(entry.path(), &e))?;
            let mut file =
                File::open(entry.path()).map_err(|e| error::fs::read_failed(entry.path(), &e))?;
            io::copy(&mut file, &mut zip)?;
        }
    }

    zip.finish().map_err(|e| archive_error(root, &e))
}

/// Extract the zip at `archive` into `dest`, refusing entries that escape it
pub fn extract(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive).map_err(|e| error::fs::read_failed(archive, &e))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| archive_error(archive, &e))?;

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(|e| archive_error(archive, &e))?;
        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            return Err(error::build::archive_failed(
                archive.display().to_string(),
                format!("entry '{}' escapes the archive root", entry.name()),
            ));
        };
        let target = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| error::fs::write_failed(&target, &e))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| error::fs::write_failed(parent, &e))?;
        }
        let mut out = File::create(&target).map_err(|e| error::fs::write_failed(&target, &e))?;
        io::copy(&mut entry, &mut out)?;
        if let Some(mode) = entry.unix_mode() {
            set_mode(&target, mode)?;
        }
    }

    Ok(())
}

/// Whether `path` looks like a zip file
pub fn is_zip(path: &Path) -> bool {
    File::open(path)
        .ok()
        .and_then(|f| zip::ZipArchive::new(f).ok())
        .is_some()
}

/// Entry name for `path` relative to `root`, always `/`-separated
fn entry_name(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| ChubError::IoError {
        message: format!("{} is outside {}", path.display(), root.display()),
    })?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Ok(parts.join("/"))
}

fn archive_error(path: &Path, err: &zip::result::ZipError) -> ChubError {
    error::build::archive_failed(path.display().to_string(), err.to_string())
}

#[cfg(unix)]
fn file_mode(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).map_or(0o644, |m| m.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn file_mode(path: &Path) -> u32 {
    if path.is_dir() { 0o755 } else { 0o644 }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o777))
        .map_err(|e| error::fs::write_failed(path, &e))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{create_temp_dir, create_test_files};

    /// Relative paths of every file under `root`, sorted
    fn list_files(root: &Path) -> Vec<PathBuf> {
        WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .map(|e| e.unwrap())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().strip_prefix(root).unwrap().to_path_buf())
            .collect()
    }

    #[test]
    fn test_write_then_extract_preserves_tree() {
        let src = create_temp_dir();
        create_test_files(
            src.path(),
            &[
                (".chubconfig", "---\nname: a\nversion: '1'\n"),
                ("a-1/libs/a-1-py3-none-any.whl", "wheel"),
                ("a-1/scripts/setup.sh", "#!/bin/sh\n"),
            ],
        );

        let out = create_temp_dir();
        let bundle = out.path().join("a.chub");
        write_tree(src.path(), File::create(&bundle).unwrap()).unwrap();
        assert!(is_zip(&bundle));

        let dest = create_temp_dir();
        extract(&bundle, dest.path()).unwrap();
        assert_eq!(
            list_files(dest.path()),
            list_files(src.path())
        );
        assert_eq!(
            fs::read_to_string(dest.path().join("a-1/libs/a-1-py3-none-any.whl")).unwrap(),
            "wheel"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_extract_keeps_executable_bit() {
        use std::os::unix::fs::PermissionsExt;

        let src = create_temp_dir();
        create_test_files(src.path(), &[("run.sh", "#!/bin/sh\n")]);
        let script = src.path().join("run.sh");
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let out = create_temp_dir();
        let bundle = out.path().join("b.chub");
        write_tree(src.path(), File::create(&bundle).unwrap()).unwrap();

        let dest = create_temp_dir();
        extract(&bundle, dest.path()).unwrap();
        let mode = fs::metadata(dest.path().join("run.sh"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn test_is_zip_rejects_plain_file() {
        let temp = create_temp_dir();
        create_test_files(temp.path(), &[("plain.txt", "not a zip")]);
        assert!(!is_zip(&temp.path().join("plain.txt")));
    }
}
