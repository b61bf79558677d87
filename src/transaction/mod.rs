//! Transaction support for filesystem changes outside the bundle
//!
//! Unpacking and environment provisioning write into user-owned locations.
//! A [`Transaction`] records what it changed so that an interrupted operation
//! leaves the prior state behind.
//!
//! ```ignore
//! let mut transaction = Transaction::new();
//! transaction.create_dir_all(&dest)?;
//! transaction.place_file(&staged, &dest.join("a.whl"))?;
//!
//! // On success:
//! transaction.commit();
//!
//! // Otherwise rollback happens on drop
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{self, Result};

/// Original content of a file replaced during the transaction
#[derive(Debug, Clone)]
struct FileBackup {
    path: PathBuf,
    content: Vec<u8>,
}

/// A directory tree the transaction owns
#[derive(Debug, Clone)]
struct OwnedTree {
    path: PathBuf,
    /// The root existed (empty) beforehand and must survive rollback
    keep_root: bool,
}

#[derive(Debug, Default)]
pub struct Transaction {
    /// Files created during this transaction
    created_files: HashSet<PathBuf>,

    /// Files overwritten during this transaction (with original content)
    modified_files: Vec<FileBackup>,

    /// Directories created during this transaction; removed only if empty
    created_dirs: HashSet<PathBuf>,

    /// Trees whose entire content belongs to this transaction
    owned_trees: Vec<OwnedTree>,

    committed: bool,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `path` and any missing parents, tracking each one created
    pub fn create_dir_all(&mut self, path: &Path) -> Result<()> {
        let mut missing = Vec::new();
        let mut current = Some(path);
        while let Some(dir) = current {
            if dir.as_os_str().is_empty() || dir.exists() {
                break;
            }
            missing.push(dir.to_path_buf());
            current = dir.parent();
        }

        fs::create_dir_all(path).map_err(|e| error::fs::write_failed(path, &e))?;
        self.created_dirs.extend(missing);
        Ok(())
    }

    /// Move `staged` to `target`, keeping a backup of anything it replaces
    pub fn place_file(&mut self, staged: &Path, target: &Path) -> Result<()> {
        if target.is_file() {
            let content = fs::read(target).map_err(|e| error::fs::read_failed(target, &e))?;
            self.modified_files.push(FileBackup {
                path: target.to_path_buf(),
                content,
            });
        } else {
            self.created_files.insert(target.to_path_buf());
        }

        if fs::rename(staged, target).is_err() {
            fs::copy(staged, target).map_err(|e| error::fs::write_failed(target, &e))?;
        }
        Ok(())
    }

    /// Track a directory tree created from nothing during this transaction
    pub fn track_tree_created(&mut self, path: impl Into<PathBuf>) {
        self.owned_trees.push(OwnedTree {
            path: path.into(),
            keep_root: false,
        });
    }

    /// Track an empty directory this transaction fills
    pub fn track_tree_filled(&mut self, path: impl Into<PathBuf>) {
        self.owned_trees.push(OwnedTree {
            path: path.into(),
            keep_root: true,
        });
    }

    /// Commit the transaction (prevent rollback)
    pub fn commit(mut self) {
        self.committed = true;
    }

    /// Undo everything tracked so far
    pub fn rollback(&mut self) {
        if self.committed {
            return;
        }

        for path in &self.created_files {
            if path.exists() {
                let _ = fs::remove_file(path);
            }
        }

        for backup in &self.modified_files {
            if let Err(e) = fs::write(&backup.path, &backup.content) {
                tracing::warn!("Failed to restore {}: {}", backup.path.display(), e);
            }
        }

        for tree in &self.owned_trees {
            if !tree.path.exists() {
                continue;
            }
            if let Err(e) = remove_tree(tree) {
                tracing::warn!("Failed to remove {}: {}", tree.path.display(), e);
            }
        }

        // Deepest first, so parents are empty by the time they are reached
        let mut dirs: Vec<_> = self.created_dirs.iter().collect();
        dirs.sort_by_key(|b| std::cmp::Reverse(b.components().count()));
        for path in dirs {
            if path.is_dir()
                && fs::read_dir(path)
                    .map(|mut d| d.next().is_none())
                    .unwrap_or(false)
            {
                let _ = fs::remove_dir(path);
            }
        }

        tracing::debug!("Rolled back filesystem changes");
    }
}

fn remove_tree(tree: &OwnedTree) -> std::io::Result<()> {
    if !tree.keep_root {
        return fs::remove_dir_all(&tree.path);
    }
    for entry in fs::read_dir(&tree.path)? {
        let path = entry?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.committed {
            self.rollback();
        }
    }
}
