//! File primitives: atomic replace, append, and snapshot/rollback
//!
//! Rewrites go through a sibling `*.tmp` file and a rename, so a crash never
//! leaves a truncated record file behind. Multi-file mutations capture a
//! [`FileSnapshot`] of every file they touch first and restore all of them if
//! any step fails.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, SalienceError};
use crate::store::paths::{BACKUP_SUFFIX, TEMP_SUFFIX};

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

/// Path of the temporary file used while rewriting `path`
pub fn temp_path(path: &Path) -> PathBuf {
    sibling(path, TEMP_SUFFIX)
}

/// Path of the rollback copy of `path`
pub fn backup_path(path: &Path) -> PathBuf {
    sibling(path, BACKUP_SUFFIX)
}

/// Replace `path` with `contents` via temp file and rename
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp = temp_path(path);
    let result = (|| -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(&temp)?);
        writer.write_all(contents)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        fs::rename(&temp, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&temp);
        return Err(SalienceError::io_operation(
            "rewrite",
            path.display(),
            e,
        ));
    }
    Ok(())
}

/// Append JSONL lines to `path`, creating it if needed
pub fn append_lines(path: &Path, lines: &[String]) -> Result<()> {
    if lines.is_empty() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let result = (|| -> std::io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);
        for line in lines {
            writeln!(writer, "{}", line)?;
        }
        writer.flush()?;
        writer.get_ref().sync_all()
    })();

    result.map_err(|e| SalienceError::io_operation("append to", path.display(), e))
}

/// Pre-mutation copy of a file, restorable byte-for-byte.
///
/// A snapshot must end in [`commit`](Self::commit) or
/// [`restore`](Self::restore); dropping it unresolved removes the backup.
#[derive(Debug)]
pub struct FileSnapshot {
    path: PathBuf,
    backup: Option<PathBuf>,
    resolved: bool,
}

impl FileSnapshot {
    /// Copy `path` aside. A missing file is remembered as missing; anything
    /// that is not a regular file is left alone on restore.
    pub fn capture(path: &Path) -> Result<Self> {
        let backup = if path.is_file() {
            let backup = backup_path(path);
            fs::copy(path, &backup)
                .map_err(|e| SalienceError::io_operation("snapshot", path.display(), e))?;
            Some(backup)
        } else {
            None
        };

        Ok(Self {
            path: path.to_path_buf(),
            backup,
            resolved: false,
        })
    }

    /// The file this snapshot protects
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the new contents and drop the backup
    pub fn commit(mut self) -> Result<()> {
        self.resolved = true;
        if let Some(backup) = &self.backup {
            fs::remove_file(backup)?;
        }
        Ok(())
    }

    /// Put the original contents back
    pub fn restore(mut self) -> Result<()> {
        self.resolved = true;
        match &self.backup {
            Some(backup) => fs::rename(backup, &self.path)
                .map_err(|e| SalienceError::io_operation("restore", self.path.display(), e)),
            None if !self.path.is_file() => Ok(()),
            None => fs::remove_file(&self.path)
                .map_err(|e| SalienceError::io_operation("restore", self.path.display(), e)),
        }
    }
}

impl Drop for FileSnapshot {
    fn drop(&mut self) {
        if !self.resolved {
            if let Some(backup) = &self.backup {
                let _ = fs::remove_file(backup);
            }
        }
    }
}

/// Snapshots over several files, restored together
#[derive(Debug, Default)]
pub struct SnapshotSet {
    snapshots: Vec<FileSnapshot>,
}

impl SnapshotSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot `path` unless it is already covered
    pub fn capture(&mut self, path: &Path) -> Result<()> {
        if self.snapshots.iter().any(|s| s.path() == path) {
            return Ok(());
        }
        self.snapshots.push(FileSnapshot::capture(path)?);
        Ok(())
    }

    pub fn commit(self) -> Result<()> {
        let mut first_err = None;
        for snapshot in self.snapshots {
            if let Err(e) = snapshot.commit() {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Restore every file; keeps going past individual failures
    pub fn restore(self) -> Result<()> {
        let mut first_err = None;
        for snapshot in self.snapshots {
            if let Err(e) = snapshot.restore() {
                tracing::error!(error = %e, "rollback failed");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}
