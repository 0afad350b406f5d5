//! Atomic writer for a rendered plan.
//!
//! ## `atomic_write` protocol
//!
//! 1. Normalise line endings to LF.
//! 2. SHA-256 hash the rendered content.
//! 3. Hash whatever is on disk now → skip if identical.
//! 4. Write to `<path>.custvault.tmp`.
//! 5. Rename to final path (atomic on POSIX).
//!
//! Orphaned entity directories are never touched.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use custvault_core::types::VaultConfig;

use crate::error::{io_err, is_absent, SyncError};
use crate::plan::RenderedFile;
use crate::snapshot::{expected, NodeKind};

const TMP_SUFFIX: &str = ".custvault.tmp";

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of an individual file write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// Content changed or the file did not previously exist.
    Written { path: PathBuf },
    /// On-disk content already hashes to the rendered content.
    Unchanged { path: PathBuf },
    /// Dry run: the file *would* have been written.
    WouldWrite { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path }
            | WriteResult::Unchanged { path }
            | WriteResult::WouldWrite { path } => path,
        }
    }
}

/// Outcome of ensuring one expected directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirResult {
    Created { path: PathBuf },
    Existing { path: PathBuf },
    WouldCreate { path: PathBuf },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyResult {
    pub dirs: Vec<DirResult>,
    pub writes: Vec<WriteResult>,
}

impl ApplyResult {
    /// Directories and files that were (or would be) changed.
    pub fn changed(&self) -> usize {
        let dirs = self
            .dirs
            .iter()
            .filter(|d| !matches!(d, DirResult::Existing { .. }))
            .count();
        let files = self
            .writes
            .iter()
            .filter(|w| !matches!(w, WriteResult::Unchanged { .. }))
            .count();
        dirs + files
    }
}

// ---------------------------------------------------------------------------
// atomic_write
// ---------------------------------------------------------------------------

fn sha256_hex(content: &str) -> String {
    let mut h = Sha256::new();
    h.update(content.as_bytes());
    hex::encode(h.finalize())
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}

/// Hash of the on-disk file, `None` when it does not exist.
fn existing_digest(path: &Path) -> Result<Option<String>, SyncError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(sha256_hex(&normalize_line_endings(&content)))),
        Err(err) if is_absent(&err) => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

/// Atomically write a single rendered file unless its content is unchanged.
pub(crate) fn atomic_write(
    path: &Path,
    content: &str,
    dry_run: bool,
) -> Result<WriteResult, SyncError> {
    let tmp = PathBuf::from(format!("{}{TMP_SUFFIX}", path.display()));
    atomic_write_with_tmp(path, content, dry_run, &tmp)
}

fn atomic_write_with_tmp(
    path: &Path,
    content: &str,
    dry_run: bool,
    tmp: &Path,
) -> Result<WriteResult, SyncError> {
    let normalized = normalize_line_endings(content);
    let content = normalized.as_str();

    let digest = sha256_hex(content);
    if existing_digest(path)?.as_deref() == Some(digest.as_str()) {
        tracing::debug!("unchanged: {}", path.display());
        return Ok(WriteResult::Unchanged {
            path: path.to_path_buf(),
        });
    }

    if dry_run {
        tracing::info!("[dry-run] would write: {}", path.display());
        return Ok(WriteResult::WouldWrite {
            path: path.to_path_buf(),
        });
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    if let Some(tmp_parent) = tmp.parent() {
        std::fs::create_dir_all(tmp_parent).map_err(|e| io_err(tmp_parent, e))?;
    }
    std::fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    tracing::info!("wrote: {}", path.display());
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// apply
// ---------------------------------------------------------------------------

fn ensure_dir(path: &Path, dry_run: bool) -> Result<DirResult, SyncError> {
    if path.is_dir() {
        return Ok(DirResult::Existing {
            path: path.to_path_buf(),
        });
    }
    if path.symlink_metadata().is_ok() {
        return Err(SyncError::PathConflict {
            path: path.to_path_buf(),
        });
    }
    if dry_run {
        tracing::info!("[dry-run] would create: {}", path.display());
        return Ok(DirResult::WouldCreate {
            path: path.to_path_buf(),
        });
    }
    std::fs::create_dir_all(path).map_err(|e| io_err(path, e))?;
    tracing::info!("created: {}", path.display());
    Ok(DirResult::Created {
        path: path.to_path_buf(),
    })
}

/// Create every expected directory, then write every planned file.
///
/// The structure root itself must already exist. Dry run touches nothing.
/// A regular file in place of an expected directory fails the run with
/// [`SyncError::PathConflict`] and is left alone.
pub fn apply(
    config: &VaultConfig,
    plan: &[RenderedFile],
    dry_run: bool,
) -> Result<ApplyResult, SyncError> {
    let root = config.root();
    if !root.is_dir() {
        return Err(SyncError::MissingExpectedRoot {
            path: root.to_path_buf(),
        });
    }

    let mut result = ApplyResult::default();
    for node in expected(config) {
        if node.kind == NodeKind::Directory {
            result.dirs.push(ensure_dir(&root.join(&node.path), dry_run)?);
        }
    }
    for file in plan {
        result
            .writes
            .push(atomic_write(&root.join(&file.path), &file.content, dry_run)?);
    }
    Ok(result)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
