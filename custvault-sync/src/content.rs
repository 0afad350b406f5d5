//! Unified diffs between on-disk index files and a rendered plan.

use std::path::{Path, PathBuf};

use similar::TextDiff;

use crate::error::{io_err, is_absent, SyncError};
use crate::plan::RenderedFile;

/// A single rendered file diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    /// Relative to the structure root.
    pub path: PathBuf,
    pub unified_diff: String,
}

/// Compare each planned file with what is under `root`. Identical files are
/// skipped; missing files diff against empty. No files are written.
pub fn content_diffs(root: &Path, plan: &[RenderedFile]) -> Result<Vec<FileDiff>, SyncError> {
    let mut diffs = Vec::new();
    for file in plan {
        let rendered = normalize_line_endings(&file.content);
        let existing = read_existing_or_empty(&root.join(&file.path))?;
        if existing == rendered {
            continue;
        }

        let shown = file.path.to_string_lossy().replace('\\', "/");
        let old_header = format!("a/{shown}");
        let new_header = format!("b/{shown}");
        let unified = TextDiff::from_lines(&existing, &rendered)
            .unified_diff()
            .header(&old_header, &new_header)
            .context_radius(3)
            .to_string();

        diffs.push(FileDiff {
            path: file.path.clone(),
            unified_diff: unified,
        });
    }
    Ok(diffs)
}

fn read_existing_or_empty(path: &Path) -> Result<String, SyncError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(normalize_line_endings(&content)),
        Err(err) if is_absent(&err) => Ok(String::new()),
        Err(err) => Err(io_err(path, err)),
    }
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}
