//! Structure diff: expected nodes versus what is on disk.
//!
//! | On disk | Node                    | Classification |
//! |---------|-------------------------|----------------|
//! | absent  | any                     | `Added`        |
//! | present | index file              | `Modified`     |
//! | present | directory               | `Unchanged`    |
//! | wrong kind | any                  | `Modified`     |
//! | orphan  | destructive mode only   | `Removed`      |
//!
//! Index files are never content-compared here; applying templates rewrites
//! them, so a present index is always reported as `Modified`.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use custvault_core::types::{EntityCode, VaultConfig};

use crate::error::SyncError;
use crate::orphan::{find_orphans, Orphan};
use crate::snapshot::{expected, scan, ExpectedNode, NodeKind, Presence};

pub const REASON_DIR_MISSING: &str = "directory missing";
pub const REASON_FILE_MISSING: &str = "file missing";
pub const REASON_TEMPLATE_MANAGED: &str = "template-managed, content not compared";
pub const REASON_DIR_PRESENT: &str = "directory present";
pub const REASON_FILE_AT_DIR: &str = "file where a directory is expected";
pub const REASON_DIR_AT_FILE: &str = "directory where a file is expected";
pub const REASON_ORPHAN: &str = "orphaned entity directory, would remove";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Added,
    Modified,
    Removed,
    Unchanged,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Classification::Added => "added",
            Classification::Modified => "modified",
            Classification::Removed => "removed",
            Classification::Unchanged => "unchanged",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffEntry {
    /// Relative to the structure root.
    pub path: PathBuf,
    pub classification: Classification,
    pub reason: &'static str,
    pub owner: EntityCode,
}

impl DiffEntry {
    /// True when something of the wrong kind occupies the path.
    pub fn is_kind_mismatch(&self) -> bool {
        matches!(self.reason, REASON_FILE_AT_DIR | REASON_DIR_AT_FILE)
    }

    /// The expected node exists on disk with the expected kind.
    pub fn is_present(&self) -> bool {
        self.classification != Classification::Added && !self.is_kind_mismatch()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffCounts {
    pub added: usize,
    pub modified: usize,
    pub removed: usize,
    pub unchanged: usize,
}

impl DiffCounts {
    /// Count `entries` by classification.
    pub fn tally(entries: &[DiffEntry]) -> Self {
        entries.iter().fold(Self::default(), |mut counts, entry| {
            match entry.classification {
                Classification::Added => counts.added += 1,
                Classification::Modified => counts.modified += 1,
                Classification::Removed => counts.removed += 1,
                Classification::Unchanged => counts.unchanged += 1,
            }
            counts
        })
    }

    pub fn total(&self) -> usize {
        self.added + self.modified + self.removed + self.unchanged
    }

    /// Entries that applying the structure would act on.
    pub fn pending(&self) -> usize {
        self.added + self.modified + self.removed
    }
}

/// Result of one diff run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffReport {
    pub entries: Vec<DiffEntry>,
    /// Tallied from `entries` on construction.
    counts: DiffCounts,
    /// Every orphan found, whether or not it was turned into an entry.
    pub orphans: Vec<Orphan>,
}

impl DiffReport {
    fn new(entries: Vec<DiffEntry>, orphans: Vec<Orphan>) -> Self {
        let counts = DiffCounts::tally(&entries);
        Self {
            entries,
            counts,
            orphans,
        }
    }

    pub fn counts(&self) -> DiffCounts {
        self.counts
    }

    pub fn is_clean(&self) -> bool {
        self.counts.pending() == 0
    }
}

/// Whether orphans become `Removed` entries or stay informational.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrphanMode {
    #[default]
    Report,
    Destructive,
}

/// Classify each expected node by what was found at its own path.
///
/// A node occupied by the wrong kind (a file named like an entity folder,
/// say) is `Modified`, never `Unchanged`.
///
/// A node whose parent directory is absent is classified by its own presence
/// like any other, so it comes out `Added` on any real filesystem.
pub fn classify(
    expected: &[ExpectedNode],
    presence: &Presence,
    orphans: Vec<Orphan>,
    mode: OrphanMode,
) -> DiffReport {
    let mut entries: Vec<DiffEntry> = expected
        .iter()
        .map(|node| {
            let (classification, reason) = match (presence.kind(&node.path), node.kind) {
                (None, NodeKind::Directory) => (Classification::Added, REASON_DIR_MISSING),
                (None, NodeKind::File) => (Classification::Added, REASON_FILE_MISSING),
                (Some(found), NodeKind::Directory) if found != node.kind => {
                    (Classification::Modified, REASON_FILE_AT_DIR)
                }
                (Some(found), NodeKind::File) if found != node.kind => {
                    (Classification::Modified, REASON_DIR_AT_FILE)
                }
                (Some(_), _) if node.role.is_template_managed() => {
                    (Classification::Modified, REASON_TEMPLATE_MANAGED)
                }
                (Some(_), _) => (Classification::Unchanged, REASON_DIR_PRESENT),
            };
            DiffEntry {
                path: node.path.clone(),
                classification,
                reason,
                owner: node.owner.clone(),
            }
        })
        .collect();

    if mode == OrphanMode::Destructive {
        entries.extend(orphans.iter().map(|orphan| DiffEntry {
            path: orphan.path.clone(),
            classification: Classification::Removed,
            reason: REASON_ORPHAN,
            owner: EntityCode::from(orphan.name.as_str()),
        }));
    }

    DiffReport::new(entries, orphans)
}

/// Diff the configured structure against the filesystem.
///
/// Fails with [`SyncError::MissingExpectedRoot`] before probing anything when
/// the structure root does not exist.
pub fn diff_structure(config: &VaultConfig, mode: OrphanMode) -> Result<DiffReport, SyncError> {
    let root = config.root();
    if !root.is_dir() {
        return Err(SyncError::MissingExpectedRoot {
            path: root.to_path_buf(),
        });
    }

    let nodes = expected(config);
    let presence = scan(root, &nodes)?;
    let orphans = find_orphans(root, &config.naming, &config.entity_id_set())?;
    if !orphans.is_empty() {
        tracing::info!(
            "found {} orphaned entity directories under {}",
            orphans.len(),
            root.display()
        );
    }

    let report = classify(&nodes, &presence, orphans, mode);
    for entry in report.entries.iter().filter(|e| e.is_kind_mismatch()) {
        tracing::warn!("{}: {}", entry.path.display(), entry.reason);
    }
    let counts = report.counts();
    tracing::debug!(
        "diff: {} added, {} modified, {} removed, {} unchanged",
        counts.added,
        counts.modified,
        counts.removed,
        counts.unchanged
    );
    Ok(report)
}
