//! # custvault-sync
//!
//! Structure diff and reconciliation for customer workspaces.
//!
//! [`diff_structure`] compares the configured layout with the filesystem;
//! [`render_plan`] and [`apply`] produce and write the index files. [`Run`]
//! bundles the inputs every command needs.

pub mod content;
pub mod diff;
pub mod error;
pub mod orphan;
pub mod pipeline;
pub mod plan;
pub mod snapshot;
pub mod status;
pub mod writer;

pub use content::{content_diffs, FileDiff};
pub use diff::{
    classify, diff_structure, Classification, DiffCounts, DiffEntry, DiffReport, OrphanMode,
};
pub use error::SyncError;
pub use orphan::{find_orphans, Orphan};
pub use pipeline::Run;
pub use plan::{render_plan, RenderedFile};
pub use snapshot::{expected, scan, ExpectedNode, NodeKind, NodeRole, Presence};
pub use status::{summarize, EntityState, EntityStatus};
pub use writer::{apply, ApplyResult, DirResult, WriteResult};
