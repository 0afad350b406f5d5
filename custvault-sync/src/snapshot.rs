//! Expected structure snapshot and what the filesystem actually holds.
//!
//! # Layout per entity
//!
//! ```text
//! <root>/
//!   CUST-002/                    EntityRoot
//!     CUST-002-Index.md          EntityIndex    (template-managed)
//!     FP/                        CategoryDir
//!       FP-Index.md              CategoryIndex  (template-managed)
//! ```
//!
//! The snapshot is derived purely from config and recomputed every run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use custvault_core::types::{CategoryName, EntityCode, VaultConfig};

use crate::error::{io_err, is_absent, SyncError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Directory,
    File,
}

/// What a node is for within an entity's tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    EntityRoot,
    EntityIndex,
    CategoryDir,
    CategoryIndex,
}

impl NodeRole {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeRole::EntityRoot | NodeRole::CategoryDir => NodeKind::Directory,
            NodeRole::EntityIndex | NodeRole::CategoryIndex => NodeKind::File,
        }
    }

    /// Index files are rewritten whenever templates are applied.
    pub fn is_template_managed(&self) -> bool {
        matches!(self, NodeRole::EntityIndex | NodeRole::CategoryIndex)
    }
}

/// A node the config says should exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpectedNode {
    /// Relative to the structure root.
    pub path: PathBuf,
    pub kind: NodeKind,
    pub role: NodeRole,
    pub owner: EntityCode,
    pub category: Option<CategoryName>,
}

impl ExpectedNode {
    fn new(
        path: PathBuf,
        role: NodeRole,
        owner: &EntityCode,
        category: Option<&CategoryName>,
    ) -> Self {
        Self {
            path,
            kind: role.kind(),
            role,
            owner: owner.clone(),
            category: category.cloned(),
        }
    }
}

/// Every expected node, entities in config order and categories in config
/// order within each entity.
pub fn expected(config: &VaultConfig) -> Vec<ExpectedNode> {
    let naming = &config.naming;
    let per_entity = 2 + 2 * config.categories.len();
    let mut nodes = Vec::with_capacity(config.entity_ids.len() * per_entity);

    for code in config.entity_codes() {
        let entity_dir = PathBuf::from(code.as_str());
        nodes.push(ExpectedNode::new(
            entity_dir.clone(),
            NodeRole::EntityRoot,
            &code,
            None,
        ));
        nodes.push(ExpectedNode::new(
            entity_dir.join(naming.root_index_name(&code)),
            NodeRole::EntityIndex,
            &code,
            None,
        ));

        for category in &config.categories {
            let category_dir = entity_dir.join(category.as_str());
            nodes.push(ExpectedNode::new(
                category_dir.clone(),
                NodeRole::CategoryDir,
                &code,
                Some(category),
            ));
            nodes.push(ExpectedNode::new(
                category_dir.join(naming.category_index_name(category)),
                NodeRole::CategoryIndex,
                &code,
                Some(category),
            ));
        }
    }
    nodes
}

/// What was found at each scanned path. Built once per run and reused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presence {
    found: BTreeMap<PathBuf, Option<NodeKind>>,
}

impl Presence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record what sits at a relative path, `None` when nothing does.
    pub fn record(&mut self, path: impl Into<PathBuf>, kind: Option<NodeKind>) {
        self.found.insert(path.into(), kind);
    }

    /// Kind found on disk. Unscanned paths count as absent.
    pub fn kind(&self, path: &Path) -> Option<NodeKind> {
        self.found.get(path).copied().flatten()
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.kind(path).is_some()
    }

    pub fn len(&self) -> usize {
        self.found.len()
    }

    pub fn is_empty(&self) -> bool {
        self.found.is_empty()
    }
}

/// Look at each expected path under `root` exactly once.
///
/// `NotFound` means absent, and so does a path whose parent is a regular
/// file. Any other error (permission denied, …) propagates. A symlink takes
/// the kind of its target; a dangling one counts as the expected kind.
pub fn scan(root: &Path, nodes: &[ExpectedNode]) -> Result<Presence, SyncError> {
    let mut presence = Presence::new();
    for node in nodes {
        let full = root.join(&node.path);
        let kind = match std::fs::symlink_metadata(&full) {
            Ok(meta) if meta.file_type().is_symlink() => match std::fs::metadata(&full) {
                Ok(target) => Some(kind_of(&target)),
                Err(_) => Some(node.kind),
            },
            Ok(meta) => Some(kind_of(&meta)),
            Err(err) if is_absent(&err) => None,
            Err(err) => return Err(io_err(&full, err)),
        };
        presence.record(node.path.clone(), kind);
    }
    Ok(presence)
}

fn kind_of(meta: &std::fs::Metadata) -> NodeKind {
    if meta.is_dir() {
        NodeKind::Directory
    } else {
        NodeKind::File
    }
}
