//! Per-entity rollup of a diff report.

use std::path::Path;

use serde::Serialize;

use custvault_core::types::EntityCode;

use crate::diff::{Classification, DiffReport};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "state")]
pub enum EntityState {
    /// Every expected node exists with the expected kind.
    Complete,
    /// The entity directory exists but `missing` nodes under it do not.
    Partial { missing: usize },
    /// The entity directory itself is absent, or a file sits in its place.
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityStatus {
    pub entity: EntityCode,
    #[serde(flatten)]
    pub state: EntityState,
    pub present: usize,
    pub expected: usize,
}

/// Group expected entries by owner, in report order. Orphan entries are
/// not included.
pub fn summarize(report: &DiffReport) -> Vec<EntityStatus> {
    let mut rows: Vec<(EntityCode, bool, usize, usize)> = Vec::new();

    for entry in &report.entries {
        if entry.classification == Classification::Removed {
            continue;
        }
        let idx = match rows.iter().position(|(owner, ..)| owner == &entry.owner) {
            Some(idx) => idx,
            None => {
                rows.push((entry.owner.clone(), true, 0, 0));
                rows.len() - 1
            }
        };
        let row = &mut rows[idx];
        let absent = !entry.is_present();
        if absent && entry.path == Path::new(entry.owner.as_str()) {
            row.1 = false;
        }
        row.3 += 1;
        if !absent {
            row.2 += 1;
        }
    }

    rows.into_iter()
        .map(|(entity, root_present, present, expected)| {
            let state = if !root_present {
                EntityState::Missing
            } else if present == expected {
                EntityState::Complete
            } else {
                EntityState::Partial {
                    missing: expected - present,
                }
            };
            EntityStatus {
                entity,
                state,
                present,
                expected,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{classify, OrphanMode};
    use crate::orphan::Orphan;
    use crate::snapshot::{expected, NodeKind, Presence};
    use custvault_core::types::{CategoryName, EntityId, VaultConfig};
    use std::path::PathBuf;

    fn config() -> VaultConfig {
        let mut cfg = VaultConfig::new("/vault");
        cfg.entity_ids = vec![EntityId(2), EntityId(10), EntityId(11)];
        cfg.categories = vec![CategoryName::from("FP")];
        cfg
    }

    #[test]
    fn states_follow_presence() {
        let cfg = config();
        let nodes = expected(&cfg);
        let mut presence = Presence::new();
        // CUST-002 complete, CUST-010 root only, CUST-011 absent.
        for node in &nodes[0..4] {
            presence.record(node.path.clone(), Some(node.kind));
        }
        presence.record(PathBuf::from("CUST-010"), Some(NodeKind::Directory));

        let orphan = Orphan {
            id: EntityId(99),
            name: "CUST-099".to_string(),
            path: PathBuf::from("CUST-099"),
        };
        let report = classify(&nodes, &presence, vec![orphan], OrphanMode::Destructive);
        let rows = summarize(&report);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].entity, EntityCode::from("CUST-002"));
        assert_eq!(rows[0].state, EntityState::Complete);
        assert_eq!(rows[1].state, EntityState::Partial { missing: 3 });
        assert_eq!(rows[1].present, 1);
        assert_eq!(rows[2].state, EntityState::Missing);
        assert_eq!(rows[2].expected, 4);
    }

    #[test]
    fn file_in_place_of_entity_dir_is_missing() {
        let mut cfg = config();
        cfg.entity_ids.truncate(1);
        let nodes = expected(&cfg);
        let mut presence = Presence::new();
        presence.record(PathBuf::from("CUST-002"), Some(NodeKind::File));

        let rows = summarize(&classify(&nodes, &presence, vec![], OrphanMode::Report));
        assert_eq!(rows[0].state, EntityState::Missing);
        assert_eq!(rows[0].present, 0);
    }

    #[test]
    fn serializes_flat_state() {
        let row = EntityStatus {
            entity: EntityCode::from("CUST-010"),
            state: EntityState::Partial { missing: 2 },
            present: 2,
            expected: 4,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["state"], "partial");
        assert_eq!(json["missing"], 2);
        assert_eq!(json["entity"], "CUST-010");
    }
}
