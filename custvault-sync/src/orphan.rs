//! Orphan detection: entity-shaped directories that config no longer lists.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use custvault_core::types::{EntityId, NamingRules};

use crate::error::{io_err, SyncError};

/// An on-disk entity directory whose id is not configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Orphan {
    pub id: EntityId,
    pub name: String,
    /// Relative to the structure root.
    pub path: PathBuf,
}

/// List top-level directories under `root` that look like entity roots but
/// whose id is not in `configured`. Sorted by name.
///
/// Names that match the naming pattern but carry an unparseable id are
/// skipped with a warning. Files and non-UTF-8 names are ignored.
pub fn find_orphans(
    root: &Path,
    naming: &NamingRules,
    configured: &BTreeSet<EntityId>,
) -> Result<Vec<Orphan>, SyncError> {
    let mut orphans = Vec::new();

    for entry in std::fs::read_dir(root).map_err(|e| io_err(root, e))? {
        let entry = entry.map_err(|e| io_err(root, e))?;
        let file_type = entry.file_type().map_err(|e| io_err(&entry.path(), e))?;
        if !file_type.is_dir() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !naming.matches_pattern(&name) {
            continue;
        }

        match naming.try_parse_entity_id(&name) {
            Some(id) if configured.contains(&id) => {}
            Some(id) => {
                tracing::debug!("orphan entity directory {name} (id {})", id.0);
                orphans.push(Orphan {
                    id,
                    path: PathBuf::from(&name),
                    name,
                });
            }
            None => {
                tracing::warn!("skipping {name}: entity id does not parse");
            }
        }
    }

    orphans.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(orphans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn configured(ids: &[u32]) -> BTreeSet<EntityId> {
        ids.iter().copied().map(EntityId).collect()
    }

    #[test]
    fn unconfigured_directory_is_an_orphan() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("CUST-099")).unwrap();
        fs::create_dir(tmp.path().join("CUST-010")).unwrap();

        let orphans =
            find_orphans(tmp.path(), &NamingRules::default(), &configured(&[2, 10])).unwrap();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].id, EntityId(99));
        assert_eq!(orphans[0].name, "CUST-099");
        assert_eq!(orphans[0].path, PathBuf::from("CUST-099"));
    }

    #[test]
    fn configured_directory_is_not_an_orphan() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("CUST-010")).unwrap();
        let orphans =
            find_orphans(tmp.path(), &NamingRules::default(), &configured(&[2, 10])).unwrap();
        assert!(orphans.is_empty());
    }

    #[test]
    fn files_and_foreign_names_are_ignored() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("CUST-050"), "not a dir").unwrap();
        fs::create_dir(tmp.path().join("Archive")).unwrap();
        fs::create_dir(tmp.path().join("CUST-ABC")).unwrap();

        let orphans = find_orphans(tmp.path(), &NamingRules::default(), &configured(&[])).unwrap();
        assert!(orphans.is_empty());
    }

    #[test]
    fn nested_directories_are_not_scanned() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("Archive").join("CUST-077")).unwrap();
        let orphans = find_orphans(tmp.path(), &NamingRules::default(), &configured(&[])).unwrap();
        assert!(orphans.is_empty());
    }

    #[test]
    fn orphans_are_sorted_by_name() {
        let tmp = TempDir::new().unwrap();
        for name in ["CUST-300", "CUST-020", "CUST-100"] {
            fs::create_dir(tmp.path().join(name)).unwrap();
        }
        let names: Vec<String> = find_orphans(tmp.path(), &NamingRules::default(), &configured(&[]))
            .unwrap()
            .into_iter()
            .map(|o| o.name)
            .collect();
        assert_eq!(names, vec!["CUST-020", "CUST-100", "CUST-300"]);
    }

    #[test]
    fn missing_root_is_an_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = find_orphans(
            &tmp.path().join("nope"),
            &NamingRules::default(),
            &configured(&[]),
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::Io { .. }));
    }
}
