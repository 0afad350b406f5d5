//! Domain types for the customer vault.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! All types are serializable/deserializable via serde + serde_yaml.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Integer identifier of a configured entity (customer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Rendered, zero-padded entity code such as `CUST-002`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityCode(pub String);

impl EntityCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for EntityCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityCode {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Name of a category subdirectory applied to every entity (e.g. `FP`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryName(pub String);

impl CategoryName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for CategoryName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CategoryName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Naming rules
// ---------------------------------------------------------------------------

/// How entity directories and index files are named on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingRules {
    pub prefix: String,
    pub separator: String,
    /// Appended to the entity code / category name to form index file names.
    pub index_suffix: String,
}

impl Default for NamingRules {
    fn default() -> Self {
        Self {
            prefix: "CUST".to_string(),
            separator: "-".to_string(),
            index_suffix: "-Index.md".to_string(),
        }
    }
}

impl NamingRules {
    /// `CUST` + `-` + id zero-padded to `width`. Ids wider than `width` keep
    /// their natural width.
    pub fn entity_code(&self, id: EntityId, width: usize) -> EntityCode {
        EntityCode(format!(
            "{}{}{:0width$}",
            self.prefix,
            self.separator,
            id.0,
            width = width
        ))
    }

    /// `<code><index_suffix>`, e.g. `CUST-002-Index.md`.
    pub fn root_index_name(&self, code: &EntityCode) -> String {
        format!("{}{}", code.0, self.index_suffix)
    }

    /// `<category><index_suffix>`, e.g. `FP-Index.md`.
    pub fn category_index_name(&self, category: &CategoryName) -> String {
        format!("{}{}", category.0, self.index_suffix)
    }

    /// True when `name` carries the entity prefix and separator, whether or
    /// not the remainder is a valid id.
    pub fn matches_pattern(&self, name: &str) -> bool {
        name.len() > self.prefix.len() + self.separator.len()
            && name.starts_with(&self.prefix)
            && name[self.prefix.len()..].starts_with(&self.separator)
    }

    /// Extract the numeric id embedded in an entity directory name.
    ///
    /// `None` when the name does not match the pattern or the remainder is not
    /// a plain run of ASCII digits that fits in a `u32`.
    pub fn try_parse_entity_id(&self, name: &str) -> Option<EntityId> {
        if !self.matches_pattern(name) {
            return None;
        }
        let digits = &name[self.prefix.len() + self.separator.len()..];
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse::<u32>().ok().map(EntityId)
    }
}

// ---------------------------------------------------------------------------
// Vault configuration
// ---------------------------------------------------------------------------

fn default_id_width() -> usize {
    3
}

/// Resolved configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Structure root inside the vault; every expected path is relative to it.
    pub root_path: PathBuf,
    #[serde(default = "default_id_width")]
    pub id_width: usize,
    #[serde(default)]
    pub entity_ids: Vec<EntityId>,
    #[serde(default)]
    pub categories: Vec<CategoryName>,
    #[serde(default)]
    pub naming: NamingRules,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates_dir: Option<PathBuf>,
    /// Custom template variables, registered fresh for every run.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
}

impl VaultConfig {
    /// Minimal config with default naming and no entities or categories.
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            id_width: default_id_width(),
            entity_ids: vec![],
            categories: vec![],
            naming: NamingRules::default(),
            templates_dir: None,
            variables: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    /// Entity codes in configured order.
    pub fn entity_codes(&self) -> Vec<EntityCode> {
        self.entity_ids
            .iter()
            .map(|id| self.naming.entity_code(*id, self.id_width))
            .collect()
    }

    pub fn entity_id_set(&self) -> BTreeSet<EntityId> {
        self.entity_ids.iter().copied().collect()
    }

    /// Check structural rules that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id_width == 0 {
            return Err(invalid("id_width must be at least 1"));
        }
        if self.naming.prefix.is_empty() {
            return Err(invalid("naming.prefix must not be empty"));
        }
        if self.naming.index_suffix.is_empty() {
            return Err(invalid("naming.index_suffix must not be empty"));
        }
        for (field, value) in [
            ("prefix", &self.naming.prefix),
            ("separator", &self.naming.separator),
            ("index_suffix", &self.naming.index_suffix),
        ] {
            if value.contains('/') || value.contains('\\') || value.contains("..") {
                return Err(invalid(format!(
                    "naming.{field} '{value}' must not contain '/', '\\' or '..'"
                )));
            }
        }

        let mut seen_ids = BTreeSet::new();
        for id in &self.entity_ids {
            if !seen_ids.insert(*id) {
                return Err(invalid(format!("duplicate entity id {id}")));
            }
        }

        let mut seen_categories = BTreeSet::new();
        for category in &self.categories {
            let name = category.as_str();
            if name.trim().is_empty() {
                return Err(invalid("category names must not be empty"));
            }
            if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
                return Err(invalid(format!(
                    "category '{name}' must be a single path component"
                )));
            }
            if !seen_categories.insert(name) {
                return Err(invalid(format!("duplicate category '{name}'")));
            }
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.into(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
