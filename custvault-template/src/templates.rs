//! Template sources: embedded defaults with optional on-disk overrides.
//!
//! # Override layout
//!
//! | File                | Replaces                                  |
//! |---------------------|-------------------------------------------|
//! | `root.md`           | entity root index template                |
//! | `category.md`       | fallback for every category index         |
//! | `<Category>.md`     | index template for that category only     |

use std::collections::BTreeMap;
use std::path::Path;

use custvault_core::types::CategoryName;

use crate::error::{io_err, TemplateError};

const DEFAULT_ROOT: &str = include_str!("templates/root.md");
const DEFAULT_CATEGORY: &str = include_str!("templates/category.md");

const ROOT_FILE: &str = "root.md";
const CATEGORY_FILE: &str = "category.md";

/// One root template and one template per category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSet {
    pub root: String,
    pub fallback: String,
    pub categories: BTreeMap<CategoryName, String>,
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self::embedded()
    }
}

impl TemplateSet {
    /// The templates baked into the binary.
    pub fn embedded() -> Self {
        Self {
            root: DEFAULT_ROOT.to_string(),
            fallback: DEFAULT_CATEGORY.to_string(),
            categories: BTreeMap::new(),
        }
    }

    /// Embedded defaults overridden by whatever `dir` provides. A missing
    /// directory yields the defaults.
    pub fn load(dir: Option<&Path>) -> Result<Self, TemplateError> {
        let mut set = Self::embedded();
        let Some(dir) = dir else {
            return Ok(set);
        };
        if !dir.exists() {
            tracing::debug!("no template overrides at {}", dir.display());
            return Ok(set);
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(|e| io_err(dir, e))? {
            let entry = entry.map_err(|e| io_err(dir, e))?;
            let path = entry.path();
            let meta = entry.metadata().map_err(|e| io_err(&path, e))?;
            if meta.is_file() && path.extension().and_then(|s| s.to_str()) == Some("md") {
                files.push(path);
            }
        }
        files.sort();

        for path in files {
            let Some(file_name) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
            match file_name {
                ROOT_FILE => set.root = contents,
                CATEGORY_FILE => set.fallback = contents,
                other => {
                    let stem = other.trim_end_matches(".md");
                    set.categories.insert(CategoryName::from(stem), contents);
                }
            }
            tracing::debug!("loaded template override {}", path.display());
        }
        Ok(set)
    }

    /// The category-specific template, else the fallback.
    pub fn for_category(&self, category: &CategoryName) -> &str {
        self.categories
            .get(category)
            .map(String::as_str)
            .unwrap_or(&self.fallback)
    }
}
