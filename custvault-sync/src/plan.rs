//! Write-back plan: rendered content for every template-managed node.

use std::path::PathBuf;

use serde::Serialize;

use custvault_core::types::{CategoryName, EntityCode, VaultConfig};
use custvault_template::{expand, Ambient, ExpansionContext, TemplateSet, VariableRegistry};

use crate::snapshot::{expected, NodeRole};

pub const OP_CREATE_ROOT_INDEX: &str = "create-root-index";
pub const OP_CREATE_CATEGORY_INDEX: &str = "create-category-index";

/// One file the caller should write. Nothing here touches the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedFile {
    /// Relative to the structure root.
    pub path: PathBuf,
    pub content: String,
    pub owner: EntityCode,
    pub category: Option<CategoryName>,
    /// Operation name handed to hooks alongside `owner`.
    pub operation: &'static str,
}

/// Render one file per index node, in expected order.
pub fn render_plan(
    config: &VaultConfig,
    templates: &TemplateSet,
    registry: &VariableRegistry,
    ambient: &Ambient,
) -> Vec<RenderedFile> {
    expected(config)
        .into_iter()
        .filter_map(|node| {
            let (template, operation) = match node.role {
                NodeRole::EntityIndex => (templates.root.as_str(), OP_CREATE_ROOT_INDEX),
                NodeRole::CategoryIndex => {
                    let category = node.category.as_ref()?;
                    (templates.for_category(category), OP_CREATE_CATEGORY_INDEX)
                }
                NodeRole::EntityRoot | NodeRole::CategoryDir => return None,
            };
            let ctx = ExpansionContext::new(
                node.owner.clone(),
                node.category.clone(),
                ambient.clone(),
            )
            .with_naming(&config.naming);
            Some(RenderedFile {
                content: expand(template, &ctx, registry),
                path: node.path,
                owner: node.owner,
                category: node.category,
                operation,
            })
        })
        .collect()
}
