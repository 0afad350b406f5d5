//! Shared run entrypoint used by every CLI command.

use std::path::Path;

use custvault_core::{config, VaultConfig};
use custvault_template::{Ambient, TemplateSet, VariableRegistry};

use crate::diff::{diff_structure, DiffReport, OrphanMode};
use crate::plan::{render_plan, RenderedFile};
use crate::writer::{apply, ApplyResult};
use crate::SyncError;

/// Everything one run needs, built fresh from config each invocation.
#[derive(Debug, Clone)]
pub struct Run {
    pub config: VaultConfig,
    pub templates: TemplateSet,
    pub registry: VariableRegistry,
    pub ambient: Ambient,
}

impl Run {
    /// Load templates and register `config.variables` for this run.
    ///
    /// Template overrides come from `config.templates_dir`, else
    /// `<home>/.custvault/templates/`.
    pub fn prepare(home: &Path, config: VaultConfig) -> Result<Self, SyncError> {
        let templates_dir = config::templates_dir_at(home, &config);
        let templates = TemplateSet::load(Some(templates_dir.as_path()))?;
        let registry = VariableRegistry::with_custom(config.variables.clone())?;
        let ambient = Ambient::from_env(config.root());
        Ok(Self {
            config,
            templates,
            registry,
            ambient,
        })
    }

    /// Replace the ambient facts, e.g. to freeze the clock.
    pub fn with_ambient(mut self, ambient: Ambient) -> Self {
        self.ambient = ambient;
        self
    }

    pub fn diff(&self, mode: OrphanMode) -> Result<DiffReport, SyncError> {
        diff_structure(&self.config, mode)
    }

    pub fn plan(&self) -> Vec<RenderedFile> {
        render_plan(&self.config, &self.templates, &self.registry, &self.ambient)
    }

    /// Render and write the plan.
    pub fn apply(&self, dry_run: bool) -> Result<ApplyResult, SyncError> {
        let plan = self.plan();
        tracing::debug!("applying {} planned file(s)", plan.len());
        apply(&self.config, &plan, dry_run)
    }
}
