//! Expansion context: the facts one template expansion may draw on.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, FixedOffset, Local, Utc};

use custvault_core::types::{CategoryName, EntityCode, NamingRules};

/// Ambient key that freezes the clock (RFC 3339 timestamp).
pub const AMBIENT_NOW: &str = "NOW";
pub const AMBIENT_USER: &str = "USER";
pub const AMBIENT_HOSTNAME: &str = "HOSTNAME";
pub const AMBIENT_VAULT_PATH: &str = "VAULT_PATH";

/// Environment-derived facts: user, host, vault path, optional frozen clock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ambient {
    values: BTreeMap<String, String>,
}

impl Ambient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read user and host from the process environment.
    pub fn from_env(vault_path: &Path) -> Self {
        let mut ambient = Self::new();
        if let Some(user) = env_first(&["USER", "USERNAME"]) {
            ambient.insert(AMBIENT_USER, user);
        }
        if let Some(host) = env_first(&["HOSTNAME", "COMPUTERNAME"]) {
            ambient.insert(AMBIENT_HOSTNAME, host);
        }
        ambient.insert(AMBIENT_VAULT_PATH, vault_path.display().to_string());
        ambient
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Builder form of [`Ambient::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Freeze every time variable at `instant`, keeping its offset as "local".
    pub fn frozen_at(self, instant: DateTime<FixedOffset>) -> Self {
        self.with(AMBIENT_NOW, instant.to_rfc3339())
    }

    /// The frozen instant, if `NOW` is set and parses as RFC 3339.
    pub fn frozen_now(&self) -> Option<DateTime<FixedOffset>> {
        let raw = self.get(AMBIENT_NOW)?;
        match DateTime::parse_from_rfc3339(raw) {
            Ok(ts) => Some(ts),
            Err(err) => {
                tracing::warn!("ignoring unparseable ambient NOW '{raw}': {err}");
                None
            }
        }
    }
}

fn env_first(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| std::env::var(k).ok())
        .find(|v| !v.is_empty())
}

/// Per-call expansion context. Immutable for the duration of one expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionContext {
    pub entity_code: EntityCode,
    /// `None` when expanding an entity's root template.
    pub category: Option<CategoryName>,
    pub ambient: Ambient,
    /// Root index note name without `.md`, e.g. `CUST-002-Index`.
    pub root_index: String,
}

impl ExpansionContext {
    /// Uses the default naming rules for `root_index`.
    pub fn new(entity_code: EntityCode, category: Option<CategoryName>, ambient: Ambient) -> Self {
        let root_index = root_index_note(&NamingRules::default(), &entity_code);
        Self {
            entity_code,
            category,
            ambient,
            root_index,
        }
    }

    /// Root-template context with no ambient facts.
    pub fn for_entity(entity_code: impl Into<EntityCode>) -> Self {
        Self::new(entity_code.into(), None, Ambient::new())
    }

    pub fn with_category(mut self, category: impl Into<CategoryName>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_ambient(mut self, ambient: Ambient) -> Self {
        self.ambient = ambient;
        self
    }

    /// Derive `root_index` from configured naming rules.
    pub fn with_naming(mut self, naming: &NamingRules) -> Self {
        self.root_index = root_index_note(naming, &self.entity_code);
        self
    }

    pub fn category_name(&self) -> &str {
        self.category.as_ref().map(|c| c.as_str()).unwrap_or("")
    }

    /// Current instant in UTC; sampled per call unless the clock is frozen.
    pub fn now_utc(&self) -> DateTime<Utc> {
        match self.ambient.frozen_now() {
            Some(ts) => ts.with_timezone(&Utc),
            None => Utc::now(),
        }
    }

    /// Current local instant. A frozen clock keeps its own offset.
    pub fn now_local(&self) -> DateTime<FixedOffset> {
        match self.ambient.frozen_now() {
            Some(ts) => ts,
            None => {
                let now = Local::now();
                now.with_timezone(now.offset())
            }
        }
    }
}

fn root_index_note(naming: &NamingRules, code: &EntityCode) -> String {
    let file = naming.root_index_name(code);
    match file.strip_suffix(".md") {
        Some(stem) => stem.to_string(),
        None => file,
    }
}
