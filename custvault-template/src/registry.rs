//! Variable registry: fixed built-ins plus caller-registered custom values.
//!
//! Resolution order is built-in first, then custom. Built-in names are
//! reserved; [`VariableRegistry::set`] refuses them. Unknown names resolve to
//! the empty string.
//!
//! A registry is a plain value: build one per run (or per concurrent
//! expansion) and pass it by reference into [`crate::expand`].

use std::collections::BTreeMap;

use chrono::{Datelike, SecondsFormat};
use uuid::Uuid;

use crate::context::{ExpansionContext, AMBIENT_HOSTNAME, AMBIENT_USER, AMBIENT_VAULT_PATH};
use crate::error::TemplateError;

// ---------------------------------------------------------------------------
// Built-ins
// ---------------------------------------------------------------------------

/// Every built-in variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    CustCode,
    CustId,
    Category,
    RootIndex,
    NowUtc,
    NowLocal,
    Date,
    Time,
    Year,
    Month,
    Day,
    Week,
    Weekday,
    WeekdayShort,
    User,
    Hostname,
    VaultPath,
    RandomId,
    Uuid,
}

impl Builtin {
    /// All built-ins in a stable order.
    pub fn all() -> &'static [Builtin] {
        &[
            Builtin::CustCode,
            Builtin::CustId,
            Builtin::Category,
            Builtin::RootIndex,
            Builtin::NowUtc,
            Builtin::NowLocal,
            Builtin::Date,
            Builtin::Time,
            Builtin::Year,
            Builtin::Month,
            Builtin::Day,
            Builtin::Week,
            Builtin::Weekday,
            Builtin::WeekdayShort,
            Builtin::User,
            Builtin::Hostname,
            Builtin::VaultPath,
            Builtin::RandomId,
            Builtin::Uuid,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::CustCode => "CUST_CODE",
            Builtin::CustId => "CUST_ID",
            Builtin::Category => "CATEGORY",
            Builtin::RootIndex => "ROOT_INDEX",
            Builtin::NowUtc => "NOW_UTC",
            Builtin::NowLocal => "NOW_LOCAL",
            Builtin::Date => "DATE",
            Builtin::Time => "TIME",
            Builtin::Year => "YEAR",
            Builtin::Month => "MONTH",
            Builtin::Day => "DAY",
            Builtin::Week => "WEEK",
            Builtin::Weekday => "WEEKDAY",
            Builtin::WeekdayShort => "WEEKDAY_SHORT",
            Builtin::User => "USER",
            Builtin::Hostname => "HOSTNAME",
            Builtin::VaultPath => "VAULT_PATH",
            Builtin::RandomId => "RANDOM_ID",
            Builtin::Uuid => "UUID",
        }
    }

    pub fn from_name(name: &str) -> Option<Builtin> {
        Builtin::all().iter().copied().find(|b| b.name() == name)
    }

    /// Short description for `custvault vars`.
    pub fn description(&self) -> &'static str {
        match self {
            Builtin::CustCode => "entity code, e.g. CUST-002",
            Builtin::CustId => "numeric part of the entity code, e.g. 002",
            Builtin::Category => "current category, empty for root templates",
            Builtin::RootIndex => "root index note name, e.g. CUST-002-Index",
            Builtin::NowUtc => "current time, RFC 3339 UTC",
            Builtin::NowLocal => "current time, RFC 3339 with offset",
            Builtin::Date => "local date, YYYY-MM-DD",
            Builtin::Time => "local time, HH:MM:SS",
            Builtin::Year => "local year",
            Builtin::Month => "local month, 01-12",
            Builtin::Day => "local day of month, 01-31",
            Builtin::Week => "ISO week number, 01-53",
            Builtin::Weekday => "weekday name, e.g. Monday",
            Builtin::WeekdayShort => "weekday abbreviation, e.g. Mon",
            Builtin::User => "current user",
            Builtin::Hostname => "current host",
            Builtin::VaultPath => "structure root path",
            Builtin::RandomId => "8 random hex characters",
            Builtin::Uuid => "random UUID v4",
        }
    }

    /// True for variables whose value changes between calls.
    pub fn is_volatile(&self) -> bool {
        matches!(
            self,
            Builtin::NowUtc
                | Builtin::NowLocal
                | Builtin::Date
                | Builtin::Time
                | Builtin::Year
                | Builtin::Month
                | Builtin::Day
                | Builtin::Week
                | Builtin::Weekday
                | Builtin::WeekdayShort
                | Builtin::RandomId
                | Builtin::Uuid
        )
    }

    /// Resolve against `ctx`. Time variables sample the clock at call time.
    pub fn resolve(&self, ctx: &ExpansionContext) -> String {
        match self {
            Builtin::CustCode => ctx.entity_code.0.clone(),
            Builtin::CustId => trailing_digits(ctx.entity_code.as_str()).to_string(),
            Builtin::Category => ctx.category_name().to_string(),
            Builtin::RootIndex => ctx.root_index.clone(),
            Builtin::NowUtc => ctx.now_utc().to_rfc3339_opts(SecondsFormat::Secs, true),
            Builtin::NowLocal => ctx.now_local().to_rfc3339_opts(SecondsFormat::Secs, false),
            Builtin::Date => ctx.now_local().format("%Y-%m-%d").to_string(),
            Builtin::Time => ctx.now_local().format("%H:%M:%S").to_string(),
            Builtin::Year => ctx.now_local().format("%Y").to_string(),
            Builtin::Month => ctx.now_local().format("%m").to_string(),
            Builtin::Day => ctx.now_local().format("%d").to_string(),
            Builtin::Week => format!("{:02}", ctx.now_local().iso_week().week()),
            Builtin::Weekday => ctx.now_local().format("%A").to_string(),
            Builtin::WeekdayShort => ctx.now_local().format("%a").to_string(),
            Builtin::User => ambient_or_empty(ctx, AMBIENT_USER),
            Builtin::Hostname => ambient_or_empty(ctx, AMBIENT_HOSTNAME),
            Builtin::VaultPath => ambient_or_empty(ctx, AMBIENT_VAULT_PATH),
            Builtin::RandomId => Uuid::new_v4().simple().to_string()[..8].to_string(),
            Builtin::Uuid => Uuid::new_v4().hyphenated().to_string(),
        }
    }
}

fn ambient_or_empty(ctx: &ExpansionContext, key: &str) -> String {
    ctx.ambient.get(key).unwrap_or_default().to_string()
}

fn trailing_digits(code: &str) -> &str {
    let start = code
        .rfind(|c: char| !c.is_ascii_digit())
        .map(|i| i + 1)
        .unwrap_or(0);
    &code[start..]
}

// ---------------------------------------------------------------------------
// VariableRegistry
// ---------------------------------------------------------------------------

/// Where a known variable name resolves from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableSource<'a> {
    Builtin(Builtin),
    Custom(&'a str),
}

/// Built-in set plus custom string values for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableRegistry {
    custom: BTreeMap<String, String>,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-filled with custom values (e.g. from config `variables:`).
    pub fn with_custom<I, K, V>(entries: I) -> Result<Self, TemplateError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut registry = Self::new();
        for (name, value) in entries {
            registry.set(name, value)?;
        }
        Ok(registry)
    }

    /// Register or replace a custom variable.
    pub fn set(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), TemplateError> {
        let name = name.into();
        if Builtin::from_name(&name).is_some() {
            return Err(TemplateError::ReservedVariable { name });
        }
        self.custom.insert(name, value.into());
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.custom.remove(name)
    }

    /// Drop every custom entry; built-ins are unaffected.
    pub fn clear(&mut self) {
        self.custom.clear();
    }

    pub fn custom(&self) -> impl Iterator<Item = (&str, &str)> {
        self.custom.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn lookup(&self, name: &str) -> Option<VariableSource<'_>> {
        if let Some(builtin) = Builtin::from_name(name) {
            return Some(VariableSource::Builtin(builtin));
        }
        self.custom
            .get(name)
            .map(|v| VariableSource::Custom(v.as_str()))
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Built-in names followed by custom names (sorted).
    pub fn known_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Builtin::all().iter().map(|b| b.name()).collect();
        names.extend(self.custom.keys().map(String::as_str));
        names
    }

    /// Never fails: unknown names resolve to `""`.
    pub fn resolve(&self, name: &str, ctx: &ExpansionContext) -> String {
        match self.lookup(name) {
            Some(VariableSource::Builtin(builtin)) => builtin.resolve(ctx),
            Some(VariableSource::Custom(value)) => value.to_string(),
            None => String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Ambient;
    use chrono::DateTime;
    use rstest::rstest;
    use std::collections::HashSet;

    fn frozen_ctx() -> ExpansionContext {
        let instant = DateTime::parse_from_rfc3339("2024-01-01T09:05:07+01:00").unwrap();
        ExpansionContext::for_entity("CUST-002")
            .with_category("FP")
            .with_ambient(
                Ambient::new()
                    .frozen_at(instant)
                    .with(AMBIENT_USER, "dana")
                    .with(AMBIENT_HOSTNAME, "workstation")
                    .with(AMBIENT_VAULT_PATH, "/vault/Customers"),
            )
    }

    #[rstest]
    #[case("CUST_CODE", "CUST-002")]
    #[case("CUST_ID", "002")]
    #[case("CATEGORY", "FP")]
    #[case("ROOT_INDEX", "CUST-002-Index")]
    #[case("NOW_UTC", "2024-01-01T08:05:07Z")]
    #[case("NOW_LOCAL", "2024-01-01T09:05:07+01:00")]
    #[case("DATE", "2024-01-01")]
    #[case("TIME", "09:05:07")]
    #[case("YEAR", "2024")]
    #[case("MONTH", "01")]
    #[case("DAY", "01")]
    #[case("WEEK", "01")]
    #[case("WEEKDAY", "Monday")]
    #[case("WEEKDAY_SHORT", "Mon")]
    #[case("USER", "dana")]
    #[case("HOSTNAME", "workstation")]
    #[case("VAULT_PATH", "/vault/Customers")]
    fn builtin_resolves_against_frozen_context(#[case] name: &str, #[case] expected: &str) {
        let registry = VariableRegistry::new();
        assert_eq!(registry.resolve(name, &frozen_ctx()), expected);
    }

    #[test]
    fn every_builtin_round_trips_through_its_name() {
        for builtin in Builtin::all() {
            assert_eq!(Builtin::from_name(builtin.name()), Some(*builtin));
            assert!(!builtin.description().is_empty());
        }
    }

    #[test]
    fn unknown_name_resolves_to_empty() {
        let registry = VariableRegistry::new();
        assert_eq!(registry.resolve("NOPE", &frozen_ctx()), "");
        assert!(!registry.is_known("NOPE"));
    }

    #[test]
    fn custom_values_resolve_after_builtins() {
        let mut registry = VariableRegistry::new();
        registry.set("ACCOUNT_MANAGER", "Sam").unwrap();
        assert_eq!(registry.resolve("ACCOUNT_MANAGER", &frozen_ctx()), "Sam");
        assert_eq!(
            registry.lookup("ACCOUNT_MANAGER"),
            Some(VariableSource::Custom("Sam"))
        );
    }

    #[test]
    fn builtin_names_are_reserved() {
        let mut registry = VariableRegistry::new();
        let err = registry.set("CUST_CODE", "hijack").unwrap_err();
        assert!(matches!(err, TemplateError::ReservedVariable { ref name } if name == "CUST_CODE"));
        assert_eq!(registry.resolve("CUST_CODE", &frozen_ctx()), "CUST-002");
    }

    #[test]
    fn names_are_case_sensitive() {
        let mut registry = VariableRegistry::new();
        registry.set("cust_code", "lower").unwrap();
        assert_eq!(registry.resolve("cust_code", &frozen_ctx()), "lower");
        assert_eq!(registry.resolve("CUST_CODE", &frozen_ctx()), "CUST-002");
    }

    #[test]
    fn clear_and_remove_only_touch_custom_entries() {
        let mut registry =
            VariableRegistry::with_custom([("A", "1"), ("B", "2")]).expect("custom");
        assert_eq!(registry.remove("A"), Some("1".to_string()));
        registry.clear();
        assert_eq!(registry.custom().count(), 0);
        assert_eq!(registry.known_names().len(), Builtin::all().len());
    }

    #[test]
    fn known_names_lists_builtins_then_custom() {
        let registry = VariableRegistry::with_custom([("ZETA", "z")]).expect("custom");
        let names = registry.known_names();
        assert_eq!(names.first(), Some(&"CUST_CODE"));
        assert_eq!(names.last(), Some(&"ZETA"));
    }

    #[test]
    fn random_ids_are_hex_and_do_not_repeat() {
        let registry = VariableRegistry::new();
        let ctx = frozen_ctx();
        let mut seen = HashSet::new();
        for _ in 0..256 {
            let id = registry.resolve("RANDOM_ID", &ctx);
            assert_eq!(id.len(), 8);
            assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
            seen.insert(id);
        }
        assert!(seen.len() > 250, "RANDOM_ID repeated too often");
    }

    #[test]
    fn uuid_is_v4_shaped() {
        let registry = VariableRegistry::new();
        let a = registry.resolve("UUID", &frozen_ctx());
        let b = registry.resolve("UUID", &frozen_ctx());
        assert_ne!(a, b);
        let parsed = Uuid::parse_str(&a).expect("valid uuid");
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn cust_id_handles_codes_without_digits() {
        assert_eq!(trailing_digits("CUST-"), "");
        assert_eq!(trailing_digits("0042"), "0042");
    }

    #[test]
    fn volatile_flags_match_documented_set() {
        assert!(Builtin::Uuid.is_volatile());
        assert!(Builtin::Date.is_volatile());
        assert!(!Builtin::CustCode.is_volatile());
        assert!(!Builtin::User.is_volatile());
    }
}
