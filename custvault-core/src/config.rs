//! YAML vault configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.custvault/
//!   config.yaml     (mode 0600, written by `init`)
//!   templates/      (optional overrides: root.md, category.md, <Category>.md)
//! ```
//!
//! # API pattern
//!
//! Every function touching the home directory has two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::types::{CategoryName, EntityId, VaultConfig};

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.custvault/`: pure, no I/O.
pub fn config_dir_at(home: &Path) -> PathBuf {
    home.join(".custvault")
}

/// `<home>/.custvault/config.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    config_dir_at(home).join("config.yaml")
}

/// `<home>/.custvault/templates/`: pure, no I/O.
pub fn default_templates_dir_at(home: &Path) -> PathBuf {
    config_dir_at(home).join("templates")
}

/// `config_path_at` convenience wrapper.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_path_at(&home()?))
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load and validate a config file from an explicit path.
///
/// Returns `ConfigError::ConfigNotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML,
/// `ConfigError::Invalid` if it parses but breaks a structural rule.
pub fn load_from(path: &Path) -> Result<VaultConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path)?;
    let config: VaultConfig = serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    config.validate()?;
    Ok(config)
}

/// Load `<home>/.custvault/config.yaml`.
pub fn load_config_at(home: &Path) -> Result<VaultConfig, ConfigError> {
    load_from(&config_path_at(home))
}

/// `load_config_at` convenience wrapper.
pub fn load_config() -> Result<VaultConfig, ConfigError> {
    load_config_at(&home()?)
}

/// Templates directory for a config: its explicit `templates_dir`, else the
/// default under `home`.
pub fn templates_dir_at(home: &Path, config: &VaultConfig) -> PathBuf {
    config
        .templates_dir
        .clone()
        .unwrap_or_else(|| default_templates_dir_at(home))
}

// ---------------------------------------------------------------------------
// 3. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save a config to an explicit path.
///
/// Write flow: validate → serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
/// `.tmp` is always in the same directory as the target (same filesystem).
pub fn save_to(path: &Path, config: &VaultConfig) -> Result<(), ConfigError> {
    config.validate()?;
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            std::fs::create_dir_all(dir)?;
            set_dir_permissions(dir)?;
        }
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "config.yaml".to_string());
    let tmp_path = path.with_file_name(format!("{file_name}.tmp"));

    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&tmp_path, yaml)?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Atomically save `<home>/.custvault/config.yaml`.
pub fn save_config_at(home: &Path, config: &VaultConfig) -> Result<(), ConfigError> {
    save_to(&config_path_at(home), config)
}

/// `save_config_at` convenience wrapper.
pub fn save_config(config: &VaultConfig) -> Result<(), ConfigError> {
    save_config_at(&home()?, config)
}

// ---------------------------------------------------------------------------
// 4. Init
// ---------------------------------------------------------------------------

/// Scaffold `<home>/.custvault/config.yaml` for a structure rooted at `root_path`.
///
/// Idempotent: if the file already exists, loads and returns it unchanged.
pub fn init_config_at(
    home: &Path,
    root_path: PathBuf,
    entity_ids: Vec<EntityId>,
    categories: Vec<CategoryName>,
    id_width: Option<usize>,
) -> Result<VaultConfig, ConfigError> {
    let path = config_path_at(home);
    if path.exists() {
        return load_from(&path);
    }

    let mut config = VaultConfig::new(root_path);
    config.entity_ids = entity_ids;
    config.categories = categories;
    if let Some(width) = id_width {
        config.id_width = width;
    }

    save_to(&path, &config)?;
    Ok(config)
}

/// `init_config_at` convenience wrapper.
pub fn init_config(
    root_path: PathBuf,
    entity_ids: Vec<EntityId>,
    categories: Vec<CategoryName>,
    id_width: Option<usize>,
) -> Result<VaultConfig, ConfigError> {
    init_config_at(&home()?, root_path, entity_ids, categories, id_width)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_home() -> TempDir {
        TempDir::new().expect("tempdir")
    }

    #[test]
    fn config_path_is_correct() {
        let home = make_home();
        let path = config_path_at(home.path());
        assert!(path.ends_with(".custvault/config.yaml"));
    }

    #[test]
    fn init_creates_config_with_perms() {
        let home = make_home();
        let cfg = init_config_at(
            home.path(),
            PathBuf::from("/vault/Customers"),
            vec![EntityId(1)],
            vec![CategoryName::from("FP")],
            None,
        )
        .expect("init");
        assert_eq!(cfg.id_width, 3);
        let path = config_path_at(home.path());
        assert!(path.exists());
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o600);
            let dir_mode = std::fs::metadata(config_dir_at(home.path()))
                .unwrap()
                .permissions()
                .mode()
                & 0o777;
            assert_eq!(dir_mode, 0o700);
        }
    }

    #[test]
    fn init_is_idempotent() {
        let home = make_home();
        let first = init_config_at(
            home.path(),
            PathBuf::from("/vault/a"),
            vec![EntityId(1)],
            vec![],
            Some(4),
        )
        .expect("init");
        let second = init_config_at(
            home.path(),
            PathBuf::from("/vault/b"),
            vec![EntityId(9)],
            vec![],
            None,
        )
        .expect("init again");
        assert_eq!(first, second);
        assert_eq!(second.root_path, PathBuf::from("/vault/a"));
    }

    #[test]
    fn save_and_load_roundtrip() {
        let home = make_home();
        let mut cfg = VaultConfig::new("/vault/Customers");
        cfg.entity_ids = vec![EntityId(2), EntityId(10)];
        cfg.categories = vec![CategoryName::from("FP"), CategoryName::from("RAISED")];
        save_config_at(home.path(), &cfg).expect("save");
        let loaded = load_config_at(home.path()).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn atomic_write_cleans_up_tmp() {
        let home = make_home();
        save_config_at(home.path(), &VaultConfig::new("/vault")).expect("save");
        let tmp = config_path_at(home.path()).with_file_name("config.yaml.tmp");
        assert!(!tmp.exists(), ".tmp must be gone after successful save");
    }

    #[test]
    fn save_refuses_invalid_config() {
        let home = make_home();
        let mut cfg = VaultConfig::new("/vault");
        cfg.id_width = 0;
        let err = save_config_at(home.path(), &cfg).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(!config_path_at(home.path()).exists());
    }

    #[test]
    fn load_missing_config_returns_not_found() {
        let home = make_home();
        let err = load_config_at(home.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigNotFound { .. }));
    }

    #[test]
    fn templates_dir_prefers_explicit_setting() {
        let home = make_home();
        let mut cfg = VaultConfig::new("/vault");
        assert_eq!(
            templates_dir_at(home.path(), &cfg),
            home.path().join(".custvault").join("templates")
        );
        cfg.templates_dir = Some(PathBuf::from("/elsewhere"));
        assert_eq!(templates_dir_at(home.path(), &cfg), PathBuf::from("/elsewhere"));
    }

    #[test]
    fn home_not_found_error_message() {
        assert!(ConfigError::HomeNotFound.to_string().contains("home directory"));
    }
}
