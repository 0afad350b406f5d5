//! Custvault core library: domain types, config persistence, errors.
//!
//! - [`types`]: newtypes, naming rules and [`VaultConfig`]
//! - [`error`]: [`ConfigError`]
//! - [`config`]: load / save / init

pub mod config;
pub mod error;
pub mod types;

pub use error::ConfigError;
pub use types::{CategoryName, EntityCode, EntityId, NamingRules, VaultConfig};
