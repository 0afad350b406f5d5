//! # custvault-template
//!
//! Placeholder expansion for vault note templates.
//!
//! ## Usage
//!
//! ```rust
//! use custvault_template::{expand, ExpansionContext, VariableRegistry};
//!
//! let mut registry = VariableRegistry::new();
//! registry.set("REGION", "EMEA").unwrap();
//!
//! let ctx = ExpansionContext::for_entity("CUST-002").with_category("FP");
//! let text = expand(
//!     "# {{CUST_CODE}} / {{CATEGORY}}{{IF:REGION}} ({{REGION}}){{ENDIF:REGION}}",
//!     &ctx,
//!     &registry,
//! );
//! assert_eq!(text, "# CUST-002 / FP (EMEA)");
//! ```

pub mod conditional;
pub mod context;
pub mod engine;
pub mod error;
pub mod registry;
pub mod templates;

pub use conditional::{strip_conditionals, RunawayConditional};
pub use context::{Ambient, ExpansionContext};
pub use engine::{expand, expand_with_issues, preview_file, validate, Expansion, Issue, IssueKind};
pub use error::TemplateError;
pub use registry::{Builtin, VariableRegistry, VariableSource};
pub use templates::TemplateSet;
