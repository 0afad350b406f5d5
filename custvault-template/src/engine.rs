//! Expansion pipeline, validator and preview.
//!
//! `expand` runs two steps in a fixed order:
//!
//! 1. Substitute every `{{NAME}}` whose name is known (built-in or custom)
//!    with its resolved value. Substitution is a single left-to-right pass, so
//!    a value that itself contains `{{…}}` is never expanded again.
//! 2. Strip conditional blocks (see [`crate::conditional`]).
//!
//! Unknown placeholders are left untouched; `validate` reports them.

use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::conditional::strip_conditionals;
use crate::context::ExpansionContext;
use crate::error::{io_err, TemplateError};
use crate::registry::VariableRegistry;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").expect("static regex"))
}

/// Looser form used by the validator so that malformed names are still seen.
fn loose_placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{([^{}:]+)\}\}").expect("static regex"))
}

fn marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{(IF|IFNOT|ENDIF):([^{}]*)\}\}").expect("static regex"))
}

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

/// Advisory problem found in a template. Never blocks expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// 1-based line of the offending token, when it has one.
    pub line: Option<usize>,
    pub kind: IssueKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// Number of `IF:`/`IFNOT:` openers differs from `ENDIF:` closers.
    UnbalancedConditional { openers: usize, closers: usize },
    /// A closer does not carry the name of the block it closes.
    MismatchedBlock { opener: String, closer: String },
    /// Placeholder or condition name with lowercase characters.
    LowercasePlaceholder { name: String },
    /// Name that is neither built-in nor registered.
    UnknownVariable { name: String },
    /// Conditional stripping hit its pass budget.
    RunawayConditional { passes: usize },
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(line) = self.line {
            write!(f, "line {line}: ")?;
        }
        match &self.kind {
            IssueKind::UnbalancedConditional { openers, closers } => write!(
                f,
                "unbalanced conditionals: {openers} opener(s), {closers} ENDIF(s)"
            ),
            IssueKind::MismatchedBlock { opener, closer } => {
                write!(f, "block opened as '{opener}' but closed as '{closer}'")
            }
            IssueKind::LowercasePlaceholder { name } => {
                write!(f, "placeholder '{name}' should be UPPER_SNAKE_CASE")
            }
            IssueKind::UnknownVariable { name } => write!(f, "unknown variable '{name}'"),
            IssueKind::RunawayConditional { passes } => {
                write!(f, "conditional processing stopped after {passes} passes")
            }
        }
    }
}

/// Expanded text plus anything noteworthy that happened on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub text: String,
    pub issues: Vec<Issue>,
}

// ---------------------------------------------------------------------------
// Expansion
// ---------------------------------------------------------------------------

/// Step 1 only: literal, non-recursive substitution of known placeholders.
pub fn substitute(template: &str, ctx: &ExpansionContext, registry: &VariableRegistry) -> String {
    placeholder_re()
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            if registry.is_known(name) {
                registry.resolve(name, ctx)
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Expand `template` for `ctx`. Never fails; see [`expand_with_issues`].
pub fn expand(template: &str, ctx: &ExpansionContext, registry: &VariableRegistry) -> String {
    expand_with_issues(template, ctx, registry).text
}

/// Expand and surface a runaway conditional scan as an issue. On runaway the
/// partially processed text is returned.
pub fn expand_with_issues(
    template: &str,
    ctx: &ExpansionContext,
    registry: &VariableRegistry,
) -> Expansion {
    let substituted = substitute(template, ctx, registry);
    match strip_conditionals(&substituted, ctx, registry) {
        Ok(text) => Expansion {
            text,
            issues: vec![],
        },
        Err(runaway) => Expansion {
            text: runaway.partial,
            issues: vec![Issue {
                line: None,
                kind: IssueKind::RunawayConditional {
                    passes: runaway.passes,
                },
            }],
        },
    }
}

/// Read a template file and expand it. Writes nothing.
pub fn preview_file(
    path: &Path,
    ctx: &ExpansionContext,
    registry: &VariableRegistry,
) -> Result<String, TemplateError> {
    let template = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    Ok(expand(&template, ctx, registry))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

struct Marker<'a> {
    kind: &'a str,
    name: &'a str,
    line: usize,
}

/// Check template syntax against `registry`. Issues are sorted by line.
pub fn validate(text: &str, registry: &VariableRegistry) -> Vec<Issue> {
    let mut issues = Vec::new();

    for caps in loose_placeholder_re().captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        check_name(name.as_str(), line_of(text, whole.start()), registry, &mut issues);
    }

    let markers: Vec<Marker<'_>> = marker_re()
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(Marker {
                kind: caps.get(1)?.as_str(),
                name: caps.get(2)?.as_str(),
                line: line_of(text, whole.start()),
            })
        })
        .collect();

    let openers = markers.iter().filter(|m| m.kind != "ENDIF").count();
    let closers = markers.len() - openers;
    if openers != closers {
        issues.push(Issue {
            line: None,
            kind: IssueKind::UnbalancedConditional { openers, closers },
        });
    }

    let mut open: Vec<&Marker<'_>> = Vec::new();
    for marker in &markers {
        if marker.kind == "ENDIF" {
            match open.pop() {
                Some(opener) if opener.name != marker.name => issues.push(Issue {
                    line: Some(marker.line),
                    kind: IssueKind::MismatchedBlock {
                        opener: opener.name.to_string(),
                        closer: marker.name.to_string(),
                    },
                }),
                _ => {}
            }
        } else {
            check_name(marker.name, marker.line, registry, &mut issues);
            open.push(marker);
        }
    }

    issues.sort_by_key(|issue| issue.line.unwrap_or(0));
    issues
}

fn check_name(name: &str, line: usize, registry: &VariableRegistry, issues: &mut Vec<Issue>) {
    if name.chars().any(char::is_lowercase) {
        issues.push(Issue {
            line: Some(line),
            kind: IssueKind::LowercasePlaceholder {
                name: name.to_string(),
            },
        });
    }
    if !registry.is_known(name) {
        issues.push(Issue {
            line: Some(line),
            kind: IssueKind::UnknownVariable {
                name: name.to_string(),
            },
        });
    }
}

fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].matches('\n').count() + 1
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
