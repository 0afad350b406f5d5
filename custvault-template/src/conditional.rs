//! Conditional block processor.
//!
//! Blocks look like `{{IF:NAME}}…{{ENDIF:NAME}}` or
//! `{{IFNOT:NAME}}…{{ENDIF:NAME}}`. Each pass finds the first block, keeps or
//! drops its content, removes both markers and rescans from the start.
//!
//! Matching is shallow: the first opener that has a same-named closer after it
//! pairs with the *nearest* such closer. In
//! `{{IF:A}}x{{IF:A}}y{{ENDIF:A}}z{{ENDIF:A}}` the outer opener pairs with the
//! inner closer and the outer closer is left over. Existing templates rely on
//! that collapse; do not replace it with a depth-tracking parser.

use std::sync::OnceLock;

use regex::Regex;

use crate::context::ExpansionContext;
use crate::registry::VariableRegistry;

fn opener_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{(IF|IFNOT):([A-Za-z0-9_]+)\}\}").expect("static regex"))
}

/// The scan exceeded its pass budget. `partial` holds the text as it stood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunawayConditional {
    pub partial: String,
    pub passes: usize,
}

/// One matched region, as byte offsets into the scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Block<'a> {
    pub name: &'a str,
    pub negated: bool,
    pub start: usize,
    pub content: std::ops::Range<usize>,
    pub end: usize,
}

/// First block in `text`, or `None` when no opener has a matching closer.
pub(crate) fn find_first_block(text: &str) -> Option<Block<'_>> {
    for caps in opener_re().captures_iter(text) {
        let (Some(whole), Some(kind), Some(name)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let closer = format!("{{{{ENDIF:{}}}}}", name.as_str());
        if let Some(offset) = text[whole.end()..].find(&closer) {
            let content_end = whole.end() + offset;
            return Some(Block {
                name: name.as_str(),
                negated: kind.as_str() == "IFNOT",
                start: whole.start(),
                content: whole.end()..content_end,
                end: content_end + closer.len(),
            });
        }
    }
    None
}

/// Strip every conditional block from `text`.
///
/// `IF:NAME` keeps its content iff `NAME` resolves non-empty; `IFNOT:NAME`
/// iff it resolves empty. Markers are always removed. The pass budget is
/// `text.len() + 1`, which well-formed input can never exhaust.
pub fn strip_conditionals(
    text: &str,
    ctx: &ExpansionContext,
    registry: &VariableRegistry,
) -> Result<String, RunawayConditional> {
    strip_conditionals_with_limit(text, ctx, registry, text.len() + 1)
}

/// [`strip_conditionals`] with an explicit pass budget.
pub fn strip_conditionals_with_limit(
    text: &str,
    ctx: &ExpansionContext,
    registry: &VariableRegistry,
    max_passes: usize,
) -> Result<String, RunawayConditional> {
    let mut current = text.to_string();
    let mut passes = 0;

    while let Some(block) = find_first_block(&current) {
        if passes >= max_passes {
            tracing::warn!("conditional scan stopped after {passes} passes");
            return Err(RunawayConditional {
                partial: current,
                passes,
            });
        }
        passes += 1;

        let value = registry.resolve(block.name, ctx);
        let keep = value.is_empty() == block.negated;
        tracing::debug!(
            "{}:{} -> {}",
            if block.negated { "IFNOT" } else { "IF" },
            block.name,
            if keep { "keep" } else { "drop" }
        );

        let mut next = String::with_capacity(current.len());
        next.push_str(&current[..block.start]);
        if keep {
            next.push_str(&current[block.content.clone()]);
        }
        next.push_str(&current[block.end..]);
        current = next;
    }

    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ExpansionContext {
        ExpansionContext::for_entity("CUST-002")
    }

    fn registry_with(name: &str, value: &str) -> VariableRegistry {
        let mut registry = VariableRegistry::new();
        registry.set(name, value).unwrap();
        registry
    }

    #[test]
    fn if_keeps_content_when_value_present() {
        let out = strip_conditionals("a{{IF:X}}b{{ENDIF:X}}c", &ctx(), &registry_with("X", "1"));
        assert_eq!(out.unwrap(), "abc");
    }

    #[test]
    fn if_drops_content_when_value_empty() {
        let out = strip_conditionals("a{{IF:X}}b{{ENDIF:X}}c", &ctx(), &VariableRegistry::new());
        assert_eq!(out.unwrap(), "ac");
    }

    #[test]
    fn ifnot_is_the_inverse() {
        let text = "{{IF:X}}A{{ENDIF:X}}{{IFNOT:X}}B{{ENDIF:X}}";
        assert_eq!(
            strip_conditionals(text, &ctx(), &registry_with("X", "yes")).unwrap(),
            "A"
        );
        assert_eq!(
            strip_conditionals(text, &ctx(), &VariableRegistry::new()).unwrap(),
            "B"
        );
    }

    #[test]
    fn empty_custom_value_counts_as_empty() {
        let out = strip_conditionals("{{IF:X}}A{{ENDIF:X}}", &ctx(), &registry_with("X", ""));
        assert_eq!(out.unwrap(), "");
    }

    #[test]
    fn builtin_condition_uses_context() {
        let out = strip_conditionals(
            "{{IF:CATEGORY}}in {{ENDIF:CATEGORY}}root",
            &ctx(),
            &VariableRegistry::new(),
        );
        assert_eq!(out.unwrap(), "root");
    }

    #[test]
    fn content_may_span_lines() {
        let text = "head\n{{IF:X}}\nline one\nline two\n{{ENDIF:X}}\ntail";
        let out = strip_conditionals(text, &ctx(), &registry_with("X", "1")).unwrap();
        assert_eq!(out, "head\n\nline one\nline two\n\ntail");
    }

    #[test]
    fn differently_named_nesting_resolves() {
        let text = "{{IF:A}}a{{IFNOT:B}}b{{ENDIF:B}}{{ENDIF:A}}";
        let out = strip_conditionals(text, &ctx(), &registry_with("A", "1")).unwrap();
        assert_eq!(out, "ab");
    }

    #[test]
    fn same_named_nesting_collapses_shallowly() {
        // Outer opener pairs with the inner closer; the stray outer closer stays.
        let text = "{{IF:A}}x{{IF:A}}y{{ENDIF:A}}z{{ENDIF:A}}";
        let out = strip_conditionals(text, &ctx(), &VariableRegistry::new()).unwrap();
        assert_eq!(out, "z{{ENDIF:A}}");
    }

    #[test]
    fn unmatched_markers_are_left_in_place() {
        let text = "{{IF:A}}x{{ENDIF:B}}";
        let out = strip_conditionals(text, &ctx(), &VariableRegistry::new()).unwrap();
        assert_eq!(out, text);
    }

    #[test]
    fn opener_without_closer_does_not_block_later_blocks() {
        let text = "{{IF:A}}x {{IF:B}}y{{ENDIF:B}}";
        let out = strip_conditionals(text, &ctx(), &registry_with("B", "1")).unwrap();
        assert_eq!(out, "{{IF:A}}x y");
    }

    #[test]
    fn pass_budget_is_enforced() {
        let text = "{{IF:A}}1{{ENDIF:A}}{{IF:A}}2{{ENDIF:A}}{{IF:A}}3{{ENDIF:A}}";
        let err = strip_conditionals_with_limit(text, &ctx(), &VariableRegistry::new(), 2)
            .unwrap_err();
        assert_eq!(err.passes, 2);
        assert_eq!(err.partial, "{{IF:A}}3{{ENDIF:A}}");
    }

    #[test]
    fn find_first_block_reports_offsets() {
        let text = "ab{{IFNOT:X}}cd{{ENDIF:X}}ef";
        let block = find_first_block(text).expect("block");
        assert_eq!(block.name, "X");
        assert!(block.negated);
        assert_eq!(block.start, 2);
        assert_eq!(&text[block.content.clone()], "cd");
        assert_eq!(&text[block.end..], "ef");
    }
}
