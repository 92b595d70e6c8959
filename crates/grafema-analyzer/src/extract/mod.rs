//! Small, focused extractors the visitor's handlers call into. Each one
//! turns a `tree_sitter::Node` into a fragment of a fact — a summary
//! string, an error class, a flattened destructuring — without itself
//! walking unrelated parts of the tree.

mod condition;
mod destructuring;
mod error_class;
mod expression;

pub use condition::{ConditionExpr, ConditionParser, Constraint, ConstraintOp};
pub use destructuring::DestructuringExtractor;
pub use error_class::{MicroTraceToErrorClass, TraceResult};
pub use expression::ExpressionEvaluator;

use tree_sitter::Node;

/// Caps how much source text a summary ever carries; long expressions are
/// truncated rather than stored in full, since summaries exist for
/// diagnostics and hinting, not round-tripping back to source.
pub(crate) const SUMMARY_MAX_LEN: usize = 96;

pub(crate) fn node_text<'a>(node: &Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

pub(crate) fn truncate_summary(text: &str) -> String {
    let flattened: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flattened.chars().count() <= SUMMARY_MAX_LEN {
        flattened
    } else {
        let truncated: String = flattened.chars().take(SUMMARY_MAX_LEN - 1).collect();
        format!("{truncated}\u{2026}")
    }
}

pub(crate) fn child_by_field<'a>(node: &'a Node, field: &str) -> Option<Node<'a>> {
    node.child_by_field_name(field)
}
