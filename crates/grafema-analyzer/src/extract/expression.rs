use super::{node_text, truncate_summary};
use tree_sitter::Node;

/// Renders any expression node down to a short, human-readable summary
/// string used as a fact field and as disambiguation hint material. Never
/// attempts partial evaluation — a summary is source text, not a value.
pub struct ExpressionEvaluator;

impl ExpressionEvaluator {
    pub fn summarize(node: &Node, source: &[u8]) -> String {
        truncate_summary(node_text(node, source))
    }

    /// Whether the expression is itself a function/arrow expression — used
    /// by the call-argument extractor to flag `has_callback_argument`.
    pub fn is_function_like(node: &Node) -> bool {
        matches!(
            node.kind(),
            "function" | "function_expression" | "arrow_function" | "generator_function"
        )
    }

    /// A best-effort identifier name for an expression that names a value
    /// (an identifier, a member expression's final property, `this`).
    pub fn leading_identifier(node: &Node, source: &[u8]) -> String {
        match node.kind() {
            "identifier" | "property_identifier" | "shorthand_property_identifier" => {
                node_text(node, source).to_string()
            }
            "member_expression" => node
                .child_by_field_name("property")
                .map(|p| node_text(&p, source).to_string())
                .unwrap_or_else(|| truncate_summary(node_text(node, source))),
            "this" => "this".to_string(),
            _ => truncate_summary(node_text(node, source)),
        }
    }
}
