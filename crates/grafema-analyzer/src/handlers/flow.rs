//! Return/yield/throw statements.

use super::Visitor;
use grafema_core::fact::{ReturnFact, ThrowFact, YieldFact};
use grafema_core::types::NodeKind;
use tree_sitter::Node;

const EARLY_RETURN_ANCESTORS: &[&str] = &[
    "if_statement",
    "switch_statement",
    "switch_case",
    "switch_default",
    "try_statement",
    "catch_clause",
    "for_statement",
    "for_in_statement",
    "while_statement",
    "do_statement",
];

const FUNCTION_BOUNDARY_KINDS: &[&str] = &[
    "function_declaration",
    "function",
    "function_expression",
    "generator_function",
    "generator_function_declaration",
    "arrow_function",
    "method_definition",
];

fn is_early(node: &Node) -> bool {
    let mut cur = node.parent();
    while let Some(p) = cur {
        if FUNCTION_BOUNDARY_KINDS.contains(&p.kind()) {
            return false;
        }
        if EARLY_RETURN_ANCESTORS.contains(&p.kind()) {
            return true;
        }
        cur = p.parent();
    }
    false
}

pub fn handle_return(v: &mut Visitor, node: &Node) {
    let expression = node.named_child(0);
    let expression_summary = expression.map(|e| v.summarize(&e));
    let is_implicit_undefined = expression.is_none();

    if is_early(node) {
        v.note_early_return();
    }

    let Some(owner_base_id) = v.current_function_base_id() else { return };
    let container_base_id = v.current_owner_base_id();
    let name = expression_summary.clone().unwrap_or_else(|| "undefined".to_string());
    let hints = format!("value:{name}");
    let site = v.site(NodeKind::Expression, "return", node, hints);
    v.bundle.returns.push(ReturnFact {
        site,
        owner_base_id,
        container_base_id,
        expression_summary,
        is_implicit_undefined,
    });
}

pub fn handle_yield(v: &mut Visitor, node: &Node) {
    let is_delegating = node.children(&mut node.walk()).any(|c| c.kind() == "*");
    let expression_summary = node
        .named_children(&mut node.walk())
        .find(|c| c.kind() != "*")
        .map(|e| v.summarize(&e));

    let Some(owner_base_id) = v.current_function_base_id() else { return };
    let container_base_id = v.current_owner_base_id();
    let hints = format!("delegating:{is_delegating}|value:{:?}", expression_summary);
    let site = v.site(NodeKind::Expression, "yield", node, hints);
    v.bundle.yields.push(YieldFact {
        site,
        owner_base_id,
        container_base_id,
        is_delegating,
        expression_summary,
    });
}

pub fn handle_throw(v: &mut Visitor, node: &Node) {
    let Some(argument) = node.named_child(0) else { return };
    let trace = crate::extract::MicroTraceToErrorClass::trace(&argument, v.source, &v.bundle.variables, &v.bundle.assignments);
    let error_class = trace.error_class;
    let is_async = v
        .current_function_base_id()
        .and_then(|id| v.bundle.functions.iter().find(|f| f.site.base_id == id))
        .map(|f| f.is_async)
        .unwrap_or(false);

    v.note_throw(is_async, &error_class);

    let owner_base_id = v.current_function_base_id().unwrap_or_default();
    let container_base_id = v.current_owner_base_id();
    let hints = format!("class:{error_class}|async:{is_async}|trace:{}", trace.trace_path.join(">"));
    let site = v.site(NodeKind::Expression, "throw", node, hints);
    v.bundle.throws.push(ThrowFact { site, owner_base_id, container_base_id, error_class });
}
