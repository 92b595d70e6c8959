//! Try/catch/finally, if/else branches, switch cases, loops, logical
//! operators and `delete`.

use super::Visitor;
use grafema_core::fact::{BranchFact, CaseFact, LoopFact, LoopKind, MiscEdgeFact, TryCatchFact, WithStatementFact};
use grafema_core::identity::ScopeKind;
use grafema_core::types::{EdgeKind, NodeKind};
use tree_sitter::Node;

pub fn handle_try(v: &mut Visitor, node: &Node) -> String {
    let owner_base_id = v.current_function_base_id().unwrap_or_default();
    let container_base_id = v.current_owner_base_id();
    v.note_try_catch();

    let body = node.child_by_field_name("body").unwrap_or(*node);
    let try_hints = format!("col:{}", body.start_position().column);
    let try_site = v.site(NodeKind::TryBlock, "try", &body, try_hints);
    let base_id = try_site.base_id.clone();

    let handler = node.child_by_field_name("handler");
    let (catch_site, catch_param) = if let Some(catch) = handler {
        let param = catch
            .child_by_field_name("parameter")
            .map(|p| v.node_text(&p));
        let hints = format!("col:{}", catch.start_position().column);
        (Some(v.site(NodeKind::CatchBlock, "catch", &catch, hints)), param)
    } else {
        (None, None)
    };

    let finalizer = node.child_by_field_name("finalizer");
    let finally_site = finalizer.map(|f| {
        let hints = format!("col:{}", f.start_position().column);
        v.site(NodeKind::FinallyBlock, "finally", &f, hints)
    });

    if let Some(catch) = &catch_site {
        v.bundle.misc_edges.push(MiscEdgeFact {
            kind: EdgeKind::Contains,
            src_base_id: base_id.clone(),
            dst_base_id: catch.base_id.clone(),
            metadata: Default::default(),
        });
    }
    if let Some(finally) = &finally_site {
        v.bundle.misc_edges.push(MiscEdgeFact {
            kind: EdgeKind::Contains,
            src_base_id: base_id.clone(),
            dst_base_id: finally.base_id.clone(),
            metadata: Default::default(),
        });
    }

    v.bundle.try_catches.push(TryCatchFact {
        owner_base_id,
        container_base_id,
        try_site,
        catch_site,
        catch_param,
        finally_site,
    });

    v.scope.enter_counted_scope(ScopeKind::Try);
    base_id
}

pub fn handle_branch(v: &mut Visitor, node: &Node) -> String {
    let owner_base_id = v.current_function_base_id().unwrap_or_default();
    let container_base_id = v.current_owner_base_id();
    v.note_branch();

    let condition_summary = crate::extract::ConditionParser::summarize(node, v.source).unwrap_or_default();
    let has_else = node.child_by_field_name("alternative").is_some();

    let hints = format!("col:{}", node.start_position().column);
    let site = v.site(NodeKind::Branch, "if", node, hints);
    let base_id = site.base_id.clone();
    v.bundle.branches.push(BranchFact {
        site,
        owner_base_id,
        container_base_id,
        condition_summary,
        has_else,
    });

    v.scope.enter_counted_scope(ScopeKind::IfStatement);
    base_id
}

pub fn handle_case(v: &mut Visitor, node: &Node) -> String {
    let owner_base_id = v.current_function_base_id().unwrap_or_default();
    let container_base_id = v.current_owner_base_id();

    let is_default = node.kind() == "switch_default";
    let test_summary = node.child_by_field_name("value").map(|v2| v.summarize(&v2));
    let falls_through = !node
        .named_children(&mut node.walk())
        .any(|c| c.kind() == "break_statement");

    let name = if is_default { "default".to_string() } else { test_summary.clone().unwrap_or_default() };
    let hints = format!("col:{}", node.start_position().column);
    let site = v.site(NodeKind::Case, &name, node, hints);
    let base_id = site.base_id.clone();
    v.bundle.cases.push(CaseFact {
        site,
        owner_base_id,
        container_base_id,
        test_summary,
        is_default,
        falls_through,
    });

    v.scope.enter_counted_scope(ScopeKind::Case);
    base_id
}

pub fn handle_loop(v: &mut Visitor, node: &Node) -> String {
    let owner_base_id = v.current_function_base_id().unwrap_or_default();
    let container_base_id = v.current_owner_base_id();
    v.note_loop();

    let (kind, scope_kind) = match node.kind() {
        "while_statement" => (LoopKind::While, ScopeKind::While),
        "do_statement" => (LoopKind::DoWhile, ScopeKind::DoWhile),
        "for_in_statement" => {
            let is_of = node
                .children(&mut node.walk())
                .any(|c| c.kind() == "of" || c.utf8_text(v.source) == Ok("of"));
            (if is_of { LoopKind::ForOf } else { LoopKind::ForIn }, ScopeKind::For)
        }
        _ => (LoopKind::For, ScopeKind::For),
    };

    let condition_summary = crate::extract::ConditionParser::summarize(node, v.source);
    let hints = format!("col:{}", node.start_position().column);
    let site = v.site(NodeKind::Scope, "loop", node, hints);
    let base_id = site.base_id.clone();
    v.bundle.loops.push(LoopFact { site, owner_base_id, container_base_id, kind, condition_summary });

    v.scope.enter_counted_scope(scope_kind);
    base_id
}

pub fn handle_binary(v: &mut Visitor, node: &Node) {
    let operator = node
        .child_by_field_name("operator")
        .map(|o| v.node_text(&o))
        .unwrap_or_default();
    if operator == "&&" || operator == "||" {
        v.note_logical_op();
    }
}

/// Legacy `with (expr) { ... }` — resolved against whatever `expr`
/// summarizes to (a binding, or `this`) by the misc edge pass, same as
/// `CALLS_ON`'s receiver resolution.
pub fn handle_with_statement(v: &mut Visitor, node: &Node) {
    let Some(object) = node.child_by_field_name("object") else { return };
    let target_summary = v.summarize(&object);
    let container_base_id = v.current_owner_base_id();
    v.bundle.with_statements.push(WithStatementFact { container_base_id, target_summary });
}

pub fn handle_delete(v: &mut Visitor, node: &Node) {
    let Some(argument) = node.child_by_field_name("argument") else { return };
    let target_summary = v.summarize(&argument);
    let owner = v.current_function_base_id().unwrap_or_default();
    let hints = format!("target:{target_summary}");
    let site = v.site(NodeKind::Expression, "delete", node, hints);
    v.bundle.misc_edges.push(MiscEdgeFact {
        kind: EdgeKind::Deletes,
        src_base_id: owner,
        dst_base_id: site.base_id,
        metadata: Default::default(),
    });
}
