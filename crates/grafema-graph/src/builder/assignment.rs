//! ASSIGNED_FROM / DERIVES_FROM for every variable-assignment fact,
//! dispatched by a best-effort textual classification of the right-hand
//! side.

use super::core::{find_function, resolve_name_to_binding};
use super::Ctx;
use grafema_core::node::GraphNode;
use grafema_core::types::{EdgeKind, NodeKind};

fn is_literal_like(summary: &str) -> bool {
    let s = summary.trim();
    s.starts_with('"')
        || s.starts_with('\'')
        || s.starts_with('`')
        || s == "true"
        || s == "false"
        || s == "null"
        || s == "undefined"
        || s.parse::<f64>().is_ok()
}

fn callee_name(summary: &str) -> Option<&str> {
    let paren = summary.find('(')?;
    let head = &summary[..paren];
    if head.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$' || c == '.') {
        head.rsplit('.').next()
    } else {
        None
    }
}

/// Resolves `target_name` against the bundle's own VARIABLE facts, the
/// same by-name best effort `resolve_name_to_binding` uses for property
/// access receivers.
fn resolve_target(ctx: &Ctx, target_name: &str) -> Option<String> {
    resolve_name_to_binding(ctx, target_name)
}

fn is_plain_identifier(text: &str) -> bool {
    !text.is_empty()
        && text.chars().enumerate().all(|(i, c)| {
            if i == 0 { c.is_alphabetic() || c == '_' || c == '$' } else { c.is_alphanumeric() || c == '_' || c == '$' }
        })
}

pub(super) fn build(ctx: &mut Ctx) {
    build_assignments(ctx);
    build_destructuring(ctx);
}

/// Every destructured `VariableFact` leaf (`const { x } = obj;`,
/// `const [a, b] = pair;`, nested/defaulted patterns) materialises an
/// `EXPRESSION` node keyed to its source path — `obj.x`, `pair[0]` — and
/// an `ASSIGNED_FROM` edge from the leaf VARIABLE/CONSTANT to it, per
/// §4.5's destructuring-tracker contract. When the pattern's right-hand
/// side is itself a plain identifier (the common case), the expression
/// also gets a `DERIVES_FROM` edge into that root binding; anything more
/// complex (a call, a member expression) has no single resolvable root
/// node, so the chain stops at the EXPRESSION per the builder's
/// never-invent-a-destination rule.
fn build_destructuring(ctx: &mut Ctx) {
    for v in &ctx.bundle.variables {
        let Some(path) = &v.destructured_from else { continue };
        let var_id = ctx.resolve(&v.site.base_id);
        let root = v.initializer_summary.as_deref().unwrap_or("").trim();
        let expr_name = if root.is_empty() { path.clone() } else { format!("{root}.{path}") };
        let expr_id = format!("{var_id}->EXPRESSION->{path}");

        let node = GraphNode::new(expr_id.clone(), NodeKind::Expression, expr_name)
            .with_file(v.site.file.clone())
            .with_location(v.site.location)
            .with_attr("source_path", path.clone())
            .with_attr("root_summary", root.to_string());
        ctx.push_node(node);

        ctx.push_edge(EdgeKind::AssignedFrom, var_id, expr_id.clone());

        if is_plain_identifier(root) {
            if let Some(root_id) = resolve_name_to_binding(ctx, root) {
                ctx.push_edge(EdgeKind::DerivesFrom, expr_id, root_id);
            }
        }
    }
}

fn build_assignments(ctx: &mut Ctx) {
    for a in &ctx.bundle.assignments {
        let Some(target_id) = resolve_target(ctx, &a.target_name) else {
            continue;
        };

        if let Some(source_id) = resolve_name_to_binding(ctx, &a.source_summary) {
            ctx.push_edge(EdgeKind::AssignedFrom, target_id, source_id);
            continue;
        }

        if is_literal_like(&a.source_summary) {
            // A literal right-hand side has no separate graph node to
            // derive from; the assignment's own `source_summary` attr
            // already records the literal text.
            continue;
        }

        if a.source_summary.trim_start().starts_with("new ") {
            let ctor_name = a.source_summary.trim_start().trim_start_matches("new ").split(['(', ' ']).next().unwrap_or("");
            if let Some(ctor) = ctx.bundle.constructor_calls.iter().find(|c| c.class_name == ctor_name) {
                let ctor_id = ctx.resolve(&ctor.site.base_id);
                ctx.push_edge(EdgeKind::DerivesFrom, target_id, ctor_id);
                continue;
            }
        }

        if let Some(name) = callee_name(&a.source_summary) {
            if let Some(call) = ctx.bundle.calls.iter().find(|c| c.callee_name == name) {
                let call_id = ctx.resolve(&call.site.base_id);
                ctx.push_edge(EdgeKind::DerivesFrom, target_id, call_id);
                continue;
            }
            if let Some(method_call) = ctx.bundle.method_calls.iter().find(|m| m.method_name == name) {
                let id = ctx.resolve(&method_call.site.base_id);
                ctx.push_edge(EdgeKind::DerivesFrom, target_id, id);
                continue;
            }
            if let Some(func) = find_function(ctx.bundle, name) {
                let id = ctx.resolve(&func.site.base_id);
                ctx.push_edge(EdgeKind::DerivesFrom, target_id, id);
                continue;
            }
        }
        // Anything else (compound/binary/conditional expressions) has no
        // single resolvable source node; the assignment's `source_summary`
        // attribute already carries what was on the right-hand side.
    }
}
