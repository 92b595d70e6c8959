//! RETURNS/yields/THROWS/REJECTS edges, materialising an EXPRESSION node
//! per fact so the operand summary has somewhere to live.

use super::core::resolve_name_to_binding;
use super::Ctx;
use grafema_core::node::GraphNode;
use grafema_core::types::{EdgeKind, NodeKind};

pub(super) fn build(ctx: &mut Ctx) {
    build_returns(ctx);
    build_yields(ctx);
    build_throws(ctx);
    build_rejects(ctx);
}

fn build_returns(ctx: &mut Ctx) {
    for r in &ctx.bundle.returns {
        let id = r.site.base_id.clone();
        let node = GraphNode::new(id.clone(), NodeKind::Expression, "return")
            .with_file(r.site.file.clone())
            .with_location(r.site.location)
            .with_attr("expression_summary", r.expression_summary.clone().unwrap_or_default())
            .with_attr("is_implicit_undefined", r.is_implicit_undefined);
        ctx.push_node(node);

        let container = ctx.resolve(&r.container_base_id);
        ctx.contains(&container, &id);

        if r.owner_base_id.is_empty() {
            continue;
        }
        let owner = ctx.resolve(&r.owner_base_id);
        ctx.push_edge(EdgeKind::Returns, owner, id.clone());

        if let Some(summary) = &r.expression_summary {
            if let Some(source) = resolve_name_to_binding(ctx, summary) {
                ctx.push_edge(EdgeKind::DerivesFrom, id, source);
            }
        }
    }
}

fn build_yields(ctx: &mut Ctx) {
    for y in &ctx.bundle.yields {
        let id = y.site.base_id.clone();
        let node = GraphNode::new(id.clone(), NodeKind::Expression, "yield")
            .with_file(y.site.file.clone())
            .with_location(y.site.location)
            .with_attr("expression_summary", y.expression_summary.clone().unwrap_or_default())
            .with_attr("is_delegating", y.is_delegating);
        ctx.push_node(node);

        let container = ctx.resolve(&y.container_base_id);
        ctx.contains(&container, &id);

        if y.owner_base_id.is_empty() {
            continue;
        }
        let owner = ctx.resolve(&y.owner_base_id);
        ctx.push_edge(EdgeKind::Returns, owner, id.clone());

        if let Some(summary) = &y.expression_summary {
            if let Some(source) = resolve_name_to_binding(ctx, summary) {
                ctx.push_edge(EdgeKind::DerivesFrom, id, source);
            }
        }
    }
}

fn build_throws(ctx: &mut Ctx) {
    for t in &ctx.bundle.throws {
        let id = t.site.base_id.clone();
        let node = GraphNode::new(id.clone(), NodeKind::Expression, "throw")
            .with_file(t.site.file.clone())
            .with_location(t.site.location)
            .with_attr("error_class", t.error_class.clone());
        ctx.push_node(node);

        let container = ctx.resolve(&t.container_base_id);
        ctx.contains(&container, &id);

        if t.owner_base_id.is_empty() {
            continue;
        }
        let owner = ctx.resolve(&t.owner_base_id);
        ctx.push_edge(EdgeKind::Throws, owner, id);
    }
}

fn build_rejects(ctx: &mut Ctx) {
    for r in &ctx.bundle.rejects {
        let id = r.site.base_id.clone();
        let node = GraphNode::new(id.clone(), NodeKind::Expression, "reject")
            .with_file(r.site.file.clone())
            .with_location(r.site.location)
            .with_attr("error_class", r.error_class.clone());
        ctx.push_node(node);

        let container = ctx.resolve(&r.container_base_id);
        ctx.contains(&container, &id);

        if r.owner_base_id.is_empty() {
            continue;
        }
        let owner = ctx.resolve(&r.owner_base_id);
        ctx.push_edge(EdgeKind::Rejects, owner, id);
    }
}
