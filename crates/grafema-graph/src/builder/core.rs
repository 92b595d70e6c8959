//! FUNCTION/SCOPE/VARIABLE/CALL/METHOD_CALL/PROPERTY_ACCESS/LITERAL/
//! OBJECT_LITERAL/ARRAY_LITERAL plus the declaration-shaped node kinds
//! (CLASS/INTERFACE/TYPE/ENUM/DECORATOR/IMPORT/EXPORT/EVENT_LISTENER/
//! TRY_BLOCK/CATCH_BLOCK/FINALLY_BLOCK/BRANCH/CASE/loop SCOPE/PARAMETER)
//! and the structural CONTAINS/DECLARES/CALLS/HAS_SCOPE/USES/READS_FROM
//! edges that don't need a second pass to resolve.

use super::Ctx;
use grafema_core::fact::{ClassFact, FunctionFact, InterfaceFact};
use grafema_core::node::GraphNode;
use grafema_core::types::{EdgeKind, NodeKind};

pub(super) fn enclosing_class_name(scope: &[String]) -> Option<&str> {
    scope.iter().rev().find_map(|seg| {
        seg.strip_prefix("CLASS[").and_then(|rest| rest.strip_suffix(']'))
    })
}

pub(super) fn find_class<'a>(bundle: &'a grafema_core::fact::FactBundle, name: &str) -> Option<&'a ClassFact> {
    bundle.classes.iter().find(|c| c.name == name)
}

pub(super) fn find_interface<'a>(bundle: &'a grafema_core::fact::FactBundle, name: &str) -> Option<&'a InterfaceFact> {
    bundle.interfaces.iter().find(|i| i.name == name)
}

pub(super) fn find_function<'a>(bundle: &'a grafema_core::fact::FactBundle, name: &str) -> Option<&'a FunctionFact> {
    bundle.functions.iter().find(|f| f.name == name)
}

/// Resolves a bare identifier read/write target to a VARIABLE or
/// PARAMETER fact's final id, by name only — intra-module best effort,
/// matching the "exact (file, line, column, name) triple" cross-reference
/// rule loosely since positional matching across these fact kinds isn't
/// tracked.
pub(super) fn resolve_name_to_binding(ctx: &Ctx, name: &str) -> Option<String> {
    if let Some(v) = ctx.bundle.variables.iter().find(|v| v.name == name) {
        return Some(ctx.resolve(&v.site.base_id));
    }
    if let Some(p) = ctx.bundle.parameters.iter().find(|p| p.name == name) {
        return Some(ctx.resolve(&p.site.base_id));
    }
    None
}

pub(super) fn build(ctx: &mut Ctx) {
    build_functions(ctx);
    build_parameters(ctx);
    build_variables(ctx);
    build_calls(ctx);
    build_method_calls(ctx);
    build_constructor_calls(ctx);
    build_property_accesses(ctx);
    build_literals(ctx);
    build_object_literals(ctx);
    build_array_literals(ctx);
    build_classes(ctx);
    build_interfaces(ctx);
    build_type_aliases(ctx);
    build_enums(ctx);
    build_decorators(ctx);
    build_imports(ctx);
    build_exports(ctx);
    build_event_listeners(ctx);
    build_try_catches(ctx);
    build_branches(ctx);
    build_cases(ctx);
    build_loops(ctx);
}

fn build_functions(ctx: &mut Ctx) {
    for f in &ctx.bundle.functions {
        let kind = if f.is_method { NodeKind::Method } else { NodeKind::Function };
        let id = f.site.base_id.clone();
        let node = GraphNode::new(id.clone(), kind, f.name.clone())
            .with_file(f.site.file.clone())
            .with_location(f.site.location)
            .with_attr("is_async", f.is_async)
            .with_attr("is_generator", f.is_generator)
            .with_attr("is_arrow", f.is_arrow)
            .with_attr("is_method", f.is_method)
            .with_attr("param_count", f.param_count as u64)
            .with_attr("cyclomatic_complexity", f.cyclomatic_complexity)
            .with_attr("has_branches", f.control_flow.has_branches)
            .with_attr("has_loops", f.control_flow.has_loops)
            .with_attr("has_try_catch", f.control_flow.has_try_catch)
            .with_attr("has_early_return", f.control_flow.has_early_return)
            .with_attr("has_throw", f.control_flow.has_throw)
            .with_attr("can_reject", f.control_flow.can_reject)
            .with_attr("has_async_throw", f.control_flow.has_async_throw)
            .with_attr(
                "rejected_builtin_errors",
                serde_json::to_value(&f.control_flow.rejected_builtin_errors).unwrap_or_default(),
            )
            .with_attr(
                "thrown_builtin_errors",
                serde_json::to_value(&f.control_flow.thrown_builtin_errors).unwrap_or_default(),
            )
            .with_attr(
                "invokes_param_indexes",
                serde_json::to_value(&f.control_flow.invokes_param_indexes).unwrap_or_default(),
            );
        ctx.push_node(node);
        let owner = ctx.resolve(&f.owner_base_id);
        ctx.contains(&owner, &id);
        ctx.declares(&owner, &id);
    }
}

fn build_parameters(ctx: &mut Ctx) {
    for p in &ctx.bundle.parameters {
        let id = p.site.base_id.clone();
        let node = GraphNode::new(id.clone(), NodeKind::Parameter, p.name.clone())
            .with_file(p.site.file.clone())
            .with_location(p.site.location)
            .with_attr("position", p.position as u64)
            .with_attr("has_default", p.has_default)
            .with_attr("is_rest", p.is_rest)
            .with_attr("destructured_from", p.destructured_from.clone().unwrap_or_default())
            .with_attr("default_value_summary", p.default_value_summary.clone().unwrap_or_default());
        ctx.push_node(node);
        let owner = ctx.resolve(&p.owner_base_id);
        ctx.contains(&owner, &id);
    }
}

fn build_variables(ctx: &mut Ctx) {
    for v in &ctx.bundle.variables {
        let kind =
            if v.decl_kind == grafema_core::fact::VariableDeclarationKind::Const { NodeKind::Constant } else { NodeKind::Variable };
        let id = v.site.base_id.clone();
        let node = GraphNode::new(id.clone(), kind, v.name.clone())
            .with_file(v.site.file.clone())
            .with_location(v.site.location)
            .with_attr("initializer_summary", v.initializer_summary.clone().unwrap_or_default())
            .with_attr("destructured_from", v.destructured_from.clone().unwrap_or_default());
        ctx.push_node(node);
        let owner = ctx.resolve(&v.owner_base_id);
        ctx.contains(&owner, &id);
        ctx.declares(&owner, &id);
    }
}

/// Tracks anonymous/arrow callbacks already claimed by a `HAS_CALLBACK`
/// edge so two calls in the same scope don't both point at the same
/// nested function.
fn build_calls(ctx: &mut Ctx) {
    let mut claimed: Vec<String> = Vec::new();
    for c in &ctx.bundle.calls {
        let id = c.site.base_id.clone();
        let node = GraphNode::new(id.clone(), NodeKind::Call, c.callee_name.clone())
            .with_file(c.site.file.clone())
            .with_location(c.site.location)
            .with_attr("argument_count", c.argument_count as u64)
            .with_attr("is_awaited", c.is_awaited)
            .with_attr("has_callback_argument", c.has_callback_argument);
        ctx.push_node(node);
        let owner = ctx.resolve(&c.owner_base_id);
        ctx.contains(&owner, &id);

        if let Some(target) = find_function(ctx.bundle, &c.callee_name) {
            let target_id = ctx.resolve(&target.site.base_id);
            ctx.push_edge(EdgeKind::Calls, id.clone(), target_id);
        }

        if c.has_callback_argument {
            if let Some(callback) = ctx.bundle.functions.iter().find(|f| {
                f.name.is_empty()
                    && ctx.resolve(&f.owner_base_id) == owner
                    && !claimed.contains(&f.site.base_id)
                    && (f.site.location.line, f.site.location.column) >= (c.site.location.line, c.site.location.column)
            }) {
                claimed.push(callback.site.base_id.clone());
                ctx.push_edge(EdgeKind::HasCallback, id.clone(), callback.site.base_id.clone());
            }
        }
    }
}

fn build_method_calls(ctx: &mut Ctx) {
    for m in &ctx.bundle.method_calls {
        let id = m.site.base_id.clone();
        let node = GraphNode::new(id.clone(), NodeKind::MethodCall, m.method_name.clone())
            .with_file(m.site.file.clone())
            .with_location(m.site.location)
            .with_attr("receiver_summary", m.receiver_summary.clone())
            .with_attr("argument_count", m.argument_count as u64)
            .with_attr("is_chained", m.is_chained)
            .with_attr("is_awaited", m.is_awaited);
        ctx.push_node(node);
        let owner = ctx.resolve(&m.owner_base_id);
        ctx.contains(&owner, &id);
    }
}

fn build_constructor_calls(ctx: &mut Ctx) {
    for c in &ctx.bundle.constructor_calls {
        let id = c.site.base_id.clone();
        let node = GraphNode::new(id.clone(), NodeKind::ConstructorCall, c.class_name.clone())
            .with_file(c.site.file.clone())
            .with_location(c.site.location)
            .with_attr("argument_count", c.argument_count as u64);
        ctx.push_node(node);
        let owner = ctx.resolve(&c.owner_base_id);
        ctx.contains(&owner, &id);
    }
}

/// `READS_FROM` is the access-site edge (PROPERTY_ACCESS -> its resolved
/// receiver); `USES` is the coarser owning-function edge enrichment walks
/// to reach a CLASS without caring which specific access triggered it.
fn build_property_accesses(ctx: &mut Ctx) {
    for p in &ctx.bundle.property_accesses {
        let id = p.site.base_id.clone();
        let node = GraphNode::new(id.clone(), NodeKind::PropertyAccess, p.property_name.clone())
            .with_file(p.site.file.clone())
            .with_location(p.site.location)
            .with_attr("receiver_summary", p.receiver_summary.clone())
            .with_attr("is_computed", p.is_computed)
            .with_attr("is_optional_chained", p.is_optional_chained);
        ctx.push_node(node);
        let owner = ctx.resolve(&p.owner_base_id);
        ctx.contains(&owner, &id);

        if p.receiver_summary == "this" {
            if let Some(class_name) = enclosing_class_name(&p.site.scope) {
                if let Some(class) = find_class(ctx.bundle, class_name) {
                    let class_id = ctx.resolve(&class.site.base_id);
                    ctx.push_edge(EdgeKind::ReadsFrom, id.clone(), class_id.clone());
                    ctx.push_edge(EdgeKind::Uses, owner, class_id);
                    continue;
                }
            }
        }
        if let Some(target) = resolve_name_to_binding(ctx, &p.receiver_summary) {
            ctx.push_edge(EdgeKind::ReadsFrom, id, target.clone());
            ctx.push_edge(EdgeKind::Uses, owner, target);
        }
    }
}

fn build_literals(ctx: &mut Ctx) {
    for l in &ctx.bundle.literals {
        let id = l.site.base_id.clone();
        let node = GraphNode::new(id.clone(), NodeKind::Literal, l.site.scope.join("/"))
            .with_file(l.site.file.clone())
            .with_location(l.site.location)
            .with_attr("kind", serde_json::to_value(l.kind).unwrap_or_default())
            .with_attr("raw_preview", l.raw_preview.clone());
        ctx.push_node(node);
        let owner = ctx.resolve(&l.owner_base_id);
        ctx.contains(&owner, &id);
    }
}

fn build_object_literals(ctx: &mut Ctx) {
    for o in &ctx.bundle.object_literals {
        let id = o.site.base_id.clone();
        let node = GraphNode::new(id.clone(), NodeKind::ObjectLiteral, o.site.scope.join("/"))
            .with_file(o.site.file.clone())
            .with_location(o.site.location)
            .with_attr("property_names", serde_json::to_value(&o.property_names).unwrap_or_default())
            .with_attr("has_spread", o.has_spread);
        ctx.push_node(node);
        let owner = ctx.resolve(&o.owner_base_id);
        ctx.contains(&owner, &id);
    }
}

fn build_array_literals(ctx: &mut Ctx) {
    for a in &ctx.bundle.array_literals {
        let id = a.site.base_id.clone();
        let node = GraphNode::new(id.clone(), NodeKind::ArrayLiteral, a.site.scope.join("/"))
            .with_file(a.site.file.clone())
            .with_location(a.site.location)
            .with_attr("element_count", a.element_count as u64)
            .with_attr("has_spread", a.has_spread);
        ctx.push_node(node);
        let owner = ctx.resolve(&a.owner_base_id);
        ctx.contains(&owner, &id);
    }
}

fn build_classes(ctx: &mut Ctx) {
    for c in &ctx.bundle.classes {
        let id = c.site.base_id.clone();
        let node = GraphNode::new(id.clone(), NodeKind::Class, c.name.clone())
            .with_file(c.site.file.clone())
            .with_location(c.site.location)
            .with_attr("is_abstract", c.is_abstract)
            .with_attr("interface_names", serde_json::to_value(&c.interface_names).unwrap_or_default());
        ctx.push_node(node);
        let owner = ctx.resolve(&c.owner_base_id);
        ctx.contains(&owner, &id);
        ctx.declares(&owner, &id);

        if let Some(super_name) = &c.superclass_name {
            if let Some(parent) = find_class(ctx.bundle, super_name) {
                let parent_id = ctx.resolve(&parent.site.base_id);
                ctx.push_edge(EdgeKind::Extends, id.clone(), parent_id);
            } else {
                ctx.warn_unresolved(EdgeKind::Extends, &c.site.file, super_name);
            }
        }
        for iface_name in &c.interface_names {
            if let Some(iface) = find_interface(ctx.bundle, iface_name) {
                let iface_id = ctx.resolve(&iface.site.base_id);
                ctx.push_edge(EdgeKind::Implements, id.clone(), iface_id);
            } else {
                ctx.warn_unresolved(EdgeKind::Implements, &c.site.file, iface_name);
            }
        }
    }
}

fn build_interfaces(ctx: &mut Ctx) {
    for i in &ctx.bundle.interfaces {
        let id = i.site.base_id.clone();
        let node = GraphNode::new(id.clone(), NodeKind::Interface, i.name.clone())
            .with_file(i.site.file.clone())
            .with_location(i.site.location);
        ctx.push_node(node);
        let owner = ctx.resolve(&i.owner_base_id);
        ctx.contains(&owner, &id);
        ctx.declares(&owner, &id);

        for parent_name in &i.extends_names {
            if let Some(parent) = find_interface(ctx.bundle, parent_name) {
                let parent_id = ctx.resolve(&parent.site.base_id);
                ctx.push_edge(EdgeKind::Extends, id.clone(), parent_id);
            } else {
                ctx.warn_unresolved(EdgeKind::Extends, &i.site.file, parent_name);
            }
        }
    }
}

fn build_type_aliases(ctx: &mut Ctx) {
    for t in &ctx.bundle.type_aliases {
        let id = t.site.base_id.clone();
        let node = GraphNode::new(id.clone(), NodeKind::Type, t.name.clone())
            .with_file(t.site.file.clone())
            .with_location(t.site.location)
            .with_attr("is_union", t.is_union)
            .with_attr("is_intersection", t.is_intersection)
            .with_attr("member_summaries", serde_json::to_value(&t.member_summaries).unwrap_or_default());
        ctx.push_node(node);
        let owner = ctx.resolve(&t.owner_base_id);
        ctx.contains(&owner, &id);
        ctx.declares(&owner, &id);
    }
}

fn build_enums(ctx: &mut Ctx) {
    for e in &ctx.bundle.enums {
        let id = e.site.base_id.clone();
        let node = GraphNode::new(id.clone(), NodeKind::Enum, e.name.clone())
            .with_file(e.site.file.clone())
            .with_location(e.site.location)
            .with_attr("member_names", serde_json::to_value(&e.member_names).unwrap_or_default())
            .with_attr("is_const", e.is_const);
        ctx.push_node(node);
        let owner = ctx.resolve(&e.owner_base_id);
        ctx.contains(&owner, &id);
        ctx.declares(&owner, &id);
    }
}

fn build_decorators(ctx: &mut Ctx) {
    for d in &ctx.bundle.decorators {
        let id = d.site.base_id.clone();
        let node = GraphNode::new(id.clone(), NodeKind::Decorator, d.name.clone())
            .with_file(d.site.file.clone())
            .with_location(d.site.location);
        ctx.push_node(node);
        if !d.target_base_id.is_empty() {
            let target = ctx.resolve(&d.target_base_id);
            ctx.contains(&target, &id);
        }
    }
}

fn build_imports(ctx: &mut Ctx) {
    for i in &ctx.bundle.imports {
        let id = i.site.base_id.clone();
        let node = GraphNode::new(id.clone(), NodeKind::Import, i.specifier.clone())
            .with_file(i.site.file.clone())
            .with_location(i.site.location)
            .with_attr("imported_names", serde_json::to_value(&i.imported_names).unwrap_or_default())
            .with_attr("is_default", i.is_default)
            .with_attr("is_namespace", i.is_namespace)
            .with_attr("is_type_only", i.is_type_only);
        ctx.push_node(node);
        let owner = ctx.resolve(&i.owner_base_id);
        ctx.contains(&owner, &id);
        ctx.declares(&owner, &id);
    }
}

fn build_exports(ctx: &mut Ctx) {
    for e in &ctx.bundle.exports {
        let id = e.site.base_id.clone();
        let node = GraphNode::new(id.clone(), NodeKind::Export, e.exported_name.clone())
            .with_file(e.site.file.clone())
            .with_location(e.site.location)
            .with_attr("is_default", e.is_default)
            .with_attr("is_re_export", e.is_re_export)
            .with_attr("source_specifier", e.source_specifier.clone().unwrap_or_default());
        ctx.push_node(node);
        let owner = ctx.resolve(&e.owner_base_id);
        ctx.contains(&owner, &id);
        ctx.declares(&owner, &id);
    }
}

fn build_event_listeners(ctx: &mut Ctx) {
    for e in &ctx.bundle.event_listeners {
        let id = e.site.base_id.clone();
        let node = GraphNode::new(id.clone(), NodeKind::EventListener, e.event_name.clone())
            .with_file(e.site.file.clone())
            .with_location(e.site.location)
            .with_attr("target_summary", e.target_summary.clone());
        ctx.push_node(node);
        let owner = ctx.resolve(&e.owner_base_id);
        ctx.contains(&owner, &id);
    }
}

fn build_try_catches(ctx: &mut Ctx) {
    for t in &ctx.bundle.try_catches {
        let try_id = t.try_site.base_id.clone();
        ctx.push_node(
            GraphNode::new(try_id.clone(), NodeKind::TryBlock, "try")
                .with_file(t.try_site.file.clone())
                .with_location(t.try_site.location),
        );
        let container = ctx.resolve(&t.container_base_id);
        ctx.contains(&container, &try_id);

        if let Some(catch) = &t.catch_site {
            let catch_id = catch.base_id.clone();
            ctx.push_node(
                GraphNode::new(catch_id.clone(), NodeKind::CatchBlock, "catch")
                    .with_file(catch.file.clone())
                    .with_location(catch.location)
                    .with_attr("catch_param", t.catch_param.clone().unwrap_or_default()),
            );
            ctx.push_edge(EdgeKind::CatchesFrom, catch_id, try_id.clone());
        }
        if let Some(finally) = &t.finally_site {
            ctx.push_node(
                GraphNode::new(finally.base_id.clone(), NodeKind::FinallyBlock, "finally")
                    .with_file(finally.file.clone())
                    .with_location(finally.location),
            );
        }
    }
}

fn build_branches(ctx: &mut Ctx) {
    for b in &ctx.bundle.branches {
        let id = b.site.base_id.clone();
        let node = GraphNode::new(id.clone(), NodeKind::Branch, "if")
            .with_file(b.site.file.clone())
            .with_location(b.site.location)
            .with_attr("condition_summary", b.condition_summary.clone())
            .with_attr("has_else", b.has_else);
        ctx.push_node(node);
        let container = ctx.resolve(&b.container_base_id);
        ctx.contains(&container, &id);
    }
}

fn build_cases(ctx: &mut Ctx) {
    for c in &ctx.bundle.cases {
        let id = c.site.base_id.clone();
        let node = GraphNode::new(id.clone(), NodeKind::Case, c.site.scope.join("/"))
            .with_file(c.site.file.clone())
            .with_location(c.site.location)
            .with_attr("test_summary", c.test_summary.clone().unwrap_or_default())
            .with_attr("is_default", c.is_default)
            .with_attr("falls_through", c.falls_through);
        ctx.push_node(node);
        let container = ctx.resolve(&c.container_base_id);
        ctx.contains(&container, &id);
    }
}

/// `CONTAINS` follows the immediate lexical container (another loop or a
/// branch, say); `HAS_SCOPE` always points back to the enclosing
/// function/method, per the connectivity invariant that every SCOPE has a
/// direct path from its owning FUNCTION.
fn build_loops(ctx: &mut Ctx) {
    for l in &ctx.bundle.loops {
        let id = l.site.base_id.clone();
        let node = GraphNode::new(id.clone(), NodeKind::Scope, "loop")
            .with_file(l.site.file.clone())
            .with_location(l.site.location)
            .with_attr("loop_kind", serde_json::to_value(l.kind).unwrap_or_default())
            .with_attr("condition_summary", l.condition_summary.clone().unwrap_or_default());
        ctx.push_node(node);
        let container = ctx.resolve(&l.container_base_id);
        ctx.contains(&container, &id);
        let owner = ctx.resolve(&l.owner_base_id);
        ctx.push_edge(EdgeKind::HasScope, owner, id);
    }
}
