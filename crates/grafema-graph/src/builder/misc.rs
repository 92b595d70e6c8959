//! The long tail: a generic replay of every raw `MiscEdgeFact` a handler
//! staged directly, plus the handful of edge kinds that need a second
//! look at sibling facts to resolve.

use super::core::{find_class, find_function, find_interface, resolve_name_to_binding};
use super::Ctx;
use grafema_core::types::EdgeKind;

pub(super) fn build(ctx: &mut Ctx) {
    replay_misc_edges(ctx);
    build_awaits(ctx);
    build_calls_on(ctx);
    build_chains_from(ctx);
    build_listens_to(ctx);
    build_type_alias_members(ctx);
    build_defaults_to(ctx);
    build_overrides(ctx);
    build_overloads(ctx);
    build_invokes(ctx);
    build_binds_this_to(ctx);
    build_type_annotations(ctx);
    build_type_constraints(ctx);
    build_extends_scope_with(ctx);
}

/// Every `MiscEdgeFact` a handler pushed directly already carries a
/// closed-enum `EdgeKind` and a pair of base ids; the only work left is
/// resolving those base ids through the owner index.
fn replay_misc_edges(ctx: &mut Ctx) {
    for m in ctx.bundle.misc_edges.iter() {
        if m.src_base_id.is_empty() || m.dst_base_id.is_empty() {
            continue;
        }
        let src = ctx.resolve(&m.src_base_id);
        let dst = ctx.resolve(&m.dst_base_id);
        ctx.push_edge(m.kind, src, dst);
    }
}

/// AWAITS from the owning function to every awaited call/method call site.
fn build_awaits(ctx: &mut Ctx) {
    for c in &ctx.bundle.calls {
        if !c.is_awaited || c.owner_base_id.is_empty() {
            continue;
        }
        let owner = ctx.resolve(&c.owner_base_id);
        ctx.push_edge(EdgeKind::Awaits, owner, c.site.base_id.clone());
    }
    for m in &ctx.bundle.method_calls {
        if !m.is_awaited || m.owner_base_id.is_empty() {
            continue;
        }
        let owner = ctx.resolve(&m.owner_base_id);
        ctx.push_edge(EdgeKind::Awaits, owner, m.site.base_id.clone());
    }
}

/// CALLS_ON from a method call to whatever its receiver resolves to: the
/// enclosing class when the receiver reads `this`, else a same-bundle
/// variable/parameter binding by name. Silently skipped when neither
/// resolves, same as `build_property_accesses`'s `READS_FROM`.
fn build_calls_on(ctx: &mut Ctx) {
    for m in &ctx.bundle.method_calls {
        let id = m.site.base_id.clone();
        if m.receiver_summary == "this" {
            if let Some(class_name) = super::core::enclosing_class_name(&m.site.scope) {
                if let Some(class) = find_class(ctx.bundle, class_name) {
                    let class_id = ctx.resolve(&class.site.base_id);
                    ctx.push_edge(EdgeKind::CallsOn, id, class_id);
                    continue;
                }
            }
        }
        if let Some(target) = resolve_name_to_binding(ctx, &m.receiver_summary) {
            ctx.push_edge(EdgeKind::CallsOn, id, target);
        }
    }
}

/// CHAINS_FROM links a chained method call to the nearest earlier method
/// call in the same owner, since a chain's receiver is the result of the
/// call immediately before it in source order.
fn build_chains_from(ctx: &mut Ctx) {
    for m in &ctx.bundle.method_calls {
        if !m.is_chained {
            continue;
        }
        let owner = ctx.resolve(&m.owner_base_id);
        let predecessor = ctx
            .bundle
            .method_calls
            .iter()
            .filter(|p| p.site.base_id != m.site.base_id)
            .filter(|p| ctx.resolve(&p.owner_base_id) == owner)
            .filter(|p| (p.site.location.line, p.site.location.column) < (m.site.location.line, m.site.location.column))
            .max_by_key(|p| (p.site.location.line, p.site.location.column));
        if let Some(pred) = predecessor {
            ctx.push_edge(EdgeKind::ChainsFrom, m.site.base_id.clone(), pred.site.base_id.clone());
        }
    }
}

fn build_listens_to(ctx: &mut Ctx) {
    for e in &ctx.bundle.event_listeners {
        let id = e.site.base_id.clone();
        if e.target_summary == "this" {
            if let Some(class_name) = super::core::enclosing_class_name(&e.site.scope) {
                if let Some(class) = find_class(ctx.bundle, class_name) {
                    let class_id = ctx.resolve(&class.site.base_id);
                    ctx.push_edge(EdgeKind::ListensTo, id, class_id);
                    continue;
                }
            }
        }
        if let Some(target) = resolve_name_to_binding(ctx, &e.target_summary) {
            ctx.push_edge(EdgeKind::ListensTo, id, target);
        }
    }
}

/// UNION_MEMBER/INTERSECTS_WITH from a union/intersection type alias to
/// whichever of its member summaries name another type alias, class, or
/// interface declared in the same module.
fn build_type_alias_members(ctx: &mut Ctx) {
    for t in &ctx.bundle.type_aliases {
        let kind = if t.is_union {
            EdgeKind::UnionMember
        } else if t.is_intersection {
            EdgeKind::IntersectsWith
        } else if t.member_summaries.len() == 1 {
            EdgeKind::Aliases
        } else {
            continue;
        };
        let id = t.site.base_id.clone();
        for member in &t.member_summaries {
            let target = ctx
                .bundle
                .type_aliases
                .iter()
                .find(|other| &other.name == member)
                .map(|other| ctx.resolve(&other.site.base_id))
                .or_else(|| find_class(ctx.bundle, member).map(|c| ctx.resolve(&c.site.base_id)))
                .or_else(|| find_interface(ctx.bundle, member).map(|i| ctx.resolve(&i.site.base_id)));
            if let Some(target_id) = target {
                ctx.push_edge(kind, id.clone(), target_id);
            }
        }
    }
}

/// DEFAULTS_TO from a parameter to whatever its default value resolves
/// to when that default is itself a named binding or function (literal
/// defaults have nowhere to point and are skipped, same rule the
/// AssignmentBuilder uses for literal right-hand sides).
fn build_defaults_to(ctx: &mut Ctx) {
    for p in &ctx.bundle.parameters {
        let Some(summary) = &p.default_value_summary else { continue };
        if let Some(target) = resolve_name_to_binding(ctx, summary) {
            ctx.push_edge(EdgeKind::DefaultsTo, p.site.base_id.clone(), target);
        } else if let Some(func) = find_function(ctx.bundle, summary) {
            let target = ctx.resolve(&func.site.base_id);
            ctx.push_edge(EdgeKind::DefaultsTo, p.site.base_id.clone(), target);
        }
    }
}

/// OVERRIDES from a subclass method to a same-named method on its
/// (same-module) superclass.
fn build_overrides(ctx: &mut Ctx) {
    for class in &ctx.bundle.classes {
        let Some(super_name) = &class.superclass_name else { continue };
        let Some(parent) = find_class(ctx.bundle, super_name) else { continue };
        let parent_id = ctx.resolve(&parent.site.base_id);
        let class_id = ctx.resolve(&class.site.base_id);

        for method in ctx.bundle.functions.iter().filter(|f| f.is_method && ctx.resolve(&f.owner_base_id) == class_id) {
            if let Some(parent_method) = ctx
                .bundle
                .functions
                .iter()
                .find(|f| f.is_method && f.name == method.name && ctx.resolve(&f.owner_base_id) == parent_id)
            {
                let parent_method_id = ctx.resolve(&parent_method.site.base_id);
                ctx.push_edge(EdgeKind::Overrides, method.site.base_id.clone(), parent_method_id);
            }
        }
    }
}

/// HAS_OVERLOAD links each ambient overload signature to the next one
/// declared for the same name; IMPLEMENTS_OVERLOAD links the first
/// signature-less implementation back to every signature that preceded it.
fn build_overloads(ctx: &mut Ctx) {
    use std::collections::HashMap;
    let mut groups: HashMap<(String, String), Vec<&grafema_core::fact::FunctionFact>> = HashMap::new();
    for f in &ctx.bundle.functions {
        let owner = ctx.resolve(&f.owner_base_id);
        groups.entry((owner, f.name.clone())).or_default().push(f);
    }
    for mut members in groups.into_values() {
        if members.len() < 2 {
            continue;
        }
        members.sort_by_key(|f| (f.site.location.line, f.site.location.column));
        let signatures: Vec<&grafema_core::fact::FunctionFact> = members.iter().filter(|f| f.is_signature).copied().collect();
        if signatures.len() < 2 && members.iter().all(|f| f.is_signature) {
            continue;
        }
        for pair in signatures.windows(2) {
            ctx.push_edge(EdgeKind::HasOverload, pair[0].site.base_id.clone(), pair[1].site.base_id.clone());
        }
        if let Some(implementation) = members.iter().find(|f| !f.is_signature) {
            for signature in &signatures {
                ctx.push_edge(EdgeKind::ImplementsOverload, implementation.site.base_id.clone(), signature.site.base_id.clone());
            }
        }
    }
}

/// INVOKES from a function to its own parameter, when the function calls
/// that parameter as if it were itself a function (a higher-order
/// callback invocation).
fn build_invokes(ctx: &mut Ctx) {
    for f in &ctx.bundle.functions {
        for binding in &f.control_flow.invokes_param_bindings {
            if let Some(param) = ctx.bundle.parameters.iter().find(|p| p.owner_base_id == f.site.base_id && p.name == *binding) {
                let param_id = ctx.resolve(&param.site.base_id);
                ctx.push_edge(EdgeKind::Invokes, f.site.base_id.clone(), param_id);
            }
        }
    }
}

/// BINDS_THIS_TO from a `.bind(this)`/`.call(this)`/`.apply(this)` call
/// site to the enclosing class, same receiver resolution `CALLS_ON` uses.
fn build_binds_this_to(ctx: &mut Ctx) {
    for m in &ctx.bundle.method_calls {
        if !m.binds_this {
            continue;
        }
        if let Some(class_name) = super::core::enclosing_class_name(&m.site.scope) {
            if let Some(class) = find_class(ctx.bundle, class_name) {
                let class_id = ctx.resolve(&class.site.base_id);
                ctx.push_edge(EdgeKind::BindsThisTo, m.site.base_id.clone(), class_id);
            }
        }
    }
}

/// HAS_TYPE/RETURNS_TYPE from a parameter/variable/function to whatever
/// class/interface/type-alias its annotation names; primitive and builtin
/// annotations have nothing to resolve to and are silently skipped.
fn build_type_annotations(ctx: &mut Ctx) {
    for t in &ctx.bundle.type_annotations {
        let Some(target) = resolve_type_name(ctx, &t.annotation_summary) else { continue };
        let owner = ctx.resolve(&t.owner_base_id);
        let kind = if t.is_return { EdgeKind::ReturnsType } else { EdgeKind::HasType };
        ctx.push_edge(kind, owner, target);
    }
}

fn build_type_constraints(ctx: &mut Ctx) {
    for t in &ctx.bundle.type_constraints {
        let Some(target) = resolve_type_name(ctx, &t.constraint_summary) else { continue };
        let owner = ctx.resolve(&t.owner_base_id);
        ctx.push_edge(EdgeKind::ConstrainedBy, owner, target);
    }
}

fn resolve_type_name(ctx: &Ctx, name: &str) -> Option<String> {
    let name = name.trim();
    if let Some(c) = find_class(ctx.bundle, name) {
        return Some(ctx.resolve(&c.site.base_id));
    }
    if let Some(i) = find_interface(ctx.bundle, name) {
        return Some(ctx.resolve(&i.site.base_id));
    }
    ctx.bundle.type_aliases.iter().find(|t| t.name == name).map(|t| ctx.resolve(&t.site.base_id))
}

/// EXTENDS_SCOPE_WITH from a `with` statement's enclosing container to
/// whatever its object expression resolves to.
fn build_extends_scope_with(ctx: &mut Ctx) {
    for w in &ctx.bundle.with_statements {
        if let Some(target) = resolve_name_to_binding(ctx, &w.target_summary) {
            let container = ctx.resolve(&w.container_base_id);
            ctx.push_edge(EdgeKind::ExtendsScopeWith, container, target);
        }
    }
}
