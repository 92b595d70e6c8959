//! String/number/boolean/null/regex/template literals plus object and array
//! literals and spread elements.

use super::Visitor;
use grafema_core::fact::{ArrayLiteralFact, LiteralFact, LiteralKind, MiscEdgeFact, ObjectLiteralFact};
use grafema_core::identity::base_id;
use grafema_core::types::{EdgeKind, NodeKind};
use tree_sitter::Node;

fn literal_kind(node: &Node) -> LiteralKind {
    match node.kind() {
        "string" => LiteralKind::String,
        "template_string" => LiteralKind::Template,
        "number" => LiteralKind::Number,
        "true" | "false" => LiteralKind::Boolean,
        "null" => LiteralKind::Null,
        "undefined" => LiteralKind::Undefined,
        "regex" => LiteralKind::Regex,
        _ => LiteralKind::String,
    }
}

pub fn handle_literal(v: &mut Visitor, node: &Node) {
    // A template string's interpolations are walked independently (they're
    // named children of the template node); only the literal shell itself
    // is recorded here.
    let kind = literal_kind(node);
    let raw_preview = v.summarize(node);
    let ordinal = v.scope.get_item_counter("literal");
    let name = format!("literal[{ordinal}]");

    let hints = format!("kind:{kind:?}|text:{raw_preview}");
    let site = v.site(NodeKind::Literal, &name, node, hints);
    let owner_base_id = v.current_owner_base_id();
    v.bundle.literals.push(LiteralFact { site, owner_base_id, kind, raw_preview });
}

pub fn handle_object_literal(v: &mut Visitor, node: &Node) {
    let mut property_names = Vec::new();
    let mut spread_targets: Vec<String> = Vec::new();
    for child in node.named_children(&mut node.walk()) {
        match child.kind() {
            "pair" => {
                if let Some(key) = child.child_by_field_name("key") {
                    property_names.push(v.node_text(&key));
                }
            }
            "shorthand_property_identifier" => property_names.push(v.node_text(&child)),
            "spread_element" => {
                if let Some(arg) = child.named_child(0) {
                    if arg.kind() == "identifier" {
                        spread_targets.push(v.node_text(&arg));
                    }
                }
            }
            "method_definition" => {
                if let Some(name) = child.child_by_field_name("name") {
                    property_names.push(v.node_text(&name));
                }
            }
            _ => {}
        }
    }
    let has_spread = !spread_targets.is_empty();

    let ordinal = v.scope.get_item_counter("object_literal");
    let name = format!("object_literal[{ordinal}]");
    let hints = format!("props:{}|spread:{has_spread}", property_names.join(","));
    let site = v.site(NodeKind::ObjectLiteral, &name, node, hints);
    let owner = site.base_id.clone();
    let owner_base_id = v.current_owner_base_id();
    v.bundle.object_literals.push(ObjectLiteralFact { site, owner_base_id, property_names, has_spread });

    if spread_targets.len() > 1 {
        // Multiple spreads in one object literal merge several sources
        // into one, distinct from a single SPREADS_FROM.
        let ctx = v.scope.get_context();
        for target in &spread_targets {
            let dst = base_id(&ctx.file, &ctx.scope_path, NodeKind::Variable, target);
            v.bundle.misc_edges.push(MiscEdgeFact {
                kind: EdgeKind::MergesWith,
                src_base_id: owner.clone(),
                dst_base_id: dst,
                metadata: Default::default(),
            });
        }
    }

    v.push_literal_owner(owner);
}

pub fn handle_array_literal(v: &mut Visitor, node: &Node) {
    let mut element_count = 0;
    let mut has_spread = false;
    for child in node.named_children(&mut node.walk()) {
        if child.kind() == "spread_element" {
            has_spread = true;
        }
        element_count += 1;
    }

    let ordinal = v.scope.get_item_counter("array_literal");
    let name = format!("array_literal[{ordinal}]");
    let hints = format!("count:{element_count}|spread:{has_spread}");
    let site = v.site(NodeKind::ArrayLiteral, &name, node, hints);
    let owner = site.base_id.clone();
    let owner_base_id = v.current_owner_base_id();
    v.bundle.array_literals.push(ArrayLiteralFact { site, owner_base_id, element_count, has_spread });
    v.push_literal_owner(owner);
}

/// Records a `SPREADS_FROM` edge when the spread sits directly inside an
/// object/array literal and its argument is a bare identifier — the only
/// case where the target's base id can be reconstructed without a second
/// pass. `GraphBuilder` drops the edge silently if no node with that id
/// exists (per the Cross-reference-rules invariant), so a wrong guess here
/// is inert, never a dangling edge.
pub fn handle_spread(v: &mut Visitor, node: &Node) {
    let Some(owner) = v.current_literal_owner().map(|s| s.to_string()) else { return };
    let Some(argument) = node.named_child(0) else { return };
    if argument.kind() != "identifier" {
        return;
    }
    let name = v.node_text(&argument);
    let ctx = v.scope.get_context();
    let dst = base_id(&ctx.file, &ctx.scope_path, NodeKind::Variable, &name);

    v.bundle.misc_edges.push(MiscEdgeFact {
        kind: EdgeKind::SpreadsFrom,
        src_base_id: owner,
        dst_base_id: dst,
        metadata: Default::default(),
    });
}
