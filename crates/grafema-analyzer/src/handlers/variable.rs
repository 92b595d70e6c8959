//! VariableDeclarator, AssignmentExpression and UpdateExpression — the
//! binding and mutation side of the visitor.

use super::Visitor;
use grafema_core::fact::{
    AssignmentFact, FactSite, MiscEdgeFact, TypeAnnotationFact, UpdateExpressionFact, VariableDeclarationKind,
    VariableFact,
};
use grafema_core::types::{EdgeKind, NodeKind};
use tree_sitter::Node;

/// Pushes a `SHADOWS` edge from `site` to the nearest earlier same-name
/// VARIABLE/PARAMETER fact declared in a strictly enclosing scope — both
/// ids are already known, no later resolution needed.
fn note_if_shadowing(v: &mut Visitor, site: &FactSite, name: &str) {
    let outer = v
        .bundle
        .variables
        .iter()
        .map(|f| (&f.name, &f.site))
        .chain(v.bundle.parameters.iter().map(|f| (&f.name, &f.site)))
        .filter(|(n, s)| *n == name && s.scope.len() < site.scope.len() && site.scope.starts_with(&s.scope))
        .max_by_key(|(_, s)| s.scope.len())
        .map(|(_, s)| s.base_id.clone());
    if let Some(outer_id) = outer {
        v.bundle.misc_edges.push(MiscEdgeFact {
            kind: EdgeKind::Shadows,
            src_base_id: site.base_id.clone(),
            dst_base_id: outer_id,
            metadata: Default::default(),
        });
    }
}

fn declarator_kind(node: &Node, source: &[u8]) -> VariableDeclarationKind {
    let mut cur = node.parent();
    while let Some(p) = cur {
        match p.kind() {
            "lexical_declaration" => {
                let text = p
                    .child(0)
                    .map(|c| c.utf8_text(source).unwrap_or(""))
                    .unwrap_or("");
                return if text == "const" { VariableDeclarationKind::Const } else { VariableDeclarationKind::Let };
            }
            "variable_declaration" => return VariableDeclarationKind::Var,
            _ => cur = p.parent(),
        }
    }
    VariableDeclarationKind::Let
}

fn initializer_hint(node: &Node, source: &[u8]) -> String {
    match node.kind() {
        "identifier" => format!("identifier:{}", node.utf8_text(source).unwrap_or("")),
        "call_expression" => {
            let callee = node
                .child_by_field_name("function")
                .map(|f| f.utf8_text(source).unwrap_or(""))
                .unwrap_or("");
            format!("call:{callee}")
        }
        "member_expression" => format!("member:{}", node.utf8_text(source).unwrap_or("")),
        "new_expression" => {
            let ctor = node
                .child_by_field_name("constructor")
                .map(|c| c.utf8_text(source).unwrap_or(""))
                .unwrap_or("");
            format!("new:{ctor}")
        }
        "string" | "template_string" | "number" | "true" | "false" | "null" | "undefined" => "literal".to_string(),
        _ => "other".to_string(),
    }
}

pub fn handle_variable_declarator(v: &mut Visitor, node: &Node) {
    let Some(name_node) = node.child_by_field_name("name") else { return };
    let decl_kind = declarator_kind(node, v.source);
    let value = node.child_by_field_name("value");

    let owner_base_id = v.current_owner_base_id();

    if matches!(name_node.kind(), "object_pattern" | "array_pattern") {
        let (bindings, has_rest) = crate::extract::DestructuringExtractor::flatten(&name_node, v.source);
        let source_summary = value.map(|n| v.summarize(&n)).unwrap_or_default();
        let init_hint = value.map(|n| initializer_hint(&n, v.source)).unwrap_or_else(|| "none".to_string());
        let _ = has_rest;
        for binding in bindings {
            let hints = format!("init:{init_hint}|path:{}", binding.source_path);
            let site = v.site(NodeKind::Variable, &binding.name, &name_node, hints);
            v.bundle.variables.push(VariableFact {
                site,
                owner_base_id: owner_base_id.clone(),
                name: binding.name,
                decl_kind,
                initializer_summary: Some(source_summary.clone()),
                destructured_from: Some(binding.source_path),
            });
        }
        return;
    }

    let name = v.node_text(&name_node);
    let initializer_summary = value.map(|n| v.summarize(&n));
    let init_hint = value.map(|n| initializer_hint(&n, v.source)).unwrap_or_else(|| "none".to_string());

    let hints = format!("init:{init_hint}");
    let site = v.site(NodeKind::Variable, &name, &name_node, hints);
    note_if_shadowing(v, &site, &name);
    let var_base_id = site.base_id.clone();
    v.bundle.variables.push(VariableFact {
        site,
        owner_base_id,
        name,
        decl_kind,
        initializer_summary,
        destructured_from: None,
    });

    if let Some(annotation) = node.child_by_field_name("type") {
        let annotation_summary = annotation.named_child(0).map(|t| v.summarize(&t)).unwrap_or_else(|| v.summarize(&annotation));
        if !annotation_summary.is_empty() {
            v.bundle.type_annotations.push(TypeAnnotationFact {
                owner_base_id: var_base_id,
                annotation_summary,
                is_return: false,
            });
        }
    }
}

pub fn handle_assignment(v: &mut Visitor, node: &Node) {
    let Some(left) = node.child_by_field_name("left") else { return };
    let Some(right) = node.child_by_field_name("right") else { return };
    let operator = node
        .child_by_field_name("operator")
        .map(|o| v.node_text(&o))
        .unwrap_or_else(|| "=".to_string());

    let target_name = v.summarize(&left);
    let source_summary = v.summarize(&right);
    let is_compound = operator != "=";

    let hints = format!("target:{target_name}|op:{operator}");
    let site = v.site(NodeKind::Variable, &target_name, node, hints);
    let owner_base_id = v.current_owner_base_id();
    v.bundle.assignments.push(AssignmentFact {
        site,
        owner_base_id,
        target_name,
        source_summary,
        is_compound,
    });
}

pub fn handle_update_expression(v: &mut Visitor, node: &Node) {
    let Some(argument) = node.child_by_field_name("argument") else { return };
    let operator = node
        .child_by_field_name("operator")
        .map(|o| v.node_text(&o))
        .unwrap_or_default();
    let target_name = v.summarize(&argument);
    let is_prefix = node.start_byte() < argument.start_byte();

    let hints = format!("target:{target_name}|op:{operator}|prefix:{is_prefix}");
    let site = v.site(NodeKind::Variable, &target_name, node, hints);
    let owner_base_id = v.current_owner_base_id();
    v.bundle.update_expressions.push(UpdateExpressionFact {
        site,
        owner_base_id,
        target_name,
        operator,
        is_prefix,
    });
}
