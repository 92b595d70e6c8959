//! CallExpression, NewExpression and MemberExpression/SubscriptExpression —
//! the call-graph and property-access surface.

use super::Visitor;
use grafema_core::fact::{CallFact, ConstructorCallFact, MethodCallFact, MiscEdgeFact, PropertyAccessFact};
use grafema_core::types::{EdgeKind, NodeKind};
use std::collections::HashMap;
use tree_sitter::Node;

fn is_awaited(node: &Node) -> bool {
    node.parent().map(|p| p.kind() == "await_expression").unwrap_or(false)
}

fn argument_count(node: &Node) -> usize {
    node.child_by_field_name("arguments")
        .map(|a| a.named_children(&mut a.walk()).count())
        .unwrap_or(0)
}

fn has_callback_argument(node: &Node) -> bool {
    node.child_by_field_name("arguments")
        .map(|a| {
            a.named_children(&mut a.walk())
                .any(crate::extract::ExpressionEvaluator::is_function_like)
        })
        .unwrap_or(false)
}

fn first_argument<'a>(node: &Node<'a>) -> Option<Node<'a>> {
    node.child_by_field_name("arguments")?.named_child(0)
}

pub fn handle_call(v: &mut Visitor, node: &Node) {
    let Some(function) = node.child_by_field_name("function") else { return };
    let argc = argument_count(node);
    let has_cb = has_callback_argument(node);
    let awaited = is_awaited(node);

    if function.kind() == "member_expression" || function.kind() == "subscript_expression" {
        let receiver = function
            .child_by_field_name("object")
            .map(|o| v.summarize(&o))
            .unwrap_or_default();
        let method_name = function
            .child_by_field_name("property")
            .or_else(|| function.child_by_field_name("index"))
            .map(|p| v.node_text(&p))
            .unwrap_or_default();
        let is_chained = function
            .child_by_field_name("object")
            .map(|o| matches!(o.kind(), "call_expression" | "await_expression"))
            .unwrap_or(false);

        let binds_this = matches!(method_name.as_str(), "bind" | "call" | "apply")
            && first_argument(node).map(|a| v.summarize(&a) == "this").unwrap_or(false);

        let hints = format!("callee:{receiver}.{method_name}|argc:{argc}");
        let site = v.site(NodeKind::MethodCall, &method_name, node, hints);
        let owner_base_id = v.current_owner_base_id();
        v.bundle.method_calls.push(MethodCallFact {
            site,
            owner_base_id,
            receiver_summary: receiver.clone(),
            method_name: method_name.clone(),
            argument_count: argc,
            is_chained,
            is_awaited: awaited,
            binds_this,
        });

        if method_name == "reject" {
            if let Some("reject") = v.promise_role_of(&receiver) {
                emit_reject(v, node, first_argument(node));
            }
        }
        return;
    }

    if function.kind() == "identifier" {
        let name = v.node_text(&function);

        if let Some(role) = v.promise_role_of(&name) {
            if role == "reject" {
                emit_reject(v, node, first_argument(node));
            }
        }
        if let Some((position, binding)) = match_invoked_param(v, &name) {
            v.note_invoked_param(position, &binding);
        }

        let hints = format!("callee:{name}|argc:{argc}");
        let site = v.site(NodeKind::Call, &name, node, hints);
        let owner_base_id = v.current_owner_base_id();
        v.bundle.calls.push(CallFact {
            site,
            owner_base_id,
            callee_name: name,
            callee_summary: v.summarize(&function),
            argument_count: argc,
            has_callback_argument: has_cb,
            is_awaited: awaited,
        });
        return;
    }

    let summary = v.summarize(&function);
    let hints = format!("callee:{summary}|argc:{argc}");
    let site = v.site(NodeKind::Call, &summary, node, hints);
    let owner_base_id = v.current_owner_base_id();
    v.bundle.calls.push(CallFact {
        site,
        owner_base_id,
        callee_name: summary.clone(),
        callee_summary: summary,
        argument_count: argc,
        has_callback_argument: has_cb,
        is_awaited: awaited,
    });
}

fn match_invoked_param(v: &Visitor, identifier: &str) -> Option<(usize, String)> {
    let owner = v.current_function_base_id()?;
    v.bundle
        .parameters
        .iter()
        .find(|p| p.owner_base_id == owner && p.name == identifier && p.destructured_from.is_none())
        .map(|p| (p.position, p.name.clone()))
}

fn emit_reject(v: &mut Visitor, call_node: &Node, argument: Option<Node>) {
    let error_class = argument
        .map(|a| crate::extract::MicroTraceToErrorClass::trace(&a, v.source, &v.bundle.variables, &v.bundle.assignments).error_class)
        .unwrap_or_else(|| "Unknown".to_string());
    let Some(owner_base_id) = v.current_function_base_id() else { return };
    let container_base_id = v.current_owner_base_id();
    v.note_reject(&error_class);
    let hints = format!("class:{error_class}");
    let site = v.site(NodeKind::Call, "reject", call_node, hints);
    v.bundle.rejects.push(grafema_core::fact::RejectFact {
        site,
        owner_base_id,
        container_base_id,
        error_class,
    });
}

pub fn handle_constructor_call(v: &mut Visitor, node: &Node) {
    let class_name = node
        .child_by_field_name("constructor")
        .map(|c| v.node_text(&c))
        .unwrap_or_default();
    let argc = argument_count(node);

    if class_name == "Promise" {
        if let Some(executor) = first_argument(node) {
            if crate::extract::ExpressionEvaluator::is_function_like(&executor) {
                v.queue_promise_roles(promise_executor_roles(&executor, v.source));
            }
        }
    }

    let hints = format!("ctor:{class_name}|argc:{argc}");
    let site = v.site(NodeKind::ConstructorCall, &class_name, node, hints);
    let owner_base_id = v.current_owner_base_id();
    v.bundle.constructor_calls.push(ConstructorCallFact { site, owner_base_id, class_name, argument_count: argc });
}

fn promise_executor_roles(executor: &Node, source: &[u8]) -> HashMap<String, &'static str> {
    let mut roles = HashMap::new();
    let Some(params) = executor.child_by_field_name("parameters") else {
        return roles;
    };
    let names: Vec<String> = params
        .named_children(&mut params.walk())
        .filter(|p| p.kind() == "identifier")
        .map(|p| p.utf8_text(source).unwrap_or("").to_string())
        .collect();
    if let Some(resolve) = names.first() {
        roles.insert(resolve.clone(), "resolve");
    }
    if let Some(reject) = names.get(1) {
        roles.insert(reject.clone(), "reject");
    }
    roles
}

pub fn handle_property_access(v: &mut Visitor, node: &Node) {
    let (receiver, property_name, is_computed) = if node.kind() == "subscript_expression" {
        let receiver = node
            .child_by_field_name("object")
            .map(|o| v.summarize(&o))
            .unwrap_or_default();
        let index = node.child_by_field_name("index");
        match index {
            Some(idx) if idx.kind() == "string" => {
                (receiver, v.node_text(&idx).trim_matches(|c| c == '"' || c == '\'').to_string(), false)
            }
            Some(idx) => (receiver, v.summarize(&idx), true),
            None => (receiver, String::new(), true),
        }
    } else {
        let receiver = node
            .child_by_field_name("object")
            .map(|o| v.summarize(&o))
            .unwrap_or_default();
        let property = node
            .child_by_field_name("property")
            .map(|p| v.node_text(&p))
            .unwrap_or_default();
        (receiver, property, false)
    };

    let is_optional_chained = node
        .children(&mut node.walk())
        .any(|c| c.kind() == "?." || c.utf8_text(v.source) == Ok("?."));

    let is_private = property_name.starts_with('_') || property_name.starts_with('#');

    let hints = format!("receiver:{receiver}|prop:{property_name}|computed:{is_computed}");
    let site = v.site(NodeKind::PropertyAccess, &property_name, node, hints);
    let access_base_id = site.base_id.clone();
    let owner_base_id = v.current_owner_base_id();
    v.bundle.property_accesses.push(PropertyAccessFact {
        site,
        owner_base_id: owner_base_id.clone(),
        receiver_summary: receiver,
        property_name,
        is_computed,
        is_optional_chained,
    });

    if is_private {
        // Self-contained: both the accessing function/method and the
        // access site's own id are already known, no cross-reference
        // resolution needed.
        v.bundle.misc_edges.push(MiscEdgeFact {
            kind: EdgeKind::AccessesPrivate,
            src_base_id: owner_base_id,
            dst_base_id: access_base_id,
            metadata: Default::default(),
        });
    }
}
