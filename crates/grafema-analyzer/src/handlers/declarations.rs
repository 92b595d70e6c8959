//! Functions, methods, classes, interfaces, type aliases, enums,
//! decorators, imports and exports — everything that introduces a named
//! declaration into the module.

use super::Visitor;
use grafema_core::fact::{
    ClassFact, DecoratorFact, EnumFact, ExportFact, FunctionFact, ImportFact, InterfaceFact, ParameterFact,
    TypeAliasFact, TypeAnnotationFact, TypeConstraintFact,
};
use grafema_core::identity::ScopeKind;
use grafema_core::types::NodeKind;
use tree_sitter::Node;

/// Unwraps a `type_annotation` node's single named child (the type itself,
/// past the leading `:`), falling back to the whole node's text when the
/// grammar didn't give us the expected shape.
fn annotated_type_summary(v: &Visitor, annotation: &Node) -> String {
    annotation.named_child(0).map(|t| v.summarize(&t)).unwrap_or_else(|| v.summarize(annotation))
}

/// Emits HAS_TYPE/RETURNS_TYPE for whatever `field` names on `node`, if present.
fn emit_type_annotation(v: &mut Visitor, node: &Node, field: &str, owner_base_id: &str, is_return: bool) {
    let Some(annotation) = node.child_by_field_name(field) else { return };
    let annotation_summary = annotated_type_summary(v, &annotation);
    if annotation_summary.is_empty() {
        return;
    }
    v.bundle.type_annotations.push(TypeAnnotationFact {
        owner_base_id: owner_base_id.to_string(),
        annotation_summary,
        is_return,
    });
}

/// Emits CONSTRAINED_BY for every `<T extends Base>` generic parameter
/// declared on a function/class/interface.
fn emit_type_constraints(v: &mut Visitor, node: &Node, owner_base_id: &str) {
    let Some(type_params) = node.child_by_field_name("type_parameters") else { return };
    for param in type_params.named_children(&mut type_params.walk()) {
        if param.kind() != "type_parameter" {
            continue;
        }
        if let Some(constraint) = param.child_by_field_name("constraint") {
            let constraint_summary = annotated_type_summary(v, &constraint);
            if !constraint_summary.is_empty() {
                v.bundle.type_constraints.push(TypeConstraintFact {
                    owner_base_id: owner_base_id.to_string(),
                    constraint_summary,
                });
            }
        }
    }
}

fn function_name(node: &Node, source: &[u8]) -> String {
    node.child_by_field_name("name")
        .map(|n| n.utf8_text(source).unwrap_or("").to_string())
        .unwrap_or_default()
}

fn param_count(node: &Node) -> usize {
    node.child_by_field_name("parameters")
        .map(|p| p.named_children(&mut p.walk()).count())
        .unwrap_or(0)
}

fn statement_count(node: &Node) -> usize {
    node.child_by_field_name("body")
        .map(|b| b.named_children(&mut b.walk()).count())
        .unwrap_or(0)
}

fn is_async(node: &Node, source: &[u8]) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|c| c.kind() == "async" || c.utf8_text(source) == Ok("async"))
}

fn is_generator(node: &Node) -> bool {
    matches!(node.kind(), "generator_function" | "generator_function_declaration")
        || node.child_by_field_name("name").is_none() && node.kind() == "function"
        || node.children(&mut node.walk()).any(|c| c.kind() == "*")
}

/// Shared by `function_declaration`/`function`/`function_expression`/
/// `generator_function`/`arrow_function`: emits the FUNCTION fact, its
/// PARAMETER facts, pushes the function scope frame, and records the
/// function's index so control-flow facts seen further down the walk can
/// attribute themselves to it.
pub fn handle_function(v: &mut Visitor, node: &Node, is_arrow: bool) -> String {
    let name = function_name(node, v.source);
    let async_flag = is_async(node, v.source);
    let generator = !is_arrow && is_generator(node);
    let params = param_count(node);
    let stmts = statement_count(node);
    let hints = format!(
        "params:{}|async:{async_flag}|generator:{generator}|stmts:{stmts}",
        collect_param_names(node, v.source).join(",")
    );

    let site = v.site(NodeKind::Function, &name, node, hints);
    let base_id = site.base_id.clone();
    let owner_base_id = v.current_owner_base_id();
    let is_signature = node.child_by_field_name("body").is_none();

    v.bundle.functions.push(FunctionFact {
        site,
        owner_base_id,
        name: name.clone(),
        is_async: async_flag,
        is_generator: generator,
        is_arrow,
        is_method: false,
        param_count: params,
        cyclomatic_complexity: 1,
        control_flow: Default::default(),
        is_signature,
    });
    let func_index = v.bundle.functions.len() - 1;

    emit_parameters(v, node, &base_id);
    emit_type_annotation(v, node, "return_type", &base_id, true);
    emit_type_constraints(v, node, &base_id);

    v.scope.enter_scope(&name, ScopeKind::Function);
    v.push_function(func_index);
    base_id
}

pub fn handle_method(v: &mut Visitor, node: &Node) -> String {
    let name = node
        .child_by_field_name("name")
        .map(|n| v.node_text(&n))
        .unwrap_or_default();
    let async_flag = is_async(node, v.source);
    let generator = node.children(&mut node.walk()).any(|c| c.kind() == "*");
    let params = param_count(node);
    let stmts = statement_count(node);
    let hints = format!(
        "params:{}|async:{async_flag}|generator:{generator}|stmts:{stmts}",
        collect_param_names(node, v.source).join(",")
    );

    let site = v.site(NodeKind::Method, &name, node, hints);
    let base_id = site.base_id.clone();
    let owner_base_id = v.current_owner_base_id();
    let is_signature = node.child_by_field_name("body").is_none();

    v.bundle.functions.push(FunctionFact {
        site,
        owner_base_id,
        name: name.clone(),
        is_async: async_flag,
        is_generator: generator,
        is_arrow: false,
        is_method: true,
        param_count: params,
        cyclomatic_complexity: 1,
        control_flow: Default::default(),
        is_signature,
    });
    let func_index = v.bundle.functions.len() - 1;

    emit_parameters(v, node, &base_id);
    emit_type_annotation(v, node, "return_type", &base_id, true);

    v.scope.enter_scope(&name, ScopeKind::Method);
    v.push_function(func_index);
    base_id
}

fn collect_param_names(node: &Node, source: &[u8]) -> Vec<String> {
    let Some(params) = node.child_by_field_name("parameters") else {
        return Vec::new();
    };
    params
        .named_children(&mut params.walk())
        .map(|p| param_binding_name(&p, source))
        .collect()
}

fn param_binding_name(param: &Node, source: &[u8]) -> String {
    match param.kind() {
        "required_parameter" | "optional_parameter" => param
            .child_by_field_name("pattern")
            .map(|p| leaf_name(&p, source))
            .unwrap_or_default(),
        "assignment_pattern" => param
            .child_by_field_name("left")
            .map(|p| leaf_name(&p, source))
            .unwrap_or_default(),
        "rest_pattern" => format!("...{}", param.named_child(0).map(|c| leaf_name(&c, source)).unwrap_or_default()),
        _ => leaf_name(param, source),
    }
}

fn leaf_name(node: &Node, source: &[u8]) -> String {
    match node.kind() {
        "identifier" => node.utf8_text(source).unwrap_or("").to_string(),
        "object_pattern" => "{..}".to_string(),
        "array_pattern" => "[..]".to_string(),
        _ => node.utf8_text(source).unwrap_or("").to_string(),
    }
}

fn emit_parameters(v: &mut Visitor, node: &Node, owner_base_id: &str) {
    let Some(params) = node.child_by_field_name("parameters") else {
        return;
    };
    for (position, param) in params.named_children(&mut params.walk()).enumerate() {
        emit_one_parameter(v, &param, position, owner_base_id);
    }
}

fn emit_one_parameter(v: &mut Visitor, param: &Node, position: usize, owner_base_id: &str) {
    let (pattern, has_default, default_node) = match param.kind() {
        "required_parameter" => (param.child_by_field_name("pattern"), false, None),
        "optional_parameter" => (param.child_by_field_name("pattern"), true, param.child_by_field_name("value")),
        "assignment_pattern" => (
            param.child_by_field_name("left"),
            true,
            param.child_by_field_name("right"),
        ),
        "rest_pattern" => (param.named_child(0), false, None),
        _ => (Some(*param), false, None),
    };
    let Some(pattern) = pattern else { return };
    let is_rest = param.kind() == "rest_pattern";
    let default_value_summary = default_node.map(|n| v.summarize(&n));

    if matches!(pattern.kind(), "object_pattern" | "array_pattern") {
        let (bindings, has_rest) =
            crate::extract::DestructuringExtractor::flatten(&pattern, v.source);
        let source_summary = v.summarize(&pattern);
        let hints = format!("pos:{position}|destructured|rest:{has_rest}");
        let site = v.site(NodeKind::Parameter, &format!("arg{position}"), param, hints);
        v.bundle.parameters.push(ParameterFact {
            site,
            owner_base_id: owner_base_id.to_string(),
            name: format!("arg{position}"),
            position,
            has_default,
            is_rest,
            destructured_from: Some(source_summary),
            default_value_summary,
        });
        for binding in bindings {
            let hints = format!("pos:{position}|path:{}", binding.source_path);
            let site = v.site(NodeKind::Parameter, &binding.name, &pattern, hints);
            v.bundle.parameters.push(ParameterFact {
                site,
                owner_base_id: owner_base_id.to_string(),
                name: binding.name,
                position,
                has_default: binding.has_default,
                is_rest: false,
                destructured_from: Some(binding.source_path),
                default_value_summary: None,
            });
        }
        return;
    }

    let name = leaf_name(&pattern, v.source);
    let hints = format!("pos:{position}|default:{has_default}|rest:{is_rest}");
    let site = v.site(NodeKind::Parameter, &name, param, hints);
    let param_base_id = site.base_id.clone();
    v.bundle.parameters.push(ParameterFact {
        site,
        owner_base_id: owner_base_id.to_string(),
        name,
        position,
        has_default,
        is_rest,
        destructured_from: None,
        default_value_summary,
    });
    emit_type_annotation(v, param, "type", &param_base_id, false);
}

pub fn handle_class(v: &mut Visitor, node: &Node) -> String {
    let name = node
        .child_by_field_name("name")
        .map(|n| v.node_text(&n))
        .unwrap_or_default();
    let superclass_name = node
        .child_by_field_name("superclass")
        .or_else(|| node.child_by_field_name("heritage"))
        .map(|n| v.summarize(&n));
    let interface_names = class_implements(node, v.source);
    let is_abstract = node.children(&mut node.walk()).any(|c| c.kind() == "abstract");

    let hints = format!("superclass:{:?}|implements:{}", superclass_name, interface_names.join(","));
    let site = v.site(NodeKind::Class, &name, node, hints);
    let base_id = site.base_id.clone();
    let owner_base_id = v.current_owner_base_id();
    v.bundle.classes.push(ClassFact {
        site,
        owner_base_id,
        name: name.clone(),
        superclass_name,
        interface_names,
        is_abstract,
    });
    emit_type_constraints(v, node, &base_id);
    v.scope.enter_scope(&name, ScopeKind::Class);
    base_id
}

fn class_implements(node: &Node, source: &[u8]) -> Vec<String> {
    let mut names = Vec::new();
    if let Some(heritage) = node.child_by_field_name("heritage") {
        let mut cursor = heritage.walk();
        for child in heritage.children(&mut cursor) {
            if child.kind() == "class_heritage" || child.kind() == "implements_clause" {
                for ty in child.named_children(&mut child.walk()) {
                    names.push(ty.utf8_text(source).unwrap_or("").to_string());
                }
            }
        }
    }
    names
}

pub fn handle_interface(v: &mut Visitor, node: &Node) {
    let name = node
        .child_by_field_name("name")
        .map(|n| v.node_text(&n))
        .unwrap_or_default();
    let extends_names = node
        .children(&mut node.walk())
        .find(|c| c.kind() == "extends_type_clause")
        .map(|c| c.named_children(&mut c.walk()).map(|t| v.node_text(&t)).collect())
        .unwrap_or_default();

    let hints = format!("members:{}", extends_names.join(","));
    let site = v.site(NodeKind::Interface, &name, node, hints);
    let base_id = site.base_id.clone();
    let owner_base_id = v.current_owner_base_id();
    v.bundle.interfaces.push(InterfaceFact { site, owner_base_id, name, extends_names });
    emit_type_constraints(v, node, &base_id);
}

pub fn handle_type_alias(v: &mut Visitor, node: &Node) {
    let name = node
        .child_by_field_name("name")
        .map(|n| v.node_text(&n))
        .unwrap_or_default();
    let value = node.child_by_field_name("value");
    let is_union = value.map(|n| n.kind() == "union_type").unwrap_or(false);
    let is_intersection = value.map(|n| n.kind() == "intersection_type").unwrap_or(false);
    let member_summaries: Vec<String> = if is_union || is_intersection {
        value
            .map(|n| n.named_children(&mut n.walk()).map(|c| v.summarize(&c)).collect())
            .unwrap_or_default()
    } else {
        // A plain `type X = Y;` names exactly one other type — recorded the
        // same way as a union/intersection member so the misc edge pass can
        // resolve it, just with a single entry and the ALIASES edge kind.
        value
            .filter(|n| matches!(n.kind(), "type_identifier" | "nested_type_identifier" | "generic_type"))
            .map(|n| vec![v.summarize(&n)])
            .unwrap_or_default()
    };

    let hints = format!("members:{}", member_summaries.join(","));
    let site = v.site(NodeKind::Type, &name, node, hints);
    let owner_base_id = v.current_owner_base_id();
    v.bundle.type_aliases.push(TypeAliasFact {
        site,
        owner_base_id,
        name,
        is_union,
        is_intersection,
        member_summaries,
    });
}

pub fn handle_enum(v: &mut Visitor, node: &Node) {
    let name = node
        .child_by_field_name("name")
        .map(|n| v.node_text(&n))
        .unwrap_or_default();
    let is_const = node.children(&mut node.walk()).any(|c| c.kind() == "const");
    let member_names = node
        .child_by_field_name("body")
        .map(|b| {
            b.named_children(&mut b.walk())
                .filter_map(|m| m.child_by_field_name("name").map(|n| v.node_text(&n)))
                .collect()
        })
        .unwrap_or_default();

    let hints = format!("members:{}", member_names.join(","));
    let site = v.site(NodeKind::Enum, &name, node, hints);
    let owner_base_id = v.current_owner_base_id();
    v.bundle.enums.push(EnumFact { site, owner_base_id, name, member_names, is_const });
}

pub fn handle_decorator(v: &mut Visitor, node: &Node) {
    let Some(call) = node.named_child(0) else { return };
    let name = match call.kind() {
        "call_expression" => call
            .child_by_field_name("function")
            .map(|f| v.node_text(&f))
            .unwrap_or_default(),
        _ => v.node_text(&call),
    };
    let target_base_id = v.current_function_base_id().unwrap_or_default();
    let hints = v.summarize(node);
    let site = v.site(NodeKind::Decorator, &name, node, hints);
    v.bundle.decorators.push(DecoratorFact { site, name, target_base_id });
}

pub fn handle_import(v: &mut Visitor, node: &Node) {
    let specifier = node
        .child_by_field_name("source")
        .map(|s| v.node_text(&s).trim_matches(|c| c == '"' || c == '\'').to_string())
        .unwrap_or_default();
    let is_type_only = node.children(&mut node.walk()).any(|c| c.kind() == "type");

    let mut imported_names = Vec::new();
    let mut is_default = false;
    let mut is_namespace = false;

    if let Some(clause) = node.child_by_field_name("import") {
        collect_import_clause(&clause, v.source, &mut imported_names, &mut is_default, &mut is_namespace);
    } else {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "import_clause" {
                collect_import_clause(&child, v.source, &mut imported_names, &mut is_default, &mut is_namespace);
            }
        }
    }

    let hints = format!("specifier:{specifier}|names:{}", imported_names.join(","));
    let name = imported_names.first().cloned().unwrap_or_else(|| specifier.clone());
    let site = v.site(NodeKind::Import, &name, node, hints);
    let owner_base_id = v.current_owner_base_id();
    v.bundle.imports.push(ImportFact {
        site,
        owner_base_id,
        specifier,
        imported_names,
        is_default,
        is_namespace,
        is_type_only,
    });
}

fn collect_import_clause(clause: &Node, source: &[u8], names: &mut Vec<String>, is_default: &mut bool, is_namespace: &mut bool) {
    let mut cursor = clause.walk();
    for child in clause.children(&mut cursor) {
        match child.kind() {
            "identifier" => {
                *is_default = true;
                names.push(child.utf8_text(source).unwrap_or("").to_string());
            }
            "namespace_import" => {
                *is_namespace = true;
                if let Some(id) = child.named_child(0) {
                    names.push(id.utf8_text(source).unwrap_or("").to_string());
                }
            }
            "named_imports" => {
                for spec in child.named_children(&mut child.walk()) {
                    if spec.kind() == "import_specifier" {
                        let bound = spec
                            .child_by_field_name("alias")
                            .or_else(|| spec.child_by_field_name("name"))
                            .map(|n| n.utf8_text(source).unwrap_or("").to_string())
                            .unwrap_or_default();
                        names.push(bound);
                    }
                }
            }
            _ => {}
        }
    }
}

pub fn handle_export(v: &mut Visitor, node: &Node) {
    let is_default = node.children(&mut node.walk()).any(|c| c.kind() == "default");
    let source_specifier = node
        .child_by_field_name("source")
        .map(|s| v.node_text(&s).trim_matches(|c| c == '"' || c == '\'').to_string());
    let is_re_export = source_specifier.is_some();

    let exported_name = export_declared_name(node, v.source).unwrap_or_else(|| {
        if is_default {
            "default".to_string()
        } else {
            "*".to_string()
        }
    });

    let hints = format!("name:{exported_name}|source:{:?}", source_specifier);
    let site = v.site(NodeKind::Export, &exported_name, node, hints);
    let owner_base_id = v.current_owner_base_id();
    v.bundle.exports.push(ExportFact {
        site,
        owner_base_id,
        exported_name,
        is_default,
        is_re_export,
        source_specifier,
    });
}

fn export_declared_name(node: &Node, source: &[u8]) -> Option<String> {
    let decl = node.child_by_field_name("declaration")?;
    match decl.kind() {
        "function_declaration" | "generator_function_declaration" | "class_declaration" | "interface_declaration"
        | "type_alias_declaration" | "enum_declaration" => decl
            .child_by_field_name("name")
            .map(|n| n.utf8_text(source).unwrap_or("").to_string()),
        "lexical_declaration" | "variable_declaration" => decl
            .named_child(0)
            .and_then(|d| d.child_by_field_name("name"))
            .map(|n| n.utf8_text(source).unwrap_or("").to_string()),
        _ => None,
    }
}
