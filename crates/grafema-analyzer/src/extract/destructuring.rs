use super::node_text;
use grafema_core::fact::DestructuredBinding;
use tree_sitter::Node;

/// Flattens an `object_pattern`/`array_pattern` into its individual leaf
/// bindings, recording each one's source path (`a.b[0]`-style) so the
/// Destructuring-completeness invariant — every bound name reachable from
/// a single destructuring has its own fact — holds even for nested
/// patterns.
pub struct DestructuringExtractor;

impl DestructuringExtractor {
    pub fn flatten(pattern: &Node, source: &[u8]) -> (Vec<DestructuredBinding>, bool) {
        let mut bindings = Vec::new();
        let mut has_rest = false;
        Self::walk(pattern, source, "", &mut bindings, &mut has_rest);
        (bindings, has_rest)
    }

    fn walk(node: &Node, source: &[u8], path_prefix: &str, out: &mut Vec<DestructuredBinding>, has_rest: &mut bool) {
        match node.kind() {
            "object_pattern" => {
                for child in node.named_children(&mut node.walk()) {
                    Self::walk_object_entry(&child, source, path_prefix, out, has_rest);
                }
            }
            "array_pattern" => {
                for (idx, child) in node.named_children(&mut node.walk()).enumerate() {
                    let path = format!("{path_prefix}[{idx}]");
                    Self::walk_array_entry(&child, source, &path, out, has_rest);
                }
            }
            "identifier" | "shorthand_property_identifier_pattern" => {
                out.push(DestructuredBinding {
                    name: node_text(node, source).to_string(),
                    source_path: if path_prefix.is_empty() {
                        node_text(node, source).to_string()
                    } else {
                        path_prefix.to_string()
                    },
                    has_default: false,
                });
            }
            _ => {}
        }
    }

    fn walk_object_entry(node: &Node, source: &[u8], path_prefix: &str, out: &mut Vec<DestructuredBinding>, has_rest: &mut bool) {
        match node.kind() {
            "rest_pattern" => *has_rest = true,
            "pair_pattern" => {
                let key = node
                    .child_by_field_name("key")
                    .map(|k| node_text(&k, source).to_string())
                    .unwrap_or_default();
                let path = if path_prefix.is_empty() { key.clone() } else { format!("{path_prefix}.{key}") };
                if let Some(value) = node.child_by_field_name("value") {
                    Self::walk_with_default(&value, source, &path, out, has_rest);
                }
            }
            "shorthand_property_identifier_pattern" => {
                let name = node_text(node, source).to_string();
                let path = if path_prefix.is_empty() { name.clone() } else { format!("{path_prefix}.{name}") };
                out.push(DestructuredBinding { name, source_path: path, has_default: false });
            }
            _ => Self::walk(node, source, path_prefix, out, has_rest),
        }
    }

    fn walk_array_entry(node: &Node, source: &[u8], path: &str, out: &mut Vec<DestructuredBinding>, has_rest: &mut bool) {
        if node.kind() == "rest_pattern" {
            *has_rest = true;
            return;
        }
        Self::walk_with_default(node, source, path, out, has_rest);
    }

    fn walk_with_default(node: &Node, source: &[u8], path: &str, out: &mut Vec<DestructuredBinding>, has_rest: &mut bool) {
        if node.kind() == "assignment_pattern" {
            if let Some(left) = node.child_by_field_name("left") {
                let before = out.len();
                Self::walk(&left, source, path, out, has_rest);
                for binding in &mut out[before..] {
                    binding.has_default = true;
                }
            }
        } else {
            Self::walk(node, source, path, out, has_rest);
        }
    }
}
