use super::node_text;
use grafema_core::fact::{AssignmentFact, VariableFact};
use tree_sitter::Node;

/// Maximum number of assignment hops the micro-trace will follow before
/// giving up. Keeps the trace intraprocedural and bounded, per the
/// micro-trace-soundness invariant — it never walks the whole module.
const MAX_TRACE_DEPTH: usize = 8;

/// Result of tracing a thrown/rejected value back to the constructor that
/// produced it. `trace_path` records every identifier hop taken to reach
/// `error_class`; it is empty when the argument was a direct `new X(...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceResult {
    pub error_class: String,
    pub trace_path: Vec<String>,
}

impl TraceResult {
    fn direct(class: impl Into<String>) -> Self {
        TraceResult { error_class: class.into(), trace_path: Vec::new() }
    }

    fn unknown() -> Self {
        Self::direct("Unknown")
    }
}

/// Classifies a `throw`/`.reject(...)` argument into the error class it
/// constructs — but only when a concrete constructor call (found directly
/// or via a bounded chain of simple assignments) justifies the
/// classification. A thrown value is classified as `"Unknown"` rather than
/// guessed at whenever no traceable `new X(...)` backs it, so the fact
/// never claims more certainty than the AST actually gives it.
pub struct MicroTraceToErrorClass;

impl MicroTraceToErrorClass {
    /// Direct classification of a single AST node, with no variable trace.
    /// Used where the caller has no fact context to trace through (tests,
    /// or call sites analyzed before any variables are known).
    pub fn classify(argument: &Node, source: &[u8]) -> String {
        Self::classify_node(argument, source).error_class
    }

    fn classify_node(argument: &Node, source: &[u8]) -> TraceResult {
        match argument.kind() {
            "new_expression" => argument
                .child_by_field_name("constructor")
                .map(|c| TraceResult::direct(node_text(&c, source)))
                .unwrap_or_else(TraceResult::unknown),
            "identifier" => TraceResult {
                error_class: "Unknown".to_string(),
                trace_path: vec![node_text(argument, source).to_string()],
            },
            _ => TraceResult::unknown(),
        }
    }

    /// Full micro-trace: classifies `argument` directly when it is a `new
    /// X(...)` expression; when it is a bare identifier (a rethrow or a
    /// `reject(err)`), follows prior simple assignments to that name —
    /// `const err = new TypeError(...)`, then possibly `err2 = err` — up to
    /// `MAX_TRACE_DEPTH` hops, recovering the constructor at the root of
    /// the chain.
    pub fn trace(
        argument: &Node,
        source: &[u8],
        variables: &[VariableFact],
        assignments: &[AssignmentFact],
    ) -> TraceResult {
        let direct = Self::classify_node(argument, source);
        if direct.error_class != "Unknown" {
            return direct;
        }
        let Some(start) = direct.trace_path.first().cloned() else { return direct };

        let mut path = Vec::new();
        let mut current = start;
        for _ in 0..MAX_TRACE_DEPTH {
            path.push(current.clone());

            if let Some(class) = Self::init_hint_class(&current, variables) {
                return TraceResult { error_class: class, trace_path: path };
            }
            match Self::next_hop(&current, variables, assignments) {
                Some(next) if !path.contains(&next) => current = next,
                _ => break,
            }
        }
        TraceResult { error_class: "Unknown".to_string(), trace_path: path }
    }

    /// If `name`'s most recent declaration initializes it directly with
    /// `new X(...)`, returns `X`.
    fn init_hint_class(name: &str, variables: &[VariableFact]) -> Option<String> {
        let decl = variables.iter().rev().find(|v| v.name == name)?;
        let summary = decl.initializer_summary.as_deref()?.trim();
        let rest = summary.strip_prefix("new ")?;
        let ctor_end = rest.find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.')).unwrap_or(rest.len());
        let ctor = &rest[..ctor_end];
        if ctor.is_empty() { None } else { Some(ctor.to_string()) }
    }

    /// Follows one assignment hop: if `name` was last reassigned to another
    /// bare identifier (`b = a;`) or declared with one as its initializer
    /// (`const b = a;`), returns that identifier.
    fn next_hop(name: &str, variables: &[VariableFact], assignments: &[AssignmentFact]) -> Option<String> {
        if let Some(a) = assignments.iter().rev().find(|a| a.target_name == name) {
            let src = a.source_summary.trim();
            if is_plain_identifier(src) {
                return Some(src.to_string());
            }
            return None;
        }
        let decl = variables.iter().rev().find(|v| v.name == name)?;
        let init = decl.initializer_summary.as_deref()?.trim();
        is_plain_identifier(init).then(|| init.to_string())
    }
}

fn is_plain_identifier(text: &str) -> bool {
    !text.is_empty() && text.chars().enumerate().all(|(i, c)| {
        if i == 0 { c.is_alphabetic() || c == '_' || c == '$' } else { c.is_alphanumeric() || c == '_' || c == '$' }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use grafema_core::fact::{FactSite, VariableDeclarationKind};
    use grafema_core::types::Location;
    use tree_sitter::Parser;

    fn parse(src: &str) -> tree_sitter::Tree {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_javascript::LANGUAGE.into()).unwrap();
        parser.parse(src, None).unwrap()
    }

    fn dummy_site() -> FactSite {
        FactSite {
            file: String::new(),
            scope: Vec::new(),
            location: Location::new(0, 0),
            base_id: String::new(),
            hints: String::new(),
        }
    }

    #[test]
    fn classifies_new_expression_by_constructor_name() {
        let src = "throw new TypeError('bad');";
        let tree = parse(src);
        let root = tree.root_node();
        let throw_stmt = root.named_child(0).unwrap();
        let arg = throw_stmt.named_child(0).unwrap();
        assert_eq!(MicroTraceToErrorClass::classify(&arg, src.as_bytes()), "TypeError");
    }

    #[test]
    fn unclassifiable_argument_is_unknown() {
        let src = "throw 'plain string';";
        let tree = parse(src);
        let root = tree.root_node();
        let throw_stmt = root.named_child(0).unwrap();
        let arg = throw_stmt.named_child(0).unwrap();
        assert_eq!(MicroTraceToErrorClass::classify(&arg, src.as_bytes()), "Unknown");
    }

    #[test]
    fn traces_rethrow_through_prior_declaration() {
        let src = "const err = new RangeError('e'); throw err;";
        let tree = parse(src);
        let root = tree.root_node();
        let throw_stmt = root.named_child(1).unwrap();
        let arg = throw_stmt.named_child(0).unwrap();

        let variables = vec![VariableFact {
            site: dummy_site(),
            owner_base_id: String::new(),
            name: "err".to_string(),
            decl_kind: VariableDeclarationKind::Const,
            initializer_summary: Some("new RangeError('e')".to_string()),
            destructured_from: None,
        }];

        let result = MicroTraceToErrorClass::trace(&arg, src.as_bytes(), &variables, &[]);
        assert_eq!(result.error_class, "RangeError");
        assert_eq!(result.trace_path, vec!["err".to_string()]);
    }

    #[test]
    fn traces_through_an_alias_hop() {
        let src = "const e = new TypeError('x'); const alias = e; throw alias;";
        let tree = parse(src);
        let root = tree.root_node();
        let throw_stmt = root.named_child(2).unwrap();
        let arg = throw_stmt.named_child(0).unwrap();

        let variables = vec![
            VariableFact {
                site: dummy_site(),
                owner_base_id: String::new(),
                name: "e".to_string(),
                decl_kind: VariableDeclarationKind::Const,
                initializer_summary: Some("new TypeError('x')".to_string()),
                destructured_from: None,
            },
            VariableFact {
                site: dummy_site(),
                owner_base_id: String::new(),
                name: "alias".to_string(),
                decl_kind: VariableDeclarationKind::Const,
                initializer_summary: Some("e".to_string()),
                destructured_from: None,
            },
        ];

        let result = MicroTraceToErrorClass::trace(&arg, src.as_bytes(), &variables, &[]);
        assert_eq!(result.error_class, "TypeError");
        assert_eq!(result.trace_path, vec!["alias".to_string(), "e".to_string()]);
    }

    #[test]
    fn unresolvable_identifier_stays_unknown_with_path() {
        let src = "throw maybeError;";
        let tree = parse(src);
        let root = tree.root_node();
        let throw_stmt = root.named_child(0).unwrap();
        let arg = throw_stmt.named_child(0).unwrap();

        let result = MicroTraceToErrorClass::trace(&arg, src.as_bytes(), &[], &[]);
        assert_eq!(result.error_class, "Unknown");
        assert_eq!(result.trace_path, vec!["maybeError".to_string()]);
    }
}
