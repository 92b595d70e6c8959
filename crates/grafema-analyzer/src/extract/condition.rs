use super::{node_text, truncate_summary};
use tree_sitter::Node;

/// A single `if`-test constraint: `variable <op> value` (or `value` set,
/// for a merged `in`/`not_in`), plus whatever quantifier produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub variable: String,
    pub op: ConstraintOp,
    pub values: Vec<String>,
    pub negated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    StrictEq,
    StrictNeq,
    In,
    NotIn,
    Truthy,
    Falsy,
}

/// A parsed `if` test: either a single constraint, or an `And`/`Or` of
/// sub-constraints (only one level deep — the parser doesn't recurse past
/// a single layer of boolean combinators, matching the visitor's
/// single-traversal, no-backtracking design).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionExpr {
    Single(Constraint),
    And(Vec<Constraint>),
    Or(Vec<Constraint>),
    /// A condition too complex to decompose into `Constraint`s (function
    /// calls, nested member expressions, etc); only the summary text
    /// survives.
    Opaque(String),
}

/// Pulls the `test`/`condition` field out of an `if`/`while`/`for`/`switch`
/// statement and renders it as a summary. Parenthesized conditions are
/// unwrapped so `(a && b)` and `a && b` summarize identically.
pub struct ConditionParser;

impl ConditionParser {
    pub fn summarize(statement: &Node, source: &[u8]) -> Option<String> {
        let field = Self::test_field(statement)?;
        Some(Self::unwrap_parens(field, source))
    }

    fn test_field(statement: &Node) -> Option<Node<'_>> {
        statement.child_by_field_name("condition").or_else(|| statement.child_by_field_name("test"))
    }

    fn unwrap_parens(mut node: Node, source: &[u8]) -> String {
        while node.kind() == "parenthesized_expression" {
            match node.named_child(0) {
                Some(inner) => node = inner,
                None => break,
            }
        }
        truncate_summary(node_text(&node, source))
    }

    /// Parses the `if`/`while` test into a structured `ConditionExpr`,
    /// merging `x === "a" || x === "b"` (same variable, same comparison
    /// direction) into a single `In` constraint.
    pub fn parse(statement: &Node, source: &[u8]) -> Option<ConditionExpr> {
        let field = Self::test_field(statement)?;
        Some(Self::parse_expr(field, source))
    }

    fn parse_expr(node: Node, source: &[u8]) -> ConditionExpr {
        let node = Self::strip_parens(node);
        match node.kind() {
            "binary_expression" => {
                if let Some(op) = node.child_by_field_name("operator").map(|o| node_text(&o, source)) {
                    if op == "&&" || op == "||" {
                        return Self::parse_logical(&node, source, op == "||");
                    }
                }
                Self::parse_comparison(&node, source)
                    .map(ConditionExpr::Single)
                    .unwrap_or_else(|| ConditionExpr::Opaque(truncate_summary(node_text(&node, source))))
            }
            "unary_expression" => Self::parse_unary(&node, source)
                .map(ConditionExpr::Single)
                .unwrap_or_else(|| ConditionExpr::Opaque(truncate_summary(node_text(&node, source)))),
            "identifier" | "member_expression" => ConditionExpr::Single(Constraint {
                variable: truncate_summary(node_text(&node, source)),
                op: ConstraintOp::Truthy,
                values: Vec::new(),
                negated: false,
            }),
            _ => ConditionExpr::Opaque(truncate_summary(node_text(&node, source))),
        }
    }

    fn strip_parens(mut node: Node) -> Node {
        while node.kind() == "parenthesized_expression" {
            match node.named_child(0) {
                Some(inner) => node = inner,
                None => break,
            }
        }
        node
    }

    fn parse_logical(node: &Node, source: &[u8], is_or: bool) -> ConditionExpr {
        let mut leaves = Vec::new();
        Self::flatten_logical(node, source, is_or, &mut leaves);

        let all_comparisons: Option<Vec<Constraint>> =
            leaves.iter().map(|n| Self::parse_comparison(n, source)).collect();

        if let Some(constraints) = all_comparisons {
            if let Some(merged) = Self::merge_same_variable(&constraints, is_or) {
                return ConditionExpr::Single(merged);
            }
            return if is_or { ConditionExpr::Or(constraints) } else { ConditionExpr::And(constraints) };
        }
        ConditionExpr::Opaque(truncate_summary(node_text(node, source)))
    }

    /// Flattens a right-leaning chain of the same logical operator
    /// (`a || b || c` parses as `(a || b) || c` in tree-sitter's grammar)
    /// into its leaf operands.
    fn flatten_logical<'a>(node: &Node<'a>, source: &[u8], is_or: bool, out: &mut Vec<Node<'a>>) {
        let op = node.child_by_field_name("operator").map(|o| node_text(&o, source).to_string());
        let matches = op.as_deref() == Some(if is_or { "||" } else { "&&" });
        if node.kind() == "binary_expression" && matches {
            if let (Some(l), Some(r)) = (node.child_by_field_name("left"), node.child_by_field_name("right")) {
                Self::flatten_logical(&l, source, is_or, out);
                Self::flatten_logical(&r, source, is_or, out);
                return;
            }
        }
        out.push(*node);
    }

    fn parse_comparison(node: &Node, source: &[u8]) -> Option<Constraint> {
        if node.kind() == "unary_expression" {
            return Self::parse_unary(node, source);
        }
        if node.kind() != "binary_expression" {
            return None;
        }
        let op_node = node.child_by_field_name("operator")?;
        let op_text = node_text(&op_node, source);
        let left = node.child_by_field_name("left")?;
        let right = node.child_by_field_name("right")?;

        match op_text {
            "===" | "==" => Some(Constraint {
                variable: truncate_summary(node_text(&left, source)),
                op: ConstraintOp::StrictEq,
                values: vec![truncate_summary(node_text(&right, source))],
                negated: false,
            }),
            "!==" | "!=" => Some(Constraint {
                variable: truncate_summary(node_text(&left, source)),
                op: ConstraintOp::StrictNeq,
                values: vec![truncate_summary(node_text(&right, source))],
                negated: false,
            }),
            "in" => Some(Constraint {
                variable: truncate_summary(node_text(&left, source)),
                op: ConstraintOp::In,
                values: vec![truncate_summary(node_text(&right, source))],
                negated: false,
            }),
            _ => None,
        }
    }

    fn parse_unary(node: &Node, source: &[u8]) -> Option<Constraint> {
        let op = node.child_by_field_name("operator").map(|o| node_text(&o, source))?;
        if op != "!" {
            return None;
        }
        let arg = node.child_by_field_name("argument")?;
        match arg.kind() {
            "identifier" | "member_expression" => Some(Constraint {
                variable: truncate_summary(node_text(&arg, source)),
                op: ConstraintOp::Falsy,
                values: Vec::new(),
                negated: false,
            }),
            _ => Self::parse_comparison(&arg, source).map(negate_single),
        }
    }

    /// Merges `x === a || x === b || …` into `x In [a, b, …]`, and
    /// `x !== a && x !== b` into `x NotIn [a, b, …]`, when every leaf
    /// shares the same variable and comparison direction matching the
    /// combinator (`===` chains under `||`, `!==` chains under `&&`).
    fn merge_same_variable(constraints: &[Constraint], is_or: bool) -> Option<Constraint> {
        if constraints.len() < 2 {
            return None;
        }
        let variable = &constraints[0].variable;
        let wanted_op = if is_or { ConstraintOp::StrictEq } else { ConstraintOp::StrictNeq };
        let all_match = constraints.iter().all(|c| &c.variable == variable && c.op == wanted_op && c.values.len() == 1);
        if !all_match {
            return None;
        }
        let values = constraints.iter().flat_map(|c| c.values.clone()).collect();
        Some(Constraint {
            variable: variable.clone(),
            op: if is_or { ConstraintOp::In } else { ConstraintOp::NotIn },
            values,
            negated: false,
        })
    }

    /// De Morgan negation for the else-branch: `!(a && b) == !a || !b`,
    /// `!(a || b) == !a && !b`; a bare `Single`/`Opaque` negates in place.
    pub fn negate(expr: &ConditionExpr) -> ConditionExpr {
        match expr {
            ConditionExpr::Single(c) => ConditionExpr::Single(negate_single(c.clone())),
            ConditionExpr::And(cs) => ConditionExpr::Or(cs.iter().cloned().map(negate_single).collect()),
            ConditionExpr::Or(cs) => ConditionExpr::And(cs.iter().cloned().map(negate_single).collect()),
            ConditionExpr::Opaque(s) => ConditionExpr::Opaque(format!("!({s})")),
        }
    }
}

fn negate_single(c: Constraint) -> Constraint {
    let op = match c.op {
        ConstraintOp::StrictEq => ConstraintOp::StrictNeq,
        ConstraintOp::StrictNeq => ConstraintOp::StrictEq,
        ConstraintOp::In => ConstraintOp::NotIn,
        ConstraintOp::NotIn => ConstraintOp::In,
        ConstraintOp::Truthy => ConstraintOp::Falsy,
        ConstraintOp::Falsy => ConstraintOp::Truthy,
    };
    Constraint { op, negated: !c.negated, ..c }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn parse_if(src: &str) -> tree_sitter::Tree {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_javascript::LANGUAGE.into()).unwrap();
        parser.parse(src, None).unwrap()
    }

    fn if_node(tree: &tree_sitter::Tree) -> Node<'_> {
        tree.root_node().named_child(0).unwrap()
    }

    #[test]
    fn merges_or_chain_of_strict_eq_into_in() {
        let src = "if (x === \"a\" || x === \"b\") {}";
        let tree = parse_if(src);
        let node = if_node(&tree);
        let parsed = ConditionParser::parse(&node, src.as_bytes()).unwrap();
        match parsed {
            ConditionExpr::Single(c) => {
                assert_eq!(c.variable, "x");
                assert_eq!(c.op, ConstraintOp::In);
                assert_eq!(c.values, vec!["\"a\"".to_string(), "\"b\"".to_string()]);
            }
            other => panic!("expected merged In constraint, got {other:?}"),
        }
    }

    #[test]
    fn negate_applies_de_morgan_to_and() {
        let src = "if (a === 1 && b === 2) {}";
        let tree = parse_if(src);
        let node = if_node(&tree);
        let parsed = ConditionParser::parse(&node, src.as_bytes()).unwrap();
        let negated = ConditionParser::negate(&parsed);
        match negated {
            ConditionExpr::Or(cs) => {
                assert_eq!(cs.len(), 2);
                assert!(cs.iter().all(|c| c.op == ConstraintOp::StrictNeq));
            }
            other => panic!("expected Or after negating And, got {other:?}"),
        }
    }

    #[test]
    fn single_equality_constraint() {
        let src = "if (status === \"ok\") {}";
        let tree = parse_if(src);
        let node = if_node(&tree);
        let parsed = ConditionParser::parse(&node, src.as_bytes()).unwrap();
        assert_eq!(
            parsed,
            ConditionExpr::Single(Constraint {
                variable: "status".to_string(),
                op: ConstraintOp::StrictEq,
                values: vec!["\"ok\"".to_string()],
                negated: false,
            })
        );
    }

    #[test]
    fn truthy_check_on_bare_identifier() {
        let src = "if (enabled) {}";
        let tree = parse_if(src);
        let node = if_node(&tree);
        let parsed = ConditionParser::parse(&node, src.as_bytes()).unwrap();
        assert_eq!(
            parsed,
            ConditionExpr::Single(Constraint {
                variable: "enabled".to_string(),
                op: ConstraintOp::Truthy,
                values: Vec::new(),
                negated: false,
            })
        );
    }

    #[test]
    fn negated_bare_identifier_is_falsy() {
        let src = "if (!enabled) {}";
        let tree = parse_if(src);
        let node = if_node(&tree);
        let parsed = ConditionParser::parse(&node, src.as_bytes()).unwrap();
        assert_eq!(
            parsed,
            ConditionExpr::Single(Constraint {
                variable: "enabled".to_string(),
                op: ConstraintOp::Falsy,
                values: Vec::new(),
                negated: false,
            })
        );
    }
}
