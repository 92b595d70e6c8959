//! The single-traversal visitor. One `tree_sitter::TreeCursor` walk per
//! module; every node kind the extraction surface cares about is matched
//! once, on the way down, and dispatched to the handler module that owns
//! that family of facts. Nothing re-walks a subtree a second handler
//! already covered.

mod calls;
mod control_flow;
mod declarations;
mod flow;
mod literals;
mod variable;

use crate::extract::ExpressionEvaluator;
use grafema_core::fact::{fact_site, FactBundle, FactSite};
use grafema_core::identity::{ScopeKind, ScopeTracker};
use grafema_core::types::{Location, NodeKind};
use std::collections::HashMap;
use tree_sitter::{Node, TreeCursor};

/// Node kinds whose dispatch also pushes a function-scope frame. Kept in
/// one place since `walk` needs to know, after descending, whether to pop
/// `func_stack` as well as `scope`.
const FUNCTION_LIKE_KINDS: &[&str] = &[
    "function_declaration",
    "function",
    "function_expression",
    "generator_function",
    "generator_function_declaration",
    "arrow_function",
    "method_definition",
];

pub struct Visitor<'a> {
    pub source: &'a [u8],
    pub scope: ScopeTracker,
    pub bundle: FactBundle,
    /// Index into `bundle.functions` for the innermost function/method
    /// currently being walked, used to attribute branch/loop/throw/return
    /// facts to the right owner for control-flow metadata.
    func_stack: Vec<usize>,
    /// Per-function-index count of logical (`&&`/`||`) operators seen in
    /// its body — folded into `cyclomatic_complexity` at `finish`, not
    /// worth a dedicated fact type since nothing downstream needs a node
    /// for a logical operator by itself.
    logical_op_counts: HashMap<usize, u32>,
    /// Set by a `new Promise(executor)` constructor call just before the
    /// executor arrow/function is walked, so `handle_function` can bind it
    /// to the right `func_stack` frame. `None` for every other function.
    pending_promise_roles: Option<HashMap<String, &'static str>>,
    /// Parallel stack to `func_stack`: which bare identifiers in the
    /// current function's scope are a Promise executor's `resolve`/
    /// `reject` parameter, if any.
    promise_roles: Vec<HashMap<String, &'static str>>,
    /// Base ids of the object/array literal(s) currently being descended
    /// into, innermost last — lets a nested `spread_element` find the
    /// literal it spreads into without a second traversal.
    literal_owner_stack: Vec<String>,
    /// Base id of the nearest enclosing graph container, innermost last —
    /// MODULE at the bottom, then whatever CLASS/FUNCTION/METHOD/BRANCH/
    /// CASE/loop-`SCOPE`/TRY_BLOCK node was most recently entered. Every
    /// fact that needs a `CONTAINS`/`DECLARES`/`HAS_SCOPE` edge from its
    /// immediate parent reads `current_owner_base_id()` at emission time.
    owner_stack: Vec<String>,
}

impl<'a> Visitor<'a> {
    pub fn new(file: impl Into<String>, source: &'a [u8]) -> Self {
        let file = file.into();
        let module_owner = grafema_core::identity::module_id(&file);
        Self {
            source,
            scope: ScopeTracker::new(file.clone()),
            bundle: FactBundle::new(file),
            func_stack: Vec::new(),
            logical_op_counts: HashMap::new(),
            pending_promise_roles: None,
            promise_roles: Vec::new(),
            literal_owner_stack: Vec::new(),
            owner_stack: vec![module_owner],
        }
    }

    pub fn run(mut self, root: Node<'a>) -> FactBundle {
        let mut cursor = root.walk();
        self.walk(&mut cursor);
        self.scope.finish();
        self.finish();
        self.bundle.finalize_ids();
        self.bundle
    }

    fn walk(&mut self, cursor: &mut TreeCursor<'a>) {
        let node = cursor.node();
        let func_depth_before = self.func_stack.len();
        let literal_depth_before = self.literal_owner_stack.len();
        let owner_depth_before = self.owner_stack.len();
        let opened_scope = self.dispatch(&node);
        if let Some(owner_id) = &opened_scope {
            self.owner_stack.push(owner_id.clone());
        }

        if cursor.goto_first_child() {
            loop {
                self.walk(cursor);
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
            cursor.goto_parent();
        }

        if opened_scope.is_some() {
            self.scope.exit_scope();
        }
        self.owner_stack.truncate(owner_depth_before);
        while self.func_stack.len() > func_depth_before {
            self.func_stack.pop();
            self.promise_roles.pop();
        }
        self.literal_owner_stack.truncate(literal_depth_before);
    }

    /// Matches on a node's kind, emits whatever fact(s) it implies, and
    /// returns the base id of the container it just opened a scope for
    /// (so `walk` knows to push it onto `owner_stack` and pop both scope
    /// and owner back off once the subtree is done). `None` means no scope
    /// was opened.
    fn dispatch(&mut self, node: &Node<'a>) -> Option<String> {
        match node.kind() {
            "function_declaration" | "function" | "function_expression" | "generator_function"
            | "generator_function_declaration" => {
                Some(declarations::handle_function(self, node, false))
            }
            "arrow_function" => Some(declarations::handle_function(self, node, true)),
            "method_definition" => Some(declarations::handle_method(self, node)),
            "class_declaration" | "class" => Some(declarations::handle_class(self, node)),
            "interface_declaration" => {
                declarations::handle_interface(self, node);
                None
            }
            "type_alias_declaration" => {
                declarations::handle_type_alias(self, node);
                None
            }
            "enum_declaration" => {
                declarations::handle_enum(self, node);
                None
            }
            "decorator" => {
                declarations::handle_decorator(self, node);
                None
            }
            "import_statement" => {
                declarations::handle_import(self, node);
                None
            }
            "export_statement" => {
                declarations::handle_export(self, node);
                None
            }

            "variable_declarator" => {
                variable::handle_variable_declarator(self, node);
                None
            }
            "assignment_expression" => {
                variable::handle_assignment(self, node);
                None
            }
            "update_expression" => {
                variable::handle_update_expression(self, node);
                None
            }

            "call_expression" => {
                calls::handle_call(self, node);
                None
            }
            "new_expression" => {
                calls::handle_constructor_call(self, node);
                None
            }
            "member_expression" | "subscript_expression" => {
                calls::handle_property_access(self, node);
                None
            }

            "string" | "template_string" | "number" | "true" | "false" | "null" | "undefined" | "regex" => {
                literals::handle_literal(self, node);
                None
            }
            "object" => {
                literals::handle_object_literal(self, node);
                None
            }
            "array" => {
                literals::handle_array_literal(self, node);
                None
            }
            "spread_element" => {
                literals::handle_spread(self, node);
                None
            }

            "return_statement" => {
                flow::handle_return(self, node);
                None
            }
            "yield_expression" => {
                flow::handle_yield(self, node);
                None
            }
            "throw_statement" => {
                flow::handle_throw(self, node);
                None
            }

            "try_statement" => Some(control_flow::handle_try(self, node)),
            "if_statement" => Some(control_flow::handle_branch(self, node)),
            "switch_statement" => {
                self.scope.enter_counted_scope(ScopeKind::Switch);
                Some(self.current_owner_base_id())
            }
            "switch_case" | "switch_default" => Some(control_flow::handle_case(self, node)),
            "for_statement" | "for_in_statement" => Some(control_flow::handle_loop(self, node)),
            "while_statement" => Some(control_flow::handle_loop(self, node)),
            "do_statement" => Some(control_flow::handle_loop(self, node)),
            "binary_expression" => {
                control_flow::handle_binary(self, node);
                None
            }
            "with_statement" => {
                control_flow::handle_with_statement(self, node);
                None
            }
            "unary_expression" if node
                .child_by_field_name("operator")
                .map(|o| self.node_text(&o) == "delete")
                .unwrap_or(false) =>
            {
                control_flow::handle_delete(self, node);
                None
            }

            _ => None,
        }
    }

    pub(crate) fn location_of(&self, node: &Node) -> Location {
        let pos = node.start_position();
        Location::new(pos.row as u32 + 1, pos.column as u32)
    }

    pub(crate) fn summarize(&self, node: &Node) -> String {
        ExpressionEvaluator::summarize(node, self.source)
    }

    pub(crate) fn node_text(&self, node: &Node) -> String {
        node.utf8_text(self.source).unwrap_or("").to_string()
    }

    /// Builds a `FactSite` from the current scope context, using the
    /// scope path *before* any frame this construct itself would push —
    /// callers enter their own scope frame, if any, after calling `site`.
    pub(crate) fn site(&self, kind: NodeKind, name: &str, node: &Node, hints: impl Into<String>) -> FactSite {
        let ctx = self.scope.get_context();
        fact_site(&ctx, kind, name, self.location_of(node), hints)
    }

    /// The pre-disambiguation base id of the function/method currently
    /// being walked, if any — used to stamp `owner_base_id` on nested
    /// facts (params, branches, throws, returns, …). `GraphBuilder`
    /// recovers the final id by stripping the same disambiguator suffix
    /// `CollisionResolver` would have appended.
    pub(crate) fn current_function_base_id(&self) -> Option<String> {
        self.func_stack.last().map(|&idx| self.bundle.functions[idx].site.base_id.clone())
    }

    /// Base id of the nearest enclosing graph container — MODULE, CLASS,
    /// FUNCTION/METHOD, or a structural BRANCH/CASE/loop/TRY_BLOCK node —
    /// for the `CONTAINS`/`DECLARES`/`HAS_SCOPE` edge `GraphBuilder` draws
    /// from it to whatever fact is being emitted right now.
    pub(crate) fn current_owner_base_id(&self) -> String {
        self.owner_stack.last().cloned().unwrap_or_else(|| grafema_core::identity::module_id(&self.bundle.file))
    }

    pub(crate) fn push_function(&mut self, index: usize) {
        self.func_stack.push(index);
        self.promise_roles.push(self.pending_promise_roles.take().unwrap_or_default());
    }

    /// Queues the `resolve`/`reject` parameter-name bindings a `new
    /// Promise(executor)` call observed in its executor argument, to be
    /// claimed by the very next `handle_function`/`handle_method` call
    /// (the executor itself, visited as the constructor call's only
    /// child).
    pub(crate) fn queue_promise_roles(&mut self, roles: HashMap<String, &'static str>) {
        self.pending_promise_roles = Some(roles);
    }

    /// Whether `name` is bound to `role` (`"resolve"` or `"reject"`) as a
    /// Promise executor parameter in the currently-walked function.
    pub(crate) fn promise_role_of(&self, name: &str) -> Option<&'static str> {
        self.promise_roles.last().and_then(|m| m.get(name).copied())
    }

    pub(crate) fn push_literal_owner(&mut self, base_id: String) {
        self.literal_owner_stack.push(base_id);
    }

    pub(crate) fn current_literal_owner(&self) -> Option<&str> {
        self.literal_owner_stack.last().map(|s| s.as_str())
    }

    pub(crate) fn note_branch(&mut self) {
        if let Some(&idx) = self.func_stack.last() {
            self.bundle.functions[idx].control_flow.has_branches = true;
        }
    }

    pub(crate) fn note_loop(&mut self) {
        if let Some(&idx) = self.func_stack.last() {
            self.bundle.functions[idx].control_flow.has_loops = true;
        }
    }

    pub(crate) fn note_try_catch(&mut self) {
        if let Some(&idx) = self.func_stack.last() {
            self.bundle.functions[idx].control_flow.has_try_catch = true;
        }
    }

    pub(crate) fn note_early_return(&mut self) {
        if let Some(&idx) = self.func_stack.last() {
            self.bundle.functions[idx].control_flow.has_early_return = true;
        }
    }

    pub(crate) fn note_throw(&mut self, is_async: bool, error_class: &str) {
        if let Some(&idx) = self.func_stack.last() {
            let cf = &mut self.bundle.functions[idx].control_flow;
            cf.has_throw = true;
            let is_classified = error_class != "Unknown" && !error_class.starts_with("rethrow:");
            if is_async {
                // A `throw` inside an async function rejects the promise it
                // returns, not just a local control-flow exit — so it's
                // recorded as a rejection, matching `Promise.reject`/executor
                // `reject()` call sites.
                cf.has_async_throw = true;
                cf.can_reject = true;
                if is_classified {
                    cf.rejected_builtin_errors.push(error_class.to_string());
                }
            } else if is_classified {
                cf.thrown_builtin_errors.push(error_class.to_string());
            }
        }
    }

    pub(crate) fn note_reject(&mut self, error_class: &str) {
        if let Some(&idx) = self.func_stack.last() {
            let cf = &mut self.bundle.functions[idx].control_flow;
            cf.can_reject = true;
            if error_class != "Unknown" && !error_class.starts_with("rethrow:") {
                cf.rejected_builtin_errors.push(error_class.to_string());
            }
        }
    }

    pub(crate) fn note_logical_op(&mut self) {
        if let Some(&idx) = self.func_stack.last() {
            *self.logical_op_counts.entry(idx).or_insert(0) += 1;
        }
    }

    pub(crate) fn note_invoked_param(&mut self, index: usize, binding: &str) {
        if let Some(&func_idx) = self.func_stack.last() {
            let cf = &mut self.bundle.functions[func_idx].control_flow;
            if !cf.invokes_param_indexes.contains(&index) {
                cf.invokes_param_indexes.push(index);
                cf.invokes_param_bindings.push(binding.to_string());
            }
        }
    }

    /// Post-traversal pass: folds branch/loop/case counts
    /// gathered directly from the bundle's own vectors (filtered by
    /// `owner_base_id`) together with the logical-op counts tracked during
    /// the walk into each function's final `cyclomatic_complexity`.
    fn finish(&mut self) {
        let mut branch_counts: HashMap<String, u32> = HashMap::new();
        let mut loop_counts: HashMap<String, u32> = HashMap::new();
        let mut case_counts: HashMap<String, u32> = HashMap::new();

        for b in &self.bundle.branches {
            *branch_counts.entry(b.owner_base_id.clone()).or_insert(0) += 1;
        }
        for l in &self.bundle.loops {
            *loop_counts.entry(l.owner_base_id.clone()).or_insert(0) += 1;
        }
        for c in &self.bundle.cases {
            *case_counts.entry(c.owner_base_id.clone()).or_insert(0) += 1;
        }

        for (idx, function) in self.bundle.functions.iter_mut().enumerate() {
            let base = function.site.base_id.clone();
            let branches = *branch_counts.get(&base).unwrap_or(&0);
            let loops = *loop_counts.get(&base).unwrap_or(&0);
            let cases = *case_counts.get(&base).unwrap_or(&0);
            let logical = *self.logical_op_counts.get(&idx).unwrap_or(&0);
            function.cyclomatic_complexity = 1 + branches + loops + cases + logical;
        }
    }
}
