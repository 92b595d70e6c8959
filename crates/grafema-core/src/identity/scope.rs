use std::collections::HashMap;

/// The scope frame kinds tracked during AST traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Module,
    Function,
    Class,
    Method,
    Try,
    Catch,
    Finally,
    IfStatement,
    ElseStatement,
    Switch,
    Case,
    For,
    While,
    DoWhile,
    Closure,
}

impl ScopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeKind::Module => "module",
            ScopeKind::Function => "function",
            ScopeKind::Class => "class",
            ScopeKind::Method => "method",
            ScopeKind::Try => "try",
            ScopeKind::Catch => "catch",
            ScopeKind::Finally => "finally",
            ScopeKind::IfStatement => "if_statement",
            ScopeKind::ElseStatement => "else_statement",
            ScopeKind::Switch => "switch",
            ScopeKind::Case => "case",
            ScopeKind::For => "for",
            ScopeKind::While => "while",
            ScopeKind::DoWhile => "do_while",
            ScopeKind::Closure => "closure",
        }
    }

    /// Named scopes derive their segment from the construct's own name
    /// (`function[foo]`); structural scopes are always anonymous and
    /// ordinal-counted (`if_statement[0]`).
    fn is_named(&self) -> bool {
        matches!(
            self,
            ScopeKind::Module | ScopeKind::Function | ScopeKind::Class | ScopeKind::Method | ScopeKind::Closure
        )
    }
}

#[derive(Debug, Clone)]
struct ScopeFrame {
    kind: ScopeKind,
    segment: String,
    child_counters: HashMap<ScopeKind, u32>,
}

/// Full positional context for the current point in the traversal: the
/// file being analysed plus the ordered scope path from the module root.
#[derive(Debug, Clone)]
pub struct ScopeContext {
    pub file: String,
    pub scope_path: Vec<String>,
}

/// A stack of scope frames maintained during a single module's AST
/// traversal. `enter_scope`/`exit_scope` must balance exactly —
/// `ScopeTracker::finish` panics in debug builds if they don't, since an
/// imbalance means a handler bug, not a recoverable analysis error.
pub struct ScopeTracker {
    file: String,
    stack: Vec<ScopeFrame>,
    item_counters: HashMap<String, u32>,
}

impl ScopeTracker {
    pub fn new(file: impl Into<String>) -> Self {
        let file = file.into();
        let module_frame = ScopeFrame {
            kind: ScopeKind::Module,
            segment: "module".to_string(),
            child_counters: HashMap::new(),
        };
        Self {
            file,
            stack: vec![module_frame],
            item_counters: HashMap::new(),
        }
    }

    /// Enters a named scope (function/class/method/closure). `name` is
    /// empty for anonymous function expressions, in which case an ordinal
    /// is derived the same way counted scopes get one.
    pub fn enter_scope(&mut self, name: &str, kind: ScopeKind) {
        let segment = if kind.is_named() && !name.is_empty() {
            format!("{}[{}]", kind.as_str(), name)
        } else {
            let ordinal = self.bump_child_counter(kind);
            format!("{}[{}]", kind.as_str(), ordinal)
        };
        self.stack.push(ScopeFrame {
            kind,
            segment,
            child_counters: HashMap::new(),
        });
    }

    /// Enters a structural scope (branch/loop/try/catch/…) whose segment is
    /// always an auto-derived ordinal within the parent frame.
    pub fn enter_counted_scope(&mut self, kind: ScopeKind) {
        self.enter_scope("", kind);
    }

    pub fn exit_scope(&mut self) {
        debug_assert!(self.stack.len() > 1, "exit_scope called without a matching enter_scope");
        self.stack.pop();
    }

    /// Current depth, including the module frame. Used to assert scope
    /// balance at the end of a module's traversal.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn get_context(&self) -> ScopeContext {
        ScopeContext {
            file: self.file.clone(),
            scope_path: self.stack.iter().map(|f| f.segment.clone()).collect(),
        }
    }

    pub fn current_kind(&self) -> ScopeKind {
        self.stack.last().expect("scope stack is never empty").kind
    }

    /// Monotonically increasing counter per (current scope path, key),
    /// e.g. used for naming anonymous object/array literals.
    pub fn get_item_counter(&mut self, key: &str) -> u32 {
        let full_key = format!("{}|{}", self.get_context().scope_path.join("->"), key);
        let counter = self.item_counters.entry(full_key).or_insert(0);
        let value = *counter;
        *counter += 1;
        value
    }

    fn bump_child_counter(&mut self, kind: ScopeKind) -> u32 {
        let parent = self.stack.last_mut().expect("scope stack is never empty");
        let counter = parent.child_counters.entry(kind).or_insert(0);
        let value = *counter;
        *counter += 1;
        value
    }

    /// Asserts the scope stack returned to just the module frame. Called by
    /// the analyzer after a module's traversal completes.
    pub fn finish(&self) {
        assert_eq!(
            self.stack.len(),
            1,
            "scope stack not balanced for {}: {} frames remain",
            self.file,
            self.stack.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_frame_is_the_root_segment() {
        let tracker = ScopeTracker::new("a.ts");
        assert_eq!(tracker.get_context().scope_path, vec!["module".to_string()]);
    }

    #[test]
    fn named_function_scope_uses_its_name() {
        let mut tracker = ScopeTracker::new("a.ts");
        tracker.enter_scope("foo", ScopeKind::Function);
        assert_eq!(
            tracker.get_context().scope_path,
            vec!["module".to_string(), "function[foo]".to_string()]
        );
        tracker.exit_scope();
        tracker.finish();
    }

    #[test]
    fn sibling_if_statements_get_distinct_ordinals() {
        let mut tracker = ScopeTracker::new("a.ts");
        tracker.enter_counted_scope(ScopeKind::IfStatement);
        tracker.exit_scope();
        tracker.enter_counted_scope(ScopeKind::IfStatement);
        let ctx = tracker.get_context();
        assert_eq!(ctx.scope_path.last().unwrap(), "if_statement[1]");
        tracker.exit_scope();
        tracker.finish();
    }

    #[test]
    fn item_counter_is_scoped_to_current_path() {
        let mut tracker = ScopeTracker::new("a.ts");
        assert_eq!(tracker.get_item_counter("object_literal"), 0);
        assert_eq!(tracker.get_item_counter("object_literal"), 1);
        tracker.enter_scope("foo", ScopeKind::Function);
        assert_eq!(tracker.get_item_counter("object_literal"), 0);
        tracker.exit_scope();
        tracker.finish();
    }

    #[test]
    #[should_panic]
    fn unbalanced_scope_stack_panics_on_finish() {
        let mut tracker = ScopeTracker::new("a.ts");
        tracker.enter_scope("foo", ScopeKind::Function);
        tracker.finish();
    }
}
