//! Single-traversal tree-sitter AST visitor and fact extraction.
//! `ModuleAnalyzer` is the crate's one public entry point: a worker in
//! `grafema-orchestrator` calls `analyze_source`/`analyze_file` once per
//! module and gets back an immutable `FactBundle`, never touching the
//! graph backend itself.

pub mod extract;
pub mod handlers;
pub mod language;

use grafema_core::error::{GrafemaError, Result};
use grafema_core::fact::FactBundle;
use grafema_core::types::Language;
use handlers::Visitor;
use language::LanguageRegistry;

/// Parses one file and runs the composed visitor over it. Stateless and
/// cheap to construct — the `LanguageRegistry` it wraps only builds
/// `tree_sitter::Parser`s on demand, one per call, since a `Parser` is
/// mutable, single-use-per-parse state that a worker thread owns for the
/// lifetime of one `analyze` call and no longer.
#[derive(Default)]
pub struct ModuleAnalyzer {
    languages: LanguageRegistry,
}

impl ModuleAnalyzer {
    pub fn new() -> Self {
        Self { languages: LanguageRegistry::new() }
    }

    /// Detects the language from `file`'s extension, reads it, and analyzes
    /// it. A `FileAccessError` on read failure, a `LanguageError` if the
    /// extension isn't recognised or the parser reports a hard failure —
    /// both are per-module errors the Orchestrator records as an `Issue`
    /// and the module is skipped.
    pub fn analyze_file(&self, file: &str) -> Result<FactBundle> {
        let source = std::fs::read(file).map_err(|e| GrafemaError::FileAccess {
            file: file.to_string(),
            source: e,
        })?;
        let language = self.languages.detect_language(file).ok_or_else(|| GrafemaError::Language {
            file: file.to_string(),
            message: "no grammar registered for this file extension".to_string(),
        })?;
        self.analyze_source(file, &source, language)
    }

    /// Analyzes source already in memory (used by tests, and by workers
    /// that read the file themselves to attribute I/O errors separately
    /// from parse errors).
    pub fn analyze_source(&self, file: &str, source: &[u8], language: Language) -> Result<FactBundle> {
        if !self.languages.has_full_surface(&language) {
            // Discovery-only language: the Indexing phase already walked
            // this file's imports for MODULE/DEPENDS_ON edges. The common
            // JS/TS surface is the only one this crate runs the full
            // single-traversal visitor over; an empty
            // bundle here is a deliberate no-op, not a failure.
            return Ok(FactBundle::new(file.to_string()));
        }

        let mut parser = self
            .languages
            .create_parser(&language)
            .ok_or_else(|| GrafemaError::Language { file: file.to_string(), message: "failed to construct parser".to_string() })?;

        let tree = parser.parse(source, None).ok_or_else(|| GrafemaError::Language {
            file: file.to_string(),
            message: "tree-sitter returned no tree".to_string(),
        })?;

        let root = tree.root_node();
        if root.has_error() {
            // Tree-sitter is error-tolerant: a malformed file still yields a
            // tree with ERROR nodes rather than failing outright. We still
            // extract what we can rather than discarding the whole module —
            // a syntax error in one function shouldn't blind the analyzer to
            // every sibling declaration — but record this for callers that
            // want to treat partial parses as an issue upstream.
            tracing::warn!(file, "tree-sitter parse produced error nodes; extracting partial facts");
        }

        let visitor = Visitor::new(file.to_string(), source);
        Ok(visitor.run(root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grafema_core::types::{EdgeKind, NodeKind};

    fn analyze(src: &str) -> FactBundle {
        ModuleAnalyzer::new()
            .analyze_source("a.ts", src.as_bytes(), Language::TypeScript)
            .expect("analysis should succeed")
    }

    #[test]
    fn simple_call_scenario() {
        // calling into another function
        let bundle = analyze("function a(){ b(); }  function b(){}");
        assert_eq!(bundle.functions.len(), 2);
        assert_eq!(bundle.functions[0].name, "a");
        assert_eq!(bundle.functions[1].name, "b");
        assert_eq!(bundle.calls.len(), 1);
        assert_eq!(bundle.calls[0].callee_name, "b");
        assert_eq!(bundle.calls[0].owner_base_id, bundle.functions[0].site.base_id);
    }

    #[test]
    fn object_destructuring_scenario() {
        // destructuring a variable declaration; the graph-level
        // ASSIGNED_FROM/DERIVES_FROM edges this fact feeds are covered by
        // `grafema_graph::builder::tests::object_destructuring_scenario_produces_assigned_from_and_derives_from_edges`.
        let bundle = analyze("const { x } = obj;");
        assert_eq!(bundle.variables.len(), 1);
        assert_eq!(bundle.variables[0].name, "x");
        assert_eq!(bundle.variables[0].destructured_from.as_deref(), Some("x"));
        assert_eq!(bundle.variables[0].initializer_summary.as_deref(), Some("obj"));
    }

    #[test]
    fn async_rejection_scenario() {
        // an async function rejecting via a thrown builtin error
        let bundle = analyze("async function f(){ if (bad) throw new TypeError(\"x\"); }");
        let f = &bundle.functions[0];
        assert!(f.control_flow.can_reject);
        assert_eq!(f.control_flow.rejected_builtin_errors, vec!["TypeError".to_string()]);
        assert_eq!(f.control_flow.thrown_builtin_errors, Vec::<String>::new());
        assert!(f.control_flow.has_async_throw);
        assert_eq!(f.cyclomatic_complexity, 2);
    }

    #[test]
    fn promise_executor_scenario() {
        // a Promise executor rejecting explicitly
        let bundle = analyze("function f(){ return new Promise((res, rej) => { rej(new RangeError(\"e\")); }); }");
        assert_eq!(bundle.constructor_calls[0].class_name, "Promise");
        assert_eq!(bundle.rejects.len(), 1);
        assert_eq!(bundle.rejects[0].error_class, "RangeError");
    }

    #[test]
    fn method_chain_scenario() {
        // a chained method call
        let bundle = analyze("a.b().c();");
        assert_eq!(bundle.method_calls.len(), 2);
        assert_eq!(bundle.method_calls[0].method_name, "b");
        assert_eq!(bundle.method_calls[1].method_name, "c");
        assert!(bundle.method_calls[1].is_chained);
    }

    #[test]
    fn scope_stack_is_balanced_after_analysis() {
        let bundle = analyze(
            "function outer() { if (x) { for (const i of xs) { try { y(); } catch (e) { z(); } } } }",
        );
        assert_eq!(bundle.functions.len(), 1);
        assert_eq!(bundle.branches.len(), 1);
        assert_eq!(bundle.loops.len(), 1);
        assert_eq!(bundle.try_catches.len(), 1);
    }

    #[test]
    fn ids_are_deterministic_across_runs() {
        let src = "function a(){ const x = 1; function a(){ const x = 2; } }";
        let b1 = analyze(src);
        let b2 = analyze(src);
        let ids1: Vec<_> = b1.all_sites().iter().map(|s| s.base_id.clone()).collect();
        let ids2: Vec<_> = b2.all_sites().iter().map(|s| s.base_id.clone()).collect();
        assert_eq!(ids1, ids2);
    }

    #[test]
    fn non_full_surface_language_yields_empty_bundle() {
        let bundle = ModuleAnalyzer::new()
            .analyze_source("a.py", b"def f():\n    pass\n", Language::Python)
            .unwrap();
        assert!(bundle.functions.is_empty());
    }

    #[test]
    fn unknown_extension_is_a_language_error() {
        let err = ModuleAnalyzer::new().analyze_file("does/not/exist.md");
        assert!(matches!(err, Err(GrafemaError::Language { .. })));
    }

    #[test]
    fn misc_edge_kinds_stay_within_the_closed_enum() {
        let bundle = analyze("function f(o){ delete o.x; }");
        assert!(bundle.misc_edges.iter().any(|e| e.kind == EdgeKind::Deletes));
        assert_eq!(bundle.functions[0].cyclomatic_complexity, 1);
        let _ = NodeKind::Function;
    }
}
