//! `GraphBuilder` — turns one module's finalized `FactBundle` into staged
//! `GraphNode`/`GraphEdge` pairs, then commits them to a `GraphBackend`.
//!
//! Every `owner_base_id`/`container_base_id`/`target_base_id` a fact
//! carries is a *pre-disambiguation* base id (or the module's own
//! never-disambiguated `module_id(file)` string). `resolve` is the single
//! rule every sub-builder uses to turn such a reference into the final,
//! possibly disambiguated, id: look the stripped base up in the bundle's
//! `owner_index`, falling back to the raw string when it isn't present
//! there (always true for a `module_id`, never present as a fact site).

mod assignment;
mod core;
mod misc;
mod returns;

use grafema_core::edge::GraphEdge;
use grafema_core::error::Result;
use grafema_core::fact::FactBundle;
use grafema_core::identity::{module_id, strip_disambiguator};
use grafema_core::issue::Issue;
use grafema_core::node::GraphNode;
use grafema_core::traits::GraphBackend;
use grafema_core::types::{EdgeKind, NodeKind};
use std::collections::HashMap;

pub(crate) fn resolve(index: &HashMap<String, String>, raw: &str) -> String {
    index.get(strip_disambiguator(raw)).cloned().unwrap_or_else(|| raw.to_string())
}

/// Per-bundle state threaded through every sub-builder: the finalized
/// bundle itself, the base-id -> final-id resolution index, and the
/// accumulators each sub-builder appends to.
pub(crate) struct Ctx<'a> {
    pub bundle: &'a FactBundle,
    pub index: HashMap<String, String>,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub issues: Vec<Issue>,
}

impl<'a> Ctx<'a> {
    fn resolve(&self, raw: &str) -> String {
        resolve(&self.index, raw)
    }

    fn push_node(&mut self, node: GraphNode) {
        self.nodes.push(node);
    }

    fn push_edge(&mut self, kind: EdgeKind, src: impl Into<String>, dst: impl Into<String>) {
        self.edges.push(GraphEdge::new(kind, src, dst));
    }

    fn contains(&mut self, owner: &str, child: &str) {
        self.push_edge(EdgeKind::Contains, owner.to_string(), child.to_string());
    }

    fn declares(&mut self, owner: &str, child: &str) {
        self.push_edge(EdgeKind::Declares, owner.to_string(), child.to_string());
    }

    fn warn_unresolved(&mut self, kind: EdgeKind, file: &str, name: &str) {
        self.issues.push(
            Issue::warning(
                "WARN_UNRESOLVED_EDGE_TARGET",
                format!("could not resolve {kind} target `{name}` in {file}"),
            )
            .with_file(file.to_string()),
        );
    }
}

/// Accumulates staged nodes/edges/issues across every module buffered
/// since the last `flush`. Not `Send`-shared itself — the Orchestrator
/// owns one per analysis run on its own thread.
#[derive(Default)]
pub struct GraphBuilder {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    issues: Vec<Issue>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages the module node plus every node/edge implied by `bundle`.
    /// Call once per successfully analyzed module; corrupt bundles are the
    /// caller's problem to have already turned into an `AnalysisError`.
    pub fn buffer(&mut self, bundle: &FactBundle) {
        let mod_id = module_id(&bundle.file);
        self.nodes.push(GraphNode::new(mod_id.clone(), NodeKind::Module, bundle.file.clone()).with_file(bundle.file.clone()));

        let mut ctx = Ctx {
            index: bundle.owner_index(),
            bundle,
            nodes: Vec::new(),
            edges: Vec::new(),
            issues: Vec::new(),
        };

        core::build(&mut ctx);
        assignment::build(&mut ctx);
        returns::build(&mut ctx);
        misc::build(&mut ctx);

        self.nodes.append(&mut ctx.nodes);
        self.edges.append(&mut ctx.edges);
        self.issues.append(&mut ctx.issues);
    }

    /// Diagnostics accumulated by every `buffer` call since construction or
    /// the last drain. The Orchestrator folds these into the run's
    /// `Manifest`.
    pub fn take_issues(&mut self) -> Vec<Issue> {
        std::mem::take(&mut self.issues)
    }

    pub fn staged_node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn staged_edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Commits every staged node and edge to `backend` and clears the
    /// buffer. Nodes are written first so `add_edges`'s endpoint
    /// validation (when not skipped) sees every node this flush
    /// introduces.
    pub async fn flush(&mut self, backend: &dyn GraphBackend) -> Result<()> {
        let nodes = std::mem::take(&mut self.nodes);
        let edges = std::mem::take(&mut self.edges);
        backend.add_nodes(nodes).await?;
        backend.add_edges(edges, true).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryGraphBackend;
    use grafema_analyzer::ModuleAnalyzer;
    use grafema_core::types::Language;

    fn analyze(src: &str) -> FactBundle {
        ModuleAnalyzer::new().analyze_source("a.ts", src.as_bytes(), Language::TypeScript).unwrap()
    }

    #[tokio::test]
    async fn simple_call_scenario_produces_contains_and_calls_edges() {
        let bundle = analyze("function a(){ b(); }  function b(){}");
        let mut builder = GraphBuilder::new();
        builder.buffer(&bundle);
        let backend = InMemoryGraphBackend::new();
        builder.flush(&backend).await.unwrap();

        assert_eq!(backend.find_by_type(NodeKind::Function).await.unwrap().len(), 2);
        let calls = backend.find_by_type(NodeKind::Call).await.unwrap();
        assert_eq!(calls.len(), 1);
        let out = backend.get_outgoing_edges(&calls[0].id, Some(&[EdgeKind::Calls])).await.unwrap();
        assert_eq!(out.len(), 1);
    }

    #[tokio::test]
    async fn module_contains_top_level_function() {
        let bundle = analyze("function a(){}");
        let mut builder = GraphBuilder::new();
        builder.buffer(&bundle);
        let backend = InMemoryGraphBackend::new();
        builder.flush(&backend).await.unwrap();

        let module = backend.find_by_type(NodeKind::Module).await.unwrap();
        assert_eq!(module.len(), 1);
        let out = backend.get_outgoing_edges(&module[0].id, Some(&[EdgeKind::Contains])).await.unwrap();
        assert!(out.iter().any(|e| e.dst.contains("FUNCTION")));
    }

    #[tokio::test]
    async fn subclass_method_overrides_parent_method() {
        let bundle = analyze("class A { greet(){} } class B extends A { greet(){} }");
        let mut builder = GraphBuilder::new();
        builder.buffer(&bundle);
        let backend = InMemoryGraphBackend::new();
        builder.flush(&backend).await.unwrap();

        let edges = backend.count_edges_by_type(Some(&[EdgeKind::Overrides])).await.unwrap();
        assert_eq!(*edges.get(&EdgeKind::Overrides).unwrap_or(&0), 1);
    }

    #[tokio::test]
    async fn ambient_signature_and_implementation_link_overload_edges() {
        let bundle = analyze("function f(a: string): void; function f(a: number): void; function f(a: any): void { }");
        let mut builder = GraphBuilder::new();
        builder.buffer(&bundle);
        let backend = InMemoryGraphBackend::new();
        builder.flush(&backend).await.unwrap();

        let has_overload = backend.count_edges_by_type(Some(&[EdgeKind::HasOverload])).await.unwrap();
        assert_eq!(*has_overload.get(&EdgeKind::HasOverload).unwrap_or(&0), 1);
        let implements = backend.count_edges_by_type(Some(&[EdgeKind::ImplementsOverload])).await.unwrap();
        assert_eq!(*implements.get(&EdgeKind::ImplementsOverload).unwrap_or(&0), 2);
    }

    #[tokio::test]
    async fn calling_a_callback_parameter_invokes_it() {
        let bundle = analyze("function runner(cb){ cb(); }");
        let mut builder = GraphBuilder::new();
        builder.buffer(&bundle);
        let backend = InMemoryGraphBackend::new();
        builder.flush(&backend).await.unwrap();

        let invokes = backend.count_edges_by_type(Some(&[EdgeKind::Invokes])).await.unwrap();
        assert_eq!(*invokes.get(&EdgeKind::Invokes).unwrap_or(&0), 1);
    }

    #[tokio::test]
    async fn bind_this_call_produces_binds_this_to_edge() {
        let bundle = analyze("class Widget { setup(){ this.handler = this.handler.bind(this); } }");
        let mut builder = GraphBuilder::new();
        builder.buffer(&bundle);
        let backend = InMemoryGraphBackend::new();
        builder.flush(&backend).await.unwrap();

        let edges = backend.count_edges_by_type(Some(&[EdgeKind::BindsThisTo])).await.unwrap();
        assert_eq!(*edges.get(&EdgeKind::BindsThisTo).unwrap_or(&0), 1);
    }

    #[tokio::test]
    async fn underscore_prefixed_property_access_is_private() {
        let bundle = analyze("class Widget { touch(){ return this._cache; } }");
        let mut builder = GraphBuilder::new();
        builder.buffer(&bundle);
        let backend = InMemoryGraphBackend::new();
        builder.flush(&backend).await.unwrap();

        let edges = backend.count_edges_by_type(Some(&[EdgeKind::AccessesPrivate])).await.unwrap();
        assert_eq!(*edges.get(&EdgeKind::AccessesPrivate).unwrap_or(&0), 1);
    }

    #[tokio::test]
    async fn inner_binding_shadows_outer_same_name_binding() {
        let bundle = analyze("function outer(){ let x = 1; function inner(){ let x = 2; return x; } }");
        let mut builder = GraphBuilder::new();
        builder.buffer(&bundle);
        let backend = InMemoryGraphBackend::new();
        builder.flush(&backend).await.unwrap();

        let edges = backend.count_edges_by_type(Some(&[EdgeKind::Shadows])).await.unwrap();
        assert_eq!(*edges.get(&EdgeKind::Shadows).unwrap_or(&0), 1);
    }

    #[tokio::test]
    async fn spreading_two_sources_into_one_object_merges_them() {
        let bundle = analyze("function combine(a, b){ return { ...a, ...b }; }");
        let mut builder = GraphBuilder::new();
        builder.buffer(&bundle);
        let backend = InMemoryGraphBackend::new();
        builder.flush(&backend).await.unwrap();

        let edges = backend.count_edges_by_type(Some(&[EdgeKind::MergesWith])).await.unwrap();
        assert_eq!(*edges.get(&EdgeKind::MergesWith).unwrap_or(&0), 2);
    }

    #[tokio::test]
    async fn plain_type_alias_aliases_its_single_target() {
        let bundle = analyze("class Base {} type Name = Base;");
        let mut builder = GraphBuilder::new();
        builder.buffer(&bundle);
        let backend = InMemoryGraphBackend::new();
        builder.flush(&backend).await.unwrap();

        let edges = backend.count_edges_by_type(Some(&[EdgeKind::Aliases])).await.unwrap();
        assert_eq!(*edges.get(&EdgeKind::Aliases).unwrap_or(&0), 1);
    }

    #[tokio::test]
    async fn parameter_type_annotation_produces_has_type_edge() {
        let bundle = analyze("class Base {} function f(x: Base){}");
        let mut builder = GraphBuilder::new();
        builder.buffer(&bundle);
        let backend = InMemoryGraphBackend::new();
        builder.flush(&backend).await.unwrap();

        let edges = backend.count_edges_by_type(Some(&[EdgeKind::HasType])).await.unwrap();
        assert_eq!(*edges.get(&EdgeKind::HasType).unwrap_or(&0), 1);
    }

    #[tokio::test]
    async fn return_type_annotation_produces_returns_type_edge() {
        let bundle = analyze("class Base {} function f(): Base { return new Base(); }");
        let mut builder = GraphBuilder::new();
        builder.buffer(&bundle);
        let backend = InMemoryGraphBackend::new();
        builder.flush(&backend).await.unwrap();

        let edges = backend.count_edges_by_type(Some(&[EdgeKind::ReturnsType])).await.unwrap();
        assert_eq!(*edges.get(&EdgeKind::ReturnsType).unwrap_or(&0), 1);
    }

    #[tokio::test]
    async fn generic_constraint_produces_constrained_by_edge() {
        let bundle = analyze("class Base {} class Box<T extends Base> {}");
        let mut builder = GraphBuilder::new();
        builder.buffer(&bundle);
        let backend = InMemoryGraphBackend::new();
        builder.flush(&backend).await.unwrap();

        let edges = backend.count_edges_by_type(Some(&[EdgeKind::ConstrainedBy])).await.unwrap();
        assert_eq!(*edges.get(&EdgeKind::ConstrainedBy).unwrap_or(&0), 1);
    }

    #[tokio::test]
    async fn with_statement_extends_scope_with_its_object() {
        let bundle = analyze("function f(config){ with (config) { } }");
        let mut builder = GraphBuilder::new();
        builder.buffer(&bundle);
        let backend = InMemoryGraphBackend::new();
        builder.flush(&backend).await.unwrap();

        let edges = backend.count_edges_by_type(Some(&[EdgeKind::ExtendsScopeWith])).await.unwrap();
        assert_eq!(*edges.get(&EdgeKind::ExtendsScopeWith).unwrap_or(&0), 1);
    }

    #[tokio::test]
    async fn object_destructuring_scenario_produces_assigned_from_and_derives_from_edges() {
        // Scenario 2: `const { x } = obj;` -> VARIABLE x, EXPRESSION obj.x,
        // `x ASSIGNED_FROM <expr>`, `<expr> DERIVES_FROM obj`.
        let bundle = analyze("function f(obj){ const { x } = obj; }");
        let mut builder = GraphBuilder::new();
        builder.buffer(&bundle);
        let backend = InMemoryGraphBackend::new();
        builder.flush(&backend).await.unwrap();

        let variables = backend.find_by_type(NodeKind::Variable).await.unwrap();
        let x = variables.iter().find(|n| n.name == "x").expect("VARIABLE x");

        let assigned_from = backend.get_outgoing_edges(&x.id, Some(&[EdgeKind::AssignedFrom])).await.unwrap();
        assert_eq!(assigned_from.len(), 1);
        let expr_id = &assigned_from[0].dst;

        let expr_node = backend.get_node(expr_id).await.unwrap().expect("EXPRESSION node for obj.x");
        assert_eq!(expr_node.kind, NodeKind::Expression);
        assert_eq!(expr_node.name, "obj.x");

        let derives_from = backend.get_outgoing_edges(expr_id, Some(&[EdgeKind::DerivesFrom])).await.unwrap();
        assert_eq!(derives_from.len(), 1);

        let params = backend.find_by_type(NodeKind::Parameter).await.unwrap();
        let obj = params.iter().find(|n| n.name == "obj").expect("PARAMETER obj");
        assert_eq!(derives_from[0].dst, obj.id);
    }

    #[tokio::test]
    async fn loop_scope_has_scope_edge_from_enclosing_function() {
        let bundle = analyze("function f(xs){ for (const x of xs) { g(x); } }");
        let mut builder = GraphBuilder::new();
        builder.buffer(&bundle);
        let backend = InMemoryGraphBackend::new();
        builder.flush(&backend).await.unwrap();

        let funcs = backend.find_by_type(NodeKind::Function).await.unwrap();
        let f = funcs.iter().find(|n| n.name == "f").expect("FUNCTION f");
        let scopes = backend.find_by_type(NodeKind::Scope).await.unwrap();
        assert_eq!(scopes.len(), 1);

        let out = backend.get_outgoing_edges(&f.id, Some(&[EdgeKind::HasScope])).await.unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].dst, scopes[0].id);

        // CONTAINS still points at the immediate lexical container too.
        let contains = backend.get_outgoing_edges(&f.id, Some(&[EdgeKind::Contains])).await.unwrap();
        assert!(contains.iter().any(|e| e.dst == scopes[0].id));
    }

    #[tokio::test]
    async fn property_access_on_receiver_produces_uses_edge_from_owning_function() {
        let bundle = analyze("function f(obj){ return obj.x; }");
        let mut builder = GraphBuilder::new();
        builder.buffer(&bundle);
        let backend = InMemoryGraphBackend::new();
        builder.flush(&backend).await.unwrap();

        let funcs = backend.find_by_type(NodeKind::Function).await.unwrap();
        let f = funcs.iter().find(|n| n.name == "f").expect("FUNCTION f");
        let params = backend.find_by_type(NodeKind::Parameter).await.unwrap();
        let obj = params.iter().find(|n| n.name == "obj").expect("PARAMETER obj");

        let uses = backend.get_outgoing_edges(&f.id, Some(&[EdgeKind::Uses])).await.unwrap();
        assert_eq!(uses.len(), 1);
        assert_eq!(uses[0].dst, obj.id);
    }

    #[tokio::test]
    async fn this_property_access_produces_uses_edge_to_enclosing_class() {
        let bundle = analyze("class A { greet(){ return this.name; } }");
        let mut builder = GraphBuilder::new();
        builder.buffer(&bundle);
        let backend = InMemoryGraphBackend::new();
        builder.flush(&backend).await.unwrap();

        let methods = backend.find_by_type(NodeKind::Method).await.unwrap();
        let greet = methods.iter().find(|n| n.name == "greet").expect("METHOD greet");
        let classes = backend.find_by_type(NodeKind::Class).await.unwrap();
        let a = classes.iter().find(|n| n.name == "A").expect("CLASS A");

        let uses = backend.get_outgoing_edges(&greet.id, Some(&[EdgeKind::Uses])).await.unwrap();
        assert_eq!(uses.len(), 1);
        assert_eq!(uses[0].dst, a.id);
    }
}
