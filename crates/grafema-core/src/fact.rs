//! The fact vocabulary produced by a single module traversal. A worker never touches the graph backend directly — it
//! walks one file's AST once, emits a `FactBundle`, and hands it back over
//! the MPMC channel. `GraphBuilder` (in `grafema-graph`) is the only
//! consumer that turns facts into `GraphNode`/`GraphEdge` pairs.

use crate::identity::ScopeContext;
use crate::types::Location;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Base positional/identity data shared by every fact kind. `scope`
/// captures the path the semantic id is derived from; `base_id`/`hints`
/// are handed to the `CollisionResolver` once the whole module is walked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactSite {
    pub file: String,
    pub scope: Vec<String>,
    pub location: Location,
    pub base_id: String,
    pub hints: String,
}

/// Control-flow metadata attached to a function fact after its subtree has
/// been fully walked. Populated by the post-traversal pass in
/// `Visitor::finish`, not at the point the function itself is visited,
/// since branch/loop/throw counts aren't known until the body is done.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControlFlowMetadata {
    pub has_branches: bool,
    pub has_loops: bool,
    pub has_try_catch: bool,
    pub has_early_return: bool,
    pub has_throw: bool,
    pub can_reject: bool,
    pub has_async_throw: bool,
    pub rejected_builtin_errors: Vec<String>,
    pub thrown_builtin_errors: Vec<String>,
    pub invokes_param_indexes: Vec<usize>,
    pub invokes_param_bindings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionFact {
    pub site: FactSite,
    /// Base id (pre-disambiguation) of whatever directly contains this
    /// declaration — MODULE, a CLASS, or an enclosing FUNCTION/METHOD for a
    /// nested function expression. Resolved to a final id by `GraphBuilder`
    /// the same way every other `owner_base_id` is.
    pub owner_base_id: String,
    pub name: String,
    pub is_async: bool,
    pub is_generator: bool,
    pub is_arrow: bool,
    pub is_method: bool,
    pub param_count: usize,
    pub cyclomatic_complexity: u32,
    #[serde(default)]
    pub control_flow: ControlFlowMetadata,
    /// True for an ambient declaration with no body (`declare function f(): void;`,
    /// a `.d.ts` overload signature) — distinguishes an overload signature from
    /// its implementation for `HAS_OVERLOAD`/`IMPLEMENTS_OVERLOAD`.
    #[serde(default)]
    pub is_signature: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterFact {
    pub site: FactSite,
    pub owner_base_id: String,
    pub name: String,
    pub position: usize,
    pub has_default: bool,
    pub is_rest: bool,
    pub destructured_from: Option<String>,
    pub default_value_summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeFact {
    pub site: FactSite,
    pub kind: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableDeclarationKind {
    Var,
    Let,
    Const,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableFact {
    pub site: FactSite,
    pub owner_base_id: String,
    pub name: String,
    pub decl_kind: VariableDeclarationKind,
    pub initializer_summary: Option<String>,
    pub destructured_from: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentFact {
    pub site: FactSite,
    pub owner_base_id: String,
    pub target_name: String,
    pub source_summary: String,
    pub is_compound: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallFact {
    pub site: FactSite,
    pub owner_base_id: String,
    pub callee_name: String,
    pub callee_summary: String,
    pub argument_count: usize,
    pub has_callback_argument: bool,
    pub is_awaited: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodCallFact {
    pub site: FactSite,
    pub owner_base_id: String,
    pub receiver_summary: String,
    pub method_name: String,
    pub argument_count: usize,
    pub is_chained: bool,
    pub is_awaited: bool,
    /// True when the method is `bind`/`call`/`apply` and the first argument
    /// is a bare `this` expression, for `BINDS_THIS_TO`.
    #[serde(default)]
    pub binds_this: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructorCallFact {
    pub site: FactSite,
    pub owner_base_id: String,
    pub class_name: String,
    pub argument_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyAccessFact {
    pub site: FactSite,
    pub owner_base_id: String,
    pub receiver_summary: String,
    pub property_name: String,
    pub is_computed: bool,
    pub is_optional_chained: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiteralKind {
    String,
    Number,
    Boolean,
    Null,
    Undefined,
    Regex,
    Template,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiteralFact {
    pub site: FactSite,
    pub owner_base_id: String,
    pub kind: LiteralKind,
    pub raw_preview: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectLiteralFact {
    pub site: FactSite,
    pub owner_base_id: String,
    pub property_names: Vec<String>,
    pub has_spread: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayLiteralFact {
    pub site: FactSite,
    pub owner_base_id: String,
    pub element_count: usize,
    pub has_spread: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnFact {
    pub site: FactSite,
    /// Nearest enclosing FUNCTION/METHOD, for the `RETURNS` edge and the
    /// complexity/control-flow bucketing in `Visitor::finish`.
    pub owner_base_id: String,
    /// Nearest enclosing structural container (could be a `BRANCH`/`CASE`/
    /// loop `SCOPE`/`TRY_BLOCK` rather than the function itself), for the
    /// `CONTAINS` edge `GraphBuilder` emits.
    pub container_base_id: String,
    pub expression_summary: Option<String>,
    pub is_implicit_undefined: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YieldFact {
    pub site: FactSite,
    pub owner_base_id: String,
    pub container_base_id: String,
    pub is_delegating: bool,
    pub expression_summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrowFact {
    pub site: FactSite,
    pub owner_base_id: String,
    pub container_base_id: String,
    pub error_class: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectFact {
    pub site: FactSite,
    pub owner_base_id: String,
    pub container_base_id: String,
    pub error_class: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TryCatchFact {
    pub owner_base_id: String,
    pub container_base_id: String,
    pub try_site: FactSite,
    pub catch_site: Option<FactSite>,
    pub catch_param: Option<String>,
    pub finally_site: Option<FactSite>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchFact {
    pub site: FactSite,
    pub owner_base_id: String,
    pub container_base_id: String,
    pub condition_summary: String,
    pub has_else: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseFact {
    pub site: FactSite,
    pub owner_base_id: String,
    pub container_base_id: String,
    pub test_summary: Option<String>,
    pub is_default: bool,
    pub falls_through: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopKind {
    For,
    ForIn,
    ForOf,
    While,
    DoWhile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopFact {
    pub site: FactSite,
    pub owner_base_id: String,
    pub container_base_id: String,
    pub kind: LoopKind,
    pub condition_summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassFact {
    pub site: FactSite,
    pub owner_base_id: String,
    pub name: String,
    pub superclass_name: Option<String>,
    pub interface_names: Vec<String>,
    pub is_abstract: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceFact {
    pub site: FactSite,
    pub owner_base_id: String,
    pub name: String,
    pub extends_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeAliasFact {
    pub site: FactSite,
    pub owner_base_id: String,
    pub name: String,
    pub is_union: bool,
    pub is_intersection: bool,
    pub member_summaries: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumFact {
    pub site: FactSite,
    pub owner_base_id: String,
    pub name: String,
    pub member_names: Vec<String>,
    pub is_const: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoratorFact {
    pub site: FactSite,
    pub name: String,
    pub target_base_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportFact {
    pub site: FactSite,
    pub owner_base_id: String,
    pub specifier: String,
    pub imported_names: Vec<String>,
    pub is_default: bool,
    pub is_namespace: bool,
    pub is_type_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportFact {
    pub site: FactSite,
    pub owner_base_id: String,
    pub exported_name: String,
    pub is_default: bool,
    pub is_re_export: bool,
    pub source_specifier: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventListenerFact {
    pub site: FactSite,
    pub owner_base_id: String,
    pub event_name: String,
    pub target_summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateExpressionFact {
    pub site: FactSite,
    pub owner_base_id: String,
    pub target_name: String,
    pub operator: String,
    pub is_prefix: bool,
}

/// A destructuring pattern flattened into its individual bindings by the
/// destructuring tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestructuringFact {
    pub site: FactSite,
    pub owner_base_id: String,
    pub source_summary: String,
    pub bindings: Vec<DestructuredBinding>,
    pub has_rest: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestructuredBinding {
    pub name: String,
    pub source_path: String,
    pub has_default: bool,
}

/// A miscellaneous graph edge a handler wants to emit directly rather than
/// through a dedicated fact/builder pair (e.g. `SHADOWS`, `MERGES_WITH`).
/// Kept narrow and explicit rather than a generic bag, per the Edge-closure
/// invariant: both endpoints are always base ids the resolver can map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiscEdgeFact {
    pub kind: crate::types::EdgeKind,
    pub src_base_id: String,
    pub dst_base_id: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// A type annotation on a parameter, variable or function return position.
/// Resolved in `GraphBuilder`'s misc pass since the annotated type may name
/// a class/interface/type-alias declared anywhere in the module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeAnnotationFact {
    pub owner_base_id: String,
    pub annotation_summary: String,
    pub is_return: bool,
}

/// A generic type parameter's `extends` constraint (`<T extends Base>`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeConstraintFact {
    pub owner_base_id: String,
    pub constraint_summary: String,
}

/// A legacy `with (expr) { ... }` statement, for `EXTENDS_SCOPE_WITH`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithStatementFact {
    pub container_base_id: String,
    pub target_summary: String,
}

/// Everything one worker produces for one file. `GraphBuilder::buffer`
/// consumes a `FactBundle` and stages the nodes/edges it implies; nothing
/// is written to the backend until `flush`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactBundle {
    pub file: String,
    pub functions: Vec<FunctionFact>,
    pub parameters: Vec<ParameterFact>,
    pub scopes: Vec<ScopeFact>,
    pub variables: Vec<VariableFact>,
    pub assignments: Vec<AssignmentFact>,
    pub calls: Vec<CallFact>,
    pub method_calls: Vec<MethodCallFact>,
    pub constructor_calls: Vec<ConstructorCallFact>,
    pub property_accesses: Vec<PropertyAccessFact>,
    pub literals: Vec<LiteralFact>,
    pub object_literals: Vec<ObjectLiteralFact>,
    pub array_literals: Vec<ArrayLiteralFact>,
    pub returns: Vec<ReturnFact>,
    pub yields: Vec<YieldFact>,
    pub throws: Vec<ThrowFact>,
    pub rejects: Vec<RejectFact>,
    pub try_catches: Vec<TryCatchFact>,
    pub branches: Vec<BranchFact>,
    pub cases: Vec<CaseFact>,
    pub loops: Vec<LoopFact>,
    pub classes: Vec<ClassFact>,
    pub interfaces: Vec<InterfaceFact>,
    pub type_aliases: Vec<TypeAliasFact>,
    pub enums: Vec<EnumFact>,
    pub decorators: Vec<DecoratorFact>,
    pub imports: Vec<ImportFact>,
    pub exports: Vec<ExportFact>,
    pub event_listeners: Vec<EventListenerFact>,
    pub update_expressions: Vec<UpdateExpressionFact>,
    pub destructurings: Vec<DestructuringFact>,
    pub misc_edges: Vec<MiscEdgeFact>,
    pub type_annotations: Vec<TypeAnnotationFact>,
    pub type_constraints: Vec<TypeConstraintFact>,
    pub with_statements: Vec<WithStatementFact>,
}

impl FactBundle {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Default::default()
        }
    }

    /// Every `FactSite` in the bundle, in a stable (field-declaration)
    /// order. Called twice by the post-traversal id resolution pass: once
    /// to stage `(base_id, hints)` pairs with the `CollisionResolver`, once
    /// more to write the resolved ids back — the two calls must see the
    /// same order, which holds as long as nothing mutates the bundle's
    /// vector lengths in between.
    pub fn all_sites_mut(&mut self) -> Vec<&mut FactSite> {
        let mut sites = Vec::new();
        sites.extend(self.functions.iter_mut().map(|f| &mut f.site));
        sites.extend(self.parameters.iter_mut().map(|f| &mut f.site));
        sites.extend(self.scopes.iter_mut().map(|f| &mut f.site));
        sites.extend(self.variables.iter_mut().map(|f| &mut f.site));
        sites.extend(self.assignments.iter_mut().map(|f| &mut f.site));
        sites.extend(self.calls.iter_mut().map(|f| &mut f.site));
        sites.extend(self.method_calls.iter_mut().map(|f| &mut f.site));
        sites.extend(self.constructor_calls.iter_mut().map(|f| &mut f.site));
        sites.extend(self.property_accesses.iter_mut().map(|f| &mut f.site));
        sites.extend(self.literals.iter_mut().map(|f| &mut f.site));
        sites.extend(self.object_literals.iter_mut().map(|f| &mut f.site));
        sites.extend(self.array_literals.iter_mut().map(|f| &mut f.site));
        sites.extend(self.returns.iter_mut().map(|f| &mut f.site));
        sites.extend(self.yields.iter_mut().map(|f| &mut f.site));
        sites.extend(self.throws.iter_mut().map(|f| &mut f.site));
        sites.extend(self.rejects.iter_mut().map(|f| &mut f.site));
        for f in self.try_catches.iter_mut() {
            sites.push(&mut f.try_site);
            if let Some(s) = f.catch_site.as_mut() {
                sites.push(s);
            }
            if let Some(s) = f.finally_site.as_mut() {
                sites.push(s);
            }
        }
        sites.extend(self.branches.iter_mut().map(|f| &mut f.site));
        sites.extend(self.cases.iter_mut().map(|f| &mut f.site));
        sites.extend(self.loops.iter_mut().map(|f| &mut f.site));
        sites.extend(self.classes.iter_mut().map(|f| &mut f.site));
        sites.extend(self.interfaces.iter_mut().map(|f| &mut f.site));
        sites.extend(self.type_aliases.iter_mut().map(|f| &mut f.site));
        sites.extend(self.enums.iter_mut().map(|f| &mut f.site));
        sites.extend(self.decorators.iter_mut().map(|f| &mut f.site));
        sites.extend(self.imports.iter_mut().map(|f| &mut f.site));
        sites.extend(self.exports.iter_mut().map(|f| &mut f.site));
        sites.extend(self.event_listeners.iter_mut().map(|f| &mut f.site));
        sites.extend(self.update_expressions.iter_mut().map(|f| &mut f.site));
        sites.extend(self.destructurings.iter_mut().map(|f| &mut f.site));
        sites
    }

    /// Read-only counterpart of `all_sites_mut`, same order. Used after
    /// finalization by `GraphBuilder` to build the base-id -> final-id index
    /// that resolves every `owner_base_id`/`target_base_id` reference.
    pub fn all_sites(&self) -> Vec<&FactSite> {
        let mut sites = Vec::new();
        sites.extend(self.functions.iter().map(|f| &f.site));
        sites.extend(self.parameters.iter().map(|f| &f.site));
        sites.extend(self.scopes.iter().map(|f| &f.site));
        sites.extend(self.variables.iter().map(|f| &f.site));
        sites.extend(self.assignments.iter().map(|f| &f.site));
        sites.extend(self.calls.iter().map(|f| &f.site));
        sites.extend(self.method_calls.iter().map(|f| &f.site));
        sites.extend(self.constructor_calls.iter().map(|f| &f.site));
        sites.extend(self.property_accesses.iter().map(|f| &f.site));
        sites.extend(self.literals.iter().map(|f| &f.site));
        sites.extend(self.object_literals.iter().map(|f| &f.site));
        sites.extend(self.array_literals.iter().map(|f| &f.site));
        sites.extend(self.returns.iter().map(|f| &f.site));
        sites.extend(self.yields.iter().map(|f| &f.site));
        sites.extend(self.throws.iter().map(|f| &f.site));
        sites.extend(self.rejects.iter().map(|f| &f.site));
        for f in self.try_catches.iter() {
            sites.push(&f.try_site);
            if let Some(s) = f.catch_site.as_ref() {
                sites.push(s);
            }
            if let Some(s) = f.finally_site.as_ref() {
                sites.push(s);
            }
        }
        sites.extend(self.branches.iter().map(|f| &f.site));
        sites.extend(self.cases.iter().map(|f| &f.site));
        sites.extend(self.loops.iter().map(|f| &f.site));
        sites.extend(self.classes.iter().map(|f| &f.site));
        sites.extend(self.interfaces.iter().map(|f| &f.site));
        sites.extend(self.type_aliases.iter().map(|f| &f.site));
        sites.extend(self.enums.iter().map(|f| &f.site));
        sites.extend(self.decorators.iter().map(|f| &f.site));
        sites.extend(self.imports.iter().map(|f| &f.site));
        sites.extend(self.exports.iter().map(|f| &f.site));
        sites.extend(self.event_listeners.iter().map(|f| &f.site));
        sites.extend(self.update_expressions.iter().map(|f| &f.site));
        sites.extend(self.destructurings.iter().map(|f| &f.site));
        sites
    }

    /// Builds the base-id -> final-id lookup `GraphBuilder` uses to resolve
    /// every `owner_base_id`/`target_base_id` captured mid-traversal, before
    /// `finalize_ids` overwrote each site's own `base_id` with its final,
    /// possibly disambiguated, id. First insertion wins a collision, matching
    /// `CollisionResolver`'s insertion-order ordinal tiebreak.
    pub fn owner_index(&self) -> HashMap<String, String> {
        let mut index = HashMap::new();
        for site in self.all_sites() {
            let base = crate::identity::strip_disambiguator(&site.base_id).to_string();
            index.entry(base).or_insert_with(|| site.base_id.clone());
        }
        index
    }

    /// Runs every staged `FactSite` through a `CollisionResolver` and
    /// writes the disambiguated ids back in place. Called once, after the
    /// whole module has been traversed.
    pub fn finalize_ids(&mut self) {
        let mut resolver = crate::identity::CollisionResolver::new();
        let tokens: Vec<usize> = self
            .all_sites_mut()
            .into_iter()
            .map(|site| resolver.push(site.base_id.clone(), site.hints.clone()))
            .collect();
        let resolved = resolver.resolve();
        for (site, token) in self.all_sites_mut().into_iter().zip(tokens) {
            site.base_id = resolved[token].clone();
        }
    }
}

/// Builds a `FactSite` from the tracker's current context plus a resolved
/// disambiguation hint string; every handler funnels through this so
/// `base_id`/`hints` stay consistent with `identity::semantic_id`.
pub fn fact_site(ctx: &ScopeContext, kind: crate::types::NodeKind, name: &str, location: Location, hints: impl Into<String>) -> FactSite {
    FactSite {
        file: ctx.file.clone(),
        scope: ctx.scope_path.clone(),
        location,
        base_id: crate::identity::base_id(&ctx.file, &ctx.scope_path, kind, name),
        hints: hints.into(),
    }
}
