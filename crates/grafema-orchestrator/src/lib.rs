//! Wires the five fixed phases together: a `PluginRegistry` per phase,
//! the built-in plugins registered into it, and the `Orchestrator` that
//! drives a `GraphBackend` through Discovery -> Indexing -> Analysis ->
//! Enrichment -> Validation for a project root.

mod analysis;
mod context;
mod discovery;
mod enrichment;
mod imports;
mod indexing;
mod orchestrator;
mod pool;
mod registry;
mod validation;
mod workspace;

pub use context::{Plugin, PluginContext, PluginOutput, ProgressCallback};
pub use orchestrator::{Options, Orchestrator};
pub use registry::PluginRegistry;

pub use analysis::AstAnalysisPlugin;
pub use discovery::WorkspaceDiscoveryPlugin;
pub use indexing::ImportWalkIndexingPlugin;

pub use enrichment::{
    AliasTrackerPlugin, ClosureCaptureEnricherPlugin, FunctionCallResolverPlugin,
    HttpConnectionEnricherPlugin, ImportExportLinkerPlugin, InstanceOfResolverPlugin,
    MethodCallResolverPlugin, NodejsBuiltinsResolverPlugin,
};

pub use validation::{
    BrokenImportValidatorPlugin, CallResolverValidatorPlugin, DataFlowValidatorPlugin,
    DeadCodeValidatorPlugin, EvalBanValidatorPlugin, GraphConnectivityValidatorPlugin,
    NodeCreationValidatorPlugin, ShadowingDetectorPlugin, SqlInjectionValidatorPlugin,
};
