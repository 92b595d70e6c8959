//! Enrichment phase: every plugin here runs after Analysis has populated
//! the graph module-by-module, and exists to resolve relationships that
//! only make sense once every module is visible at once — cross-module
//! imports/exports, calls into another file, inferred instance types,
//! closures over an outer scope, and the handful of well-known runtime
//! surfaces (Node.js builtins, outbound HTTP) no single module's AST can
//! reveal on its own.

mod alias_tracker;
mod closure_capture;
mod function_call_resolver;
mod http_connection;
mod import_export_linker;
mod instanceof_resolver;
mod method_call_resolver;
mod nodejs_builtins;

pub use alias_tracker::AliasTrackerPlugin;
pub use closure_capture::ClosureCaptureEnricherPlugin;
pub use function_call_resolver::FunctionCallResolverPlugin;
pub use http_connection::HttpConnectionEnricherPlugin;
pub use import_export_linker::ImportExportLinkerPlugin;
pub use instanceof_resolver::InstanceOfResolverPlugin;
pub use method_call_resolver::MethodCallResolverPlugin;
pub use nodejs_builtins::NodejsBuiltinsResolverPlugin;
