//! `Orchestrator` — the single-threaded driver that owns the plugin list,
//! the `GraphBackend` reference, and walks a project root through
//! Discovery -> Indexing -> Analysis -> Enrichment -> Validation. Only the
//! Analysis phase fans out; every other phase's plugins run sequentially
//! on this thread in the order `PluginRegistry::for_phase` computes.

use crate::analysis::AstAnalysisPlugin;
use crate::context::{Plugin, PluginContext, ProgressCallback};
use crate::discovery::WorkspaceDiscoveryPlugin;
use crate::enrichment::{
    AliasTrackerPlugin, ClosureCaptureEnricherPlugin, FunctionCallResolverPlugin,
    HttpConnectionEnricherPlugin, ImportExportLinkerPlugin, InstanceOfResolverPlugin,
    MethodCallResolverPlugin, NodejsBuiltinsResolverPlugin,
};
use crate::indexing::ImportWalkIndexingPlugin;
use crate::registry::PluginRegistry;
use crate::validation::{
    BrokenImportValidatorPlugin, CallResolverValidatorPlugin, DataFlowValidatorPlugin,
    DeadCodeValidatorPlugin, EvalBanValidatorPlugin, GraphConnectivityValidatorPlugin,
    NodeCreationValidatorPlugin, ShadowingDetectorPlugin, SqlInjectionValidatorPlugin,
};
use grafema_core::config::Config;
use grafema_core::error::{GrafemaError, Result};
use grafema_core::manifest::Manifest;
use grafema_core::plugin::Phase;
use grafema_core::progress::{CancellationToken, ProgressInfo};
use grafema_core::traits::GraphBackend;
use std::path::Path;
use std::sync::Arc;

/// `run`'s options, mirroring the contract in the component design: a
/// service allow-list, a force re-analysis flag, an indexing-only
/// short-circuit, a progress callback, and a cancellation signal the caller
/// keeps a handle to so it can cancel a run already in flight.
#[derive(Default)]
pub struct Options<'a> {
    pub service_filter: Option<Vec<String>>,
    pub force: bool,
    pub index_only: bool,
    pub on_progress: Option<ProgressCallback<'a>>,
    pub cancellation: Option<CancellationToken>,
}

/// Owns the phase-ordered plugin registry and the shared `GraphBackend`
/// handle. Cheap to construct; the expensive state (worker pool, parsed
/// trees) lives for the duration of one `run` call only.
pub struct Orchestrator {
    registry: PluginRegistry,
    backend: Arc<dyn GraphBackend>,
}

impl Orchestrator {
    /// Builds an orchestrator with every built-in plugin registered — the
    /// reference pipeline described in the component design. Callers that
    /// need a custom plugin set should build a `PluginRegistry` themselves
    /// and use `with_registry`.
    pub fn new(backend: Arc<dyn GraphBackend>) -> Self {
        let mut registry = PluginRegistry::new();
        registry.register(Arc::new(WorkspaceDiscoveryPlugin));
        registry.register(Arc::new(ImportWalkIndexingPlugin));
        registry.register(Arc::new(AstAnalysisPlugin));

        registry.register(Arc::new(ImportExportLinkerPlugin));
        registry.register(Arc::new(FunctionCallResolverPlugin));
        registry.register(Arc::new(InstanceOfResolverPlugin));
        registry.register(Arc::new(MethodCallResolverPlugin));
        registry.register(Arc::new(ClosureCaptureEnricherPlugin));
        registry.register(Arc::new(AliasTrackerPlugin));
        registry.register(Arc::new(HttpConnectionEnricherPlugin));
        registry.register(Arc::new(NodejsBuiltinsResolverPlugin));

        registry.register(Arc::new(GraphConnectivityValidatorPlugin));
        registry.register(Arc::new(BrokenImportValidatorPlugin));
        registry.register(Arc::new(CallResolverValidatorPlugin));
        registry.register(Arc::new(NodeCreationValidatorPlugin));
        registry.register(Arc::new(ShadowingDetectorPlugin));
        registry.register(Arc::new(EvalBanValidatorPlugin));
        registry.register(Arc::new(SqlInjectionValidatorPlugin));
        registry.register(Arc::new(DataFlowValidatorPlugin));
        registry.register(Arc::new(DeadCodeValidatorPlugin));

        Self { registry, backend }
    }

    pub fn with_registry(registry: PluginRegistry, backend: Arc<dyn GraphBackend>) -> Self {
        Self { registry, backend }
    }

    pub fn backend(&self) -> &Arc<dyn GraphBackend> {
        &self.backend
    }

    /// Drives one full (or partial, with `index_only`) run over
    /// `project_root`. Loads configuration first — a malformed
    /// `.grafema/config.yaml` is a `ConfigError` and aborts before any phase
    /// runs, per the error taxonomy. A `force` run clears the backend
    /// before Discovery starts.
    pub async fn run(&self, project_root: &Path, options: Options<'_>) -> Result<Manifest> {
        let config = Config::load(project_root)?;
        let cancellation = options.cancellation.unwrap_or_default();
        let mut manifest = Manifest::default();

        if options.force {
            self.backend.clear().await?;
        }

        let phases: &[Phase] = if options.index_only {
            &[Phase::Discovery, Phase::Indexing]
        } else {
            &Phase::ORDER
        };

        for &phase in phases {
            if cancellation.is_cancelled() {
                manifest.cancelled = true;
                return Ok(manifest);
            }

            let plugins = self.registry.for_phase(phase)?;
            for plugin in &plugins {
                if cancellation.is_cancelled() {
                    manifest.cancelled = true;
                    return Ok(manifest);
                }

                let meta = plugin.metadata();
                let mut ctx = PluginContext {
                    backend: self.backend.as_ref(),
                    config: &config,
                    manifest: &mut manifest,
                    cancellation: &cancellation,
                    project_root,
                    on_progress: options.on_progress,
                };
                ctx.report(ProgressInfo::new(phase, format!("running {}", meta.name)).with_plugin(meta.name.clone()));

                match plugin.execute(&mut ctx).await {
                    Ok(issues) => manifest.issues.extend(issues),
                    Err(err) => {
                        if self.is_required_by_another_plugin(&meta.name) {
                            return Err(GrafemaError::Plugin {
                                plugin: meta.name.clone(),
                                message: err.to_string(),
                            });
                        }
                        manifest.push_issue(
                            grafema_core::issue::Issue::error(
                                grafema_core::issue::codes::PLUGIN_FAILED,
                                format!("{}: {err}", meta.name),
                            ),
                        );
                    }
                }
            }

            if phase == Phase::Discovery {
                if let Some(filter) = &options.service_filter {
                    manifest.services.retain(|s| filter.contains(&s.name));
                }
            }
        }

        Ok(manifest)
    }

    fn is_required_by_another_plugin(&self, name: &str) -> bool {
        self.registry.all().iter().any(|p| p.metadata().dependencies.iter().any(|d| d == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use grafema_core::issue::Issue;
    use grafema_core::plugin::PluginMetadata;
    use grafema_graph::InMemoryGraphBackend;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn full_run_over_a_tiny_project_produces_functions_and_calls() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/index.ts"), "function a(){ b(); } function b(){}").unwrap();

        let backend: Arc<dyn GraphBackend> = Arc::new(InMemoryGraphBackend::new());
        let orchestrator = Orchestrator::new(backend.clone());
        let manifest = orchestrator.run(dir.path(), Options::default()).await.unwrap();

        assert!(!manifest.cancelled);
        assert_eq!(manifest.services.len(), 1);
        assert_eq!(backend.count_nodes_by_type(None).await.unwrap().get(&grafema_core::types::NodeKind::Function).copied().unwrap_or(0), 2);
    }

    #[tokio::test]
    async fn index_only_stops_before_analysis() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/index.ts"), "function a(){}").unwrap();

        let backend: Arc<dyn GraphBackend> = Arc::new(InMemoryGraphBackend::new());
        let orchestrator = Orchestrator::new(backend.clone());
        orchestrator
            .run(dir.path(), Options { index_only: true, ..Default::default() })
            .await
            .unwrap();

        assert_eq!(backend.count_nodes_by_type(None).await.unwrap().get(&grafema_core::types::NodeKind::Function).copied().unwrap_or(0), 0);
    }

    #[tokio::test]
    async fn malformed_config_aborts_before_any_phase() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".grafema")).unwrap();
        fs::write(dir.path().join(".grafema/config.yaml"), "services: [this is not valid").unwrap();

        let backend: Arc<dyn GraphBackend> = Arc::new(InMemoryGraphBackend::new());
        let orchestrator = Orchestrator::new(backend);
        let err = orchestrator.run(dir.path(), Options::default()).await.unwrap_err();
        assert!(matches!(err, GrafemaError::Yaml(_) | GrafemaError::Config(_)));
    }

    #[tokio::test]
    async fn cancellation_before_any_plugin_runs_returns_a_cancelled_manifest() {
        let dir = TempDir::new().unwrap();
        let backend: Arc<dyn GraphBackend> = Arc::new(InMemoryGraphBackend::new());
        let orchestrator = Orchestrator::new(backend);
        let token = CancellationToken::new();
        token.cancel();
        let manifest = orchestrator
            .run(dir.path(), Options { cancellation: Some(token), ..Default::default() })
            .await
            .unwrap();
        assert!(manifest.cancelled);
        assert!(manifest.services.is_empty());
    }

    #[tokio::test]
    async fn service_filter_restricts_discovered_services() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".grafema")).unwrap();
        fs::write(
            dir.path().join(".grafema/config.yaml"),
            "services:\n  - name: api\n    path: api\n    entrypoints: [index.ts]\n  - name: worker\n    path: worker\n    entrypoints: [index.ts]\n",
        )
        .unwrap();

        let backend: Arc<dyn GraphBackend> = Arc::new(InMemoryGraphBackend::new());
        let orchestrator = Orchestrator::new(backend);
        let manifest = orchestrator
            .run(
                dir.path(),
                Options { service_filter: Some(vec!["api".to_string()]), index_only: true, ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(manifest.services.len(), 1);
        assert_eq!(manifest.services[0].name, "api");
    }

    struct RequiredAndMissingDep;

    #[async_trait]
    impl Plugin for RequiredAndMissingDep {
        fn metadata(&self) -> PluginMetadata {
            PluginMetadata::new("flaky", Phase::Validation, 100)
        }
        async fn execute(&self, _ctx: &mut PluginContext<'_>) -> Result<Vec<Issue>> {
            Err(GrafemaError::Plugin { plugin: "flaky".to_string(), message: "boom".to_string() })
        }
    }

    struct DependsOnFlaky;

    #[async_trait]
    impl Plugin for DependsOnFlaky {
        fn metadata(&self) -> PluginMetadata {
            PluginMetadata::new("depends_on_flaky", Phase::Validation, 1).depends_on(["flaky"])
        }
        async fn execute(&self, _ctx: &mut PluginContext<'_>) -> Result<Vec<Issue>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn plugin_error_aborts_when_a_dependent_plugin_requires_it() {
        let mut registry = PluginRegistry::new();
        registry.register(Arc::new(RequiredAndMissingDep));
        registry.register(Arc::new(DependsOnFlaky));
        let backend: Arc<dyn GraphBackend> = Arc::new(InMemoryGraphBackend::new());
        let orchestrator = Orchestrator::with_registry(registry, backend);

        let dir = TempDir::new().unwrap();
        let err = orchestrator.run(dir.path(), Options::default()).await.unwrap_err();
        assert!(matches!(err, GrafemaError::Plugin { .. }));
    }

    struct UnrequiredFlaky;

    #[async_trait]
    impl Plugin for UnrequiredFlaky {
        fn metadata(&self) -> PluginMetadata {
            PluginMetadata::new("standalone_flaky", Phase::Validation, 100)
        }
        async fn execute(&self, _ctx: &mut PluginContext<'_>) -> Result<Vec<Issue>> {
            Err(GrafemaError::Plugin { plugin: "standalone_flaky".to_string(), message: "boom".to_string() })
        }
    }

    #[tokio::test]
    async fn plugin_error_becomes_an_issue_when_nothing_depends_on_it() {
        let mut registry = PluginRegistry::new();
        registry.register(Arc::new(UnrequiredFlaky));
        let backend: Arc<dyn GraphBackend> = Arc::new(InMemoryGraphBackend::new());
        let orchestrator = Orchestrator::with_registry(registry, backend);

        let dir = TempDir::new().unwrap();
        let manifest = orchestrator.run(dir.path(), Options::default()).await.unwrap();
        assert!(manifest.issues.iter().any(|i| i.code == grafema_core::issue::codes::PLUGIN_FAILED));
    }
}
