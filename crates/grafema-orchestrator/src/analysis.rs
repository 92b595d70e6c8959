//! Analysis phase: parses every MODULE the Indexing
//! phase emitted, extracts a fact bundle per module, and hands each bundle
//! to `GraphBuilder`. Runs on the worker pool when `config.analysis.
//! parallel.enabled`; otherwise runs the same `ModuleAnalyzer` inline on
//! the scheduler thread.

use crate::context::{Plugin, PluginContext};
use crate::pool::{ParseOutcome, ParseTask, WorkerPool};
use async_trait::async_trait;
use grafema_analyzer::language::LanguageRegistry;
use grafema_analyzer::ModuleAnalyzer;
use grafema_core::error::Result;
use grafema_core::issue::{codes, Issue};
use grafema_core::plugin::{Phase, PluginMetadata};
use grafema_core::progress::ProgressInfo;
use grafema_core::types::NodeKind;
use grafema_graph::GraphBuilder;

pub struct AstAnalysisPlugin;

#[async_trait]
impl Plugin for AstAnalysisPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("ast_analysis", Phase::Analysis, 100)
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> Result<Vec<Issue>> {
        let modules = ctx.backend.find_by_type(NodeKind::Module).await?;
        let total = modules.len();
        let languages = LanguageRegistry::new();
        let mut builder = GraphBuilder::new();
        let mut issues = Vec::new();
        let mut processed = 0usize;

        if ctx.config.analysis.parallel.enabled && total > 0 {
            let pool = WorkerPool::spawn(ctx.config.max_workers())
                .map_err(|e| grafema_core::error::GrafemaError::Config(e.to_string()))?;

            for module in &modules {
                let Some(language) = languages.detect_language(&module.name) else {
                    processed += 1;
                    continue;
                };
                pool.dispatch(ParseTask { file: module.name.clone(), language });
            }

            let mut received = 0usize;
            while received < total {
                if ctx.cancellation.is_cancelled() {
                    break;
                }
                match pool.try_recv_result() {
                    Some(ParseOutcome::Bundle(bundle)) => {
                        builder.buffer(&bundle);
                        received += 1;
                        processed += 1;
                    }
                    Some(ParseOutcome::Error { file, error }) => {
                        issues.push(
                            Issue::error(codes::ANALYSIS_FAILED, format!("{file}: {error}")).with_file(file),
                        );
                        received += 1;
                        processed += 1;
                    }
                    None => std::thread::yield_now(),
                }
                if processed % 10 == 0 {
                    ctx.report(ProgressInfo::new(Phase::Analysis, "analyzing modules").with_files(processed, total));
                }
            }

            pool.shutdown();
        } else {
            let analyzer = ModuleAnalyzer::new();
            for module in &modules {
                if ctx.cancellation.is_cancelled() {
                    break;
                }
                match analyzer.analyze_file(&module.name) {
                    Ok(bundle) => builder.buffer(&bundle),
                    Err(e) => issues.push(
                        Issue::error(codes::ANALYSIS_FAILED, format!("{}: {e}", module.name))
                            .with_file(module.name.clone()),
                    ),
                }
                processed += 1;
                if processed % 10 == 0 {
                    ctx.report(ProgressInfo::new(Phase::Analysis, "analyzing modules").with_files(processed, total));
                }
            }
        }

        issues.extend(builder.take_issues());
        builder.flush(ctx.backend).await?;
        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grafema_core::config::Config;
    use grafema_core::manifest::Manifest;
    use grafema_core::node::GraphNode;
    use grafema_core::progress::CancellationToken;
    use grafema_graph::InMemoryGraphBackend;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn analyzes_indexed_modules_sequentially() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.ts");
        fs::write(&file, "function a(){ b(); } function b(){}").unwrap();

        let backend = InMemoryGraphBackend::new();
        backend
            .add_node(GraphNode::new(
                format!("{}->MODULE", file.display()),
                NodeKind::Module,
                file.to_string_lossy().to_string(),
            ))
            .await
            .unwrap();

        let mut config = Config::default();
        config.analysis.parallel.enabled = false;
        let mut manifest = Manifest::default();
        let cancellation = CancellationToken::new();
        let mut ctx = PluginContext {
            backend: &backend,
            config: &config,
            manifest: &mut manifest,
            cancellation: &cancellation,
            project_root: dir.path(),
            on_progress: None,
        };

        AstAnalysisPlugin.execute(&mut ctx).await.unwrap();
        let functions = backend.find_by_type(NodeKind::Function).await.unwrap();
        assert_eq!(functions.len(), 2);
    }

    #[tokio::test]
    async fn analyzes_indexed_modules_in_parallel() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.ts");
        fs::write(&file, "function a(){ b(); } function b(){}").unwrap();

        let backend = InMemoryGraphBackend::new();
        backend
            .add_node(GraphNode::new(
                format!("{}->MODULE", file.display()),
                NodeKind::Module,
                file.to_string_lossy().to_string(),
            ))
            .await
            .unwrap();

        let mut config = Config::default();
        config.analysis.parallel.enabled = true;
        config.analysis.parallel.max_workers = Some(1);
        let mut manifest = Manifest::default();
        let cancellation = CancellationToken::new();
        let mut ctx = PluginContext {
            backend: &backend,
            config: &config,
            manifest: &mut manifest,
            cancellation: &cancellation,
            project_root: dir.path(),
            on_progress: None,
        };

        AstAnalysisPlugin.execute(&mut ctx).await.unwrap();
        let functions = backend.find_by_type(NodeKind::Function).await.unwrap();
        assert_eq!(functions.len(), 2);
    }
}
