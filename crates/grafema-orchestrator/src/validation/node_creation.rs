//! Checks the two invariants `GraphBuilder` relies on but cannot itself
//! enforce across the whole assembled graph: no two distinct nodes share an
//! id, and no node's id embeds a file path other than its own declared
//! `file` — the "a file can only emit ids whose embedded file path equals
//! its own" rule. A node whose id disagrees with its `file` field would let
//! one module forge identifiers that collide with another's.

use crate::context::{Plugin, PluginContext};
use async_trait::async_trait;
use grafema_core::error::Result;
use grafema_core::issue::{codes, Issue};
use grafema_core::plugin::{Phase, PluginMetadata};
use std::collections::HashMap;

pub struct NodeCreationValidatorPlugin;

#[async_trait]
impl Plugin for NodeCreationValidatorPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("node_creation_validator", Phase::Validation, 90)
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> Result<Vec<Issue>> {
        let nodes = ctx.backend.query_nodes(&|_| true).await?;
        let mut issues = Vec::new();

        let mut seen: HashMap<String, usize> = HashMap::new();
        for node in &nodes {
            *seen.entry(node.id.clone()).or_insert(0) += 1;
        }
        for (id, count) in seen.iter().filter(|(_, c)| **c > 1) {
            issues.push(Issue::error(
                codes::UNREACHABLE_NODE,
                format!("id `{id}` was assigned to {count} distinct nodes"),
            ));
        }

        for node in &nodes {
            let Some(file) = &node.file else { continue };
            let Some(embedded) = node.id.split("->").next() else { continue };
            if embedded != file {
                issues.push(
                    Issue::error(
                        codes::UNREACHABLE_NODE,
                        format!("node id `{}` embeds file `{embedded}` but declares file `{file}`", node.id),
                    )
                    .with_file(file.clone()),
                );
            }
        }

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
    use grafema_core::types::NodeKind;
    use grafema_graph::InMemoryGraphBackend;
    use tempfile::TempDir;

    async fn run(backend: &InMemoryGraphBackend) -> Vec<Issue> {
        let dir = TempDir::new().unwrap();
        let config = Config::default();
        let mut manifest = Manifest::default();
        let cancellation = CancellationToken::new();
        let mut ctx = PluginContext {
            backend,
            config: &config,
            manifest: &mut manifest,
            cancellation: &cancellation,
            project_root: dir.path(),
            on_progress: None,
        };
        NodeCreationValidatorPlugin.execute(&mut ctx).await.unwrap()
    }

    #[tokio::test]
    async fn flags_a_node_whose_id_embeds_a_foreign_file() {
        let backend = InMemoryGraphBackend::new();
        backend
            .add_node(
                GraphNode::new("a.ts->FUNCTION->f", NodeKind::Function, "f").with_file("b.ts".to_string()),
            )
            .await
            .unwrap();
        let issues = run(&backend).await;
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, codes::UNREACHABLE_NODE);
    }

    #[tokio::test]
    async fn consistent_ids_produce_no_issues() {
        let backend = InMemoryGraphBackend::new();
        backend
            .add_node(
                GraphNode::new("a.ts->FUNCTION->f", NodeKind::Function, "f").with_file("a.ts".to_string()),
            )
            .await
            .unwrap();
        assert!(run(&backend).await.is_empty());
    }
}
