//! Flags a non-exported `FUNCTION`/`CLASS` with no incoming `CALLS`,
//! `CALLS_ON`, `EXTENDS`, or `IMPLEMENTS` edge — nothing in the graph
//! reaches it, and nothing outside the module can either, so it is as
//! close to provably dead as a static pass gets. Entry-point functions
//! (the ones an `ENTRYPOINT` node reaches) are exempt.

use crate::context::{Plugin, PluginContext};
use async_trait::async_trait;
use grafema_core::error::Result;
use grafema_core::issue::{codes, Issue};
use grafema_core::plugin::{Phase, PluginMetadata};
use grafema_core::types::{EdgeKind, NodeKind};
use std::collections::HashSet;

const REACHING: &[EdgeKind] = &[EdgeKind::Calls, EdgeKind::CallsOn, EdgeKind::Extends, EdgeKind::Implements, EdgeKind::Invokes];

pub struct DeadCodeValidatorPlugin;

#[async_trait]
impl Plugin for DeadCodeValidatorPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("dead_code_validator", Phase::Validation, 50)
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> Result<Vec<Issue>> {
        let functions = ctx.backend.find_by_type(NodeKind::Function).await?;
        let classes = ctx.backend.find_by_type(NodeKind::Class).await?;
        let exports = ctx.backend.find_by_type(NodeKind::Export).await?;

        let exported_ids: HashSet<String> = {
            let mut ids = HashSet::new();
            for export in &exports {
                for edge in ctx.backend.get_incoming_edges(&export.id, Some(&[EdgeKind::Declares])).await? {
                    ids.insert(edge.src.clone());
                }
            }
            ids
        };

        let mut issues = Vec::new();
        for node in functions.iter().chain(classes.iter()) {
            if ctx.cancellation.is_cancelled() {
                break;
            }
            if exported_ids.contains(&node.id) {
                continue;
            }
            if node.name == "main" || node.name.is_empty() {
                continue;
            }
            if !ctx.backend.get_incoming_edges(&node.id, Some(REACHING)).await?.is_empty() {
                continue;
            }
            issues.push(
                Issue::warning(codes::DEAD_CODE, format!("`{}` is never called, extended, or exported", node.name))
                    .with_file(node.file.clone().unwrap_or_default()),
            );
        }

        Ok(issues)
    }
}
