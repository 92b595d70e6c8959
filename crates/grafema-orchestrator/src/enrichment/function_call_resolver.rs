//! Resolves a `CALL` node that Analysis left without an outgoing `CALLS`
//! edge (the callee wasn't declared in the same module) against whatever
//! the calling module actually imports. Same-module calls are already
//! wired by `GraphBuilder`; this plugin only ever looks across a
//! `DEPENDS_ON` edge.

use crate::context::{Plugin, PluginContext};
use crate::indexing::resolve_specifier;
use async_trait::async_trait;
use grafema_core::edge::GraphEdge;
use grafema_core::error::Result;
use grafema_core::issue::Issue;
use grafema_core::node::GraphNode;
use grafema_core::plugin::{Phase, PluginMetadata};
use grafema_core::types::{EdgeKind, NodeKind};
use std::collections::HashMap;

pub struct FunctionCallResolverPlugin;

#[async_trait]
impl Plugin for FunctionCallResolverPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("function_call_resolver", Phase::Enrichment, 90).depends_on(["import_export_linker"])
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> Result<Vec<Issue>> {
        let calls = ctx.backend.find_by_type(NodeKind::Call).await?;
        let imports = ctx.backend.find_by_type(NodeKind::Import).await?;
        let functions = ctx.backend.find_by_type(NodeKind::Function).await?;

        let mut functions_by_file_and_name: HashMap<(String, String), &GraphNode> = HashMap::new();
        for f in &functions {
            if let Some(file) = &f.file {
                functions_by_file_and_name.insert((file.clone(), f.name.clone()), f);
            }
        }

        let mut imports_by_file: HashMap<&str, Vec<&GraphNode>> = HashMap::new();
        for i in &imports {
            if let Some(file) = &i.file {
                imports_by_file.entry(file.as_str()).or_default().push(i);
            }
        }

        let mut edges = Vec::new();
        for call in &calls {
            if ctx.cancellation.is_cancelled() {
                break;
            }
            let Some(file) = &call.file else { continue };
            if !ctx.backend.get_outgoing_edges(&call.id, Some(&[EdgeKind::Calls])).await?.is_empty() {
                continue;
            }

            let Some(candidates) = imports_by_file.get(file.as_str()) else { continue };
            for import in candidates {
                let imported_names = import
                    .attr("imported_names")
                    .and_then(|v| v.as_array())
                    .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect::<Vec<_>>())
                    .unwrap_or_default();
                if !imported_names.contains(&call.name.as_str()) {
                    continue;
                }
                let Some(target) = resolve_specifier(&ctx.project_root.join(file), &import.name) else { continue };
                let target_rel = crate::indexing::rel_path(ctx.project_root, &target);
                if let Some(func) = functions_by_file_and_name.get(&(target_rel, call.name.clone())) {
                    edges.push(GraphEdge::new(EdgeKind::Calls, call.id.clone(), func.id.clone()));
                    break;
                }
            }
        }

        ctx.backend.add_edges(edges, true).await?;
        Ok(Vec::new())
    }
}
