//! Gives a variable a concrete `HAS_TYPE` edge to the class it was
//! constructed from. `GraphBuilder` already links the variable to its
//! `CONSTRUCTOR_CALL` via `DERIVES_FROM`; this plugin takes the
//! constructor's class name and finds the actual `CLASS` node, whether it
//! lives in the same module or is reached through an import.

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

pub struct InstanceOfResolverPlugin;

#[async_trait]
impl Plugin for InstanceOfResolverPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("instanceof_resolver", Phase::Enrichment, 70).depends_on(["import_export_linker"])
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> Result<Vec<Issue>> {
        let variables = ctx.backend.find_by_type(NodeKind::Variable).await?;
        let classes = ctx.backend.find_by_type(NodeKind::Class).await?;
        let imports = ctx.backend.find_by_type(NodeKind::Import).await?;

        let mut classes_by_file_and_name: HashMap<(String, String), &GraphNode> = HashMap::new();
        for c in &classes {
            if let Some(file) = &c.file {
                classes_by_file_and_name.insert((file.clone(), c.name.clone()), c);
            }
        }
        let mut imports_by_file: HashMap<&str, Vec<&GraphNode>> = HashMap::new();
        for i in &imports {
            if let Some(file) = &i.file {
                imports_by_file.entry(file.as_str()).or_default().push(i);
            }
        }

        let mut edges = Vec::new();
        for variable in &variables {
            if ctx.cancellation.is_cancelled() {
                break;
            }
            let Some(file) = &variable.file else { continue };
            let derives = ctx.backend.get_outgoing_edges(&variable.id, Some(&[EdgeKind::DerivesFrom])).await?;
            let Some(derives_edge) = derives.first() else { continue };
            let Some(ctor) = ctx.backend.get_node(&derives_edge.dst).await? else { continue };
            if ctor.kind != NodeKind::ConstructorCall {
                continue;
            }

            if let Some(class) = classes_by_file_and_name.get(&(file.clone(), ctor.name.clone())) {
                edges.push(GraphEdge::new(EdgeKind::HasType, variable.id.clone(), class.id.clone()));
                continue;
            }

            let Some(candidates) = imports_by_file.get(file.as_str()) else { continue };
            for import in candidates {
                let imported_names = import
                    .attr("imported_names")
                    .and_then(|v| v.as_array())
                    .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect::<Vec<_>>())
                    .unwrap_or_default();
                if !imported_names.contains(&ctor.name.as_str()) {
                    continue;
                }
                let Some(target) = resolve_specifier(&ctx.project_root.join(file), &import.name) else { continue };
                let target_rel = crate::indexing::rel_path(ctx.project_root, &target);
                if let Some(class) = classes_by_file_and_name.get(&(target_rel, ctor.name.clone())) {
                    edges.push(GraphEdge::new(EdgeKind::HasType, variable.id.clone(), class.id.clone()));
                    break;
                }
            }
        }

        ctx.backend.add_edges(edges, true).await?;
        Ok(Vec::new())
    }
}
