//! Resolves each IMPORT node to the EXPORT it actually binds to, walking
//! the same specifier resolution Indexing used to build `DEPENDS_ON`
//! edges between modules. An import that resolves to nothing becomes the
//! Validation phase's `BrokenImportValidator`'s problem, not this one's —
//! this plugin only ever adds edges, never records an issue.

use crate::context::{Plugin, PluginContext};
use crate::indexing::{normalize, resolve_specifier};
use async_trait::async_trait;
use grafema_core::edge::GraphEdge;
use grafema_core::error::Result;
use grafema_core::issue::Issue;
use grafema_core::plugin::{Phase, PluginMetadata};
use grafema_core::types::{EdgeKind, NodeKind};
use std::path::Path;

pub struct ImportExportLinkerPlugin;

#[async_trait]
impl Plugin for ImportExportLinkerPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("import_export_linker", Phase::Enrichment, 100)
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> Result<Vec<Issue>> {
        let imports = ctx.backend.find_by_type(NodeKind::Import).await?;
        let exports = ctx.backend.find_by_type(NodeKind::Export).await?;
        let mut edges = Vec::new();

        for import in &imports {
            if ctx.cancellation.is_cancelled() {
                break;
            }
            let Some(from_file) = &import.file else { continue };
            let Some(target) = resolve_specifier(&ctx.project_root.join(from_file), &import.name) else {
                continue;
            };
            let target_rel = rel_path(ctx.project_root, &target);

            let imported_names = import
                .attr("imported_names")
                .and_then(|v| v.as_array())
                .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect::<Vec<_>>())
                .unwrap_or_default();
            let is_default = import.attr("is_default").and_then(|v| v.as_bool()).unwrap_or(false);
            let is_namespace = import.attr("is_namespace").and_then(|v| v.as_bool()).unwrap_or(false);

            if is_namespace {
                for export in exports.iter().filter(|e| e.file.as_deref() == Some(target_rel.as_str())) {
                    edges.push(GraphEdge::new(EdgeKind::ImportsFrom, import.id.clone(), export.id.clone()));
                }
                continue;
            }

            for export in exports.iter().filter(|e| e.file.as_deref() == Some(target_rel.as_str())) {
                let matches = if is_default {
                    export.attr("is_default").and_then(|v| v.as_bool()).unwrap_or(false)
                } else {
                    imported_names.iter().any(|n| n == &export.name)
                };
                if matches {
                    edges.push(GraphEdge::new(EdgeKind::ImportsFrom, import.id.clone(), export.id.clone()));
                }
            }
        }

        ctx.backend.add_edges(edges, true).await?;
        Ok(Vec::new())
    }
}

fn rel_path(root: &Path, file: &Path) -> String {
    let n = normalize(file);
    n.strip_prefix(root).unwrap_or(&n).to_string_lossy().replace('\\', "/")
}
