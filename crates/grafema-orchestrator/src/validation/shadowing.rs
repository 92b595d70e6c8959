//! Flags a parameter/variable whose name already names a binding declared
//! by an enclosing function — a nested scope quietly shadowing an outer
//! one, which `tsc`/eslint would warn about too. Read-only: this only
//! produces issues, it never adds a `SHADOWS` edge.

use crate::context::{Plugin, PluginContext};
use async_trait::async_trait;
use grafema_core::error::Result;
use grafema_core::issue::{codes, Issue};
use grafema_core::node::GraphNode;
use grafema_core::plugin::{Phase, PluginMetadata};
use grafema_core::types::{EdgeKind, NodeKind};
use std::collections::HashMap;

pub struct ShadowingDetectorPlugin;

#[async_trait]
impl Plugin for ShadowingDetectorPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("shadowing_detector", Phase::Validation, 70)
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> Result<Vec<Issue>> {
        let functions = ctx.backend.find_by_type(NodeKind::Function).await?;
        let methods = ctx.backend.find_by_type(NodeKind::Method).await?;
        let by_id: HashMap<String, GraphNode> = functions.into_iter().chain(methods).map(|f| (f.id.clone(), f)).collect();

        let mut own_bindings: HashMap<String, HashMap<String, String>> = HashMap::new();
        for function in by_id.values() {
            let mut names = HashMap::new();
            for edge in ctx.backend.get_outgoing_edges(&function.id, Some(&[EdgeKind::Declares])).await? {
                if let Some(node) = ctx.backend.get_node(&edge.dst).await? {
                    if matches!(node.kind, NodeKind::Variable | NodeKind::Parameter | NodeKind::Constant) {
                        names.insert(node.name.clone(), node.id.clone());
                    }
                }
            }
            own_bindings.insert(function.id.clone(), names);
        }

        let mut issues = Vec::new();
        for function in by_id.values() {
            if ctx.cancellation.is_cancelled() {
                break;
            }
            let Some(names) = own_bindings.get(&function.id) else { continue };
            let mut ancestor = enclosing_function(ctx, &function.id, &by_id).await?;
            while let Some(outer) = ancestor {
                if let Some(outer_names) = own_bindings.get(&outer.id) {
                    for name in names.keys() {
                        if outer_names.contains_key(name) {
                            issues.push(
                                Issue::warning(
                                    codes::SHADOWED_BINDING,
                                    format!("`{name}` in `{}` shadows a binding of the same name in enclosing `{}`", function.name, outer.name),
                                )
                                .with_file(function.file.clone().unwrap_or_default()),
                            );
                        }
                    }
                }
                ancestor = enclosing_function(ctx, &outer.id, &by_id).await?;
            }
        }

        Ok(issues)
    }
}

async fn enclosing_function(
    ctx: &PluginContext<'_>,
    id: &str,
    by_id: &HashMap<String, GraphNode>,
) -> Result<Option<GraphNode>> {
    for edge in ctx.backend.get_incoming_edges(id, Some(&[EdgeKind::Contains])).await? {
        if let Some(owner) = by_id.get(&edge.src) {
            return Ok(Some(owner.clone()));
        }
    }
    Ok(None)
}
