//! Collapses single-assignment `CONSTANT` chains into direct `ALIASES`
//! edges. `const b = a` never shows up as an `ASSIGNED_FROM` edge — that
//! only fires for a later reassignment — so a `const` whose initializer is
//! a bare identifier is resolved here by name within the same module, then
//! any chain of such aliases is collapsed to point straight at the
//! original binding.

use crate::context::{Plugin, PluginContext};
use async_trait::async_trait;
use grafema_core::edge::GraphEdge;
use grafema_core::error::Result;
use grafema_core::issue::Issue;
use grafema_core::node::GraphNode;
use grafema_core::plugin::{Phase, PluginMetadata};
use grafema_core::types::{EdgeKind, NodeKind};
use regex::Regex;
use std::collections::HashMap;

pub struct AliasTrackerPlugin;

#[async_trait]
impl Plugin for AliasTrackerPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("alias_tracker", Phase::Enrichment, 40)
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> Result<Vec<Issue>> {
        let bare_identifier = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("static regex");
        let constants = ctx.backend.find_by_type(NodeKind::Constant).await?;
        let variables = ctx.backend.find_by_type(NodeKind::Variable).await?;
        let parameters = ctx.backend.find_by_type(NodeKind::Parameter).await?;

        let mut bindings_by_file_and_name: HashMap<(String, String), &GraphNode> = HashMap::new();
        for node in variables.iter().chain(parameters.iter()).chain(constants.iter()) {
            if let Some(file) = &node.file {
                bindings_by_file_and_name.insert((file.clone(), node.name.clone()), node);
            }
        }

        let mut direct: HashMap<String, String> = HashMap::new();
        for constant in &constants {
            let Some(file) = &constant.file else { continue };
            let Some(init) = constant.attr("initializer_summary").and_then(|v| v.as_str()) else { continue };
            if !bare_identifier.is_match(init) || init == constant.name {
                continue;
            }
            if let Some(source) = bindings_by_file_and_name.get(&(file.clone(), init.to_string())) {
                direct.insert(constant.id.clone(), source.id.clone());
            }
        }

        let mut edges = Vec::new();
        for (from, _) in &direct {
            let mut current = from.clone();
            let mut visited = std::collections::HashSet::new();
            visited.insert(current.clone());
            while let Some(next) = direct.get(&current) {
                if !visited.insert(next.clone()) {
                    break;
                }
                current = next.clone();
            }
            if &current != from {
                edges.push(GraphEdge::new(EdgeKind::Aliases, from.clone(), current));
            }
        }

        ctx.backend.add_edges(edges, true).await?;
        Ok(Vec::new())
    }
}
