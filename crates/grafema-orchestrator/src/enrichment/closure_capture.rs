//! Builds `CAPTURES` edges from a nested function to the outer
//! parameter/variable bindings it closes over. Nothing in Analysis records
//! identifier references directly, so this plugin falls back to the same
//! signal `GraphBuilder` uses for `CALLS_ON`/`ASSIGNED_FROM` resolution: the
//! textual summaries (`initializer_summary`, `receiver_summary`, a call's
//! own name) already attached to each descendant node.

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

pub struct ClosureCaptureEnricherPlugin;

#[async_trait]
impl Plugin for ClosureCaptureEnricherPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("closure_capture", Phase::Enrichment, 50)
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> Result<Vec<Issue>> {
        let functions = ctx.backend.find_by_type(NodeKind::Function).await?;
        let by_id: HashMap<&str, &GraphNode> = functions.iter().map(|f| (f.id.as_str(), f)).collect();
        let mut edges = Vec::new();

        for closure in &functions {
            let Some(outer) = enclosing_function(ctx, closure, &by_id).await? else { continue };
            let bindings = outer_bindings(ctx, &outer.id).await?;
            if bindings.is_empty() {
                continue;
            }

            let text = descendant_text(ctx, &closure.id).await?;
            for (name, binding_id) in &bindings {
                if mentions(&text, name) {
                    edges.push(GraphEdge::new(EdgeKind::Captures, closure.id.clone(), binding_id.clone()));
                }
            }
        }

        ctx.backend.add_edges(edges, true).await?;
        Ok(Vec::new())
    }
}

async fn enclosing_function<'a>(
    ctx: &PluginContext<'_>,
    closure: &GraphNode,
    by_id: &HashMap<&'a str, &'a GraphNode>,
) -> Result<Option<GraphNode>> {
    let incoming = ctx.backend.get_incoming_edges(&closure.id, Some(&[EdgeKind::Contains])).await?;
    for edge in incoming {
        if let Some(owner) = by_id.get(edge.src.as_str()) {
            return Ok(Some((*owner).clone()));
        }
    }
    Ok(None)
}

async fn outer_bindings(ctx: &PluginContext<'_>, function_id: &str) -> Result<Vec<(String, String)>> {
    let mut out = Vec::new();
    for edge in ctx.backend.get_outgoing_edges(function_id, Some(&[EdgeKind::Declares])).await? {
        if let Some(node) = ctx.backend.get_node(&edge.dst).await? {
            if matches!(node.kind, NodeKind::Variable | NodeKind::Parameter | NodeKind::Constant) {
                out.push((node.name.clone(), node.id.clone()));
            }
        }
    }
    Ok(out)
}

/// Collects the name and every textual summary attribute from every node
/// transitively contained in `root`, for a simple word-boundary scan.
async fn descendant_text(ctx: &PluginContext<'_>, root: &str) -> Result<String> {
    let mut text = String::new();
    let mut stack = vec![root.to_string()];
    let mut seen = std::collections::HashSet::new();
    while let Some(id) = stack.pop() {
        if !seen.insert(id.clone()) {
            continue;
        }
        for edge in ctx.backend.get_outgoing_edges(&id, Some(&[EdgeKind::Contains])).await? {
            if let Some(node) = ctx.backend.get_node(&edge.dst).await? {
                text.push(' ');
                text.push_str(&node.name);
                if let Some(s) = node.attr("initializer_summary").and_then(|v| v.as_str()) {
                    text.push(' ');
                    text.push_str(s);
                }
                if let Some(s) = node.attr("receiver_summary").and_then(|v| v.as_str()) {
                    text.push(' ');
                    text.push_str(s);
                }
                stack.push(node.id.clone());
            }
        }
    }
    Ok(text)
}

fn mentions(text: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    let pattern = format!(r"\b{}\b", regex::escape(name));
    Regex::new(&pattern).map(|re| re.is_match(text)).unwrap_or(false)
}
