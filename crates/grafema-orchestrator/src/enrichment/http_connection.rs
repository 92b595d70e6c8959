//! Tags a `CALL`/`METHOD_CALL` that fires an outbound HTTP request with a
//! `FLOWS_INTO` edge to a synthetic `EXTERNAL` node for the client it went
//! through (`fetch`, `axios`, `http`/`https`, `got`, `request`). Nothing in
//! the source tree names the destination host statically in the general
//! case, so the node stands for "the network", not a specific URL.

use crate::context::{Plugin, PluginContext};
use async_trait::async_trait;
use grafema_core::edge::GraphEdge;
use grafema_core::error::Result;
use grafema_core::issue::Issue;
use grafema_core::node::GraphNode;
use grafema_core::plugin::{Phase, PluginMetadata};
use grafema_core::types::{EdgeKind, NodeKind};

const HTTP_METHODS: &[&str] = &["get", "post", "put", "delete", "patch", "head", "request"];

pub struct HttpConnectionEnricherPlugin;

#[async_trait]
impl Plugin for HttpConnectionEnricherPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("http_connection", Phase::Enrichment, 30)
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> Result<Vec<Issue>> {
        let calls = ctx.backend.find_by_type(NodeKind::Call).await?;
        let method_calls = ctx.backend.find_by_type(NodeKind::MethodCall).await?;
        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        let mut seen_externals = std::collections::HashSet::new();

        for call in &calls {
            if call.name != "fetch" {
                continue;
            }
            link(call, "fetch", &mut nodes, &mut edges, &mut seen_externals);
        }

        for call in &method_calls {
            let Some(receiver) = call.attr("receiver_summary").and_then(|v| v.as_str()) else { continue };
            let receiver_root = receiver.split('.').next().unwrap_or(receiver);
            let client = match receiver_root {
                "axios" => Some("axios"),
                "http" => Some("http"),
                "https" => Some("https"),
                "got" => Some("got"),
                _ => None,
            };
            let Some(client) = client else { continue };
            if !HTTP_METHODS.contains(&call.name.as_str()) {
                continue;
            }
            link(call, client, &mut nodes, &mut edges, &mut seen_externals);
        }

        ctx.backend.add_nodes(nodes).await?;
        ctx.backend.add_edges(edges, true).await?;
        Ok(Vec::new())
    }
}

fn link(
    call: &GraphNode,
    client: &str,
    nodes: &mut Vec<GraphNode>,
    edges: &mut Vec<GraphEdge>,
    seen: &mut std::collections::HashSet<String>,
) {
    let external_id = format!("external://http/{client}");
    if seen.insert(external_id.clone()) {
        nodes.push(GraphNode::new(external_id.clone(), NodeKind::External, format!("http:{client}")));
    }
    edges.push(GraphEdge::new(EdgeKind::FlowsInto, call.id.clone(), external_id));
}
