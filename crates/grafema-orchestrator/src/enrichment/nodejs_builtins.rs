//! Links an `IMPORT` of a Node.js built-in module (`fs`, `path`, `http`,
//! `os`, `crypto`, `child_process`, ...) to a synthetic `EXTERNAL` node
//! standing in for that module, since no `EXPORT` node will ever exist for
//! it. Also links a bare call to a known global (`setTimeout`, `fetch`,
//! `require`, ...) the same way, using the configured known-globals list so
//! a project's own extensions to it are covered too.

use crate::context::{Plugin, PluginContext};
use async_trait::async_trait;
use grafema_core::edge::GraphEdge;
use grafema_core::error::Result;
use grafema_core::issue::Issue;
use grafema_core::node::GraphNode;
use grafema_core::plugin::{Phase, PluginMetadata};
use grafema_core::types::{EdgeKind, NodeKind};
use std::collections::HashSet;

const NODE_BUILTIN_MODULES: &[&str] = &[
    "fs", "path", "http", "https", "os", "crypto", "child_process", "net", "stream", "events",
    "util", "url", "querystring", "zlib", "assert", "buffer", "cluster", "dns", "readline",
    "timers", "tls", "dgram", "worker_threads", "perf_hooks",
];

pub struct NodejsBuiltinsResolverPlugin;

#[async_trait]
impl Plugin for NodejsBuiltinsResolverPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("nodejs_builtins", Phase::Enrichment, 20)
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> Result<Vec<Issue>> {
        let imports = ctx.backend.find_by_type(NodeKind::Import).await?;
        let calls = ctx.backend.find_by_type(NodeKind::Call).await?;
        let known_globals: HashSet<String> = ctx.config.known_globals().into_iter().collect();

        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        let mut seen = HashSet::new();

        for import in &imports {
            let specifier = import.name.trim_start_matches("node:");
            if !NODE_BUILTIN_MODULES.contains(&specifier) {
                continue;
            }
            let external_id = builtin_id(specifier);
            if seen.insert(external_id.clone()) {
                nodes.push(GraphNode::new(external_id.clone(), NodeKind::External, specifier.to_string()));
            }
            edges.push(GraphEdge::new(EdgeKind::ImportsFrom, import.id.clone(), external_id));
        }

        for call in &calls {
            if !known_globals.contains(&call.name) {
                continue;
            }
            if !ctx.backend.get_outgoing_edges(&call.id, Some(&[EdgeKind::Calls])).await?.is_empty() {
                continue;
            }
            let external_id = builtin_id(&call.name);
            if seen.insert(external_id.clone()) {
                nodes.push(GraphNode::new(external_id.clone(), NodeKind::External, call.name.clone()));
            }
            edges.push(GraphEdge::new(EdgeKind::Calls, call.id.clone(), external_id));
        }

        ctx.backend.add_nodes(nodes).await?;
        ctx.backend.add_edges(edges, true).await?;
        Ok(Vec::new())
    }
}

fn builtin_id(name: &str) -> String {
    format!("external://nodejs/{name}")
}
