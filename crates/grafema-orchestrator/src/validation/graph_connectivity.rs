//! Runs a bidirectional BFS from every `SERVICE`/`MODULE` root over
//! `CONTAINS`/`DECLARES`/`HAS_SCOPE` edges (followed in both directions, so
//! a node reachable only by walking an edge backward still counts) and
//! flags whatever an `EXTERNAL` node isn't left unvisited, grouped by kind
//! so one disconnected subtree doesn't produce one issue per node.

use crate::context::{Plugin, PluginContext};
use async_trait::async_trait;
use grafema_core::error::Result;
use grafema_core::issue::{codes, Issue};
use grafema_core::plugin::{Phase, PluginMetadata};
use grafema_core::types::{EdgeKind, NodeKind};
use std::collections::{HashMap, HashSet, VecDeque};

const TRAVERSED: &[EdgeKind] = &[EdgeKind::Contains, EdgeKind::Declares, EdgeKind::HasScope];

pub struct GraphConnectivityValidatorPlugin;

#[async_trait]
impl Plugin for GraphConnectivityValidatorPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("graph_connectivity_validator", Phase::Validation, 100)
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> Result<Vec<Issue>> {
        let all_nodes = ctx.backend.query_nodes(&|_| true).await?;
        let roots: Vec<_> = all_nodes
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::Service | NodeKind::Module))
            .map(|n| n.id.clone())
            .collect();

        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = roots.into_iter().collect();
        visited.extend(queue.iter().cloned());

        while let Some(id) = queue.pop_front() {
            if ctx.cancellation.is_cancelled() {
                break;
            }
            let mut neighbours = ctx.backend.get_outgoing_edges(&id, Some(TRAVERSED)).await?.into_iter().map(|e| e.dst).collect::<Vec<_>>();
            neighbours.extend(ctx.backend.get_incoming_edges(&id, Some(TRAVERSED)).await?.into_iter().map(|e| e.src));
            for next in neighbours {
                if visited.insert(next.clone()) {
                    queue.push_back(next);
                }
            }
        }

        let mut unreachable_by_kind: HashMap<NodeKind, usize> = HashMap::new();
        for node in &all_nodes {
            if node.kind == NodeKind::External {
                continue;
            }
            if !visited.contains(&node.id) {
                *unreachable_by_kind.entry(node.kind).or_insert(0) += 1;
            }
        }

        let mut issues = Vec::new();
        for (kind, count) in unreachable_by_kind {
            issues.push(Issue::warning(
                codes::UNREACHABLE_NODE,
                format!("{count} unreachable {} node(s) with no path to a SERVICE/MODULE root", kind.as_str()),
            ));
        }
        Ok(issues)
    }
}
