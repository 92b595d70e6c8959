//! Checks edge closure for the data-flow edge kinds specifically:
//! `ASSIGNED_FROM`, `DERIVES_FROM`, `READS_FROM`, `USES`, `CAPTURES`,
//! `ALIASES`, `FLOWS_INTO`. These are the edges a taint/flow analysis built
//! on top of this graph would walk, so a dangling endpoint here is worse
//! than one on a purely structural edge — it silently breaks a flow trace
//! instead of just one lookup.

use crate::context::{Plugin, PluginContext};
use async_trait::async_trait;
use grafema_core::error::Result;
use grafema_core::issue::Issue;
use grafema_core::plugin::{Phase, PluginMetadata};
use grafema_core::types::{EdgeKind, NodeKind};

const DATA_FLOW_EDGES: &[EdgeKind] = &[
    EdgeKind::AssignedFrom,
    EdgeKind::DerivesFrom,
    EdgeKind::ReadsFrom,
    EdgeKind::Uses,
    EdgeKind::Captures,
    EdgeKind::Aliases,
    EdgeKind::FlowsInto,
];

pub struct DataFlowValidatorPlugin;

#[async_trait]
impl Plugin for DataFlowValidatorPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("data_flow_validator", Phase::Validation, 50)
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> Result<Vec<Issue>> {
        let nodes = ctx.backend.find_by_type(NodeKind::Variable).await?;
        let mut issues = Vec::new();

        for node in &nodes {
            if ctx.cancellation.is_cancelled() {
                break;
            }
            for edge in ctx.backend.get_outgoing_edges(&node.id, Some(DATA_FLOW_EDGES)).await? {
                if ctx.backend.get_node(&edge.dst).await?.is_none() {
                    issues.push(
                        Issue::error(
                            "ERR_DANGLING_DATA_FLOW_EDGE",
                            format!("{} edge from `{}` points at a node that no longer exists", edge.kind.as_str(), node.name),
                        )
                        .with_file(node.file.clone().unwrap_or_default()),
                    );
                }
            }
        }

        Ok(issues)
    }
}
