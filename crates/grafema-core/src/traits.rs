use crate::edge::GraphEdge;
use crate::error::Result;
use crate::node::GraphNode;
use crate::types::{EdgeKind, NodeId, NodeKind};
use async_trait::async_trait;
use std::collections::HashMap;

/// A predicate used by `GraphBackend::query_nodes` for ad-hoc filtering
/// that doesn't warrant a dedicated accessor.
pub type NodeFilter<'a> = &'a (dyn Fn(&GraphNode) -> bool + Send + Sync);

/// The only external touchpoint the core depends on. Persistence
/// format, storage engine, and query planning are entirely the backend's
/// concern; the core only ever calls these methods. Node insertion must be
/// idempotent: re-adding a node with an id already present is a no-op.
#[async_trait]
pub trait GraphBackend: Send + Sync {
    async fn add_node(&self, node: GraphNode) -> Result<()>;
    async fn add_nodes(&self, nodes: Vec<GraphNode>) -> Result<()>;
    async fn add_edge(&self, edge: GraphEdge) -> Result<()>;
    async fn add_edges(&self, edges: Vec<GraphEdge>, skip_validation: bool) -> Result<()>;

    async fn get_node(&self, id: &NodeId) -> Result<Option<GraphNode>>;
    async fn find_by_type(&self, kind: NodeKind) -> Result<Vec<GraphNode>>;
    async fn find_by_attr(&self, attrs: &HashMap<String, serde_json::Value>) -> Result<Vec<GraphNode>>;
    async fn query_nodes(&self, filter: NodeFilter<'_>) -> Result<Vec<GraphNode>>;

    async fn get_outgoing_edges(&self, id: &NodeId, types: Option<&[EdgeKind]>) -> Result<Vec<GraphEdge>>;
    async fn get_incoming_edges(&self, id: &NodeId, types: Option<&[EdgeKind]>) -> Result<Vec<GraphEdge>>;

    async fn node_count(&self) -> Result<usize>;
    async fn edge_count(&self) -> Result<usize>;
    async fn count_nodes_by_type(&self, types: Option<&[NodeKind]>) -> Result<HashMap<NodeKind, usize>>;
    async fn count_edges_by_type(&self, types: Option<&[EdgeKind]>) -> Result<HashMap<EdgeKind, usize>>;

    /// Deletes every node and edge. Used for `force=true` re-analysis.
    async fn clear(&self) -> Result<()>;

    /// Deletes every node whose id's embedded file path is in `files`,
    /// along with edges incident to those nodes (incremental reanalysis).
    async fn delete_modules(&self, files: &[String]) -> Result<()>;

    /// Optional: backends without buffering can accept the default no-op.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Optional: backends without a connection to release can accept the
    /// default no-op.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
