//! `InMemoryGraphBackend` — the reference `GraphBackend` implementation.
//! Dashmap-cached node/edge lookup, no on-disk persistence: here the cache
//! *is* the store, since this backend carries no durability guarantees of
//! its own.

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use grafema_core::edge::GraphEdge;
use grafema_core::error::Result;
use grafema_core::node::GraphNode;
use grafema_core::traits::{GraphBackend, NodeFilter};
use grafema_core::types::{EdgeId, EdgeKind, NodeId, NodeKind};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Concurrency-safe, entirely in-memory `GraphBackend`. Multiple workers
/// may call its read methods concurrently; writes are equally safe to call
/// concurrently (each `DashMap` shard guards itself), though the reference
/// pipeline only ever calls them from the Orchestrator thread.
#[derive(Default)]
pub struct InMemoryGraphBackend {
    nodes: DashMap<NodeId, GraphNode>,
    edges: DashMap<EdgeId, GraphEdge>,
    outgoing: DashMap<NodeId, Vec<EdgeId>>,
    incoming: DashMap<NodeId, Vec<EdgeId>>,
    edge_keys: DashSet<(EdgeKind, NodeId, NodeId)>,
    next_edge_id: Mutex<EdgeId>,
}

impl InMemoryGraphBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert_edge(&self, edge: GraphEdge) {
        let key = (edge.kind, edge.src.clone(), edge.dst.clone());
        if !self.edge_keys.insert(key) {
            return;
        }
        let id = {
            let mut next = self.next_edge_id.lock();
            let id = *next;
            *next += 1;
            id
        };
        self.outgoing.entry(edge.src.clone()).or_default().push(id);
        self.incoming.entry(edge.dst.clone()).or_default().push(id);
        self.edges.insert(id, edge);
    }

    fn remove_node_and_incident_edges(&self, id: &NodeId) {
        self.nodes.remove(id);
        if let Some((_, ids)) = self.outgoing.remove(id) {
            for eid in ids {
                if let Some((_, edge)) = self.edges.remove(&eid) {
                    self.edge_keys.remove(&(edge.kind, edge.src, edge.dst));
                }
            }
        }
        if let Some((_, ids)) = self.incoming.remove(id) {
            for eid in ids {
                if let Some((_, edge)) = self.edges.remove(&eid) {
                    self.edge_keys.remove(&(edge.kind, edge.src, edge.dst));
                }
            }
        }
    }
}

#[async_trait]
impl GraphBackend for InMemoryGraphBackend {
    async fn add_node(&self, node: GraphNode) -> Result<()> {
        self.nodes.entry(node.id.clone()).or_insert(node);
        Ok(())
    }

    async fn add_nodes(&self, nodes: Vec<GraphNode>) -> Result<()> {
        for node in nodes {
            self.nodes.entry(node.id.clone()).or_insert(node);
        }
        Ok(())
    }

    async fn add_edge(&self, edge: GraphEdge) -> Result<()> {
        self.insert_edge(edge);
        Ok(())
    }

    async fn add_edges(&self, edges: Vec<GraphEdge>, skip_validation: bool) -> Result<()> {
        for edge in edges {
            if !skip_validation && (!self.nodes.contains_key(&edge.src) || !self.nodes.contains_key(&edge.dst)) {
                tracing::warn!(src = %edge.src, dst = %edge.dst, kind = %edge.kind, "skipping edge with dangling endpoint");
                continue;
            }
            self.insert_edge(edge);
        }
        Ok(())
    }

    async fn get_node(&self, id: &NodeId) -> Result<Option<GraphNode>> {
        Ok(self.nodes.get(id).map(|n| n.value().clone()))
    }

    async fn find_by_type(&self, kind: NodeKind) -> Result<Vec<GraphNode>> {
        Ok(self.nodes.iter().filter(|n| n.value().kind == kind).map(|n| n.value().clone()).collect())
    }

    async fn find_by_attr(&self, attrs: &HashMap<String, serde_json::Value>) -> Result<Vec<GraphNode>> {
        Ok(self
            .nodes
            .iter()
            .filter(|n| attrs.iter().all(|(k, v)| n.value().attr(k) == Some(v)))
            .map(|n| n.value().clone())
            .collect())
    }

    async fn query_nodes(&self, filter: NodeFilter<'_>) -> Result<Vec<GraphNode>> {
        Ok(self.nodes.iter().filter(|n| filter(n.value())).map(|n| n.value().clone()).collect())
    }

    async fn get_outgoing_edges(&self, id: &NodeId, types: Option<&[EdgeKind]>) -> Result<Vec<GraphEdge>> {
        let Some(ids) = self.outgoing.get(id) else { return Ok(Vec::new()) };
        Ok(ids
            .iter()
            .filter_map(|eid| self.edges.get(eid).map(|e| e.value().clone()))
            .filter(|e| types.map(|ts| ts.contains(&e.kind)).unwrap_or(true))
            .collect())
    }

    async fn get_incoming_edges(&self, id: &NodeId, types: Option<&[EdgeKind]>) -> Result<Vec<GraphEdge>> {
        let Some(ids) = self.incoming.get(id) else { return Ok(Vec::new()) };
        Ok(ids
            .iter()
            .filter_map(|eid| self.edges.get(eid).map(|e| e.value().clone()))
            .filter(|e| types.map(|ts| ts.contains(&e.kind)).unwrap_or(true))
            .collect())
    }

    async fn node_count(&self) -> Result<usize> {
        Ok(self.nodes.len())
    }

    async fn edge_count(&self) -> Result<usize> {
        Ok(self.edges.len())
    }

    async fn count_nodes_by_type(&self, types: Option<&[NodeKind]>) -> Result<HashMap<NodeKind, usize>> {
        let mut counts = HashMap::new();
        for node in self.nodes.iter() {
            if types.map(|ts| ts.contains(&node.value().kind)).unwrap_or(true) {
                *counts.entry(node.value().kind).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn count_edges_by_type(&self, types: Option<&[EdgeKind]>) -> Result<HashMap<EdgeKind, usize>> {
        let mut counts = HashMap::new();
        for edge in self.edges.iter() {
            if types.map(|ts| ts.contains(&edge.value().kind)).unwrap_or(true) {
                *counts.entry(edge.value().kind).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn clear(&self) -> Result<()> {
        self.nodes.clear();
        self.edges.clear();
        self.outgoing.clear();
        self.incoming.clear();
        self.edge_keys.clear();
        *self.next_edge_id.lock() = 0;
        Ok(())
    }

    async fn delete_modules(&self, files: &[String]) -> Result<()> {
        let prefixes: Vec<String> = files.iter().map(|f| format!("{f}->")).collect();
        let stale: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|n| prefixes.iter().any(|p| n.id.starts_with(p.as_str())))
            .map(|n| n.id.clone())
            .collect();
        for id in stale {
            self.remove_node_and_incident_edges(&id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grafema_core::types::Location;

    fn node(id: &str, kind: NodeKind) -> GraphNode {
        GraphNode::new(id, kind, id).with_location(Location::new(1, 0))
    }

    #[tokio::test]
    async fn add_node_is_idempotent() {
        let backend = InMemoryGraphBackend::new();
        backend.add_node(node("a->MODULE", NodeKind::Module)).await.unwrap();
        backend
            .add_node(GraphNode::new("a->MODULE", NodeKind::Module, "renamed"))
            .await
            .unwrap();
        let n = backend.get_node(&"a->MODULE".to_string()).await.unwrap().unwrap();
        assert_eq!(n.name, "a->MODULE");
    }

    #[tokio::test]
    async fn edges_validate_endpoints_unless_skipped() {
        let backend = InMemoryGraphBackend::new();
        backend.add_node(node("a", NodeKind::Module)).await.unwrap();
        backend
            .add_edges(vec![GraphEdge::new(EdgeKind::Contains, "a", "missing")], false)
            .await
            .unwrap();
        assert_eq!(backend.edge_count().await.unwrap(), 0);
        backend
            .add_edges(vec![GraphEdge::new(EdgeKind::Contains, "a", "missing")], true)
            .await
            .unwrap();
        assert_eq!(backend.edge_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_edges_are_deduplicated() {
        let backend = InMemoryGraphBackend::new();
        backend.add_node(node("a", NodeKind::Module)).await.unwrap();
        backend.add_node(node("b", NodeKind::Function)).await.unwrap();
        backend.add_edge(GraphEdge::new(EdgeKind::Contains, "a", "b")).await.unwrap();
        backend.add_edge(GraphEdge::new(EdgeKind::Contains, "a", "b")).await.unwrap();
        assert_eq!(backend.edge_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_modules_removes_file_scoped_nodes_and_incident_edges() {
        let backend = InMemoryGraphBackend::new();
        backend.add_node(node("a.ts->MODULE", NodeKind::Module)).await.unwrap();
        backend
            .add_node(node("a.ts->FUNCTION->f", NodeKind::Function))
            .await
            .unwrap();
        backend.add_node(node("b.ts->MODULE", NodeKind::Module)).await.unwrap();
        backend
            .add_edge(GraphEdge::new(EdgeKind::Contains, "a.ts->MODULE", "a.ts->FUNCTION->f"))
            .await
            .unwrap();
        backend
            .add_edge(GraphEdge::new(EdgeKind::DependsOn, "a.ts->MODULE", "b.ts->MODULE"))
            .await
            .unwrap();

        backend.delete_modules(&["a.ts".to_string()]).await.unwrap();

        assert_eq!(backend.node_count().await.unwrap(), 1);
        assert_eq!(backend.edge_count().await.unwrap(), 0);
        assert!(backend.get_node(&"b.ts->MODULE".to_string()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn find_by_type_and_count_nodes_by_type() {
        let backend = InMemoryGraphBackend::new();
        backend.add_node(node("a", NodeKind::Module)).await.unwrap();
        backend.add_node(node("b", NodeKind::Function)).await.unwrap();
        backend.add_node(node("c", NodeKind::Function)).await.unwrap();

        assert_eq!(backend.find_by_type(NodeKind::Function).await.unwrap().len(), 2);
        let counts = backend.count_nodes_by_type(None).await.unwrap();
        assert_eq!(counts.get(&NodeKind::Function), Some(&2));
    }

    #[tokio::test]
    async fn clear_resets_everything() {
        let backend = InMemoryGraphBackend::new();
        backend.add_node(node("a", NodeKind::Module)).await.unwrap();
        backend.add_node(node("b", NodeKind::Function)).await.unwrap();
        backend.add_edge(GraphEdge::new(EdgeKind::Contains, "a", "b")).await.unwrap();
        backend.clear().await.unwrap();
        assert_eq!(backend.node_count().await.unwrap(), 0);
        assert_eq!(backend.edge_count().await.unwrap(), 0);
    }
}
