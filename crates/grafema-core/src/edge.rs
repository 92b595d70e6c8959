use crate::types::{EdgeKind, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A materialised graph edge. `src`/`dst` are semantic ids resolved by the
/// time the edge reaches the backend — an edge must never point at an id
/// that doesn't resolve to a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub kind: EdgeKind,
    pub src: NodeId,
    pub dst: NodeId,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl GraphEdge {
    pub fn new(kind: EdgeKind, src: impl Into<NodeId>, dst: impl Into<NodeId>) -> Self {
        Self {
            kind,
            src: src.into(),
            dst: dst.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
