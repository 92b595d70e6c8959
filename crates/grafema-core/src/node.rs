use crate::types::{Location, NodeId, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A materialised graph node.
///
/// Kind-specific facts that don't warrant a dedicated struct field (e.g. a
/// function's `cyclomaticComplexity`, an import's specifier) live in
/// `attributes` as JSON values — the same shape `CoreBuilder` and friends
/// populate when they translate a fact into a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub name: String,
    pub file: Option<String>,
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, serde_json::Value>,
}

impl GraphNode {
    pub fn new(id: impl Into<NodeId>, kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            file: None,
            location: None,
            attributes: HashMap::new(),
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attr(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }
}
