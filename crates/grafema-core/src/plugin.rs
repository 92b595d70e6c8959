use serde::{Deserialize, Serialize};

/// The five orchestrator phases, strictly ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Discovery,
    Indexing,
    Analysis,
    Enrichment,
    Validation,
}

impl Phase {
    pub const ORDER: [Phase; 5] = [
        Phase::Discovery,
        Phase::Indexing,
        Phase::Analysis,
        Phase::Enrichment,
        Phase::Validation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Discovery => "discovery",
            Phase::Indexing => "indexing",
            Phase::Analysis => "analysis",
            Phase::Enrichment => "enrichment",
            Phase::Validation => "validation",
        }
    }
}

/// What a plugin declares it creates. Purely informational today (used for
/// diagnostics and for `DESIGN.md`-style documentation generation); the
/// scheduler does not currently use it to order plugins, only `priority`
/// and `dependencies` do.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Creates {
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default)]
    pub edges: Vec<String>,
}

/// A plugin's static description, used by the registry to order execution
/// within a phase: priority descending, ties broken by declared dependency
/// order, then by registration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginMetadata {
    pub name: String,
    pub phase: Phase,
    pub priority: i32,
    #[serde(default)]
    pub creates: Creates,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl PluginMetadata {
    pub fn new(name: impl Into<String>, phase: Phase, priority: i32) -> Self {
        Self {
            name: name.into(),
            phase,
            priority,
            creates: Creates::default(),
            dependencies: Vec::new(),
        }
    }

    pub fn depends_on(mut self, names: impl IntoIterator<Item = &'static str>) -> Self {
        self.dependencies = names.into_iter().map(String::from).collect();
        self
    }
}
