//! Core types, traits and identity machinery shared by every other
//! `grafema-*` crate: the node/edge/fact vocabulary, the closed error
//! taxonomy, the `GraphBackend` trait, configuration loading, and the
//! scope-aware semantic id assigner.

pub mod config;
pub mod edge;
pub mod error;
pub mod fact;
pub mod identity;
pub mod issue;
pub mod manifest;
pub mod node;
pub mod plugin;
pub mod progress;
pub mod traits;
pub mod types;

pub use config::Config;
pub use edge::GraphEdge;
pub use error::{GrafemaError, Result};
pub use fact::{fact_site, FactBundle};
pub use issue::{Issue, Severity};
pub use manifest::{Manifest, ServiceDescriptor, ServiceType};
pub use node::GraphNode;
pub use plugin::{Creates, Phase, PluginMetadata};
pub use progress::{CancellationToken, ProgressInfo};
pub use traits::{GraphBackend, NodeFilter};
pub use types::{EdgeKind, EdgeId, Language, Location, NodeId, NodeKind};
