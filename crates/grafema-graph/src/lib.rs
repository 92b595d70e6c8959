//! The graph side of the pipeline: a `GraphBuilder` that turns a finalized
//! `FactBundle` into `GraphNode`/`GraphEdge` pairs, and an
//! in-process `GraphBackend` implementation suitable as a default when no
//! external store is configured.

pub mod backend;
pub mod builder;

pub use backend::InMemoryGraphBackend;
pub use builder::GraphBuilder;
