//! Semantic identity assignment: a deterministic, content-addressed id for
//! every graph node, stable across re-analysis runs as long as the source
//! structure it was derived from doesn't change.

mod collision;
mod scope;
mod semantic_id;

pub use collision::{CollisionResolver, PendingNode};
pub use scope::{ScopeContext, ScopeKind, ScopeTracker};
pub use semantic_id::{base_id, content_hash, disambiguate, module_id, strip_disambiguator, HINT_SCHEMA_VERSION};
