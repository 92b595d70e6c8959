//! `PluginRegistry` — orders a phase's plugins priority-descending, ties
//! broken by declared dependency order then registration order, and
//! rejects a cyclic `dependencies` graph before the run starts.

use crate::context::Plugin;
use grafema_core::error::{GrafemaError, Result};
use grafema_core::plugin::Phase;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// Returns every plugin registered for `phase`, ordered priority desc,
    /// ties broken by declared-dependency topological order, then
    /// registration order.
    pub fn for_phase(&self, phase: Phase) -> Result<Vec<Arc<dyn Plugin>>> {
        let registration_index: HashMap<String, usize> = self
            .plugins
            .iter()
            .enumerate()
            .map(|(i, p)| (p.metadata().name, i))
            .collect();

        let mut candidates: Vec<Arc<dyn Plugin>> =
            self.plugins.iter().filter(|p| p.metadata().phase == phase).cloned().collect();

        candidates.sort_by(|a, b| {
            let ma = a.metadata();
            let mb = b.metadata();
            mb.priority
                .cmp(&ma.priority)
                .then_with(|| registration_index[&ma.name].cmp(&registration_index[&mb.name]))
        });

        topo_sort(candidates)
    }

    pub fn all(&self) -> &[Arc<dyn Plugin>] {
        &self.plugins
    }
}

/// Kahn's algorithm over the declared `dependencies` edges, seeded in the
/// priority/registration order computed by the caller so that plugins with
/// no ordering constraint between them keep that order. A cycle is a
/// `ConfigError` raised before the run starts, never a runtime panic.
fn topo_sort(candidates: Vec<Arc<dyn Plugin>>) -> Result<Vec<Arc<dyn Plugin>>> {
    let names: HashMap<String, usize> =
        candidates.iter().enumerate().map(|(i, p)| (p.metadata().name.clone(), i)).collect();

    let mut in_degree = vec![0usize; candidates.len()];
    let mut edges: Vec<Vec<usize>> = vec![Vec::new(); candidates.len()];

    for (i, plugin) in candidates.iter().enumerate() {
        for dep in &plugin.metadata().dependencies {
            if let Some(&dep_idx) = names.get(dep) {
                edges[dep_idx].push(i);
                in_degree[i] += 1;
            }
            // A dependency on a plugin outside this phase (or not
            // registered at all) is not this function's problem to flag —
            // the Orchestrator checks that when a `PluginError` occurs.
        }
    }

    let mut ready: Vec<usize> = (0..candidates.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut ordered = Vec::with_capacity(candidates.len());
    let mut visited = HashSet::new();

    while let Some(idx) = ready.first().copied() {
        ready.remove(0);
        visited.insert(idx);
        ordered.push(candidates[idx].clone());
        for &next in &edges[idx] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(next);
            }
        }
        ready.sort_unstable();
    }

    if ordered.len() != candidates.len() {
        let stuck: Vec<String> = (0..candidates.len())
            .filter(|i| !visited.contains(i))
            .map(|i| candidates[i].metadata().name.clone())
            .collect();
        return Err(GrafemaError::Config(format!(
            "cyclic plugin dependency among: {}",
            stuck.join(", ")
        )));
    }

    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PluginContext;
    use async_trait::async_trait;
    use grafema_core::plugin::PluginMetadata;

    struct Stub(PluginMetadata);

    #[async_trait]
    impl Plugin for Stub {
        fn metadata(&self) -> PluginMetadata {
            self.0.clone()
        }
        async fn execute(&self, _ctx: &mut PluginContext<'_>) -> Result<Vec<grafema_core::issue::Issue>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn orders_by_priority_descending() {
        let mut reg = PluginRegistry::new();
        reg.register(Arc::new(Stub(PluginMetadata::new("low", Phase::Validation, 1))));
        reg.register(Arc::new(Stub(PluginMetadata::new("high", Phase::Validation, 10))));
        let ordered = reg.for_phase(Phase::Validation).unwrap();
        assert_eq!(ordered[0].metadata().name, "high");
        assert_eq!(ordered[1].metadata().name, "low");
    }

    #[test]
    fn respects_declared_dependencies_over_priority() {
        let mut reg = PluginRegistry::new();
        reg.register(Arc::new(Stub(
            PluginMetadata::new("first", Phase::Enrichment, 1).depends_on(["second"]),
        )));
        reg.register(Arc::new(Stub(PluginMetadata::new("second", Phase::Enrichment, 100))));
        let ordered = reg.for_phase(Phase::Enrichment).unwrap();
        assert_eq!(ordered[0].metadata().name, "second");
        assert_eq!(ordered[1].metadata().name, "first");
    }

    #[test]
    fn cyclic_dependency_is_a_config_error() {
        let mut reg = PluginRegistry::new();
        reg.register(Arc::new(Stub(PluginMetadata::new("a", Phase::Validation, 0).depends_on(["b"]))));
        reg.register(Arc::new(Stub(PluginMetadata::new("b", Phase::Validation, 0).depends_on(["a"]))));
        assert!(reg.for_phase(Phase::Validation).is_err());
    }
}
