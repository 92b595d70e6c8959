use super::semantic_id::{content_hash, disambiguate};
use std::collections::HashMap;

/// A node awaiting its final id. `base_id` is the scope-path id without a
/// disambiguator; `hints` is the kind-specific content string hashed to
/// break ties between sibling nodes that share a `base_id`.
#[derive(Debug, Clone)]
pub struct PendingNode {
    pub base_id: String,
    pub hints: String,
}

/// Two-phase id assignment: every node discovered during a module's
/// traversal is staged here via `push`, and the final ids are only known
/// once the whole module has been seen, since disambiguation depends on
/// how many siblings share a base id. `push` returns a token used to look
/// up the resolved id after `resolve` runs.
#[derive(Debug, Default)]
pub struct CollisionResolver {
    pending: Vec<PendingNode>,
}

impl CollisionResolver {
    pub fn new() -> Self {
        Self { pending: Vec::new() }
    }

    pub fn push(&mut self, base_id: String, hints: String) -> usize {
        self.pending.push(PendingNode { base_id, hints });
        self.pending.len() - 1
    }

    /// Resolves every staged node to its final id, preserving insertion
    /// order (the returned `Vec<String>` is indexed by the token `push`
    /// returned).
    ///
    /// - A `base_id` held by exactly one node: the bare base id, no
    ///   disambiguator.
    /// - A `base_id` shared by several nodes: each node's `hints` is
    ///   hashed. Hashes unique within the group get `base_id[h:hash]`.
    ///   Nodes that also share a hash (true duplicate structures) get
    ///   `base_id[h:hash]` for the first by insertion order and
    ///   `base_id[h:hash]#N` (N starting at 1) for the rest.
    pub fn resolve(self) -> Vec<String> {
        let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, node) in self.pending.iter().enumerate() {
            groups.entry(node.base_id.clone()).or_default().push(idx);
        }

        let mut resolved = vec![String::new(); self.pending.len()];
        for (base_id, indices) in groups {
            if indices.len() == 1 {
                resolved[indices[0]] = base_id;
                continue;
            }

            let mut by_hash: HashMap<String, Vec<usize>> = HashMap::new();
            for &idx in &indices {
                let hash = content_hash(&self.pending[idx].hints);
                by_hash.entry(hash).or_default().push(idx);
            }

            for (hash, mut hash_indices) in by_hash {
                hash_indices.sort_unstable();
                for (ordinal, idx) in hash_indices.iter().enumerate() {
                    let suffix = if ordinal == 0 { None } else { Some(ordinal) };
                    resolved[*idx] = disambiguate(&base_id, &hash, suffix);
                }
            }
        }

        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singleton_group_gets_bare_base_id() {
        let mut resolver = CollisionResolver::new();
        let token = resolver.push("a.ts->module->VARIABLE->x".to_string(), "init:1".to_string());
        let ids = resolver.resolve();
        assert_eq!(ids[token], "a.ts->module->VARIABLE->x");
    }

    #[test]
    fn distinct_hints_get_distinct_hash_disambiguators() {
        let mut resolver = CollisionResolver::new();
        let t1 = resolver.push("a.ts->module->VARIABLE->x".to_string(), "init:1".to_string());
        let t2 = resolver.push("a.ts->module->VARIABLE->x".to_string(), "init:2".to_string());
        let ids = resolver.resolve();
        assert_ne!(ids[t1], ids[t2]);
        assert!(ids[t1].starts_with("a.ts->module->VARIABLE->x[h:"));
        assert!(ids[t2].starts_with("a.ts->module->VARIABLE->x[h:"));
        assert!(!ids[t1].contains('#'));
        assert!(!ids[t2].contains('#'));
    }

    #[test]
    fn identical_hints_fall_back_to_ordinal_tiebreak() {
        let mut resolver = CollisionResolver::new();
        let t1 = resolver.push("a.ts->module->VARIABLE->x".to_string(), "init:1".to_string());
        let t2 = resolver.push("a.ts->module->VARIABLE->x".to_string(), "init:1".to_string());
        let ids = resolver.resolve();
        assert!(!ids[t1].contains('#'));
        assert!(ids[t2].ends_with("#1"));
    }
}
