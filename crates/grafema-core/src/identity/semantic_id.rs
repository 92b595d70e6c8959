use crate::types::NodeKind;
use sha2::{Digest, Sha256};

/// The hint schema is a stability contract: changing
/// what goes into a kind's hint string invalidates every downstream diff
/// baseline, so it is versioned and bumped only alongside a migration note
/// in `DESIGN.md`.
pub const HINT_SCHEMA_VERSION: u32 = 1;

/// Builds the disambiguator-free base id:
/// `{file}->{scope_segment_0}->…->{NodeKind}->{name}`.
pub fn base_id(file: &str, scope_path: &[String], kind: NodeKind, name: &str) -> String {
    let mut parts = Vec::with_capacity(scope_path.len() + 3);
    parts.push(file.to_string());
    parts.extend(scope_path.iter().cloned());
    parts.push(kind.as_str().to_string());
    parts.push(name.to_string());
    parts.join("->")
}

/// An 8-hex-character content hash of a kind-specific hint string. Two
/// pending nodes with the same `base_id` but different hints land in
/// different disambiguation groups; same hints (a true duplicate
/// structure) fall through to the `#N` ordinal tiebreak.
pub fn content_hash(hints: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(hints.as_bytes());
    let digest = hasher.finalize();
    hex_prefix(&digest, 4)
}

fn hex_prefix(bytes: &[u8], n: usize) -> String {
    bytes.iter().take(n).map(|b| format!("{:02x}", b)).collect()
}

/// Appends the `[h:<hash>]` or `[h:<hash>]#N` disambiguator to a base id.
pub fn disambiguate(base: &str, hash: &str, ordinal: Option<usize>) -> String {
    match ordinal {
        None => format!("{base}[h:{hash}]"),
        Some(n) => format!("{base}[h:{hash}]#{n}"),
    }
}

/// The id of the MODULE node for `file`. Never runs through disambiguation
/// (a file has exactly one module node), so unlike every other node kind it
/// is never suffixed with `[h:...]`.
pub fn module_id(file: &str) -> String {
    format!("{file}->MODULE")
}

/// Cuts a (possibly disambiguated) id back to its base id by truncating at
/// the `[h:` marker. Used to map an `owner_base_id`/`target_base_id`
/// captured mid-traversal back to whatever final id `finalize_ids` assigned
/// its owner, since the base id itself is overwritten in place.
pub fn strip_disambiguator(id: &str) -> &str {
    match id.find("[h:") {
        Some(idx) => &id[..idx],
        None => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_id_concatenates_with_arrows() {
        let id = base_id("a.ts", &["module".to_string()], NodeKind::Function, "foo");
        assert_eq!(id, "a.ts->module->FUNCTION->foo");
    }

    #[test]
    fn content_hash_is_stable_and_eight_hex_chars() {
        let h1 = content_hash("params:a,b|async:false|stmts:3");
        let h2 = content_hash("params:a,b|async:false|stmts:3");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 8);
    }

    #[test]
    fn different_hints_produce_different_hashes() {
        let h1 = content_hash("params:a,b");
        let h2 = content_hash("params:a,c");
        assert_ne!(h1, h2);
    }

    #[test]
    fn strip_disambiguator_recovers_base() {
        let base = "a.ts->module->FUNCTION->foo";
        let disambiguated = disambiguate(base, "abcd1234", Some(2));
        assert_eq!(strip_disambiguator(&disambiguated), base);
        assert_eq!(strip_disambiguator(base), base);
    }

    #[test]
    fn module_id_has_no_disambiguator() {
        assert_eq!(module_id("src/a.ts"), "src/a.ts->MODULE");
    }
}
