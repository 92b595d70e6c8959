//! Workspace discovery: detects a monorepo's package manifests in
//! priority order `pnpm-workspace.yaml(|.yml)` -> `package.json` with
//! `workspaces` -> `lerna.json`, expands the glob patterns each declares to
//! the set of directories containing a package manifest, and honours
//! `!pattern` negations. Depth-capped and vendor/hidden-directory-skipping,
//! built on `globset`'s combinators for matching candidate directories.

use globset::{Glob, GlobSetBuilder};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const MAX_DEPTH: usize = 10;
const VENDOR_DIRS: &[&str] = &["node_modules", "vendor", "target", "dist", "build", ".git"];

#[derive(Debug, Deserialize)]
struct PnpmWorkspace {
    #[serde(default)]
    packages: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PackageJsonWorkspaces {
    #[serde(default)]
    workspaces: Option<WorkspacesField>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WorkspacesField {
    List(Vec<String>),
    Object { packages: Vec<String> },
}

#[derive(Debug, Deserialize)]
struct LernaJson {
    #[serde(default)]
    packages: Vec<String>,
}

/// Detects the workspace manifest at `root` (if any) and returns its raw
/// glob patterns, in detection-priority order. Returns `None` when the
/// project isn't a recognised workspace layout at all — the caller then
/// falls back to treating `root` itself as a single service.
pub fn detect_patterns(root: &Path) -> Option<Vec<String>> {
    for name in ["pnpm-workspace.yaml", "pnpm-workspace.yml"] {
        let path = root.join(name);
        if let Ok(raw) = std::fs::read_to_string(&path) {
            if let Ok(parsed) = serde_yaml::from_str::<PnpmWorkspace>(&raw) {
                return Some(parsed.packages);
            }
        }
    }

    let pkg_path = root.join("package.json");
    if let Ok(raw) = std::fs::read_to_string(&pkg_path) {
        if let Ok(parsed) = serde_json::from_str::<PackageJsonWorkspaces>(&raw) {
            match parsed.workspaces {
                Some(WorkspacesField::List(patterns)) => return Some(patterns),
                Some(WorkspacesField::Object { packages }) => return Some(packages),
                None => {}
            }
        }
    }

    let lerna_path = root.join("lerna.json");
    if let Ok(raw) = std::fs::read_to_string(&lerna_path) {
        if let Ok(parsed) = serde_json::from_str::<LernaJson>(&raw) {
            return Some(parsed.packages);
        }
    }

    None
}

/// Expands `patterns` (positive and `!`-negated) against `root`, returning
/// every directory that both matches a positive pattern and contains a
/// `package.json`, skipping hidden/vendor directories and capping recursion
/// at `MAX_DEPTH`.
pub fn expand_patterns(root: &Path, patterns: &[String]) -> Vec<PathBuf> {
    let mut positive = GlobSetBuilder::new();
    let mut negative = GlobSetBuilder::new();
    let mut any_positive = false;
    let mut any_negative = false;

    for pattern in patterns {
        if let Some(stripped) = pattern.strip_prefix('!') {
            if let Ok(glob) = Glob::new(stripped) {
                negative.add(glob);
                any_negative = true;
            }
        } else if let Ok(glob) = Glob::new(pattern) {
            positive.add(glob);
            any_positive = true;
        }
    }

    if !any_positive {
        return Vec::new();
    }

    let positive = positive.build().unwrap_or_else(|_| GlobSetBuilder::new().build().unwrap());
    let negative = if any_negative {
        negative.build().ok()
    } else {
        None
    };

    let mut found = Vec::new();
    walk(root, root, 0, &positive, negative.as_ref(), &mut found);
    found.sort();
    found.dedup();
    found
}

fn walk(
    root: &Path,
    dir: &Path,
    depth: usize,
    positive: &globset::GlobSet,
    negative: Option<&globset::GlobSet>,
    found: &mut Vec<PathBuf>,
) {
    if depth > MAX_DEPTH {
        return;
    }
    let Ok(entries) = std::fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else { continue };
        if name.starts_with('.') || VENDOR_DIRS.contains(&name) {
            continue;
        }

        let rel = path.strip_prefix(root).unwrap_or(&path);
        let matches_positive = positive.is_match(rel);
        let matches_negative = negative.map(|n| n.is_match(rel)).unwrap_or(false);

        if matches_positive && !matches_negative && path.join("package.json").exists() {
            found.push(path.clone());
        }

        walk(root, &path, depth + 1, positive, negative, found);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn detects_pnpm_workspace() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pnpm-workspace.yaml"), "packages:\n  - 'services/*'\n").unwrap();
        let patterns = detect_patterns(dir.path()).unwrap();
        assert_eq!(patterns, vec!["services/*".to_string()]);
    }

    #[test]
    fn detects_package_json_workspaces_list_form() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"workspaces": ["packages/*"]}"#).unwrap();
        let patterns = detect_patterns(dir.path()).unwrap();
        assert_eq!(patterns, vec!["packages/*".to_string()]);
    }

    #[test]
    fn no_workspace_manifest_yields_none() {
        let dir = TempDir::new().unwrap();
        assert!(detect_patterns(dir.path()).is_none());
    }

    #[test]
    fn expand_patterns_finds_package_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("services/api")).unwrap();
        fs::write(dir.path().join("services/api/package.json"), "{}").unwrap();
        fs::create_dir_all(dir.path().join("services/web")).unwrap();
        fs::write(dir.path().join("services/web/package.json"), "{}").unwrap();

        let found = expand_patterns(dir.path(), &["services/*".to_string()]);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn negated_pattern_excludes_a_match() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("services/api")).unwrap();
        fs::write(dir.path().join("services/api/package.json"), "{}").unwrap();
        fs::create_dir_all(dir.path().join("services/excluded")).unwrap();
        fs::write(dir.path().join("services/excluded/package.json"), "{}").unwrap();

        let found = expand_patterns(
            dir.path(),
            &["services/*".to_string(), "!services/excluded".to_string()],
        );
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("api"));
    }
}
