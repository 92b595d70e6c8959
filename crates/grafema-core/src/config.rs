use crate::error::{GrafemaError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// `.grafema/config.yaml`, relative to a project root. Loading is a pure
/// parse: no file watcher, no hot reload, no secrets layer — those belong
/// to products built on top of this core, not to the indexing pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub routing: serde_yaml::Value,
    #[serde(default)]
    pub plugins: PluginsConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub entrypoints: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default)]
    pub roots: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginsConfig {
    #[serde(default)]
    pub discovery: Vec<String>,
    #[serde(default)]
    pub indexing: Vec<String>,
    #[serde(default)]
    pub analysis: Vec<String>,
    #[serde(default)]
    pub enrichment: Vec<String>,
    #[serde(default)]
    pub validation: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub max_workers: Option<usize>,
    #[serde(default)]
    pub socket_path: Option<String>,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_workers: None,
            socket_path: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestsConfig {
    #[serde(default)]
    pub mark_test_files: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub parallel: ParallelConfig,
    #[serde(default)]
    pub tests: TestsConfig,
    /// Extends (never replaces) the embedded default set of known globals.
    #[serde(default)]
    pub known_globals: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Loads `<project_root>/.grafema/config.yaml`. A missing file yields
    /// the all-defaults config (an empty `services` list is valid — the
    /// caller may still pass a `serviceFilter` against an empty manifest).
    /// A malformed file is a `ConfigError`, which aborts the run before any
    /// phase runs.
    pub fn load(project_root: &Path) -> Result<Self> {
        let path = project_root.join(".grafema").join("config.yaml");
        if !path.exists() {
            return Ok(Config::default());
        }
        let raw = std::fs::read_to_string(&path).map_err(|e| GrafemaError::FileAccess {
            file: path.display().to_string(),
            source: e,
        })?;
        serde_yaml::from_str(&raw).map_err(|e| GrafemaError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn max_workers(&self) -> usize {
        self.analysis
            .parallel
            .max_workers
            .unwrap_or_else(num_cpus::get)
            .min(16)
            .max(1)
    }

    /// The full known-globals set: the embedded ECMAScript/Node.js default
    /// plus whatever the project extends it with.
    pub fn known_globals(&self) -> Vec<String> {
        let mut globals: Vec<String> = default_known_globals().iter().map(|s| s.to_string()).collect();
        globals.extend(self.analysis.known_globals.iter().cloned());
        globals
    }
}

/// The embedded default set of common ECMAScript/Node.js globals that
/// `BrokenImportValidator` and `CallResolverValidator` must never flag as
/// unresolved.
pub fn default_known_globals() -> &'static [&'static str] {
    &[
        "console", "process", "Promise", "Object", "Array", "Map", "Set", "WeakMap", "WeakSet",
        "JSON", "Math", "Error", "TypeError", "RangeError", "SyntaxError", "ReferenceError",
        "EvalError", "URIError", "setTimeout", "setInterval", "clearTimeout", "clearInterval",
        "require", "module", "exports", "__dirname", "__filename", "globalThis", "Buffer",
        "Symbol", "Proxy", "Reflect", "Date", "RegExp", "Number", "String", "Boolean", "undefined",
        "NaN", "Infinity", "structuredClone", "queueMicrotask", "fetch", "URL", "URLSearchParams",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_file_is_all_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(config.services.is_empty());
        assert!(config.analysis.parallel.enabled);
    }

    #[test]
    fn unknown_keys_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".grafema")).unwrap();
        std::fs::write(
            dir.path().join(".grafema/config.yaml"),
            "services:\n  - name: api\n    path: services/api\n    entrypoints: [src/index.ts]\nsome_future_key: 42\n",
        )
        .unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.services.len(), 1);
        assert_eq!(config.services[0].name, "api");
    }

    #[test]
    fn known_globals_extends_the_default_set() {
        let mut config = Config::default();
        config.analysis.known_globals = vec!["MyGlobal".to_string()];
        let globals = config.known_globals();
        assert!(globals.contains(&"console".to_string()));
        assert!(globals.contains(&"MyGlobal".to_string()));
    }
}
