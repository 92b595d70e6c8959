//! Discovery phase: produces the `Manifest`'s service
//! list. Explicit `config.services` entries win outright; otherwise the
//! project root is probed for a workspace layout (see `workspace`), and
//! failing that the root itself becomes the sole service.

use crate::context::{Plugin, PluginContext};
use crate::workspace;
use async_trait::async_trait;
use grafema_core::error::Result;
use grafema_core::issue::Issue;
use grafema_core::manifest::{ServiceDescriptor, ServiceType};
use grafema_core::plugin::{Phase, PluginMetadata};
use grafema_core::types::Language;
use serde::Deserialize;
use std::path::Path;

pub struct WorkspaceDiscoveryPlugin;

#[async_trait]
impl Plugin for WorkspaceDiscoveryPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("workspace_discovery", Phase::Discovery, 100)
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> Result<Vec<Issue>> {
        let mut issues = Vec::new();

        if !ctx.config.services.is_empty() {
            for svc in &ctx.config.services {
                let root = ctx.project_root.join(&svc.path);
                let entrypoint = svc
                    .entrypoints
                    .first()
                    .cloned()
                    .unwrap_or_else(|| default_entrypoint(&root));
                ctx.manifest.services.push(ServiceDescriptor {
                    name: svc.name.clone(),
                    root: svc.path.clone(),
                    language: detect_language(&root.join(&entrypoint)),
                    entrypoint,
                    service_type: service_type_of(&root),
                    test_files: Vec::new(),
                });
            }
            return Ok(issues);
        }

        if let Some(patterns) = workspace::detect_patterns(ctx.project_root) {
            let dirs = workspace::expand_patterns(ctx.project_root, &patterns);
            if dirs.is_empty() {
                issues.push(Issue::warning(
                    "WARN_EMPTY_WORKSPACE",
                    "workspace manifest present but no package directories matched",
                ));
            }
            for dir in dirs {
                let rel = dir.strip_prefix(ctx.project_root).unwrap_or(&dir).to_string_lossy().to_string();
                let name = package_name(&dir).unwrap_or_else(|| rel.clone());
                let entrypoint = default_entrypoint(&dir);
                ctx.manifest.services.push(ServiceDescriptor {
                    name,
                    language: detect_language(&dir.join(&entrypoint)),
                    entrypoint,
                    root: rel,
                    service_type: service_type_of(&dir),
                    test_files: Vec::new(),
                });
            }
            return Ok(issues);
        }

        let entrypoint = default_entrypoint(ctx.project_root);
        let name = package_name(ctx.project_root).unwrap_or_else(|| "root".to_string());
        ctx.manifest.services.push(ServiceDescriptor {
            name,
            root: ".".to_string(),
            language: detect_language(&ctx.project_root.join(&entrypoint)),
            entrypoint,
            service_type: service_type_of(ctx.project_root),
            test_files: Vec::new(),
        });

        Ok(issues)
    }
}

#[derive(Deserialize, Default)]
struct PackageJsonFields {
    name: Option<String>,
    main: Option<String>,
    bin: Option<serde_json::Value>,
    #[serde(default)]
    scripts: std::collections::HashMap<String, String>,
}

fn package_name(dir: &Path) -> Option<String> {
    let raw = std::fs::read_to_string(dir.join("package.json")).ok()?;
    let parsed: PackageJsonFields = serde_json::from_str(&raw).ok()?;
    parsed.name
}

fn default_entrypoint(dir: &Path) -> String {
    if let Ok(raw) = std::fs::read_to_string(dir.join("package.json")) {
        if let Ok(parsed) = serde_json::from_str::<PackageJsonFields>(&raw) {
            if let Some(main) = parsed.main {
                return main;
            }
        }
    }
    for candidate in ["src/index.ts", "src/index.js", "index.ts", "index.js"] {
        if dir.join(candidate).exists() {
            return candidate.to_string();
        }
    }
    "src/index.ts".to_string()
}

fn service_type_of(dir: &Path) -> ServiceType {
    let Ok(raw) = std::fs::read_to_string(dir.join("package.json")) else {
        return ServiceType::Unknown;
    };
    let Ok(parsed) = serde_json::from_str::<PackageJsonFields>(&raw) else {
        return ServiceType::Unknown;
    };
    if parsed.bin.is_some() {
        return ServiceType::Application;
    }
    if parsed.scripts.contains_key("start") || parsed.scripts.contains_key("serve") {
        return ServiceType::Service;
    }
    ServiceType::Library
}

fn detect_language(entrypoint: &Path) -> Language {
    match entrypoint.extension().and_then(|s| s.to_str()) {
        Some("ts") | Some("tsx") => Language::TypeScript,
        Some("js") | Some("jsx") | Some("mjs") | Some("cjs") => Language::JavaScript,
        Some("rs") => Language::Rust,
        Some("py") => Language::Python,
        Some("go") => Language::Go,
        _ => Language::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grafema_core::config::Config;
    use grafema_core::manifest::Manifest;
    use grafema_core::progress::CancellationToken;
    use grafema_graph::InMemoryGraphBackend;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn single_service_fallback_when_no_workspace() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/index.ts"), "export const x = 1;").unwrap();

        let backend = InMemoryGraphBackend::new();
        let config = Config::default();
        let mut manifest = Manifest::default();
        let cancellation = CancellationToken::new();
        let mut ctx = PluginContext {
            backend: &backend,
            config: &config,
            manifest: &mut manifest,
            cancellation: &cancellation,
            project_root: dir.path(),
            on_progress: None,
        };

        WorkspaceDiscoveryPlugin.execute(&mut ctx).await.unwrap();
        assert_eq!(manifest.services.len(), 1);
        assert_eq!(manifest.services[0].entrypoint, "src/index.ts");
    }

    #[tokio::test]
    async fn explicit_config_services_take_priority() {
        let dir = TempDir::new().unwrap();
        let backend = InMemoryGraphBackend::new();
        let mut config = Config::default();
        config.services.push(grafema_core::config::ServiceConfig {
            name: "api".to_string(),
            path: "services/api".to_string(),
            entrypoints: vec!["src/main.ts".to_string()],
        });
        let mut manifest = Manifest::default();
        let cancellation = CancellationToken::new();
        let mut ctx = PluginContext {
            backend: &backend,
            config: &config,
            manifest: &mut manifest,
            cancellation: &cancellation,
            project_root: dir.path(),
            on_progress: None,
        };

        WorkspaceDiscoveryPlugin.execute(&mut ctx).await.unwrap();
        assert_eq!(manifest.services.len(), 1);
        assert_eq!(manifest.services[0].name, "api");
    }
}
