//! Indexing phase: walks each service from its
//! entrypoint following `import`/`require`/`export-from`, emitting a
//! MODULE node per resolved file, `CONTAINS` edges from the SERVICE, and
//! `DEPENDS_ON`/`IMPORTS` edges between modules. Hard caps (2 000 modules,
//! depth 50) stop traversal for that service with a warning `Issue`, never
//! the whole run.

use crate::context::{Plugin, PluginContext};
use crate::imports;
use async_trait::async_trait;
use grafema_core::error::Result;
use grafema_core::issue::{codes, Issue};
use grafema_core::manifest::ServiceDescriptor;
use grafema_core::node::GraphNode;
use grafema_core::plugin::{Phase, PluginMetadata};
use grafema_core::types::{EdgeKind, NodeKind};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

const MAX_MODULES_PER_SERVICE: usize = 2_000;
const MAX_DEPTH: usize = 50;
const RESOLVABLE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

pub struct ImportWalkIndexingPlugin;

#[async_trait]
impl Plugin for ImportWalkIndexingPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("import_walk_indexing", Phase::Indexing, 100)
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> Result<Vec<Issue>> {
        let mut issues = Vec::new();
        let services = ctx.manifest.services.clone();

        for service in &services {
            if ctx.cancellation.is_cancelled() {
                break;
            }
            index_service(ctx, service, &mut issues).await?;
        }

        Ok(issues)
    }
}

async fn index_service(
    ctx: &mut PluginContext<'_>,
    service: &ServiceDescriptor,
    issues: &mut Vec<Issue>,
) -> Result<()> {
    let service_root = ctx.project_root.join(&service.root);
    let entry_abs = normalize(&service_root.join(&service.entrypoint));

    let service_id = format!("SERVICE::{}", service.name);
    let mut nodes = vec![GraphNode::new(service_id.clone(), NodeKind::Service, service.name.clone())
        .with_file(service.root.clone())];
    let mut edges = Vec::new();

    let entrypoint_id = format!("{service_id}::ENTRYPOINT");
    nodes.push(
        GraphNode::new(entrypoint_id.clone(), NodeKind::Entrypoint, service.entrypoint.clone())
            .with_file(rel_path(ctx.project_root, &entry_abs)),
    );
    edges.push((EdgeKind::Contains, service_id.clone(), entrypoint_id.clone()));

    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut queue: VecDeque<(PathBuf, usize)> = VecDeque::new();
    let mut hit_module_cap = false;
    let mut hit_depth_cap = false;

    if entry_abs.exists() {
        queue.push_back((entry_abs.clone(), 0));
        visited.insert(entry_abs.clone());
    } else {
        issues.push(
            Issue::error(codes::FILE_ACCESS_FAILED, format!("entrypoint not found: {}", entry_abs.display()))
                .with_service(service.name.clone()),
        );
    }

    while let Some((file, depth)) = queue.pop_front() {
        if visited.len() > MAX_MODULES_PER_SERVICE {
            hit_module_cap = true;
            break;
        }
        if depth > MAX_DEPTH {
            hit_depth_cap = true;
            continue;
        }

        let rel = rel_path(ctx.project_root, &file);
        let module_id = format!("{rel}->MODULE");
        nodes.push(GraphNode::new(module_id.clone(), NodeKind::Module, rel.clone()).with_file(rel.clone()));
        edges.push((EdgeKind::Contains, service_id.clone(), module_id.clone()));
        if file == entry_abs {
            edges.push((EdgeKind::Contains, entrypoint_id.clone(), module_id.clone()));
        }

        let Ok(source) = std::fs::read_to_string(&file) else {
            issues.push(
                Issue::warning(codes::FILE_ACCESS_FAILED, format!("could not read {}", file.display()))
                    .with_service(service.name.clone())
                    .with_file(rel.clone()),
            );
            continue;
        };

        for spec in imports::extract_specifiers(&source) {
            if !spec.starts_with('.') {
                continue; // bare specifier: external package, not indexed
            }
            let Some(resolved) = resolve_specifier(&file, &spec) else { continue };
            let resolved_rel = rel_path(ctx.project_root, &resolved);
            let resolved_id = format!("{resolved_rel}->MODULE");
            edges.push((EdgeKind::DependsOn, module_id.clone(), resolved_id.clone()));
            edges.push((EdgeKind::Imports, module_id.clone(), resolved_id.clone()));

            if !visited.contains(&resolved) {
                visited.insert(resolved.clone());
                queue.push_back((resolved, depth + 1));
            }
        }
    }

    if hit_module_cap {
        issues.push(
            Issue::warning(codes::MODULE_CAP_REACHED, format!("service `{}` exceeded {MAX_MODULES_PER_SERVICE} modules; traversal stopped", service.name))
                .with_service(service.name.clone()),
        );
    }
    if hit_depth_cap {
        issues.push(
            Issue::warning(codes::DEPTH_CAP_REACHED, format!("service `{}` exceeded depth {MAX_DEPTH}; deeper imports not followed", service.name))
                .with_service(service.name.clone()),
        );
    }

    ctx.backend.add_nodes(nodes).await?;
    let graph_edges: Vec<_> = edges
        .into_iter()
        .map(|(kind, src, dst)| grafema_core::edge::GraphEdge::new(kind, src, dst))
        .collect();
    ctx.backend.add_edges(graph_edges, true).await?;

    Ok(())
}

pub(crate) fn rel_path(root: &Path, file: &Path) -> String {
    file.strip_prefix(root).unwrap_or(file).to_string_lossy().replace('\\', "/")
}

/// Resolves a relative specifier against `from`'s directory, trying the
/// literal path, each known extension, and `/index.<ext>` for directory
/// imports. Returns `None` when nothing on disk matches (an external or
/// unresolvable import — left to `BrokenImportValidator` in Enrichment).
pub(crate) fn resolve_specifier(from: &Path, spec: &str) -> Option<PathBuf> {
    let base = from.parent()?.join(spec);

    if base.is_file() {
        return Some(normalize(&base));
    }
    for ext in RESOLVABLE_EXTENSIONS {
        let candidate = append_ext(&base, ext);
        if candidate.is_file() {
            return Some(normalize(&candidate));
        }
    }
    for ext in RESOLVABLE_EXTENSIONS {
        let candidate = base.join(format!("index.{ext}"));
        if candidate.is_file() {
            return Some(normalize(&candidate));
        }
    }
    None
}

fn append_ext(path: &Path, ext: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

pub(crate) fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use grafema_core::config::Config;
    use grafema_core::manifest::{Manifest, ServiceType};
    use grafema_core::progress::CancellationToken;
    use grafema_core::types::Language;
    use grafema_graph::InMemoryGraphBackend;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn walks_import_chain_and_emits_modules() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/index.ts"), "import { b } from './b';").unwrap();
        fs::write(dir.path().join("src/b.ts"), "export const b = 1;").unwrap();

        let backend = InMemoryGraphBackend::new();
        let config = Config::default();
        let mut manifest = Manifest::default();
        manifest.services.push(ServiceDescriptor {
            name: "root".to_string(),
            root: ".".to_string(),
            entrypoint: "src/index.ts".to_string(),
            service_type: ServiceType::Library,
            language: Language::TypeScript,
            test_files: Vec::new(),
        });
        let cancellation = CancellationToken::new();
        let mut ctx = PluginContext {
            backend: &backend,
            config: &config,
            manifest: &mut manifest,
            cancellation: &cancellation,
            project_root: dir.path(),
            on_progress: None,
        };

        ImportWalkIndexingPlugin.execute(&mut ctx).await.unwrap();

        let modules = backend.find_by_type(NodeKind::Module).await.unwrap();
        assert_eq!(modules.len(), 2);
        let depends = backend.count_edges_by_type(Some(&[EdgeKind::DependsOn])).await.unwrap();
        assert_eq!(*depends.get(&EdgeKind::DependsOn).unwrap_or(&0), 1);
    }

    #[tokio::test]
    async fn missing_entrypoint_records_an_issue() {
        let dir = TempDir::new().unwrap();
        let backend = InMemoryGraphBackend::new();
        let config = Config::default();
        let mut manifest = Manifest::default();
        manifest.services.push(ServiceDescriptor {
            name: "root".to_string(),
            root: ".".to_string(),
            entrypoint: "src/missing.ts".to_string(),
            service_type: ServiceType::Library,
            language: Language::TypeScript,
            test_files: Vec::new(),
        });
        let cancellation = CancellationToken::new();
        let mut ctx = PluginContext {
            backend: &backend,
            config: &config,
            manifest: &mut manifest,
            cancellation: &cancellation,
            project_root: dir.path(),
            on_progress: None,
        };

        let issues = ImportWalkIndexingPlugin.execute(&mut ctx).await.unwrap();
        assert!(issues.iter().any(|i| i.code == codes::FILE_ACCESS_FAILED));
    }
}
