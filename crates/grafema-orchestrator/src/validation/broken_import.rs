//! Flags an `IMPORT` that never got an `IMPORTS_FROM` edge from
//! `ImportExportLinkerPlugin`, skipping what was never supposed to resolve
//! to a local EXPORT in the first place: namespace imports, type-only
//! imports, and specifiers that resolve outside the project (node_modules,
//! Node.js built-ins — those get their own `EXTERNAL` link instead).

use crate::context::{Plugin, PluginContext};
use crate::indexing::resolve_specifier;
use async_trait::async_trait;
use grafema_core::error::Result;
use grafema_core::issue::{codes, Issue};
use grafema_core::plugin::{Phase, PluginMetadata};
use grafema_core::types::{EdgeKind, NodeKind};

pub struct BrokenImportValidatorPlugin;

#[async_trait]
impl Plugin for BrokenImportValidatorPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("broken_import_validator", Phase::Validation, 90)
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> Result<Vec<Issue>> {
        let imports = ctx.backend.find_by_type(NodeKind::Import).await?;
        let mut issues = Vec::new();

        for import in &imports {
            if ctx.cancellation.is_cancelled() {
                break;
            }
            let is_namespace = import.attr("is_namespace").and_then(|v| v.as_bool()).unwrap_or(false);
            let is_type_only = import.attr("is_type_only").and_then(|v| v.as_bool()).unwrap_or(false);
            if is_namespace || is_type_only {
                continue;
            }
            let Some(file) = &import.file else { continue };
            if resolve_specifier(&ctx.project_root.join(file), &import.name).is_none() {
                continue;
            }
            if !ctx.backend.get_outgoing_edges(&import.id, Some(&[EdgeKind::ImportsFrom])).await?.is_empty() {
                continue;
            }
            issues.push(
                Issue::error(codes::BROKEN_IMPORT, format!("import `{}` does not resolve to any export", import.name))
                    .with_file(file.clone()),
            );
        }

        Ok(issues)
    }
}
