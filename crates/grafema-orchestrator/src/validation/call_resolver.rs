//! Flags a `CALL` that no plugin ever resolved to a target: not a local
//! function (Analysis would have wired `CALLS` already), not an import
//! (`FunctionCallResolverPlugin`'s job), not a known Node.js built-in or
//! global (`NodejsBuiltinsResolverPlugin`'s). Method calls are out of
//! scope here — an unresolved receiver type is too common to flag as an
//! error on its own.

use crate::context::{Plugin, PluginContext};
use async_trait::async_trait;
use grafema_core::error::Result;
use grafema_core::issue::{codes, Issue};
use grafema_core::plugin::{Phase, PluginMetadata};
use grafema_core::types::{EdgeKind, NodeKind};
use std::collections::HashSet;

pub struct CallResolverValidatorPlugin;

#[async_trait]
impl Plugin for CallResolverValidatorPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("call_resolver_validator", Phase::Validation, 80)
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> Result<Vec<Issue>> {
        let calls = ctx.backend.find_by_type(NodeKind::Call).await?;
        let imports = ctx.backend.find_by_type(NodeKind::Import).await?;
        let known_globals: HashSet<String> = ctx.config.known_globals().into_iter().collect();

        let mut imported_names_by_file: std::collections::HashMap<&str, HashSet<&str>> = std::collections::HashMap::new();
        for import in &imports {
            let Some(file) = &import.file else { continue };
            let names = import
                .attr("imported_names")
                .and_then(|v| v.as_array())
                .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect::<Vec<_>>())
                .unwrap_or_default();
            imported_names_by_file.entry(file.as_str()).or_default().extend(names);
        }

        let mut issues = Vec::new();
        for call in &calls {
            if ctx.cancellation.is_cancelled() {
                break;
            }
            if known_globals.contains(&call.name) {
                continue;
            }
            if let Some(file) = &call.file {
                if imported_names_by_file.get(file.as_str()).is_some_and(|names| names.contains(call.name.as_str())) {
                    continue;
                }
            }
            if !ctx.backend.get_outgoing_edges(&call.id, Some(&[EdgeKind::Calls])).await?.is_empty() {
                continue;
            }
            issues.push(
                Issue::warning(codes::UNRESOLVED_CALL, format!("call to `{}` did not resolve to any declaration", call.name))
                    .with_file(call.file.clone().unwrap_or_default()),
            );
        }

        Ok(issues)
    }
}
