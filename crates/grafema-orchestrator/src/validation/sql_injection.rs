//! Heuristic: a template literal that both looks like SQL and interpolates
//! an expression is a classic injection shape (`` `SELECT * FROM users
//! WHERE id = ${id}` ``) regardless of which driver call it eventually
//! reaches. Cheap and over-inclusive by design — this is a warning, not a
//! proof.

use crate::context::{Plugin, PluginContext};
use async_trait::async_trait;
use grafema_core::error::Result;
use grafema_core::issue::{codes, Issue};
use grafema_core::plugin::{Phase, PluginMetadata};
use grafema_core::types::NodeKind;
use regex::Regex;

pub struct SqlInjectionValidatorPlugin;

#[async_trait]
impl Plugin for SqlInjectionValidatorPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("sql_injection_validator", Phase::Validation, 60)
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> Result<Vec<Issue>> {
        let sql_keyword = Regex::new(r"(?i)^\s*(select|insert|update|delete|drop|alter|create)\b").expect("static regex");
        let literals = ctx.backend.find_by_type(NodeKind::Literal).await?;

        let mut issues = Vec::new();
        for literal in &literals {
            if ctx.cancellation.is_cancelled() {
                break;
            }
            if literal.attr("kind").and_then(|v| v.as_str()) != Some("Template") {
                continue;
            }
            let Some(preview) = literal.attr("raw_preview").and_then(|v| v.as_str()) else { continue };
            if preview.contains("${") && sql_keyword.is_match(preview) {
                issues.push(
                    Issue::warning(codes::SQL_INJECTION_RISK, format!("interpolated SQL template literal: {preview}"))
                        .with_file(literal.file.clone().unwrap_or_default()),
                );
            }
        }

        Ok(issues)
    }
}
