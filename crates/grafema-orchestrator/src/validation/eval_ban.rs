//! Flags direct use of `eval` and the `Function` constructor — both run
//! arbitrary strings as code, which no amount of graph resolution can make
//! safe to ignore.

use crate::context::{Plugin, PluginContext};
use async_trait::async_trait;
use grafema_core::error::Result;
use grafema_core::issue::{codes, Issue};
use grafema_core::plugin::{Phase, PluginMetadata};
use grafema_core::types::NodeKind;

const BANNED: &[&str] = &["eval", "Function"];

pub struct EvalBanValidatorPlugin;

#[async_trait]
impl Plugin for EvalBanValidatorPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("eval_ban_validator", Phase::Validation, 60)
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> Result<Vec<Issue>> {
        let calls = ctx.backend.find_by_type(NodeKind::Call).await?;
        let constructor_calls = ctx.backend.find_by_type(NodeKind::ConstructorCall).await?;

        let mut issues = Vec::new();
        for call in calls.iter().filter(|c| BANNED.contains(&c.name.as_str())) {
            issues.push(
                Issue::error(codes::EVAL_USE, format!("direct call to `{}` executes a dynamic string as code", call.name))
                    .with_file(call.file.clone().unwrap_or_default()),
            );
        }
        for call in constructor_calls.iter().filter(|c| c.name == "Function") {
            issues.push(
                Issue::error(codes::EVAL_USE, "`new Function(...)` executes a dynamic string as code")
                    .with_file(call.file.clone().unwrap_or_default()),
            );
        }

        Ok(issues)
    }
}
