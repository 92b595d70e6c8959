//! The plugin contract every phase's registrants implement. A plugin is a stateless factory producing a worker
//! function; here that's simply a `Plugin` trait object the registry holds
//! and calls in dependency order.

use async_trait::async_trait;
use grafema_core::config::Config;
use grafema_core::error::Result;
use grafema_core::issue::Issue;
use grafema_core::manifest::Manifest;
use grafema_core::plugin::PluginMetadata;
use grafema_core::progress::{CancellationToken, ProgressInfo};
use grafema_core::traits::GraphBackend;

pub type ProgressCallback<'a> = &'a (dyn Fn(ProgressInfo) + Send + Sync);

/// Everything a plugin's `execute` needs, threaded through by the
/// Orchestrator on its own thread. `manifest` is mutable only for Discovery
/// (which populates it); every later phase treats it read-only.
pub struct PluginContext<'a> {
    pub backend: &'a dyn GraphBackend,
    pub config: &'a Config,
    pub manifest: &'a mut Manifest,
    pub cancellation: &'a CancellationToken,
    pub project_root: &'a std::path::Path,
    pub on_progress: Option<ProgressCallback<'a>>,
}

impl<'a> PluginContext<'a> {
    pub fn report(&self, info: ProgressInfo) {
        if let Some(cb) = self.on_progress {
            cb(info);
        }
    }
}

/// Issues a plugin wants folded into the run's `Manifest` — never a reason
/// to abort by itself; only `ConfigError` and a dependency-missing
/// `PluginError` bubble out of `execute` as an `Err`.
pub type PluginOutput = Vec<Issue>;

#[async_trait]
pub trait Plugin: Send + Sync {
    fn metadata(&self) -> PluginMetadata;

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> Result<PluginOutput>;
}
