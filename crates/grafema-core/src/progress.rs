use crate::plugin::Phase;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Progress event delivered on the scheduler thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressInfo {
    pub phase: Phase,
    pub current_plugin: Option<String>,
    pub message: String,
    pub total_files: Option<usize>,
    pub processed_files: Option<usize>,
    pub current_service: Option<String>,
    pub services_discovered: Option<usize>,
    pub services_analyzed: Option<usize>,
}

impl ProgressInfo {
    pub fn new(phase: Phase, message: impl Into<String>) -> Self {
        Self {
            phase,
            current_plugin: None,
            message: message.into(),
            total_files: None,
            processed_files: None,
            current_service: None,
            services_discovered: None,
            services_analyzed: None,
        }
    }

    pub fn with_plugin(mut self, name: impl Into<String>) -> Self {
        self.current_plugin = Some(name.into());
        self
    }

    pub fn with_files(mut self, processed: usize, total: usize) -> Self {
        self.processed_files = Some(processed);
        self.total_files = Some(total);
        self
    }

    pub fn with_service(mut self, name: impl Into<String>) -> Self {
        self.current_service = Some(name.into());
        self
    }
}

/// A cheap, clonable cancellation flag polled at phase/plugin/task
/// checkpoints. Setting it from any thread is observed by every
/// clone; there is no blocking wait, only a checked flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
