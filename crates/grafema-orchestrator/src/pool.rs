//! Worker pool: OS threads, not async tasks, because
//! `tree_sitter::Parser`/`Tree` are pinned to the thread that owns them for
//! one `parse` call. Tasks and completed bundles cross a bounded
//! lock-free MPMC channel each way, built on `grafema_concurrent::mpmc`.

use grafema_analyzer::ModuleAnalyzer;
use grafema_concurrent::mpmc::LockFreeMpmcQueue;
use grafema_core::error::GrafemaError;
use grafema_core::fact::FactBundle;
use grafema_core::types::Language;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// One unit of analysis work: a file and the language it was detected as
/// during Indexing/Discovery.
pub struct ParseTask {
    pub file: String,
    pub language: Language,
}

/// A worker's outcome for one task: either a finalized `FactBundle`, or
/// `{file, error}` "a worker that encounters a parse failure
/// returns an error bundle rather than crashing".
pub enum ParseOutcome {
    Bundle(FactBundle),
    Error { file: String, error: String },
}

const INIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Spawns `min(max_workers, 16)` OS threads, each with its own
/// `ModuleAnalyzer`. `dispatch` blocks the calling (Orchestrator) thread
/// only on the outbound queue being full; `recv_result` blocks only when no
/// worker has produced a result yet.
pub struct WorkerPool {
    tasks: LockFreeMpmcQueue<ParseTask>,
    results: LockFreeMpmcQueue<ParseOutcome>,
    shutdown: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
    ready: Arc<std::sync::atomic::AtomicUsize>,
    worker_count: usize,
}

impl WorkerPool {
    /// Spawns the pool and blocks until every worker has signalled ready or
    /// `INIT_TIMEOUT` elapses.
    pub fn spawn(max_workers: usize) -> Result<Self, GrafemaError> {
        let worker_count = max_workers.min(16).max(1);
        let tasks = LockFreeMpmcQueue::with_capacity(worker_count * 64 + 64);
        let results = LockFreeMpmcQueue::with_capacity(worker_count * 64 + 64);
        let shutdown = Arc::new(AtomicBool::new(false));
        let ready = Arc::new(std::sync::atomic::AtomicUsize::new(0));

        let mut handles = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            let tasks = tasks.clone();
            let results = results.clone();
            let shutdown = shutdown.clone();
            let ready = ready.clone();
            handles.push(
                std::thread::Builder::new()
                    .name(format!("grafema-worker-{id}"))
                    .spawn(move || worker_loop(tasks, results, shutdown, ready))
                    .map_err(|e| GrafemaError::Config(format!("failed to spawn worker {id}: {e}")))?,
            );
        }

        let start = Instant::now();
        while ready.load(Ordering::Acquire) < worker_count {
            if start.elapsed() > INIT_TIMEOUT {
                return Err(GrafemaError::Config(format!(
                    "worker pool init timed out after {INIT_TIMEOUT:?} ({}/{worker_count} ready)",
                    ready.load(Ordering::Acquire)
                )));
            }
            std::thread::yield_now();
        }

        Ok(Self { tasks, results, shutdown, handles, ready, worker_count })
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// FIFO dispatch: spins briefly on a full queue rather than dropping a
    /// task.
    pub fn dispatch(&self, task: ParseTask) {
        let mut pending = task;
        loop {
            match self.tasks.try_push_retryable(pending) {
                Ok(()) => return,
                Err(returned) => {
                    pending = returned;
                    std::thread::yield_now();
                }
            }
        }
    }

    pub fn try_recv_result(&self) -> Option<ParseOutcome> {
        self.results.try_pop().ok()
    }

    /// Signals every worker to exit and joins each thread sends exit and awaits each worker exit").
    pub fn shutdown(mut self) {
        self.shutdown.store(true, Ordering::Release);
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

fn worker_loop(
    tasks: LockFreeMpmcQueue<ParseTask>,
    results: LockFreeMpmcQueue<ParseOutcome>,
    shutdown: Arc<AtomicBool>,
    ready: Arc<std::sync::atomic::AtomicUsize>,
) {
    let analyzer = ModuleAnalyzer::new();
    ready.fetch_add(1, Ordering::AcqRel);

    loop {
        match tasks.try_pop() {
            Ok(task) => {
                let outcome = match std::fs::read(&task.file) {
                    Ok(source) => match analyzer.analyze_source(&task.file, &source, task.language) {
                        Ok(bundle) => ParseOutcome::Bundle(bundle),
                        Err(e) => ParseOutcome::Error { file: task.file, error: e.to_string() },
                    },
                    Err(e) => ParseOutcome::Error { file: task.file, error: e.to_string() },
                };
                let mut pending = outcome;
                loop {
                    match results.try_push_retryable(pending) {
                        Ok(()) => break,
                        Err(returned) => {
                            pending = returned;
                            std::thread::yield_now();
                        }
                    }
                }
            }
            Err(_) => {
                if shutdown.load(Ordering::Acquire) {
                    return;
                }
                std::thread::yield_now();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_spawns_and_shuts_down() {
        let pool = WorkerPool::spawn(2).unwrap();
        assert_eq!(pool.worker_count(), 2);
        pool.shutdown();
    }

    #[test]
    fn caps_worker_count_at_sixteen() {
        let pool = WorkerPool::spawn(64).unwrap();
        assert_eq!(pool.worker_count(), 16);
        pool.shutdown();
    }

    #[test]
    fn parses_a_dispatched_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.ts");
        std::fs::write(&file, "function a(){ b(); } function b(){}").unwrap();

        let pool = WorkerPool::spawn(1).unwrap();
        pool.dispatch(ParseTask { file: file.to_string_lossy().to_string(), language: Language::TypeScript });

        let mut outcome = None;
        for _ in 0..10_000 {
            if let Some(o) = pool.try_recv_result() {
                outcome = Some(o);
                break;
            }
            std::thread::yield_now();
        }
        match outcome.expect("should have received a result") {
            ParseOutcome::Bundle(bundle) => assert_eq!(bundle.functions.len(), 2),
            ParseOutcome::Error { error, .. } => panic!("unexpected error: {error}"),
        }
        pool.shutdown();
    }
}
