//! Concurrent, lock-free and wait-free data structures for Grafema.
//!
//! - `spsc`: Wait-free single-producer single-consumer queue.
//! - `mpmc`: Lock-free bounded multi-producer multi-consumer queue (wrapper).
//!
//! The orchestrator's worker pool (see `grafema-orchestrator`) is built on
//! top of `mpmc`: the dispatch queue is a single bounded MPMC channel shared
//! by every worker thread, and completed fact bundles flow back over a
//! second MPMC channel the scheduler thread drains.

pub mod mpmc;
pub mod spsc;
