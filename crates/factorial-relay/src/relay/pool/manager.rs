//! Fixed-size pool of workers draining a shared work channel.
//!
//! Unlike a round-robin dispatcher, every worker pulls from the same
//! [`mpsc::Receiver`], so an idle worker always picks up the next item and a
//! slow request never holds back items queued behind it. Each item is received
//! by exactly one worker.
//!
//! Workers are spawned on a caller-provided [`TaskTracker`], which lets the
//! owner wait for producers and workers through a single counter.

use super::worker::{SharedReceiver, worker_loop};
use crate::relay::report::ReportFailure;
use factorial_core::{FactorialResult, FactorialSource, WorkItem};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

/// A set of `num_workers` concurrent consumers of a single work channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    num_workers: usize,
}

impl WorkerPool {
    /// Spawns `num_workers` workers onto `tracker`.
    ///
    /// The pool takes ownership of `results`; every worker holds a clone and
    /// the original is dropped before returning, so the result channel closes
    /// as soon as the last worker exits.
    ///
    /// # Panics
    ///
    /// Panics if `num_workers` is zero.
    pub fn spawn<C: FactorialSource>(
        num_workers: usize,
        work_rx: mpsc::Receiver<WorkItem>,
        results: mpsc::Sender<FactorialResult>,
        client: Arc<C>,
        reporter: Arc<dyn ReportFailure>,
        shutdown: &CancellationToken,
        tracker: &TaskTracker,
    ) -> Self {
        assert!(num_workers > 0, "a worker pool needs at least one worker");

        let rx: SharedReceiver = Arc::new(Mutex::new(work_rx));
        for worker_id in 0..num_workers {
            tracker.spawn(worker_loop(
                worker_id,
                Arc::clone(&rx),
                Arc::clone(&client),
                results.clone(),
                Arc::clone(&reporter),
                shutdown.clone(),
            ));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Spawned {num_workers} workers");

        Self { num_workers }
    }

    pub const fn num_workers(&self) -> usize {
        self.num_workers
    }
}
