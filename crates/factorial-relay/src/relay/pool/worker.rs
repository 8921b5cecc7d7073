use crate::relay::{
    report::ReportFailure,
    telemetry::{
        decrement_requests_inflight, increment_requests_inflight, increment_results_emitted,
        record_request_duration,
    },
};
use factorial_core::{FactorialResult, FactorialSource, Result, WorkItem};
use std::sync::Arc;
use tokio::{
    sync::{Mutex, mpsc},
    time::Instant,
};
use tokio_util::sync::CancellationToken;

/// The receiving half of the work channel, shared by every worker in a pool.
///
/// Only one worker waits in `recv` at a time; the lock is released before the
/// item is processed, so processing is fully concurrent.
pub type SharedReceiver = Arc<Mutex<mpsc::Receiver<WorkItem>>>;

/// Runs one request against `client`, recording in-flight and latency
/// metrics around it.
pub(crate) async fn compute_item<C: FactorialSource>(
    client: &C,
    n: WorkItem,
) -> Result<FactorialResult> {
    increment_requests_inflight();
    let start = Instant::now();
    let result = client.compute(n).await;
    decrement_requests_inflight();
    record_request_duration(start.elapsed().as_secs_f64() * 1000.0);
    result
}

/// Worker task draining the shared work channel.
///
/// Each received [`WorkItem`] is computed through `client`. Successes are sent
/// to `results`; failures go to `reporter` and the item is dropped.
///
/// The loop ends when:
/// - the work channel is closed and drained,
/// - the result channel is closed, or
/// - `shutdown` is cancelled. An in-flight request is allowed to finish but
///   its result is discarded, so nothing is written to `results` once
///   teardown has begun.
pub async fn worker_loop<C: FactorialSource>(
    _worker_id: usize,
    rx: SharedReceiver,
    client: Arc<C>,
    results: mpsc::Sender<FactorialResult>,
    reporter: Arc<dyn ReportFailure>,
    shutdown: CancellationToken,
) {
    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {_worker_id} started");

    loop {
        let next = tokio::select! {
            biased;
            () = shutdown.cancelled() => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Worker {_worker_id} shutdown via cancellation token");
                break;
            }
            next = async { rx.lock().await.recv().await } => next,
        };

        let Some(n) = next else {
            #[cfg(feature = "tracing")]
            tracing::debug!("Worker {_worker_id} work channel closed");
            break;
        };

        let result = match compute_item(&*client, n).await {
            Ok(result) => result,
            Err(e) => {
                reporter.report(e);
                continue;
            }
        };

        tokio::select! {
            biased;
            () = shutdown.cancelled() => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Worker {_worker_id} discarding result for {n} during shutdown");
                break;
            }
            sent = results.send(result) => {
                if sent.is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("Worker {_worker_id} result channel closed");
                    break;
                }
                increment_results_emitted();
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {_worker_id} stopped");
}
