//! One-shot fan-out over a finite input range.
//!
//! Every input gets its own task, launched immediately, with no pool and no
//! pacing. The result channel is sized to hold every possible result, so no
//! task ever waits on the consumer. Each task owns a sender clone; the channel
//! closes once the last task finishes, which is what ends the consumer.
//!
//! Failures follow the pool's policy: reported, then dropped.

use crate::relay::{
    config::{FanOutConfig, MAX_FAN_OUT_INPUTS},
    pool::worker::compute_item,
    report::ReportFailure,
    shutdown::TaskGroup,
    telemetry::increment_results_emitted,
};
use factorial_core::{FactorialResult, FactorialSource};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

#[derive(Debug)]
pub struct FanOutHandle {
    group: TaskGroup,
    results: mpsc::Receiver<FactorialResult>,
}

impl FanOutHandle {
    /// Spawns one task per input in `config.inputs`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<C: FactorialSource>(
        config: &FanOutConfig,
        client: Arc<C>,
        reporter: Arc<dyn ReportFailure>,
    ) -> Self {
        let group = TaskGroup::new();
        // Larger ranges can only come from a hand-built config; their
        // overflow is dropped at `try_send`.
        let capacity = config.len().clamp(1, MAX_FAN_OUT_INPUTS as usize);
        let (tx, results) = mpsc::channel(capacity);

        for n in config.inputs.clone() {
            let client = Arc::clone(&client);
            let reporter = Arc::clone(&reporter);
            let token = group.token().clone();
            let tx = tx.clone();

            group.tracker().spawn(async move {
                if token.is_cancelled() {
                    return;
                }

                let result = match compute_item(&*client, n).await {
                    Ok(result) => result,
                    Err(e) => {
                        reporter.report(e);
                        return;
                    }
                };

                if token.is_cancelled() {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("Discarding result for {n} during shutdown");
                    return;
                }

                match tx.try_send(result) {
                    Ok(()) => increment_results_emitted(),
                    Err(TrySendError::Closed(_r)) => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!("Result channel closed, discarding result for {}", _r.n);
                    }
                    Err(TrySendError::Full(_r)) => {
                        // Only reachable past `MAX_FAN_OUT_INPUTS` inputs.
                        #[cfg(feature = "tracing")]
                        tracing::error!("Result channel full, discarding result for {}", _r.n);
                    }
                }
            });
        }

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Fan-out started: {} tasks for {:?}",
            config.len(),
            config.inputs
        );

        Self { group, results }
    }

    pub const fn group(&self) -> &TaskGroup {
        &self.group
    }

    pub fn results(&mut self) -> &mut mpsc::Receiver<FactorialResult> {
        &mut self.results
    }

    pub fn into_parts(self) -> (TaskGroup, mpsc::Receiver<FactorialResult>) {
        (self.group, self.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::{report::LogFailures, testing::LocalFactorials};
    use core::time::Duration;
    use factorial_core::{Error, num_bigint::BigUint};

    async fn run(client: Arc<LocalFactorials>) -> (Vec<FactorialResult>, Vec<Error>) {
        let (failure_tx, mut failure_rx) = mpsc::unbounded_channel::<Error>();
        let mut handle =
            FanOutHandle::start(&FanOutConfig::default(), client, Arc::new(failure_tx));

        let mut results = Vec::new();
        while let Some(result) = handle.results().recv().await {
            results.push(result);
        }
        handle.group().drain().await;

        let mut failures = Vec::new();
        while let Ok(err) = failure_rx.try_recv() {
            failures.push(err);
        }
        results.sort_by_key(|r| r.n);
        (results, failures)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn produces_exactly_ten_factorials() {
        let (results, failures) = run(Arc::new(LocalFactorials::new())).await;

        let expected: [u32; 10] = [1, 1, 2, 6, 24, 120, 720, 5040, 40320, 362_880];
        assert!(failures.is_empty());
        assert_eq!(results.len(), 10);
        for (n, (result, value)) in results.iter().zip(expected).enumerate() {
            assert_eq!(result.n, n as u64);
            assert_eq!(result.value, BigUint::from(value));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn repeated_runs_yield_same_multiset() {
        let client = Arc::new(LocalFactorials::new().with_delay(Duration::from_millis(2)));
        let (first, _) = run(Arc::clone(&client)).await;
        let (second, _) = run(client).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn failures_are_reported_and_do_not_block_completion() {
        let client = Arc::new(LocalFactorials::new().failing([0, 9]));
        let (results, failures) = run(client).await;

        let emitted: Vec<_> = results.iter().map(|r| r.n).collect();
        assert_eq!(emitted, (1..=8).collect::<Vec<_>>());

        let mut dropped: Vec<_> = failures.iter().filter_map(Error::item).collect();
        dropped.sort_unstable();
        assert_eq!(dropped, vec![0, 9]);
    }

    #[tokio::test]
    async fn tasks_finish_without_a_consumer() {
        let client = Arc::new(LocalFactorials::new());
        let config = FanOutConfig { inputs: 5..=24 };
        let mut handle = FanOutHandle::start(&config, client, Arc::new(LogFailures));

        // Nobody reads until every task is done: the channel holds them all.
        handle.group().drain().await;

        let mut count = 0;
        while handle.results().try_recv().is_ok() {
            count += 1;
        }
        assert_eq!(count, 20);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_fan_out_sends_nothing() {
        let client = Arc::new(LocalFactorials::new().with_delay(Duration::from_secs(1)));
        let mut handle = FanOutHandle::start(
            &FanOutConfig::default(),
            Arc::clone(&client),
            Arc::new(LogFailures),
        );

        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.group().shutdown().await;

        assert_eq!(handle.results().recv().await, None);
        // Requests already in flight were allowed to complete.
        assert_eq!(client.calls().len(), 10);
    }
}
