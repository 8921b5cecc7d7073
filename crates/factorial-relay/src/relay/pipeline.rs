//! Timer-paced producer/consumer pipeline.
//!
//! ```text
//! TickingGenerator --work (bounded)--> WorkerPool (N) --results (bounded)--> consumer
//! ```
//!
//! The generator and every worker run on the same [`TaskGroup`], so one
//! cancellation stops them all and one wait confirms they are gone. Channels
//! are never closed explicitly: the work channel closes when the generator
//! returns, the result channel when the last worker does.

use crate::relay::{
    config::PipelineConfig,
    generator::TickingGenerator,
    pool::manager::WorkerPool,
    report::ReportFailure,
    shutdown::TaskGroup,
};
use factorial_core::{FactorialResult, FactorialSource};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Everything a running pipeline consists of, owned by the orchestrating
/// routine until teardown.
#[derive(Debug)]
pub struct PipelineHandle {
    group: TaskGroup,
    pool: WorkerPool,
    results: mpsc::Receiver<FactorialResult>,
}

impl PipelineHandle {
    /// Spawns the generator and the worker pool.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<C: FactorialSource>(
        config: &PipelineConfig,
        client: Arc<C>,
        reporter: Arc<dyn ReportFailure>,
    ) -> Self {
        let group = TaskGroup::new();
        let (work_tx, work_rx) = mpsc::channel(config.work_buffer_size);
        let (result_tx, results) = mpsc::channel(config.result_buffer_size);

        let mut generator =
            TickingGenerator::new(config.tick_interval).with_limit(config.max_items);
        let token = group.token().clone();
        group.tracker().spawn(async move {
            generator.run(work_tx, token).await;
        });

        let pool = WorkerPool::spawn(
            config.num_workers,
            work_rx,
            result_tx,
            client,
            reporter,
            group.token(),
            group.tracker(),
        );

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Pipeline started: one item every {:?}, {} workers",
            config.tick_interval,
            pool.num_workers()
        );

        Self {
            group,
            pool,
            results,
        }
    }

    pub const fn group(&self) -> &TaskGroup {
        &self.group
    }

    pub const fn pool(&self) -> &WorkerPool {
        &self.pool
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
    use crate::relay::testing::{LocalFactorials, factorial};
    use core::time::Duration;

    fn config(num_workers: usize, max_items: Option<u64>) -> PipelineConfig {
        PipelineConfig {
            tick_interval: Duration::from_millis(250),
            num_workers,
            max_items,
            ..PipelineConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn limited_pipeline_delivers_every_item_then_closes() {
        let client = Arc::new(LocalFactorials::new().with_delay(Duration::from_millis(400)));
        let (failures, _rx) = mpsc::unbounded_channel::<factorial_core::Error>();
        let mut handle =
            PipelineHandle::start(&config(3, Some(12)), Arc::clone(&client), Arc::new(failures));

        let mut seen = Vec::new();
        while let Some(result) = handle.results().recv().await {
            assert_eq!(result.value, factorial(result.n));
            seen.push(result.n);
        }
        handle.group().drain().await;

        seen.sort_unstable();
        assert_eq!(seen, (0..12).collect::<Vec<_>>());
        let mut calls = client.calls();
        calls.sort_unstable();
        assert_eq!(calls, (0..12).collect::<Vec<_>>());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_generator_and_workers() {
        let client = Arc::new(LocalFactorials::new());
        let (failures, _rx) = mpsc::unbounded_channel::<factorial_core::Error>();
        let mut handle =
            PipelineHandle::start(&config(2, None), Arc::clone(&client), Arc::new(failures));
        assert_eq!(handle.pool().num_workers(), 2);

        for expected in 0..4 {
            let result = handle.results().recv().await.unwrap();
            assert_eq!(result.n, expected);
        }

        handle.group().shutdown().await;
        assert!(handle.group().tracker().is_empty());

        // Nothing is produced once teardown is complete.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(handle.results().recv().await, None);
        assert!(client.calls().len() <= 5);
    }
}
