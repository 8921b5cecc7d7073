use crate::relay::{
    config::{RelayConfig, RunMode},
    fanout::FanOutHandle,
    pipeline::PipelineHandle,
    report::ReportFailure,
    shutdown::{RunSummary, supervise},
    sink::SharedSink,
};
use core::future::Future;
use factorial_core::FactorialSource;
use std::{io, io::Write, sync::Arc};

/// Runs the strategy selected by `config.mode` until it completes or
/// `trigger` fires, printing results to `sink`, then prints the closing line.
///
/// Returns only after every spawned task has exited.
///
/// # Errors
///
/// Returns the first error writing to `sink`.
pub async fn run<C, F, W>(
    config: &RelayConfig,
    client: Arc<C>,
    reporter: Arc<dyn ReportFailure>,
    trigger: F,
    sink: &SharedSink<W>,
) -> io::Result<RunSummary>
where
    C: FactorialSource,
    F: Future<Output = ()>,
    W: Write,
{
    let (group, results) = match config.mode {
        RunMode::Pipeline => PipelineHandle::start(&config.pipeline, client, reporter).into_parts(),
        RunMode::FanOut => FanOutHandle::start(&config.fan_out, client, reporter).into_parts(),
    };

    let summary = supervise(group, results, trigger, sink).await?;
    sink.lock().farewell()?;

    #[cfg(feature = "tracing")]
    tracing::info!(
        "Run finished: {} results printed, interrupted: {}",
        summary.emitted,
        summary.interrupted
    );

    Ok(summary)
}
