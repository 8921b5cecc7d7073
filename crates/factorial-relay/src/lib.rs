#![doc = include_str!("../README.md")]

pub mod relay;

pub use relay::{
    config::{CliArgs, FanOutConfig, PipelineConfig, RelayConfig, RunMode},
    fanout::FanOutHandle,
    generator::{GeneratorState, StopReason, TickingGenerator},
    pipeline::PipelineHandle,
    pool::manager::WorkerPool,
    report::{LogFailures, ReportFailure},
    runner::run,
    shutdown::{RunSummary, TaskGroup, shutdown_signal, supervise},
    sink::{ConsoleSink, FAREWELL, SHUTDOWN_BANNER, SharedSink},
};
