//! Orchestration for relaying factorial computations.
//!
//! ## Structure
//!
//! - [`config`] - CLI / environment configuration.
//! - [`generator`] - timer-paced work item generator.
//! - [`pool`] - fixed-size worker pool over a shared work channel.
//! - [`fanout`] - one task per input of a finite range.
//! - [`pipeline`] - generator + pool wiring.
//! - [`shutdown`] - task group, signal handling and the supervising consumer.
//! - [`report`] - failure sinks for dropped items.
//! - [`sink`] - console output.
//! - [`runner`] - picks a strategy and supervises it.
//! - [`telemetry`] - logging and optional metrics.

pub mod config;
pub mod fanout;
pub mod generator;
pub mod pipeline;
pub mod pool;
pub mod report;
pub mod runner;
pub mod shutdown;
pub mod sink;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testing;
