use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use core::{ops::RangeInclusive, time::Duration};
use factorial_core::{Url, WorkItem};

/// Upper bound on fan-out inputs. Every input is a concurrent task and a slot
/// in the result channel.
pub const MAX_FAN_OUT_INPUTS: u64 = 1 << 20;

/// Which concurrency strategy drives the run.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Timer-paced generator feeding a fixed worker pool; runs until
    /// interrupted.
    Pipeline,
    /// One task per input of a finite range, all launched at once.
    FanOut,
}

/// Runtime configuration for the `factorial-relay` binary.
///
/// All values are parsed from CLI arguments or environment variables (a
/// `.env` file is loaded first), with defaults matching a local factorial
/// service on port 12345.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "factorial-relay",
    version,
    about = "Relays factorial computations to a remote service"
)]
pub struct CliArgs {
    /// Concurrency strategy to run.
    ///
    /// Environment variable: `RELAY_MODE`
    #[arg(long, env = "RELAY_MODE", value_enum, default_value_t = RunMode::Pipeline)]
    pub mode: RunMode,

    /// Base URL of the factorial service. The argument is appended as the
    /// `n` query parameter.
    ///
    /// Environment variable: `FACTORIAL_ENDPOINT`
    #[arg(long, env = "FACTORIAL_ENDPOINT", default_value_t = String::from("http://localhost:12345/"))]
    pub endpoint: String,

    /// Milliseconds between two generated work items in pipeline mode.
    ///
    /// Environment variable: `TICK_INTERVAL_MS`
    #[arg(long, env = "TICK_INTERVAL_MS", default_value_t = 250)]
    pub tick_interval_ms: u64,

    /// Number of workers draining the work channel in pipeline mode.
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long, env = "NUM_WORKERS", default_value_t = 1)]
    pub num_workers: usize,

    /// Capacity of the channel between the generator and the workers. Small
    /// values make a slow pool stall the generator.
    ///
    /// Environment variable: `WORK_BUFFER_SIZE`
    #[arg(long, env = "WORK_BUFFER_SIZE", default_value_t = 1)]
    pub work_buffer_size: usize,

    /// Capacity of the channel between the workers and the console.
    ///
    /// Environment variable: `RESULT_BUFFER_SIZE`
    #[arg(long, env = "RESULT_BUFFER_SIZE", default_value_t = 1)]
    pub result_buffer_size: usize,

    /// Stop the generator on its own after this many items. Unset means run
    /// until interrupted.
    ///
    /// Environment variable: `MAX_ITEMS`
    #[arg(long, env = "MAX_ITEMS")]
    pub max_items: Option<u64>,

    /// First input of the fan-out range (inclusive).
    ///
    /// Environment variable: `FAN_OUT_START`
    #[arg(long, env = "FAN_OUT_START", default_value_t = 0)]
    pub fan_out_start: WorkItem,

    /// Last input of the fan-out range (inclusive).
    ///
    /// Environment variable: `FAN_OUT_END`
    #[arg(long, env = "FAN_OUT_END", default_value_t = 9)]
    pub fan_out_end: WorkItem,

    /// Per-request timeout in milliseconds. Unset means requests may take as
    /// long as the service needs.
    ///
    /// Environment variable: `REQUEST_TIMEOUT_MS`
    #[arg(long, env = "REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: Option<u64>,
}

/// Settings for the timer-paced pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub tick_interval: Duration,
    pub num_workers: usize,
    pub work_buffer_size: usize,
    pub result_buffer_size: usize,
    pub max_items: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(250),
            num_workers: 1,
            work_buffer_size: 1,
            result_buffer_size: 1,
            max_items: None,
        }
    }
}

/// Settings for the one-shot fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanOutConfig {
    pub inputs: RangeInclusive<WorkItem>,
}

impl FanOutConfig {
    /// Number of results the fan-out can produce at most. Saturates at
    /// `usize::MAX`.
    pub fn len(&self) -> usize {
        if self.inputs.is_empty() {
            return 0;
        }
        usize::try_from(self.inputs.end() - self.inputs.start())
            .ok()
            .and_then(|span| span.checked_add(1))
            .unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self { inputs: 0..=9 }
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub mode: RunMode,
    pub endpoint: Url,
    pub request_timeout: Option<Duration>,
    pub pipeline: PipelineConfig,
    pub fan_out: FanOutConfig,
}

impl TryFrom<CliArgs> for RelayConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.num_workers == 0 {
            bail!("NUM_WORKERS must be greater than 0");
        }

        if args.tick_interval_ms == 0 {
            bail!("TICK_INTERVAL_MS must be greater than 0");
        }

        if args.work_buffer_size == 0 || args.result_buffer_size == 0 {
            bail!("WORK_BUFFER_SIZE and RESULT_BUFFER_SIZE must be greater than 0");
        }

        if args.fan_out_start > args.fan_out_end {
            bail!(
                "FAN_OUT_START ({}) must not exceed FAN_OUT_END ({})",
                args.fan_out_start,
                args.fan_out_end
            );
        }

        if args.fan_out_end - args.fan_out_start >= MAX_FAN_OUT_INPUTS {
            bail!("fan-out range must not exceed {MAX_FAN_OUT_INPUTS} inputs");
        }

        if args.request_timeout_ms == Some(0) {
            bail!("REQUEST_TIMEOUT_MS must be greater than 0 when set");
        }

        let endpoint = Url::parse(&args.endpoint)
            .with_context(|| format!("invalid FACTORIAL_ENDPOINT `{}`", args.endpoint))?;

        Ok(Self {
            mode: args.mode,
            endpoint,
            request_timeout: args.request_timeout_ms.map(Duration::from_millis),
            pipeline: PipelineConfig {
                tick_interval: Duration::from_millis(args.tick_interval_ms),
                num_workers: args.num_workers,
                work_buffer_size: args.work_buffer_size,
                result_buffer_size: args.result_buffer_size,
                max_items: args.max_items,
            },
            fan_out: FanOutConfig {
                inputs: args.fan_out_start..=args.fan_out_end,
            },
        })
    }
}
