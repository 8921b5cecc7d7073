//! Shutdown coordination.
//!
//! Every run owns a [`TaskGroup`]: a [`CancellationToken`] that producers and
//! workers watch, and a [`TaskTracker`] counting them. [`supervise`] consumes
//! the result channel while racing it against an interrupt trigger:
//!
//! - If the run finishes first (fan-out done, generator limit reached), the
//!   group is closed and waited on.
//! - If the trigger fires first, the banner is printed and the token cancelled
//!   under the sink lock, then the group is closed and waited on. Nothing is
//!   printed after the banner.

use crate::relay::sink::SharedSink;
use core::future::Future;
use factorial_core::FactorialResult;
use std::io::{self, Write};
use tokio::{signal, sync::mpsc};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

/// Stop signal plus completion counter for one run.
#[derive(Clone, Debug, Default)]
pub struct TaskGroup {
    shutdown_token: CancellationToken,
    tracker: TaskTracker,
}

impl TaskGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn token(&self) -> &CancellationToken {
        &self.shutdown_token
    }

    pub const fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }

    /// Asks every task in the group to stop. Does not wait.
    pub fn cancel(&self) {
        self.shutdown_token.cancel();
    }

    /// Waits until every task in the group has exited, without cancelling.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    /// Cancels the group and waits until every task has exited.
    ///
    /// In-flight requests are not aborted; tasks exit at their next
    /// cancellation check.
    pub async fn shutdown(&self) {
        #[cfg(feature = "tracing")]
        tracing::debug!("Cancelling {} tasks via shutdown token", self.tracker.len());
        self.cancel();

        #[cfg(feature = "tracing")]
        tracing::debug!("Waiting for tasks to confirm exit");
        self.drain().await;

        #[cfg(feature = "tracing")]
        tracing::info!("All producers and workers stopped");
    }
}

/// Outcome of a supervised run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Results printed to the sink.
    pub emitted: usize,
    /// Whether the run ended because of the trigger.
    pub interrupted: bool,
}

/// Resolves on the first SIGINT (Ctrl+C) or SIGTERM.
///
/// If a handler cannot be installed the error is logged and that signal is
/// never reported.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::error!("Failed to install SIGTERM handler: {_e}");
                core::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = core::future::pending::<()>();

    let ctrl_c = async {
        if let Err(_e) = signal::ctrl_c().await {
            #[cfg(feature = "tracing")]
            tracing::error!("Failed to install Ctrl+C handler: {_e}");
            core::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => {
            #[cfg(feature = "tracing")]
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            #[cfg(feature = "tracing")]
            tracing::info!("Received SIGTERM signal");
        },
    }
}

/// Prints results from `results` until the run ends or `trigger` fires, then
/// tears the group down.
///
/// Returns only after every task in `group` has exited.
///
/// # Errors
///
/// Returns the first error writing to the sink. The group is still shut down
/// before returning.
pub async fn supervise<W, F>(
    group: TaskGroup,
    mut results: mpsc::Receiver<FactorialResult>,
    trigger: F,
    sink: &SharedSink<W>,
) -> io::Result<RunSummary>
where
    W: Write,
    F: Future<Output = ()>,
{
    let consume = consume(&mut results, group.token(), sink);
    tokio::pin!(consume);
    tokio::pin!(trigger);

    tokio::select! {
        emitted = &mut consume => {
            #[cfg(feature = "tracing")]
            tracing::debug!("Result channel closed, waiting for stragglers");
            let outcome = emitted.map(|emitted| RunSummary { emitted, interrupted: false });
            // A write error stops consumption early; make the remaining tasks
            // stop too instead of waiting on a generator that never ends.
            if outcome.is_err() {
                group.shutdown().await;
            } else {
                group.drain().await;
            }
            outcome
        }
        () = &mut trigger => {
            #[cfg(feature = "tracing")]
            tracing::info!("Shutdown signal received, terminating gracefully...");
            let banner = {
                let mut sink = sink.lock();
                group.cancel();
                sink.announce_shutdown()
            };
            let emitted = consume.await;
            group.shutdown().await;
            banner?;
            Ok(RunSummary { emitted: emitted?, interrupted: true })
        }
    }
}

/// Drains `results` into the sink until the channel closes or `token` is
/// cancelled. Closes the receiver on exit so later sends fail fast.
async fn consume<W: Write>(
    results: &mut mpsc::Receiver<FactorialResult>,
    token: &CancellationToken,
    sink: &SharedSink<W>,
) -> io::Result<usize> {
    let mut emitted = 0;
    let outcome = loop {
        let result = tokio::select! {
            biased;
            () = token.cancelled() => break Ok(emitted),
            result = results.recv() => match result {
                Some(result) => result,
                None => break Ok(emitted),
            },
        };

        let mut sink = sink.lock();
        if token.is_cancelled() {
            break Ok(emitted);
        }
        if let Err(e) = sink.emit(&result) {
            #[cfg(feature = "tracing")]
            tracing::error!("Failed to write result for {}: {e}", result.n);
            break Err(e);
        }
        emitted += 1;
    };
    results.close();
    outcome
}
