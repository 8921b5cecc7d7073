//! Failure reporting for dropped work items.
//!
//! Workers and fan-out tasks never retry: a failed item is handed to a
//! [`ReportFailure`] sink and then dropped. Keeping the sink behind a trait
//! decouples failure signaling from where it ends up (logs, a channel a caller
//! inspects, a metric).

use crate::relay::telemetry::increment_items_dropped;
use factorial_core::Error;
use tokio::sync::mpsc;

/// Receives every per-item failure exactly once.
pub trait ReportFailure: Send + Sync + 'static {
    fn report(&self, error: Error);
}

/// Default sink: logs the failure and counts it.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogFailures;

impl ReportFailure for LogFailures {
    fn report(&self, _error: Error) {
        increment_items_dropped(_error.kind());
        #[cfg(feature = "tracing")]
        tracing::warn!(kind = _error.kind(), "Dropping work item: {_error}");
    }
}

/// Structured sink: forwards failures to whoever holds the receiver.
///
/// A closed receiver is not an error; the failure is only counted.
impl ReportFailure for mpsc::UnboundedSender<Error> {
    fn report(&self, error: Error) {
        increment_items_dropped(error.kind());
        if let Err(_e) = self.send(error) {
            #[cfg(feature = "tracing")]
            tracing::debug!("Failure receiver closed, discarding: {}", _e.0);
        }
    }
}
