//! Timer-paced work item generator.
//!
//! [`TickingGenerator`] emits `0, 1, 2, ...` onto a bounded channel, one value
//! per tick. The timer lives inside [`TickingGenerator::run`] and is dropped
//! when it returns, so a stopped generator leaves no periodic wakeups behind.

use crate::relay::telemetry::increment_items_generated;
use core::time::Duration;
use factorial_core::WorkItem;
use tokio::{
    sync::mpsc,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tokio_util::sync::CancellationToken;

/// Lifecycle of a [`TickingGenerator`]. `Stopped` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeneratorState {
    Running,
    Stopped(StopReason),
}

/// Why a generator stopped emitting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The shutdown token was cancelled.
    Cancelled,
    /// The configured item limit was reached.
    LimitReached,
    /// Every receiver of the work channel was dropped.
    ChannelClosed,
}

/// Emits a strictly increasing sequence of [`WorkItem`]s at a fixed cadence.
///
/// The first value is emitted one full period after [`run`](Self::run) starts.
/// When the receiver is slow the send blocks and later ticks are delayed
/// rather than bursted, so a busy worker pool paces the generator.
#[derive(Debug)]
pub struct TickingGenerator {
    period: Duration,
    next: WorkItem,
    limit: Option<u64>,
    emitted: u64,
    state: GeneratorState,
}

impl TickingGenerator {
    /// # Panics
    ///
    /// Panics if `period` is zero.
    pub fn new(period: Duration) -> Self {
        assert!(!period.is_zero(), "tick period must be non-zero");
        Self {
            period,
            next: 0,
            limit: None,
            emitted: 0,
            state: GeneratorState::Running,
        }
    }

    /// Stops the generator on its own after `limit` values.
    #[must_use]
    pub const fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    pub const fn state(&self) -> GeneratorState {
        self.state
    }

    /// Number of values successfully handed to the work channel.
    pub const fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Emits values until cancelled, the limit is reached, or the channel
    /// closes. Calling `run` on a stopped generator returns immediately.
    pub async fn run(
        &mut self,
        tx: mpsc::Sender<WorkItem>,
        shutdown: CancellationToken,
    ) -> StopReason {
        if let GeneratorState::Stopped(reason) = self.state {
            return reason;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Generator started with a {:?} period", self.period);

        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let reason = loop {
            if self.limit.is_some_and(|limit| self.emitted >= limit) {
                break StopReason::LimitReached;
            }

            tokio::select! {
                biased;
                () = shutdown.cancelled() => break StopReason::Cancelled,
                _ = ticker.tick() => {}
            }

            let n = self.next;
            tokio::select! {
                biased;
                () = shutdown.cancelled() => break StopReason::Cancelled,
                sent = tx.send(n) => {
                    if sent.is_err() {
                        break StopReason::ChannelClosed;
                    }
                }
            }

            #[cfg(feature = "tracing")]
            tracing::trace!("Generated work item {n}");
            increment_items_generated();
            self.next += 1;
            self.emitted += 1;
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Generator stopped ({reason:?}) after {} items",
            self.emitted
        );

        self.state = GeneratorState::Stopped(reason);
        reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(250);

    #[tokio::test(start_paused = true)]
    async fn emits_increasing_values_once_per_period() {
        let (tx, mut rx) = mpsc::channel(8);
        let token = CancellationToken::new();
        let start = Instant::now();

        let handle = tokio::spawn(async move {
            let mut generator = TickingGenerator::new(PERIOD).with_limit(Some(5));
            generator.run(tx, token).await
        });

        let mut seen = Vec::new();
        while let Some(n) = rx.recv().await {
            let elapsed = Instant::now() - start;
            let expected = PERIOD * (seen.len() as u32 + 1);
            assert!(
                elapsed >= expected && elapsed < expected + PERIOD / 2,
                "value {n} arrived after {elapsed:?}, expected {expected:?}"
            );
            seen.push(n);
        }

        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
        assert_eq!(handle.await.unwrap(), StopReason::LimitReached);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_within_one_period_of_cancellation() {
        let (tx, mut rx) = mpsc::channel(8);
        let token = CancellationToken::new();

        let handle = tokio::spawn({
            let token = token.clone();
            async move {
                let mut generator = TickingGenerator::new(PERIOD);
                let reason = generator.run(tx, token).await;
                (reason, generator)
            }
        });

        for expected in 0..3 {
            assert_eq!(rx.recv().await, Some(expected));
        }

        let cancelled_at = Instant::now();
        token.cancel();
        let (reason, generator) = handle.await.unwrap();

        assert!(Instant::now() - cancelled_at < PERIOD);
        assert_eq!(reason, StopReason::Cancelled);
        assert_eq!(
            generator.state(),
            GeneratorState::Stopped(StopReason::Cancelled)
        );
        assert_eq!(generator.emitted(), 3);
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_generator_never_emits_again() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut generator = TickingGenerator::new(PERIOD).with_limit(Some(2));

        let first = generator.run(tx.clone(), CancellationToken::new()).await;
        let second = generator.run(tx, CancellationToken::new()).await;

        assert_eq!(first, StopReason::LimitReached);
        assert_eq!(second, StopReason::LimitReached);
        assert_eq!(generator.emitted(), 2);
        assert_eq!(rx.recv().await, Some(0));
        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_receiver_is_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let mut generator = TickingGenerator::new(PERIOD);
        let reason = generator.run(tx, CancellationToken::new()).await;

        assert_eq!(reason, StopReason::ChannelClosed);
        assert_eq!(generator.emitted(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_receiver_stalls_the_generator() {
        let (tx, mut rx) = mpsc::channel(1);
        let token = CancellationToken::new();

        let handle = tokio::spawn({
            let token = token.clone();
            async move {
                let mut generator = TickingGenerator::new(PERIOD);
                generator.run(tx, token).await;
                generator
            }
        });

        // Ten periods pass with nobody receiving: one value fills the buffer
        // and the next send blocks.
        tokio::time::sleep(PERIOD * 10).await;
        token.cancel();
        let generator = handle.await.unwrap();

        assert_eq!(generator.emitted(), 1);
        assert_eq!(rx.recv().await, Some(0));
        assert_eq!(rx.recv().await, None);
    }
}
