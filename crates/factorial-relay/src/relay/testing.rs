use core::time::Duration;
use factorial_core::{Error, FactorialResult, FactorialSource, Result, WorkItem, num_bigint::BigUint};
use parking_lot::Mutex;
use std::collections::HashSet;

pub(crate) fn factorial(n: WorkItem) -> BigUint {
    (1..=n).map(BigUint::from).product()
}

/// In-process factorial source that records every call.
#[derive(Default)]
pub(crate) struct LocalFactorials {
    calls: Mutex<Vec<WorkItem>>,
    failing: HashSet<WorkItem>,
    delay: Duration,
}

impl LocalFactorials {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing(mut self, items: impl IntoIterator<Item = WorkItem>) -> Self {
        self.failing.extend(items);
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> Vec<WorkItem> {
        self.calls.lock().clone()
    }
}

impl FactorialSource for LocalFactorials {
    async fn compute(&self, n: WorkItem) -> Result<FactorialResult> {
        self.calls.lock().push(n);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.contains(&n) {
            return Err(Error::Decode {
                n,
                body: "not a number".to_string(),
            });
        }
        Ok(FactorialResult::new(n, factorial(n)))
    }
}
