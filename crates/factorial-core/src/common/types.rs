//! # Work and result types
//!
//! - [`WorkItem`] - the argument of a single factorial computation
//! - [`FactorialResult`] - a computed `(n, n!)` pair

use core::fmt;
use num_bigint::BigUint;

/// A single factorial argument awaiting computation.
pub type WorkItem = u64;

/// A computed `(argument, factorial value)` pair.
///
/// Produced by a [`FactorialSource`](crate::FactorialSource) on success and
/// never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FactorialResult {
    pub n: WorkItem,
    pub value: BigUint,
}

impl FactorialResult {
    pub const fn new(n: WorkItem, value: BigUint) -> Self {
        Self { n, value }
    }
}

impl fmt::Display for FactorialResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N: {}, A: {}", self.n, self.value)
    }
}
