pub mod client;
pub mod error;
pub mod types;

pub use client::{FactorialSource, HttpFactorialClient};
pub use error::{Error, Result};
pub use types::{FactorialResult, WorkItem};
