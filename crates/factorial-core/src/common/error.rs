//! Error types for the factorial relay.
//!
//! This module defines the central `Error` enum. Per-item failures carry the
//! `n` they were computed for so that a failure sink can report which
//! [`WorkItem`](crate::WorkItem) was dropped.
//!
//! ## Error Cases
//! - `Transport`: The request never produced a usable response (connection
//!   failure, timeout or a non-2xx status).
//! - `Decode`: The response body was not a base-10 non-negative integer.
//! - `ClientBuild`: The HTTP client could not be constructed.

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for remote factorial computation.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// Network or protocol level failure talking to the factorial service.
    #[error("Transport error for n={n}: {reason}")]
    Transport { n: u64, reason: String },

    /// The service answered, but not with a decimal integer.
    #[error("Failed to decode factorial for n={n} from body {body:?}")]
    Decode { n: u64, body: String },

    /// The underlying HTTP client could not be built.
    #[error("Failed to build HTTP client: {reason}")]
    ClientBuild { reason: String },
}

impl Error {
    /// Returns the work item this error belongs to, if any.
    pub const fn item(&self) -> Option<u64> {
        match self {
            Self::Transport { n, .. } | Self::Decode { n, .. } => Some(*n),
            Self::ClientBuild { .. } => None,
        }
    }

    /// Short, stable label used for logs and metric attributes.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Decode { .. } => "decode",
            Self::ClientBuild { .. } => "client_build",
        }
    }
}
