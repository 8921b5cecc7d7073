//! Remote factorial client.
//!
//! [`FactorialSource`] is the seam between the relay's orchestration and
//! whatever computes factorials. [`HttpFactorialClient`] is the production
//! implementation: one `GET <endpoint>?n=<n>` per call, body parsed as a
//! base-10 [`BigUint`]. There are no retries; callers decide what a failure
//! means for the item.

use crate::{Error, FactorialResult, Result, WorkItem};
use core::{future::Future, time::Duration};
use num_bigint::BigUint;
use reqwest::{Client, Url, header::CONTENT_TYPE};

/// Something that can turn a [`WorkItem`] into a [`FactorialResult`].
///
/// Implementations are shared between concurrently running workers, so they
/// must be `Send + Sync` and the returned future must be `Send`.
pub trait FactorialSource: Send + Sync + 'static {
    /// Computes `n!`, or reports why it could not.
    fn compute(&self, n: WorkItem) -> impl Future<Output = Result<FactorialResult>> + Send;
}

/// HTTP client for the remote factorial service.
///
/// Cloning is cheap: clones share the same connection pool.
#[derive(Clone, Debug)]
pub struct HttpFactorialClient {
    client: Client,
    endpoint: Url,
}

impl HttpFactorialClient {
    /// Builds a client for `endpoint` with no request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClientBuild`] if the TLS backend cannot be
    /// initialized.
    pub fn new(endpoint: Url) -> Result<Self> {
        Self::with_timeout(endpoint, None)
    }

    /// Builds a client for `endpoint`, bounding each request by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClientBuild`] if the TLS backend cannot be
    /// initialized.
    pub fn with_timeout(endpoint: Url, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| Error::ClientBuild {
            reason: e.to_string(),
        })?;
        Ok(Self::from_client(client, endpoint))
    }

    /// Wraps an already configured [`reqwest::Client`].
    pub const fn from_client(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl FactorialSource for HttpFactorialClient {
    async fn compute(&self, n: WorkItem) -> Result<FactorialResult> {
        let transport = |e: reqwest::Error| Error::Transport {
            n,
            reason: e.to_string(),
        };

        #[cfg(feature = "tracing")]
        tracing::trace!("Requesting {n}! from {}", self.endpoint);

        let response = self
            .client
            .get(self.endpoint.clone())
            .header(CONTENT_TYPE, "text/plain")
            .query(&[("n", n)])
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transport {
                n,
                reason: format!("HTTP status {status}"),
            });
        }

        let body = response.text().await.map_err(transport)?;
        parse_body(n, &body)
    }
}

/// Parses a response body into a [`FactorialResult`].
///
/// Only ASCII digits are accepted once surrounding whitespace is trimmed; a
/// sign, separators or an empty body are decode failures.
pub fn parse_body(n: WorkItem, body: &str) -> Result<FactorialResult> {
    let digits = body.trim();
    let decode = || Error::Decode {
        n,
        body: body.to_string(),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(decode());
    }

    BigUint::parse_bytes(digits.as_bytes(), 10)
        .map(|value| FactorialResult::new(n, value))
        .ok_or_else(decode)
}
