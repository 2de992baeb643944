//! [`HttpSend`] implementation backed by [`reqwest`].
//!
//! Every [`ReqwestHttpSend`] owns its own timeout and [`RetryPolicy`], so two
//! clients built with different settings never observe each other's values.

use std::time::Duration;

use airx_core::{Error, HttpSend, Result};
use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use http::StatusCode;
use log::warn;
use reqwest::{Client, Request};

/// Timeout applied to every request unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Retry policy used by [`ReqwestHttpSend`].
///
/// A request is retried when
///
/// - the connection could not be established, for any method;
/// - the request timed out, for idempotent methods only;
/// - the server answered with `5xx`, for idempotent methods only.
///
/// Idempotent methods are `GET`, `HEAD`, `OPTIONS`, `PUT` and `DELETE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// How many extra attempts are allowed after the first one.
    pub max_retries: usize,
    /// Delay before the first retry, doubled on every following retry.
    ///
    /// Zero means retry immediately.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    fn is_idempotent(method: &Method) -> bool {
        matches!(
            *method,
            Method::GET | Method::HEAD | Method::OPTIONS | Method::PUT | Method::DELETE
        )
    }

    /// Check whether a failed attempt should be retried.
    pub fn should_retry_error(&self, method: &Method, err: &reqwest::Error) -> bool {
        if err.is_connect() {
            return true;
        }
        err.is_timeout() && Self::is_idempotent(method)
    }

    /// Check whether a response should be retried.
    pub fn should_retry_status(&self, method: &Method, status: StatusCode) -> bool {
        status.is_server_error() && Self::is_idempotent(method)
    }

    fn delay(&self, retry: usize) -> Duration {
        let shift = u32::try_from(retry.saturating_sub(1)).unwrap_or(u32::MAX).min(16);
        self.base_delay.saturating_mul(1 << shift)
    }
}

/// ReqwestHttpSend sends requests through a [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestHttpSend {
    client: Client,
    timeout: Option<Duration>,
    retry: RetryPolicy,
}

impl Default for ReqwestHttpSend {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

impl ReqwestHttpSend {
    /// Create a new ReqwestHttpSend with a reqwest::Client.
    ///
    /// The default timeout and retry policy are applied on top of the client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: Some(DEFAULT_TIMEOUT),
            retry: RetryPolicy::default(),
        }
    }

    /// Set the per request timeout, `None` leaves it to the inner client.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Get the per request timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Get the retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    async fn send_once(
        &self,
        req: http::Request<Bytes>,
    ) -> std::result::Result<http::Response<Bytes>, reqwest::Error> {
        let mut req = Request::try_from(req)?;
        if let Some(timeout) = self.timeout {
            *req.timeout_mut() = Some(timeout);
        }

        let resp = self.client.execute(req).await?;
        let mut builder = http::Response::builder()
            .status(resp.status())
            .version(resp.version());
        if let Some(headers) = builder.headers_mut() {
            headers.extend(resp.headers().clone());
        }
        let body = resp.bytes().await?;

        // The parts come from a valid response, building again can't fail.
        Ok(builder
            .body(body)
            .expect("response parts must be valid"))
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let method = req.method().clone();
        let mut retries = 0;

        loop {
            let can_retry = retries < self.retry.max_retries;
            match self.send_once(req.clone()).await {
                Ok(resp) if can_retry && self.retry.should_retry_status(&method, resp.status()) => {
                    warn!(
                        "{} {} answered {}, retrying ({}/{})",
                        method,
                        req.uri(),
                        resp.status(),
                        retries + 1,
                        self.retry.max_retries
                    );
                }
                Ok(resp) => return Ok(resp),
                Err(err) if can_retry && self.retry.should_retry_error(&method, &err) => {
                    warn!(
                        "{} {} failed: {err}, retrying ({}/{})",
                        method,
                        req.uri(),
                        retries + 1,
                        self.retry.max_retries
                    );
                }
                Err(err) if err.is_builder() => {
                    return Err(Error::request_invalid("failed to build request")
                        .with_source(anyhow::Error::new(err)))
                }
                Err(err) => {
                    return Err(Error::transport(format!("failed to send request: {err}"))
                        .with_source(anyhow::Error::new(err)))
                }
            }

            retries += 1;
            let delay = self.retry.delay(retries);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}
