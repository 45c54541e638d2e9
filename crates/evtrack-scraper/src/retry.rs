//! Retry with exponential back-off, optional jitter and `Retry-After` support.
//!
//! [`retry_with_backoff`] wraps any fallible async operation and retries on
//! transient errors (throttling, network failures, 5xx, pending page tokens).
//! Everything else is returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::FetchError;

const DEFAULT_MAX_DELAY_MS: u64 = 60_000;

/// Retry schedule injected into every [`crate::FetchClient`].
///
/// `max_retries` counts additional attempts after the first, so the operation
/// runs at most `max_retries + 1` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub max_delay_ms: u64,
    /// Scale each computed delay by a random factor in `[0.75, 1.25)`.
    pub jitter: bool,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_retries: u32, backoff_base_ms: u64) -> Self {
        Self {
            max_retries,
            backoff_base_ms,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            jitter: true,
        }
    }

    #[must_use]
    pub const fn without_jitter(self) -> Self {
        Self {
            jitter: false,
            ..self
        }
    }

    /// Back-off before retry number `attempt` (0-based): `base * 2^attempt`,
    /// capped at `max_delay_ms`. Jitter is not applied here.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let computed = self
            .backoff_base_ms
            .saturating_mul(1u64 << attempt.min(32));
        Duration::from_millis(computed.min(self.max_delay_ms))
    }

    /// Delay before retrying after `err`. A provider `Retry-After` wins over
    /// the computed back-off; both are capped at `max_delay_ms`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, err: &FetchError) -> Duration {
        if let FetchError::RateLimited {
            retry_after_secs: Some(secs),
            ..
        } = err
        {
            return Duration::from_secs(*secs).min(Duration::from_millis(self.max_delay_ms));
        }
        self.backoff_delay(attempt)
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if !self.jitter || delay.is_zero() {
            return delay;
        }
        delay.mul_f64(rand::random::<f64>() * 0.5 + 0.75)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, 1_000)
    }
}

/// Returns `true` for errors worth retrying after a back-off delay.
///
/// **Retriable:** throttling (HTTP 429 or in-band), a page token used too
/// early, connect/timeout/body failures, and HTTP 5xx.
///
/// **Not retriable:** other 4xx, provider refusals, undecodable bodies,
/// pagination limits and malformed URLs.
pub(crate) fn is_retriable(err: &FetchError) -> bool {
    match err {
        FetchError::RateLimited { .. } | FetchError::PageTokenPending { .. } => true,
        FetchError::Http(e) => {
            e.is_timeout()
                || e.is_connect()
                || e.is_request()
                || e.is_body()
                || e.status().is_some_and(|s| s.is_server_error())
        }
        FetchError::UnexpectedStatus { status, .. } => *status >= 500,
        FetchError::Provider { .. }
        | FetchError::Deserialize { .. }
        | FetchError::PaginationLimit { .. }
        | FetchError::InvalidUrl { .. } => false,
    }
}

/// Runs `operation` with up to `policy.max_retries` additional attempts on
/// transient errors. After the last attempt the final error is returned.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= policy.max_retries {
                    return Err(err);
                }
                let delay = match &err {
                    // Provider-specified waits are used as given.
                    FetchError::RateLimited {
                        retry_after_secs: Some(_),
                        ..
                    } => policy.delay_for(attempt, &err),
                    _ => policy.jittered(policy.delay_for(attempt, &err)),
                };
                attempt += 1;
                #[allow(clippy::cast_possible_truncation)]
                let delay_ms = delay.as_millis() as u64;
                tracing::warn!(
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms,
                    error = %err,
                    "transient fetch error, retrying after back-off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
