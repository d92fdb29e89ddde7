//! Transport-level retry policy for idempotent requests.

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Method, StatusCode};

/// Statuses that trigger a retry of an idempotent request.
pub const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// How failed idempotent requests are retried.
///
/// Only `GET`, `HEAD` and `OPTIONS` are ever retried; the login `POST` goes
/// out exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled on every further attempt.
    pub initial_backoff: Duration,
    /// Upper bound for a single delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Whether requests with this method may be retried at all.
    #[must_use]
    pub fn allows(&self, method: &Method) -> bool {
        matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
    }

    /// Whether a response status should be retried.
    #[must_use]
    pub fn is_retryable_status(status: StatusCode) -> bool {
        RETRY_STATUSES.contains(&status.as_u16())
    }

    /// Delay before retry number `attempt` (0-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Delay for a retryable response, honoring a numeric `Retry-After` on
    /// 429 and 503.
    #[must_use]
    pub fn delay_for(&self, status: StatusCode, headers: &HeaderMap, attempt: u32) -> Duration {
        if matches!(
            status,
            StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
        ) {
            let retry_after = headers
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            if let Some(secs) = retry_after {
                return Duration::from_secs(secs).min(self.max_backoff);
            }
        }
        self.backoff(attempt)
    }
}
