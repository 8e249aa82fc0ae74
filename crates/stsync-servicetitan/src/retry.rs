//! Retry with exponential back-off and jitter for the `ServiceTitan` client.
//!
//! [`retry_with_backoff`] wraps any fallible async operation and retries on
//! transient errors (network failures, 429, 5xx). Everything else is returned
//! on the first failure.

use std::future::Future;
use std::time::Duration;

use crate::error::ServiceTitanError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:**
/// - Network-level failures: timeout, connection refused or reset.
/// - [`ServiceTitanError::RateLimited`]: HTTP 429.
/// - HTTP 5xx responses.
///
/// **Not retriable:** authentication failures, 404, other 4xx, and
/// malformed bodies. Retrying won't change the answer.
pub(crate) fn is_retriable(err: &ServiceTitanError) -> bool {
    match err {
        ServiceTitanError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        ServiceTitanError::RateLimited { .. } => true,
        ServiceTitanError::UnexpectedStatus { status, .. } => *status >= 500,
        ServiceTitanError::Auth { .. }
        | ServiceTitanError::Unauthorized { .. }
        | ServiceTitanError::NotFound { .. }
        | ServiceTitanError::Deserialize { .. }
        | ServiceTitanError::InvalidUrl { .. } => false,
    }
}

const MAX_DELAY_MS: u64 = 60_000;

/// Delay before retry `attempt` (1-based).
///
/// The back-off is `backoff_base_ms * 2^(attempt-1)` with ±25 % jitter. A 429
/// waits at least its `Retry-After`. The result never exceeds 60 s.
pub(crate) fn retry_delay_ms(err: &ServiceTitanError, attempt: u32, backoff_base_ms: u64) -> u64 {
    let computed = backoff_base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(10));
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered =
        (computed.min(MAX_DELAY_MS) as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
    let floor = match err {
        ServiceTitanError::RateLimited { retry_after_secs } => {
            retry_after_secs.saturating_mul(1000)
        }
        _ => 0,
    };
    jittered.max(floor).min(MAX_DELAY_MS)
}

/// Runs `operation` with up to `max_retries` additional attempts on transient
/// errors, waiting [`retry_delay_ms`] between attempts.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ServiceTitanError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ServiceTitanError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay_ms = retry_delay_ms(&err, attempt, backoff_base_ms);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "ServiceTitan transient error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
