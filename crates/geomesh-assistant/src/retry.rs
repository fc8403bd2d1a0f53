//! Exponential back-off with jitter for chat-completion calls.
//!
//! Only transient failures are retried: timeouts, connection errors, 5xx
//! and 429. Bad requests, auth failures and malformed bodies return
//! immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::AssistantError;

const MAX_DELAY_MS: u64 = 30_000;

pub(crate) fn is_retriable(err: &AssistantError) -> bool {
    match err {
        AssistantError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        AssistantError::Api { status, .. } => *status == 429 || *status >= 500,
        AssistantError::Deserialize { .. }
        | AssistantError::EmptyQuestion
        | AssistantError::MissingApiKey
        | AssistantError::InvalidBaseUrl { .. } => false,
    }
}

/// Runs `operation`, retrying transient failures up to `max_retries` times.
///
/// Attempt `n` (1-based) sleeps `backoff_base_ms * 2^(n-1)` ±25 %, capped
/// at 30 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, AssistantError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AssistantError>>,
{
    let mut attempt = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }
        attempt += 1;

        let base = backoff_base_ms
            .saturating_mul(1u64 << (attempt - 1).min(10))
            .min(MAX_DELAY_MS);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let delay_ms = (base as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;

        tracing::warn!(
            attempt,
            max_retries,
            delay_ms,
            error = %err,
            "assistant call failed, retrying"
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}
