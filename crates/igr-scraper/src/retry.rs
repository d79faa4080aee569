//! Retry with exponential backoff for the HTTP translation backends.
//!
//! Only transient conditions are retried: 429 responses, timeouts, failed connections
//! and 5xx statuses. Everything else is returned to the caller immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::ScrapeError;

fn is_retriable(err: &ScrapeError) -> bool {
    match err {
        ScrapeError::RateLimited { .. } => true,
        ScrapeError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        ScrapeError::UnexpectedStatus { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Executes `operation`, retrying retriable errors up to `max_retries` more
/// times. The wait before retry `n` (1-based) is
/// `backoff_base_millis * 2^(n-1)` milliseconds.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_millis: u64,
    mut operation: F,
) -> Result<T, ScrapeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScrapeError>>,
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

        let delay_ms = backoff_base_millis.saturating_mul(1u64 << attempt.min(62));
        tracing::warn!(
            attempt,
            max_retries,
            delay_ms,
            error = %err,
            "transient translation error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        attempt += 1;
    }
}
