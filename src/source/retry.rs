// Single-retry wrapper for source requests.
//
// One retry after a short pause on transient failures (timeouts, 429,
// 5xx). Anything more elaborate is left to the next scheduled run.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::client::FetchError;

/// Pause before the single retry.
pub const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Run `operation`, retrying it once after [`RETRY_DELAY`] if the first
/// attempt fails with a transient error.
pub async fn with_retry<F, Fut, T>(label: &str, operation: F) -> Result<T, FetchError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    with_retry_delay(label, RETRY_DELAY, operation).await
}

/// Same as [`with_retry`] with an explicit pause.
pub async fn with_retry_delay<F, Fut, T>(
    label: &str,
    delay: Duration,
    operation: F,
) -> Result<T, FetchError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    match operation().await {
        Ok(value) => Ok(value),
        Err(err) if err.is_transient() => {
            warn!(
                request = label,
                error = %err,
                delay_ms = delay.as_millis() as u64,
                "Transient failure, retrying once"
            );
            tokio::time::sleep(delay).await;
            operation().await
        }
        Err(err) => Err(err),
    }
}
