use crate::EngagementError;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Retries a request-handler operation on `EngagementError::Transient`
/// only, ("Transient — store contention/rollback; handler
/// retries up to 3x with jitter"). Any other error kind is returned
/// immediately without consuming a retry.
pub async fn retry_transient<F, Fut, T>(
    mut operation: F,
    max_retries: u32,
    initial_delay: Duration,
    max_delay: Duration,
) -> Result<T, EngagementError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EngagementError>>,
{
    let mut attempts = 0;
    let mut delay = initial_delay;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) if err.is_retryable() => {
                attempts += 1;
                if attempts >= max_retries {
                    error!(attempts, %err, "operation failed after max retries");
                    return Err(err);
                }
                warn!(attempts, ?delay, %err, "retrying transient failure");
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, max_delay);
                let jitter =
                    Duration::from_millis(fastrand::u64(0..=(delay.as_millis() as u64 / 10).max(1)));
                delay += jitter;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_only_transient_errors() {
        let calls = AtomicU32::new(0);
        let result = retry_transient(
            || async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(EngagementError::Transient("busy".into()))
                } else {
                    Ok(42)
                }
            },
            5,
            Duration::from_millis(1),
            Duration::from_millis(5),
        )
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_immediately_on_non_transient() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_transient(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(EngagementError::NotFound("x".into()))
            },
            5,
            Duration::from_millis(1),
            Duration::from_millis(5),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
