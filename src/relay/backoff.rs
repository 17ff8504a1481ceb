use std::future::Future;
use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBuilder};

use super::errors::RelayError;

/// Shared retry shape for both `EdgePuller` and `Forwarder`: exponential
/// backoff with jitter, the same curve `hls::remuxer::write_with_retry`
/// uses for storage writes, just with longer bounds suited to a TCP
/// reconnect instead of a single storage call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    min_delay: Duration,
    max_delay: Duration,
    max_times: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            max_times: 5,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(min_delay: Duration, max_delay: Duration, max_times: usize) -> Self {
        Self { min_delay, max_delay, max_times }
    }

    /// Runs `attempt` until it succeeds or the backoff is exhausted,
    /// sleeping between tries. Returns `RelayError::Exhausted` carrying the
    /// last failure if every attempt fails.
    pub async fn run<F, Fut, T>(&self, mut attempt: F) -> Result<T, RelayError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RelayError>>,
    {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_times)
            .with_jitter()
            .build();

        let mut last_err = None;
        for delay in std::iter::once(Duration::ZERO).chain(backoff) {
            if delay > Duration::ZERO {
                tokio::time::sleep(delay).await;
            }

            match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    tracing::warn!("relay attempt failed, retrying in {:?}: {err}", delay);
                    last_err = Some(err);
                }
            }
        }

        Err(RelayError::Exhausted(
            last_err.map(|e| e.to_string()).unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn succeeds_without_retry() {
        let policy = RetryPolicy::new(Duration::from_millis(1), Duration::from_millis(5), 3);
        let result = policy.run(|| async { Ok::<_, RelayError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let policy = RetryPolicy::new(Duration::from_millis(1), Duration::from_millis(5), 3);
        let attempts = Arc::new(AtomicUsize::new(0));
        let result = policy
            .run(|| {
                let attempts = Arc::clone(&attempts);
                async move {
                    if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(RelayError::EmptyStream)
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_after_max_times() {
        let policy = RetryPolicy::new(Duration::from_millis(1), Duration::from_millis(5), 2);
        let result: Result<(), RelayError> = policy.run(|| async { Err(RelayError::EmptyStream) }).await;
        assert!(matches!(result, Err(RelayError::Exhausted(_))));
    }
}
