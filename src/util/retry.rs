//! Caller-side retry of whole dispatch cycles, with exponential backoff and jitter.
//!
//! The dispatch core never retries. Hosts that want "ask the model again
//! when it answers in prose" wrap their cycles in a [`RetryPolicy`].

use std::future::Future;
use std::time::Duration;

use crate::dispatcher::DispatchResult;

/// Retry policy configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Initial backoff duration.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Run a cycle, starting a fresh one while the outcome is a retryable failure.
    ///
    /// Successes, no-action outcomes, and non-retryable failures are returned
    /// immediately; after the last attempt the final result is returned as is.
    pub async fn run<F, Fut>(&self, mut cycle: F) -> DispatchResult
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DispatchResult>,
    {
        let mut backoff = self.initial_backoff;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let result = cycle().await;

            let retryable = result.error.is_some_and(|kind| kind.is_retryable());
            if !retryable || attempt >= self.max_attempts.max(1) {
                return result;
            }

            tracing::warn!(
                attempt,
                max_attempts = self.max_attempts,
                error = %result.output,
                "Retrying dispatch cycle"
            );

            // Jitter: 75%–125% of backoff
            let jitter_factor = 0.75 + (rand_factor() * 0.5);
            tokio::time::sleep(Duration::from_secs_f64(backoff.as_secs_f64() * jitter_factor)).await;

            backoff = Duration::from_secs_f64(
                (backoff.as_secs_f64() * self.multiplier).min(self.max_backoff.as_secs_f64()),
            );
        }
    }
}

/// Simple pseudo-random factor [0, 1) without pulling in rand crate.
fn rand_factor() -> f64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
        .hash(&mut hasher);
    std::thread::current().id().hash(&mut hasher);

    let hash = hasher.finish();
    (hash % 10000) as f64 / 10000.0
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::error::DispatchError;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(1),
            multiplier: 1.0,
        }
    }

    #[tokio::test]
    async fn retries_malformed_until_success() {
        let calls = &AtomicU32::new(0);
        let result = fast_policy(3)
            .run(move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    DispatchResult::failed(&DispatchError::MalformedResponse("prose".into()))
                } else {
                    DispatchResult::executed("get_calendar", "ok")
                }
            })
            .await;

        assert!(result.success);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn does_not_retry_validation_failures() {
        let calls = &AtomicU32::new(0);
        let result = fast_policy(3)
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                DispatchResult::failed(&DispatchError::argument("location", "missing"))
            })
            .await;

        assert!(result.is_error());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn does_not_retry_no_action() {
        let calls = &AtomicU32::new(0);
        let result = fast_policy(3)
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                DispatchResult::no_action()
            })
            .await;

        assert!(result.is_no_action());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stops_after_max_attempts() {
        let calls = &AtomicU32::new(0);
        let result = fast_policy(2)
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                DispatchResult::failed(&DispatchError::BackendUnavailable("down".into()))
            })
            .await;

        assert!(result.is_error());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
