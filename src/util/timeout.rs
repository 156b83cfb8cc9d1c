//! Timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::error::DispatchError;

/// Wrap a backend future with a timeout; expiry counts as the backend being unavailable.
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, DispatchError>>,
) -> Result<T, DispatchError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(DispatchError::BackendUnavailable(format!(
            "no response within {}ms",
            duration.as_millis()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn expired_future_is_backend_unavailable() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, DispatchError>(())
        };

        let err = with_timeout(Duration::from_secs(1), slow).await.unwrap_err();
        assert!(matches!(err, DispatchError::BackendUnavailable(_)));
        assert!(err.to_string().contains("1000ms"));
    }

    #[tokio::test]
    async fn fast_future_passes_through() {
        let value = with_timeout(Duration::from_secs(1), async { Ok::<_, DispatchError>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }
}
