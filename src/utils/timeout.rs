//! Async timeout wrappers and default deadlines.

use std::future::Future;
use std::time::Duration;

use crate::error::{ListenerError, Result};

/// Default deadline for reading one complete frame from a connection
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Default deadline for a server-side TLS handshake
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default deadline for the handler's response and the final close
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause after a failed `accept()` before the worker tries again
pub const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Run a fallible future under a deadline, mapping expiry to
/// [`ListenerError::Timeout`].
pub async fn with_timeout_error<F, T>(future: F, duration: Duration) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(ListenerError::Timeout),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[tokio::test]
    async fn test_elapsed_maps_to_timeout() {
        let result: Result<()> = with_timeout_error(
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
            Duration::from_millis(10),
        )
        .await;
        assert!(matches!(result, Err(ListenerError::Timeout)));
    }

    #[tokio::test]
    async fn test_inner_result_passes_through() {
        let ok = with_timeout_error(async { Ok(7) }, Duration::from_secs(1)).await;
        assert_eq!(ok.unwrap(), 7);

        let err: Result<()> = with_timeout_error(
            async { Err(ListenerError::ConnectionClosed) },
            Duration::from_secs(1),
        )
        .await;
        assert!(matches!(err, Err(ListenerError::ConnectionClosed)));
    }
}
