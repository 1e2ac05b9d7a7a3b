use crate::asset::CompressionResponse;
use crate::config::RetryPolicy;
use crate::error::Result;
use crate::service::{CompressionRequest, CompressionService};
use async_trait::async_trait;
use log::warn;
use tokio::time::sleep;

/// Retry decorator for [`CompressionService`] implementations.
///
/// Transport failures are retried with exponential backoff up to
/// `max_retries` extra attempts; service rejections are returned at once.
pub struct RetryingService<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: CompressionService> RetryingService<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: CompressionService> CompressionService for RetryingService<S> {
    async fn compress(&self, request: CompressionRequest) -> Result<CompressionResponse> {
        let mut attempt = 0;
        loop {
            match self.inner.compress(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.policy.max_retries => {
                    attempt += 1;
                    let delay = self.policy.delay_for_attempt(attempt);
                    warn!(
                        "Upload of {} failed ({}), retry {}/{} in {:?}",
                        request.source.name(),
                        e,
                        attempt,
                        self.policy.max_retries,
                        delay
                    );
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::SourceFile;
    use crate::config::Parameters;
    use crate::error::SessionError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Fails with the given error `failures` times, then succeeds.
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
        transport: bool,
    }

    #[async_trait]
    impl CompressionService for Flaky {
        async fn compress(&self, _request: CompressionRequest) -> Result<CompressionResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                if self.transport {
                    return Err(SessionError::Transport("connection reset".to_string()));
                }
                return Err(SessionError::ServiceStatus {
                    status: 422,
                    body: "quality out of range".to_string(),
                });
            }
            Ok(CompressionResponse {
                size: 1.0,
                width: 1,
                height: 1,
                url: "/files/x.jpg".to_string(),
            })
        }
    }

    fn request() -> CompressionRequest {
        CompressionRequest::new(SourceFile::new("a.png", vec![0u8; 4]), Parameters::default())
    }

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(100), Duration::from_secs(1))
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failures_are_retried() {
        let service = RetryingService::new(
            Flaky {
                failures: 2,
                calls: AtomicU32::new(0),
                transport: true,
            },
            policy(3),
        );

        assert!(service.compress(request()).await.is_ok());
        assert_eq!(service.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_are_bounded() {
        let service = RetryingService::new(
            Flaky {
                failures: 10,
                calls: AtomicU32::new(0),
                transport: true,
            },
            policy(2),
        );

        let err = service.compress(request()).await.unwrap_err();
        assert!(matches!(err, SessionError::Transport(_)));
        assert_eq!(service.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_service_errors_are_not_retried() {
        let service = RetryingService::new(
            Flaky {
                failures: 1,
                calls: AtomicU32::new(0),
                transport: false,
            },
            policy(3),
        );

        let err = service.compress(request()).await.unwrap_err();
        assert!(matches!(err, SessionError::ServiceStatus { status: 422, .. }));
        assert_eq!(service.inner().calls.load(Ordering::SeqCst), 1);
    }
}
