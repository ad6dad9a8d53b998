use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::Result;

/// Backoff schedule for transport-level backend failures.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: usize,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            max_attempts: 5,
        }
    }
}

/// Runs `op`, retrying with exponential backoff while it fails with a
/// transport-level error. Success and all other errors return immediately.
pub async fn retry_transport<F, Fut, T>(policy: BackoffPolicy, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delay = policy.initial_delay;
    let mut attempt = 1;

    loop {
        match op().await {
            Err(error) if error.is_transport() && attempt < policy.max_attempts => {
                warn!(%error, attempt, "backend unavailable, backing off before retrying");
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(policy.max_delay);
                attempt += 1;
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use snafu::ResultExt;
    use strata_cassandra::SessionError;

    use crate::error::{IngestorError, SessionSnafu};

    use super::*;

    fn immediate() -> BackoffPolicy {
        BackoffPolicy {
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            max_attempts: 3,
        }
    }

    fn transport_error() -> IngestorError {
        IngestorError::Session {
            source: SessionError::NoHostAvailable {
                message: "down".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn retries_transport_errors_until_success() {
        let calls = AtomicUsize::new(0);

        let result = retry_transport(immediate(), || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(transport_error())
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicUsize::new(0);

        let result: Result<()> = retry_transport(immediate(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(transport_error()) }
        })
        .await;

        assert!(result.unwrap_err().is_transport());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_transport_errors_are_not_retried() {
        let calls = AtomicUsize::new(0);

        let result: Result<()> = retry_transport(immediate(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(SessionError::Timeout {
                    timeout: Duration::from_secs(1),
                })
                .context(SessionSnafu)
            }
        })
        .await;

        assert!(!result.unwrap_err().is_transport());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
