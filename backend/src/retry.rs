//! Bounded retry with linear back-off for directions-provider calls.
//!
//! The policy is a pure function from `(attempt, error)` to the next action;
//! [`with_retries`] drives it over an async operation. Rate limits (429),
//! server errors (5xx) and network-level failures are retried; every other
//! error is returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::ors::ProviderError;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_step: Duration::from_millis(400),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait for the given delay, then try again.
    Retry(Duration),
    GiveUp,
}

/// Returns `true` for errors that are worth retrying after a back-off delay.
pub fn is_retriable(err: &ProviderError) -> bool {
    match err {
        ProviderError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        ProviderError::Api { status, .. } => *status == 429 || *status >= 500,
        ProviderError::NoMatch(_)
        | ProviderError::Deserialize { .. }
        | ProviderError::Geometry(_)
        | ProviderError::BadUrl(_) => false,
    }
}

/// Decide what to do after a failed attempt. `attempt` counts completed
/// attempts starting at 0; the delay grows linearly with each retry.
pub fn next_action(policy: RetryPolicy, attempt: u32, err: &ProviderError) -> RetryDecision {
    if attempt >= policy.max_retries || !is_retriable(err) {
        RetryDecision::GiveUp
    } else {
        RetryDecision::Retry(policy.backoff_step * (attempt + 1))
    }
}

/// Run `operation`, retrying per `policy` on transient errors.
pub async fn with_retries<T, F, Fut>(policy: RetryPolicy, mut operation: F) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => match next_action(policy, attempt, &err) {
                RetryDecision::GiveUp => return Err(err),
                RetryDecision::Retry(delay) => {
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient provider error, retrying after back-off"
                    );
                    tokio::time::sleep(delay).await;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(status: u16) -> ProviderError {
        ProviderError::Api {
            status,
            message: "test".to_owned(),
        }
    }

    fn deserialize_error() -> ProviderError {
        let source = serde_json::from_str::<()>("not json").unwrap_err();
        ProviderError::Deserialize {
            context: "test".to_owned(),
            source,
        }
    }

    #[test]
    fn rate_limit_and_server_errors_are_retriable() {
        assert!(is_retriable(&api_error(429)));
        assert!(is_retriable(&api_error(500)));
        assert!(is_retriable(&api_error(503)));
    }

    #[test]
    fn client_errors_are_not_retriable() {
        assert!(!is_retriable(&api_error(400)));
        assert!(!is_retriable(&api_error(404)));
        assert!(!is_retriable(&api_error(422)));
    }

    #[test]
    fn no_match_and_deserialize_are_not_retriable() {
        assert!(!is_retriable(&ProviderError::NoMatch("nowhere".to_owned())));
        assert!(!is_retriable(&deserialize_error()));
        assert!(!is_retriable(&ProviderError::Geometry(
            "empty response".to_owned()
        )));
    }

    #[test]
    fn backoff_grows_linearly() {
        let policy = RetryPolicy {
            max_retries: 3,
            backoff_step: Duration::from_millis(100),
        };
        assert_eq!(
            next_action(policy, 0, &api_error(429)),
            RetryDecision::Retry(Duration::from_millis(100))
        );
        assert_eq!(
            next_action(policy, 1, &api_error(429)),
            RetryDecision::Retry(Duration::from_millis(200))
        );
        assert_eq!(
            next_action(policy, 2, &api_error(429)),
            RetryDecision::Retry(Duration::from_millis(300))
        );
        assert_eq!(next_action(policy, 3, &api_error(429)), RetryDecision::GiveUp);
    }

    #[test]
    fn permanent_errors_give_up_immediately() {
        let policy = RetryPolicy::default();
        assert_eq!(next_action(policy, 0, &api_error(400)), RetryDecision::GiveUp);
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_retries: 2,
            backoff_step: Duration::ZERO,
        };
        let result = with_retries(policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, ProviderError>(7) }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_errors_then_succeeds() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_retries: 2,
            backoff_step: Duration::ZERO,
        };
        let result = with_retries(policy, || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(api_error(503))
                } else {
                    Ok(11)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 11);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_retries: 2,
            backoff_step: Duration::ZERO,
        };
        let result: Result<(), _> = with_retries(policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(api_error(429)) }
        })
        .await;

        assert!(matches!(result, Err(ProviderError::Api { status: 429, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_permanent_errors() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retries(RetryPolicy::default(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(api_error(404)) }
        })
        .await;

        assert!(matches!(result, Err(ProviderError::Api { status: 404, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
