// Exponential backoff for YouTube Data API calls.
//
// Quota and rate-limit rejections (403/429) and server errors (5xx) are
// retried with delays of base * 2^(attempt-1) plus a random jitter, up to a
// fixed number of retries. Transport and decode failures carry no status and
// are retried the same way. Every other HTTP status fails immediately.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;
use yt_data_client::ApiError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total calls are at most `1 + max_retries`
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Upper bound (exclusive) of the random delay added to each backoff
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 6,
            base_delay: Duration::from_secs(1),
            max_jitter: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Policy that retries `max_retries` times without waiting
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based), without jitter
    pub fn base_backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_backoff(attempt) + random_up_to(self.max_jitter)
    }
}

fn random_up_to(max: Duration) -> Duration {
    if max.is_zero() {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(rand::thread_rng().gen_range(0.0..max.as_secs_f64()))
}

/// Run `operation`, retrying transient failures according to `policy`.
///
/// `label` names the call in log output.
pub async fn with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_transient() || attempt >= policy.max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay = policy.delay_for(attempt);

                match err.status() {
                    Some(status) => warn!(
                        call = label,
                        status,
                        attempt,
                        max_retries = policy.max_retries,
                        backoff_secs = delay.as_secs_f64(),
                        "HTTP {} - backing off {:.1}s (attempt {}/{})",
                        status,
                        delay.as_secs_f64(),
                        attempt,
                        policy.max_retries,
                    ),
                    None => warn!(
                        call = label,
                        attempt,
                        max_retries = policy.max_retries,
                        error = %err,
                        "{} - retrying in {:.1}s (attempt {}/{})",
                        err,
                        delay.as_secs_f64(),
                        attempt,
                        policy.max_retries,
                    ),
                }

                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn http(status: u16) -> ApiError {
        ApiError::Http {
            status,
            body: String::new(),
        }
    }

    #[test]
    fn base_backoff_doubles() {
        let policy = RetryPolicy {
            max_retries: 6,
            base_delay: Duration::from_secs(1),
            max_jitter: Duration::ZERO,
        };
        assert_eq!(policy.base_backoff(1), Duration::from_secs(1));
        assert_eq!(policy.base_backoff(2), Duration::from_secs(2));
        assert_eq!(policy.base_backoff(4), Duration::from_secs(8));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    }

    #[test]
    fn jitter_stays_below_bound() {
        let policy = RetryPolicy::default();
        for _ in 0..100 {
            let delay = policy.delay_for(1);
            assert!(delay >= Duration::from_secs(1));
            assert!(delay < Duration::from_secs(2));
        }
    }

    #[tokio::test]
    async fn persistent_transient_error_makes_one_plus_max_retries_calls() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = with_backoff(&RetryPolicy::immediate(4), "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(http(429))
        })
        .await;
        assert_eq!(result.unwrap_err().status(), Some(429));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn permanent_error_is_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = with_backoff(&RetryPolicy::immediate(4), "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(http(404))
        })
        .await;
        assert_eq!(result.unwrap_err().status(), Some(404));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transport_errors_recover_after_retry() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_backoff(&RetryPolicy::immediate(3), "test", move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(ApiError::Transport("connection reset".into()))
            } else {
                Ok("done")
            }
        })
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_grow_exponentially() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_jitter: Duration::ZERO,
        };
        let start = tokio::time::Instant::now();
        let result: Result<(), _> = with_backoff(&policy, "test", || async { Err(http(503)) }).await;
        assert!(result.is_err());
        // 1s + 2s + 4s of virtual time
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(7), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_secs(8), "elapsed {elapsed:?}");
    }
}
