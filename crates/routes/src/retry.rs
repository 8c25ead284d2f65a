//! Retry, pacing and cancellation helpers for calls to external services.

use std::{
    fmt,
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use rand::Rng;
use thiserror::Error;
use tokio::{sync::Mutex, time::Instant};

/// How many times to try an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Wait after the first failure; doubled after every further failure.
    pub base_delay: Duration,
    /// Up to this fraction of the backoff is added at random.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            jitter: 0.0,
        }
    }
}

impl RetryPolicy {
    /// Backoff to sleep after failed attempt number `attempt` (0-based).
    pub fn backoff(&self, attempt: u32, rng: &mut impl Rng) -> Duration {
        let base = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        if self.jitter <= 0.0 {
            return base;
        }
        base.mul_f64(1.0 + rng.gen_range(0.0..=self.jitter))
    }
}

#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("operation cancelled")]
    Cancelled,

    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: E,
    },
}

/// Shared flag a caller flips to abandon in-flight retries.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs `op` until it succeeds, the policy runs out of attempts, or `cancel` fires.
///
/// Cancellation is checked before every attempt and after every backoff sleep.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    cancel: &Cancellation,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    E: fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled);
        }

        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt + 1 >= max_attempts => {
                return Err(RetryError::Exhausted {
                    attempts: attempt + 1,
                    last: e,
                });
            }
            Err(e) => {
                let delay = policy.backoff(attempt, &mut rand::thread_rng());
                tracing::warn!(
                    "Attempt {} of {} failed: {e}; retrying in {:?}",
                    attempt + 1,
                    max_attempts,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Enforces a minimum interval between consecutive requests.
#[derive(Debug)]
pub struct RequestPacer {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl RequestPacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Waits until at least `interval` has passed since the previous call returned.
    pub async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            tokio::time::sleep_until(prev + self.interval).await;
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;

    use super::*;

    #[derive(Debug, PartialEq)]
    struct Flaky;

    impl fmt::Display for Flaky {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "flaky")
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        let mut rng = rand::thread_rng();
        assert_eq!(policy.backoff(0, &mut rng), Duration::from_secs(1));
        assert_eq!(policy.backoff(1, &mut rng), Duration::from_secs(2));
        assert_eq!(policy.backoff(2, &mut rng), Duration::from_secs(4));
    }

    #[test]
    fn test_backoff_jitter_is_bounded() {
        let policy = RetryPolicy {
            jitter: 0.5,
            ..Default::default()
        };
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let delay = policy.backoff(1, &mut rng);
            assert!(delay >= Duration::from_secs(2));
            assert!(delay <= Duration::from_secs(3));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_after_failures() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result = retry(&RetryPolicy::default(), &Cancellation::new(), |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { if n < 2 { Err(Flaky) } else { Ok(n) } }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1 s after the first failure, 2 s after the second
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry(&RetryPolicy::default(), &Cancellation::new(), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Flaky) }
        })
        .await;

        match result {
            Err(RetryError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last, Flaky);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_stops_when_cancelled() {
        let cancel = Cancellation::new();
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = retry(&RetryPolicy::default(), &cancel, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            cancel.cancel();
            async { Err(Flaky) }
        })
        .await;

        assert!(matches!(result, Err(RetryError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_first_attempt() {
        let cancel = Cancellation::new();
        cancel.cancel();
        let result: Result<(), RetryError<Flaky>> =
            retry(&RetryPolicy::default(), &cancel, |_| async { Ok(()) }).await;
        assert!(matches!(result, Err(RetryError::Cancelled)));
    }

    #[test]
    fn test_retry_error_display() {
        let err: RetryError<Flaky> = RetryError::Exhausted {
            attempts: 3,
            last: Flaky,
        };
        assert_eq!(err.to_string(), "gave up after 3 attempts: flaky");
        assert_eq!(RetryError::<Flaky>::Cancelled.to_string(), "operation cancelled");
    }

    #[test]
    fn test_exhausted_keeps_last_error_as_source() {
        use std::error::Error as _;

        let err: RetryError<std::io::Error> = RetryError::Exhausted {
            attempts: 2,
            last: std::io::Error::other("upstream down"),
        };
        assert_eq!(err.source().map(|e| e.to_string()).as_deref(), Some("upstream down"));
        assert!(RetryError::<std::io::Error>::Cancelled.source().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacer_spaces_requests() {
        let pacer = RequestPacer::new(Duration::from_secs(1));
        let start = Instant::now();

        pacer.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
        pacer.wait().await;
        pacer.wait().await;
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }
}
