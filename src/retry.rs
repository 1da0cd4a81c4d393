use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Exponential backoff settings for backend calls.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Preset for translation backends: 3 attempts, delays 500ms then 1s.
    ///
    /// Kept short because the whole request is bounded by the gateway's
    /// processing timeout and later methods still need time to run.
    pub fn backend() -> Self {
        Self::new(3, Duration::from_millis(500))
            .with_max_delay(Duration::from_secs(2))
            .with_backoff_multiplier(2.0)
    }

    /// Delay before attempt `attempt` (0-indexed); the first attempt never waits.
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let ms = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi((attempt - 1) as i32);
        Duration::from_millis(ms as u64).min(self.max_delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::backend()
    }
}

/// Run `operation` until it succeeds, `should_retry` rejects its error, or
/// the attempts run out. Returns the last error on failure.
///
/// A `max_attempts` of 0 is treated as 1.
pub async fn with_retry_if<T, E, F, Fut, P>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        let delay = config.delay_for_attempt(attempt);
        if !delay.is_zero() {
            debug!(
                "{}: retry {}/{} after {:?}",
                operation_name,
                attempt + 1,
                max_attempts,
                delay
            );
            sleep(delay).await;
        }

        let error = match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!("{}: succeeded on attempt {}", operation_name, attempt + 1);
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        attempt += 1;
        if !should_retry(&error) {
            warn!("{}: non-retryable failure: {}", operation_name, error);
            return Err(error);
        }
        if attempt >= max_attempts {
            warn!(
                "{}: all {} attempts failed, last error: {}",
                operation_name, max_attempts, error
            );
            return Err(error);
        }
        warn!(
            "{}: attempt {}/{} failed ({}), retrying",
            operation_name, attempt, max_attempts, error
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    // ==================== Delay Tests ====================

    #[test]
    fn test_first_attempt_has_no_delay() {
        assert_eq!(RetryConfig::backend().delay_for_attempt(0), Duration::ZERO);
    }

    #[test]
    fn test_backend_preset_delays() {
        let config = RetryConfig::backend();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(500));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(1));
    }

    #[test]
    fn test_delay_is_capped() {
        let config = RetryConfig::new(10, Duration::from_secs(1)).with_max_delay(Duration::from_secs(3));
        assert_eq!(config.delay_for_attempt(4), Duration::from_secs(3));
    }

    #[test]
    fn test_custom_multiplier() {
        let config = RetryConfig::new(5, Duration::from_millis(100)).with_backoff_multiplier(3.0);
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(900));
    }

    // ==================== with_retry_if Tests ====================

    #[tokio::test]
    async fn test_succeeds_first_attempt() {
        let config = RetryConfig::new(3, Duration::from_millis(5));
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result: Result<u32, &str> = with_retry_if(
            &config,
            "test",
            || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                }
            },
            |_| true,
        )
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let config = RetryConfig::new(3, Duration::from_millis(5));
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result: Result<u32, &str> = with_retry_if(
            &config,
            "test",
            || {
                let c = c.clone();
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err("503")
                    } else {
                        Ok(1)
                    }
                }
            },
            |_| true,
        )
        .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_stops_on_non_retryable_error() {
        let config = RetryConfig::new(3, Duration::from_millis(5));
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result: Result<u32, &str> = with_retry_if(
            &config,
            "test",
            || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err("401 unauthorized")
                }
            },
            |e: &&str| !e.starts_with("4"),
        )
        .await;

        assert_eq!(result.unwrap_err(), "401 unauthorized");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausts_attempts() {
        let config = RetryConfig::new(2, Duration::from_millis(5));
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result: Result<u32, String> = with_retry_if(
            &config,
            "test",
            || {
                let c = c.clone();
                async move {
                    let n = c.fetch_add(1, Ordering::SeqCst);
                    Err(format!("failure {}", n))
                }
            },
            |_| true,
        )
        .await;

        assert_eq!(result.unwrap_err(), "failure 1");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_attempts_runs_once() {
        let config = RetryConfig::new(0, Duration::from_millis(5));
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let _: Result<(), &str> = with_retry_if(
            &config,
            "test",
            || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err("nope")
                }
            },
            |_| true,
        )
        .await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
