//! Retry policies for reconnect episodes.

use std::time::Duration;

/// Decides whether a reconnect episode should keep trying.
///
/// A policy is a pure decision function over the number of failed attempts
/// so far and the time elapsed since the episode started: `Some(delay)`
/// means sleep `delay` and try again, `None` means give up.
pub trait RetryPolicy: Send + Sync {
    /// Whether to retry after `attempt` failed attempts and `elapsed` time,
    /// and how long to sleep first.
    fn should_retry(&self, attempt: u32, elapsed: Duration) -> Option<Duration>;
}

/// Exponential backoff with an optional attempt cap.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on the delay between retries.
    pub max_delay: Duration,
    /// Multiplier applied to the delay for each further attempt.
    pub backoff_multiplier: f64,
    /// Maximum number of attempts (`None` = unbounded).
    pub max_attempts: Option<u32>,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            max_attempts: None,
        }
    }
}

impl ExponentialBackoff {
    /// Delay for the given attempt number (1-based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        let delay_millis = (self.initial_delay.as_millis() as f64 * factor) as u64;
        Duration::from_millis(delay_millis).min(self.max_delay)
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn should_retry(&self, attempt: u32, _elapsed: Duration) -> Option<Duration> {
        match self.max_attempts {
            Some(max) if attempt >= max => None,
            _ => Some(self.delay_for_attempt(attempt)),
        }
    }
}

/// Retries a bounded number of times with a constant sleep.
#[derive(Debug, Clone)]
pub struct RetryNTimes {
    retries: u32,
    sleep: Duration,
}

impl RetryNTimes {
    /// Allow up to `retries` retries, sleeping `sleep` between attempts.
    #[must_use]
    pub const fn new(retries: u32, sleep: Duration) -> Self {
        Self { retries, sleep }
    }

    /// Policy that allows exactly one retry.
    #[must_use]
    pub const fn once(sleep: Duration) -> Self {
        Self::new(1, sleep)
    }
}

impl RetryPolicy for RetryNTimes {
    fn should_retry(&self, attempt: u32, _elapsed: Duration) -> Option<Duration> {
        (attempt <= self.retries).then_some(self.sleep)
    }
}

/// Retries with a constant sleep until a wall-time budget is spent.
#[derive(Debug, Clone)]
pub struct RetryUntilElapsed {
    max_elapsed: Duration,
    sleep: Duration,
}

impl RetryUntilElapsed {
    /// Retry for up to `max_elapsed`, sleeping `sleep` between attempts.
    #[must_use]
    pub const fn new(max_elapsed: Duration, sleep: Duration) -> Self {
        Self { max_elapsed, sleep }
    }
}

impl RetryPolicy for RetryUntilElapsed {
    fn should_retry(&self, _attempt: u32, elapsed: Duration) -> Option<Duration> {
        (elapsed < self.max_elapsed).then_some(self.sleep)
    }
}
