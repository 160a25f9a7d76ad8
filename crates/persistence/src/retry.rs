//! Retry with capped exponential backoff for transient store failures.

use std::future::Future;
use std::time::Duration;

use sea_orm::DbErr;

use common::RetryConfig;

/// Errors that may succeed when the whole operation is attempted again.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for DbErr {
    fn is_transient(&self) -> bool {
        matches!(self, DbErr::Conn(_) | DbErr::ConnectionAcquire(_))
    }
}

/// Bounded retry schedule: at most `max_attempts` calls, waiting
/// `base * 2^retry` (capped at `max_delay`) between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
        }
    }

    /// A policy that gives up on the first failure.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// Delay before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Run `attempt` until it succeeds, fails permanently or the attempts
    /// are used up. Each call of `attempt` must redo the whole operation.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut attempt: F) -> Result<T, E>
    where
        E: Transient + std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempts = 1;
        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempts < self.max_attempts => {
                    let delay = self.delay_for(attempts - 1);
                    attempts += 1;
                    tracing::warn!(
                        operation,
                        attempt = attempts,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient store failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryConfig::default().into()
    }
}

impl From<RetryConfig> for RetryPolicy {
    fn from(config: RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
            Duration::from_secs(config.max_delay_secs),
        )
    }
}
