//! Fixed-delay retry policy for feed fetches.
//!
//! Only errors for which [`FeedError::is_retriable`] holds are retried.
//! Everything else ends the cycle on the attempt that produced it.
//!
//! [`FeedError::is_retriable`]: rssfilter_core::FeedError::is_retriable

use rssfilter_core::config::MonitorSettings;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Wait between a retriable failure and the next attempt.
    pub retry_delay: Duration,
}

impl RetryPolicy {
    /// 3 attempts, 5 seconds apart.
    pub const DEFAULT: Self = Self {
        max_attempts: 3,
        retry_delay: Duration::from_secs(5),
    };

    pub fn new(max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            max_attempts,
            retry_delay,
        }
    }

    /// Whether a failed `attempt` (1-based) leaves room for another.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<&MonitorSettings> for RetryPolicy {
    fn from(settings: &MonitorSettings) -> Self {
        Self::new(settings.max_attempts, settings.retry_delay())
    }
}
