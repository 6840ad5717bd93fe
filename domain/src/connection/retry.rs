//! Retry policy for connection re-initialization

use crate::core::error::DomainError;
use std::time::Duration;

/// Exponential backoff policy (Value Object)
///
/// Retry `n` (1-based) waits `base_delay × backoff_multiplier^(n−1)`.
/// Once `max_attempts` retries have been used up, the next failure is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    backoff_multiplier: u32,
}

/// What to do after the `n`th consecutive failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    GiveUp,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);
    pub const DEFAULT_MULTIPLIER: u32 = 2;

    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        backoff_multiplier: u32,
    ) -> Result<Self, DomainError> {
        if backoff_multiplier == 0 {
            return Err(DomainError::InvalidRetryPolicy(
                "backoff multiplier must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            max_attempts,
            base_delay,
            backoff_multiplier,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn backoff_multiplier(&self) -> u32 {
        self.backoff_multiplier
    }

    /// Delay before retry number `attempt` (1-based), or `None` when the
    /// attempt is outside the budget.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        let factor = self.backoff_multiplier.saturating_pow(attempt - 1);
        Some(self.base_delay.saturating_mul(factor))
    }

    /// Decide the reaction to the `failures`th consecutive failure
    pub fn decide(&self, failures: u32) -> RetryDecision {
        match self.delay_for(failures) {
            Some(delay) => RetryDecision::RetryAfter(delay),
            None => RetryDecision::GiveUp,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            base_delay: Self::DEFAULT_BASE_DELAY,
            backoff_multiplier: Self::DEFAULT_MULTIPLIER,
        }
    }
}
