//! Bounded retry with a fixed delay
//!
//! Every attempt waits the same delay (no backoff). Once the attempts are
//! spent the state stays exhausted until it is reset by a successful
//! connection.

use std::time::Duration;

/// Default number of reconnect attempts
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default pause before each reconnect attempt
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(300);

/// How many times to retry and how long to wait before each attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Start counting attempts against this policy
    #[must_use]
    pub fn start(self) -> RetryState {
        RetryState::new(self)
    }
}

/// Outcome of asking for another attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again after `delay`; `attempt` is 1-based
    Retry { attempt: u32, delay: Duration },
    /// No attempts left
    Exhausted { attempts: u32 },
}

impl RetryDecision {
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

/// Attempts consumed so far under a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    policy: RetryPolicy,
    attempts: u32,
}

impl RetryState {
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
        }
    }

    /// Consume an attempt if one is left
    pub fn next_attempt(&mut self) -> RetryDecision {
        if self.attempts < self.policy.max_attempts {
            self.attempts += 1;
            RetryDecision::Retry {
                attempt: self.attempts,
                delay: self.policy.delay,
            }
        } else {
            RetryDecision::Exhausted {
                attempts: self.attempts,
            }
        }
    }

    /// Attempts consumed since the last reset
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.policy.max_attempts
    }

    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}
