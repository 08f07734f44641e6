//! Retry evaluation.
//!
//! Most UI assertions race the event loop: click, wait for repaint, assert.
//! An evaluation that fails with an assertion failure is tried again after
//! a pause and an idle wait, up to the policy's attempt count. Hard failures
//! are not transient and end the evaluation at once. The final attempt runs
//! unguarded, so whatever it returns is what the caller sees.

use crate::idle::IdleWaiter;
use crate::result::GuiCheckResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// How often and how patiently an evaluation is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the final unguarded one
    pub max_attempts: u32,
    /// Pause after a failed attempt, before the idle wait (ms)
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay_ms: 50,
        }
    }
}

impl RetryPolicy {
    /// Create a policy
    #[must_use]
    pub const fn new(max_attempts: u32, delay_ms: u64) -> Self {
        Self {
            max_attempts,
            delay_ms,
        }
    }

    /// A single unguarded attempt
    #[must_use]
    pub const fn once() -> Self {
        Self::new(1, 0)
    }

    /// Set the number of attempts
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the pause between attempts
    #[must_use]
    pub const fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Pause between attempts
    #[must_use]
    pub const fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Runs evaluations under a retry policy
#[derive(Debug, Clone)]
pub struct Evaluator {
    idle: IdleWaiter,
    policy: RetryPolicy,
}

impl Evaluator {
    /// Create an evaluator with a default policy
    #[must_use]
    pub const fn new(idle: IdleWaiter, policy: RetryPolicy) -> Self {
        Self { idle, policy }
    }

    /// Default policy
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Idle waiter used between attempts
    #[must_use]
    pub const fn idle(&self) -> &IdleWaiter {
        &self.idle
    }

    /// Evaluate under the default policy
    ///
    /// # Errors
    /// The first hard failure, or the final attempt's error
    pub fn eval<T>(&self, evaluation: impl FnMut() -> GuiCheckResult<T>) -> GuiCheckResult<T> {
        self.eval_with(&self.policy, evaluation)
    }

    /// Evaluate under `policy`.
    ///
    /// A policy of zero attempts behaves like a single attempt.
    ///
    /// # Errors
    /// The first hard failure, or the final attempt's error
    pub fn eval_with<T>(
        &self,
        policy: &RetryPolicy,
        mut evaluation: impl FnMut() -> GuiCheckResult<T>,
    ) -> GuiCheckResult<T> {
        let attempts = policy.max_attempts.max(1);
        for attempt in 1..attempts {
            match evaluation() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() => {
                    debug!(attempt, attempts, error = %err, "evaluation not satisfied, retrying");
                    std::thread::sleep(policy.delay());
                    self.idle.wait_for_idle();
                }
                Err(err) => return Err(err),
            }
        }
        evaluation()
    }
}
