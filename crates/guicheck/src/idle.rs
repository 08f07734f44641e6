//! Idle detection.
//!
//! One drained no-op is not enough evidence that the UI has settled: toolkits
//! defer layout and styling work to later pulses. The UI counts as idle once
//! the event loop has accepted and completed a no-op task `cycles` times in a
//! row, with a real-time pause after each to let deferred work enqueue.

use crate::dispatch::Dispatcher;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::trace;

/// Idle detection settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdleConfig {
    /// Consecutive no-op cycles required
    pub cycles: u32,
    /// Pause after each cycle before slow motion is applied (ms)
    pub delay_per_cycle_ms: u64,
    /// Multiplier on the pause, for watching a test run
    pub slow_motion_factor: u32,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            cycles: 3,
            delay_per_cycle_ms: 1,
            slow_motion_factor: 10,
        }
    }
}

impl IdleConfig {
    /// Pause after each cycle, slow motion included
    #[must_use]
    pub fn effective_delay(&self) -> Duration {
        Duration::from_millis(
            self.delay_per_cycle_ms
                .saturating_mul(u64::from(self.slow_motion_factor)),
        )
    }

    /// Set the number of cycles
    #[must_use]
    pub const fn with_cycles(mut self, cycles: u32) -> Self {
        self.cycles = cycles;
        self
    }

    /// Set the slow-motion factor
    #[must_use]
    pub const fn with_slow_motion(mut self, factor: u32) -> Self {
        self.slow_motion_factor = factor;
        self
    }
}

/// Blocks the test thread until the UI is idle
#[derive(Debug, Clone)]
pub struct IdleWaiter {
    dispatcher: Dispatcher,
    config: IdleConfig,
}

impl IdleWaiter {
    /// Create a waiter; `config` is fixed for the waiter's lifetime
    #[must_use]
    pub fn new(dispatcher: Dispatcher, config: IdleConfig) -> Self {
        Self { dispatcher, config }
    }

    /// The settings in use
    #[must_use]
    pub const fn config(&self) -> &IdleConfig {
        &self.config
    }

    /// Dispatcher the waiter posts through
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Wait with the configured cycles and delay
    pub fn wait_for_idle(&self) {
        self.wait_cycles(self.config.cycles, self.config.effective_delay());
    }

    /// Run `cycles` no-op round trips, sleeping `delay` after each.
    ///
    /// Returns at once if the event loop is (or becomes) dead.
    pub fn wait_cycles(&self, cycles: u32, delay: Duration) {
        for cycle in 1..=cycles {
            if !self.dispatcher.is_alive() {
                trace!(cycle, "event loop not alive, idle wait ends");
                return;
            }
            if !self.dispatcher.run_and_wait(|| {}).is_completed() {
                return;
            }
            std::thread::sleep(delay);
            trace!(cycle, cycles, "idle cycle completed");
        }
    }
}
