//! Cross-thread dispatcher.
//!
//! The only path from the test thread onto the event-loop thread. A task is
//! posted and the caller blocks on a one-shot completion signal. While
//! waiting, event-loop liveness is re-checked every poll interval so a UI
//! that shuts down (last window closed) never hangs the test.
//!
//! A task that is still queued when the dispatcher gives up is cancelled:
//! its wrapper sees the abandoned flag and skips the body if the loop ever
//! drains it.

use crate::platform::EventLoop;
use crate::result::{GuiCheckError, GuiCheckResult};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Shortest liveness poll interval; a zero interval would spin
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Outcome of [`Dispatcher::run_and_wait`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The task ran to completion on the event-loop thread
    Completed,
    /// The loop was not running; nothing was scheduled
    LoopNotRunning,
    /// The loop died while the task was pending; the task was cancelled
    LoopTerminated,
    /// The task was discarded by the loop or panicked
    TaskDropped,
}

impl Dispatch {
    /// Whether the task ran
    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Completed => "task completed",
            Self::LoopNotRunning => "the event loop is not running",
            Self::LoopTerminated => "the event loop terminated while a task was pending",
            Self::TaskDropped => "the task was dropped before completing",
        };
        f.write_str(text)
    }
}

/// Runs work on the event-loop thread on behalf of the test thread
#[derive(Clone)]
pub struct Dispatcher {
    event_loop: Arc<dyn EventLoop>,
    poll_interval: Duration,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("poll_interval", &self.poll_interval)
            .field("alive", &self.event_loop.is_alive())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Create a dispatcher polling liveness every `poll_interval`,
    /// at least [`MIN_POLL_INTERVAL`]
    #[must_use]
    pub fn new(event_loop: Arc<dyn EventLoop>, poll_interval: Duration) -> Self {
        Self {
            event_loop,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
        }
    }

    /// Liveness of the underlying event loop
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.event_loop.is_alive()
    }

    /// Liveness poll interval
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Run `task` on the event-loop thread and wait for it.
    ///
    /// Never fails because of a dead loop: the outcome says whether the task
    /// ran. Errors inside `task` are the task's business; use
    /// [`Dispatcher::invoke`] to carry a result back.
    pub fn run_and_wait(&self, task: impl FnOnce() + Send + 'static) -> Dispatch {
        match self.dispatch(task) {
            Ok(()) => Dispatch::Completed,
            Err(outcome) => outcome,
        }
    }

    /// Run `f` on the event-loop thread and return its result.
    ///
    /// # Errors
    /// Whatever `f` returns, or [`GuiCheckError::EventLoopUnavailable`] if it
    /// did not run to completion
    pub fn invoke<T, F>(&self, f: F) -> GuiCheckResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> GuiCheckResult<T> + Send + 'static,
    {
        self.dispatch(f)
            .unwrap_or_else(|outcome| Err(GuiCheckError::event_loop(outcome.to_string())))
    }

    /// Post `task` without waiting. Returns `false` if the loop is not running.
    pub fn run_later(&self, task: impl FnOnce() + Send + 'static) -> bool {
        self.event_loop.is_alive() && self.event_loop.post(Box::new(task))
    }

    fn dispatch<T, F>(&self, task: F) -> Result<T, Dispatch>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        if !self.event_loop.is_alive() {
            return Err(Dispatch::LoopNotRunning);
        }
        // Already on the loop thread: posting and blocking would deadlock
        if self.event_loop.is_current_thread() {
            return Ok(task());
        }

        let (done_tx, done_rx) = mpsc::sync_channel::<T>(1);
        let abandoned = Arc::new(AtomicBool::new(false));
        let cancelled = Arc::clone(&abandoned);
        let posted = self.event_loop.post(Box::new(move || {
            if cancelled.load(Ordering::Acquire) {
                return;
            }
            let _ = done_tx.send(task());
        }));
        if !posted {
            return Err(Dispatch::LoopNotRunning);
        }

        loop {
            match done_rx.recv_timeout(self.poll_interval) {
                Ok(value) => return Ok(value),
                Err(RecvTimeoutError::Disconnected) => return Err(Dispatch::TaskDropped),
                Err(RecvTimeoutError::Timeout) => {
                    if !self.event_loop.is_alive() {
                        abandoned.store(true, Ordering::Release);
                        warn!("event loop terminated while a dispatched task was pending; task cancelled");
                        return Err(Dispatch::LoopTerminated);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::MockEventLoop;
    use crate::platform::UiTask;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::thread;
    use std::time::Instant;

    /// Accepts tasks but never runs them on its own
    #[derive(Default)]
    struct StalledLoop {
        alive: AtomicBool,
        queue: Mutex<Vec<UiTask>>,
    }

    impl EventLoop for StalledLoop {
        fn post(&self, task: UiTask) -> bool {
            self.queue.lock().unwrap().push(task);
            true
        }

        fn is_alive(&self) -> bool {
            self.alive.load(Ordering::SeqCst)
        }
    }

    fn dispatcher(event_loop: Arc<dyn EventLoop>) -> Dispatcher {
        Dispatcher::new(event_loop, Duration::from_millis(10))
    }

    mod run_and_wait {
        use super::*;

        #[test]
        fn test_runs_on_loop_thread() {
            let event_loop = MockEventLoop::start();
            let d = dispatcher(event_loop.clone());
            let seen = Arc::new(Mutex::new(None));
            let slot = Arc::clone(&seen);
            let outcome = d.run_and_wait(move || {
                *slot.lock().unwrap() = Some(thread::current().id());
            });
            assert_eq!(outcome, Dispatch::Completed);
            let ran_on = seen.lock().unwrap().unwrap();
            assert_ne!(ran_on, thread::current().id());
            assert_eq!(Some(ran_on), event_loop.thread_id());
            event_loop.stop();
        }

        #[test]
        fn test_dead_loop_returns_immediately() {
            let event_loop = MockEventLoop::start();
            event_loop.stop();
            let d = dispatcher(event_loop);
            let ran = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&ran);
            let start = Instant::now();
            let outcome = d.run_and_wait(move || flag.store(true, Ordering::SeqCst));
            assert_eq!(outcome, Dispatch::LoopNotRunning);
            assert!(start.elapsed() < Duration::from_millis(100));
            assert!(!ran.load(Ordering::SeqCst));
        }

        #[test]
        fn test_loop_death_mid_wait_cancels_task() {
            let stalled = Arc::new(StalledLoop::default());
            stalled.alive.store(true, Ordering::SeqCst);
            let d = dispatcher(stalled.clone());

            let killer = {
                let stalled = Arc::clone(&stalled);
                thread::spawn(move || {
                    thread::sleep(Duration::from_millis(50));
                    stalled.alive.store(false, Ordering::SeqCst);
                })
            };
            let runs = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&runs);
            let outcome = d.run_and_wait(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            killer.join().unwrap();
            assert_eq!(outcome, Dispatch::LoopTerminated);

            // Draining the queue later must not run the cancelled body
            for task in stalled.queue.lock().unwrap().drain(..) {
                task();
            }
            assert_eq!(runs.load(Ordering::SeqCst), 0);
        }

        #[test]
        fn test_panicking_task_reports_dropped() {
            let event_loop = MockEventLoop::start();
            let d = dispatcher(event_loop.clone());
            let outcome = d.run_and_wait(|| panic!("task failure"));
            assert_eq!(outcome, Dispatch::TaskDropped);
            // The loop survives the panic
            assert!(d.run_and_wait(|| {}).is_completed());
            event_loop.stop();
        }

        #[test]
        fn test_reentrant_call_runs_inline() {
            let event_loop = MockEventLoop::start();
            let d = dispatcher(event_loop.clone());
            let inner = d.clone();
            let nested = Arc::new(Mutex::new(None));
            let slot = Arc::clone(&nested);
            let outer = d.run_and_wait(move || {
                let outcome = inner.run_and_wait(|| {});
                *slot.lock().unwrap() = Some(outcome);
            });
            assert_eq!(outer, Dispatch::Completed);
            assert_eq!(*nested.lock().unwrap(), Some(Dispatch::Completed));
            event_loop.stop();
        }
    }

    mod invoke {
        use super::*;

        #[test]
        fn test_returns_task_result() {
            let event_loop = MockEventLoop::start();
            let d = dispatcher(event_loop.clone());
            assert_eq!(d.invoke(|| Ok(41 + 1)).unwrap(), 42);
            let err = d
                .invoke(|| Err::<(), _>(GuiCheckError::assertion("not yet")))
                .unwrap_err();
            assert!(err.is_retryable());
            event_loop.stop();
        }

        #[test]
        fn test_dead_loop_is_hard_failure() {
            let event_loop = MockEventLoop::start();
            event_loop.stop();
            let d = dispatcher(event_loop);
            let err = d.invoke(|| Ok(())).unwrap_err();
            assert!(matches!(err, GuiCheckError::EventLoopUnavailable { .. }));
            assert!(!err.is_retryable());
        }
    }

    mod poll_interval {
        use super::*;

        #[test]
        fn test_zero_interval_is_clamped() {
            let event_loop = MockEventLoop::start();
            let d = Dispatcher::new(event_loop.clone(), Duration::ZERO);
            assert_eq!(d.poll_interval(), MIN_POLL_INTERVAL);
            assert!(d.run_and_wait(|| {}).is_completed());
            event_loop.stop();
        }

        #[test]
        fn test_longer_interval_is_kept() {
            let event_loop = MockEventLoop::start();
            let d = dispatcher(event_loop.clone());
            assert_eq!(d.poll_interval(), Duration::from_millis(10));
            event_loop.stop();
        }
    }

    mod run_later {
        use super::*;

        #[test]
        fn test_does_not_wait() {
            let event_loop = MockEventLoop::start();
            let d = dispatcher(event_loop.clone());
            let (tx, rx) = mpsc::channel();
            assert!(d.run_later(move || {
                thread::sleep(Duration::from_millis(30));
                tx.send(()).unwrap();
            }));
            // Not done yet when run_later returns
            assert!(rx.try_recv().is_err());
            rx.recv_timeout(Duration::from_secs(2)).unwrap();
            event_loop.stop();
        }

        #[test]
        fn test_dead_loop_rejects() {
            let event_loop = MockEventLoop::start();
            event_loop.stop();
            assert!(!dispatcher(event_loop).run_later(|| {}));
        }
    }
}
