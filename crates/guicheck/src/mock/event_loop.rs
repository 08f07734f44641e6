//! Event-loop thread for the mock toolkit.

use super::lock;
use crate::platform::{EventLoop, UiTask};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};
use tracing::warn;

/// A single UI thread draining a task queue
#[derive(Debug)]
pub struct MockEventLoop {
    sender: Mutex<Option<Sender<UiTask>>>,
    alive: Arc<AtomicBool>,
    tasks_run: Arc<AtomicUsize>,
    thread_id: Option<ThreadId>,
}

impl MockEventLoop {
    /// Spawn the loop thread.
    ///
    /// If the thread cannot be spawned the loop starts dead, which callers
    /// observe through [`EventLoop::is_alive`].
    #[must_use]
    pub fn start() -> Arc<Self> {
        let (sender, receiver) = mpsc::channel::<UiTask>();
        let alive = Arc::new(AtomicBool::new(true));
        let tasks_run = Arc::new(AtomicUsize::new(0));

        let loop_alive = Arc::clone(&alive);
        let loop_tasks = Arc::clone(&tasks_run);
        let spawned = thread::Builder::new()
            .name("guicheck-ui".into())
            .spawn(move || {
                while let Ok(task) = receiver.recv() {
                    if !loop_alive.load(Ordering::Acquire) {
                        break;
                    }
                    loop_tasks.fetch_add(1, Ordering::AcqRel);
                    // A panicking task must not take the UI thread down
                    let _ = panic::catch_unwind(AssertUnwindSafe(task));
                }
                loop_alive.store(false, Ordering::Release);
            });

        let thread_id = match spawned {
            Ok(handle) => Some(handle.thread().id()),
            Err(err) => {
                warn!(error = %err, "cannot spawn mock event loop thread");
                alive.store(false, Ordering::Release);
                None
            }
        };

        Arc::new(Self {
            sender: Mutex::new(Some(sender)),
            alive,
            tasks_run,
            thread_id,
        })
    }

    /// Shut the loop down. Tasks still queued are dropped unrun.
    pub fn stop(&self) {
        self.alive.store(false, Ordering::Release);
        lock(&self.sender).take();
    }

    /// Number of tasks the loop has started so far
    #[must_use]
    pub fn tasks_run(&self) -> usize {
        self.tasks_run.load(Ordering::Acquire)
    }

    /// Id of the loop thread
    #[must_use]
    pub const fn thread_id(&self) -> Option<ThreadId> {
        self.thread_id
    }
}

impl EventLoop for MockEventLoop {
    fn post(&self, task: UiTask) -> bool {
        if !self.is_alive() {
            return false;
        }
        lock(&self.sender)
            .as_ref()
            .is_some_and(|sender| sender.send(task).is_ok())
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    fn is_current_thread(&self) -> bool {
        self.thread_id == Some(thread::current().id())
    }
}

impl Drop for MockEventLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_runs_posted_tasks_in_order() {
        let event_loop = MockEventLoop::start();
        let (tx, rx) = mpsc::channel();
        for i in 0..5 {
            let tx = tx.clone();
            assert!(event_loop.post(Box::new(move || tx.send(i).unwrap())));
        }
        let seen: Vec<i32> = (0..5)
            .map(|_| rx.recv_timeout(Duration::from_secs(2)).unwrap())
            .collect();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
        event_loop.stop();
    }

    #[test]
    fn test_stop_rejects_new_work() {
        let event_loop = MockEventLoop::start();
        assert!(event_loop.is_alive());
        event_loop.stop();
        assert!(!event_loop.is_alive());
        assert!(!event_loop.post(Box::new(|| {})));
    }

    #[test]
    fn test_current_thread_detection() {
        let event_loop = MockEventLoop::start();
        assert!(!event_loop.is_current_thread());
        let (tx, rx) = mpsc::channel();
        let probe = Arc::clone(&event_loop);
        event_loop.post(Box::new(move || tx.send(probe.is_current_thread()).unwrap()));
        assert!(rx.recv_timeout(Duration::from_secs(2)).unwrap());
        event_loop.stop();
    }

    #[test]
    fn test_survives_panicking_task() {
        let event_loop = MockEventLoop::start();
        event_loop.post(Box::new(|| panic!("boom")));
        let (tx, rx) = mpsc::channel();
        event_loop.post(Box::new(move || tx.send(()).unwrap()));
        rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(event_loop.is_alive());
        assert_eq!(event_loop.tasks_run(), 2);
        event_loop.stop();
    }
}
