//! Test session: the entry point of GUIcheck.
//!
//! A [`GuiCheck`] owns the dispatcher, idle waiter and evaluator built from
//! one [`GuiCheckConfig`]. The configuration is fixed for the session; slow
//! motion and the default retry policy are set before the first lookup and
//! never change afterwards.

use crate::assertion::{Evaluator, RetryPolicy};
use crate::config::GuiCheckConfig;
use crate::dispatch::Dispatcher;
use crate::idle::IdleWaiter;
use crate::locator::Pattern;
use crate::platform::{Toolkit, WindowRef};
use crate::result::{GuiCheckError, GuiCheckResult};
use crate::stage::Stage;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

struct Inner {
    toolkit: Arc<dyn Toolkit>,
    dispatcher: Dispatcher,
    evaluator: Evaluator,
    config: GuiCheckConfig,
}

/// A GUI test session over one toolkit.
///
/// Cheap to clone; every stage and node handed out keeps a clone.
#[derive(Clone)]
pub struct GuiCheck {
    inner: Arc<Inner>,
}

impl fmt::Debug for GuiCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuiCheck")
            .field("config", &self.inner.config)
            .field("dispatcher", &self.inner.dispatcher)
            .finish_non_exhaustive()
    }
}

impl GuiCheck {
    /// Create a session.
    ///
    /// A config that fails [`GuiCheckConfig::validate`] is used anyway with
    /// its zero values clamped: one attempt per evaluation and a 1 ms
    /// liveness poll.
    #[must_use]
    pub fn new(toolkit: Arc<dyn Toolkit>, config: GuiCheckConfig) -> Self {
        if let Err(error) = config.validate() {
            warn!(%error, "invalid session config, clamping zero values");
        }
        let dispatcher = Dispatcher::new(toolkit.event_loop(), config.dispatch_poll_interval());
        let idle = IdleWaiter::new(dispatcher.clone(), config.idle);
        let evaluator = Evaluator::new(idle, config.retry);
        debug!(?config, "session created");
        Self {
            inner: Arc::new(Inner {
                toolkit,
                dispatcher,
                evaluator,
                config,
            }),
        }
    }

    /// Session configuration
    #[must_use]
    pub fn config(&self) -> &GuiCheckConfig {
        &self.inner.config
    }

    /// Dispatcher onto the event-loop thread
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    /// Evaluator with the session's default policy
    #[must_use]
    pub fn evaluator(&self) -> &Evaluator {
        &self.inner.evaluator
    }

    /// The toolkit under test
    #[must_use]
    pub fn toolkit(&self) -> &Arc<dyn Toolkit> {
        &self.inner.toolkit
    }

    /// Whether the event loop is running
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.inner.dispatcher.is_alive()
    }

    /// Block until the UI is idle
    pub fn wait_for_idle(&self) {
        self.inner.evaluator.idle().wait_for_idle();
    }

    /// Find a showing stage whose title starts with or matches `title`,
    /// with retry
    ///
    /// # Errors
    /// Assertion failure naming the title after the last attempt; hard
    /// failure if `title` is needed as a regex and does not compile
    pub fn stage(&self, title: &str) -> GuiCheckResult<Stage> {
        let policy = *self.inner.evaluator.policy();
        self.stage_with(title, &policy)
    }

    /// Like [`GuiCheck::stage`] under `policy`
    ///
    /// # Errors
    /// As [`GuiCheck::stage`]
    pub fn stage_with(&self, title: &str, policy: &RetryPolicy) -> GuiCheckResult<Stage> {
        let window = self.find_window(Some(Pattern::new(title)), policy)?;
        Ok(Stage::new(self.clone(), window))
    }

    /// Find a showing stage without a title, with retry
    ///
    /// # Errors
    /// Assertion failure after the last attempt
    pub fn untitled_stage(&self) -> GuiCheckResult<Stage> {
        let policy = *self.inner.evaluator.policy();
        let window = self.find_window(None, &policy)?;
        Ok(Stage::new(self.clone(), window))
    }

    fn find_window(
        &self,
        pattern: Option<Pattern>,
        policy: &RetryPolicy,
    ) -> GuiCheckResult<WindowRef> {
        self.inner.evaluator.eval_with(policy, || {
            let toolkit = Arc::clone(&self.inner.toolkit);
            let pattern = pattern.clone();
            self.inner.dispatcher.invoke(move || {
                for window in toolkit.windows() {
                    if !window.is_showing() {
                        continue;
                    }
                    let title = window.title();
                    let found = match (&pattern, title.as_deref()) {
                        (None, title) => title.is_none(),
                        (Some(pattern), title) => pattern.is_match(title)?,
                    };
                    if found {
                        return Ok(window);
                    }
                }
                Err(GuiCheckError::assertion(match &pattern {
                    Some(pattern) => format!("Cannot find stage with title: {}", pattern.as_str()),
                    None => "Cannot find stage without title".to_string(),
                }))
            })
        })
    }

    /// Wait until the event loop runs and the first window is showing.
    ///
    /// For applications started on another thread right before the test.
    ///
    /// # Errors
    /// [`GuiCheckError::StartupTimeout`] if that does not happen within the
    /// configured startup timeout
    pub fn await_startup(&self) -> GuiCheckResult<()> {
        let timeout = self.inner.config.startup_timeout();
        let pause = self.inner.config.idle.effective_delay().max(Duration::from_millis(1));
        let start = Instant::now();
        while start.elapsed() < timeout {
            if self.is_alive() {
                let toolkit = Arc::clone(&self.inner.toolkit);
                let showing = self
                    .inner
                    .dispatcher
                    .invoke(move || Ok(toolkit.windows().first().is_some_and(|w| w.is_showing())))
                    .unwrap_or(false);
                self.wait_for_idle();
                if showing {
                    info!(elapsed = ?start.elapsed(), "UI platform started");
                    return Ok(());
                }
            } else {
                std::thread::sleep(pause);
            }
        }
        Err(GuiCheckError::StartupTimeout {
            ms: self.inner.config.startup_timeout_ms,
        })
    }

    /// Block until no window is showing, the event loop has stopped, or
    /// `timeout` has passed. Useful to keep a failing test's UI open.
    ///
    /// # Errors
    /// Assertion failure if windows are still showing after `timeout`
    pub fn wait_for_all_windows_closed(&self, timeout: Duration) -> GuiCheckResult<()> {
        let poll = self.inner.dispatcher.poll_interval();
        let start = Instant::now();
        loop {
            let toolkit = Arc::clone(&self.inner.toolkit);
            let showing = self
                .inner
                .dispatcher
                .invoke(move || Ok(toolkit.windows().iter().filter(|w| w.is_showing()).count()));
            match showing {
                Ok(0) | Err(_) => return Ok(()),
                Ok(count) if start.elapsed() >= timeout => {
                    return Err(GuiCheckError::assertion(format!(
                        "{count} window(s) still showing after {}ms",
                        timeout.as_millis()
                    )));
                }
                Ok(_) => std::thread::sleep(poll.min(timeout)),
            }
        }
    }
}
