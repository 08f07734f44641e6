//! A top-level window under test.

use crate::assertion::ensure_some;
use crate::component::{Component, Handle};
use crate::context::GuiCheck;
use crate::locator::Selector;
use crate::menu::ContextMenu;
use crate::node::Node;
use crate::platform::WindowRef;
use crate::result::{GuiCheckError, GuiCheckResult};
use crate::robot::Robot;
use std::fmt;
use tracing::debug;

/// A stage (top-level window).
///
/// Node lookups start at the root of the stage's scene; property checks
/// apply to the window itself (`title`, `showing`, ...).
#[derive(Clone)]
pub struct Stage {
    context: GuiCheck,
    window: WindowRef,
    handle: Handle,
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("window_id", &self.window.window_id())
            .finish_non_exhaustive()
    }
}

impl Stage {
    pub(crate) fn new(context: GuiCheck, window: WindowRef) -> Self {
        Self {
            context,
            handle: Handle::Window(window.clone()),
            window,
        }
    }

    /// The underlying toolkit window
    #[must_use]
    pub const fn window(&self) -> &WindowRef {
        &self.window
    }

    /// Current title
    ///
    /// # Errors
    /// Hard failure if the event loop is gone
    pub fn title(&self) -> GuiCheckResult<Option<String>> {
        let window = self.window.clone();
        self.context.dispatcher().invoke(move || Ok(window.title()))
    }

    /// Input robot acting on this stage
    #[must_use]
    pub fn robot(&self) -> Robot {
        Robot::new(self.clone())
    }

    /// Close the stage on the event-loop thread
    pub fn close(&self) -> &Self {
        let window = self.window.clone();
        let outcome = self.context.dispatcher().run_and_wait(move || window.close());
        if !outcome.is_completed() {
            debug!(%outcome, "stage close not run");
        }
        self
    }

    /// Primary-click the node for `selector` and return the context menu
    /// that opened
    ///
    /// # Errors
    /// Any robot failure; assertion failure "Cannot find context menu" if
    /// no popup showed up
    pub fn context_menu(&self, selector: impl Into<Selector>) -> GuiCheckResult<ContextMenu> {
        self.robot().mouse_move_to_center_on(selector)?.mouse_click()?;
        self.find_context_menu()
    }

    /// Like [`Stage::context_menu`] for an already located node
    ///
    /// # Errors
    /// As [`Stage::context_menu`]
    pub fn context_menu_of(&self, node: &Node) -> GuiCheckResult<ContextMenu> {
        self.robot().mouse_move_to_center(node)?.mouse_click()?;
        self.find_context_menu()
    }

    /// Secondary-click the node for `selector` and return the context menu
    /// that opened
    ///
    /// # Errors
    /// As [`Stage::context_menu`]
    pub fn context_menu_via_secondary_click(
        &self,
        selector: impl Into<Selector>,
    ) -> GuiCheckResult<ContextMenu> {
        self.robot()
            .mouse_move_to_center_on(selector)?
            .mouse_click_secondary()?;
        self.find_context_menu()
    }

    /// Like [`Stage::context_menu_via_secondary_click`] for an already
    /// located node
    ///
    /// # Errors
    /// As [`Stage::context_menu`]
    pub fn context_menu_via_secondary_click_of(&self, node: &Node) -> GuiCheckResult<ContextMenu> {
        self.robot().mouse_move_to_center(node)?.mouse_click_secondary()?;
        self.find_context_menu()
    }

    fn find_context_menu(&self) -> GuiCheckResult<ContextMenu> {
        let popup = self.context.evaluator().eval(|| {
            let toolkit = self.context.toolkit().clone();
            self.context.dispatcher().invoke(move || {
                ensure_some(toolkit.popup_menus().into_iter().next(), || {
                    "Cannot find context menu".to_string()
                })
            })
        })?;
        Ok(ContextMenu::new(self.context.clone(), popup))
    }

    /// Fail if a showing modal window owned by this stage blocks input
    ///
    /// # Errors
    /// Assertion failure naming both windows
    pub(crate) fn ensure_not_blocked(&self) -> GuiCheckResult<()> {
        let toolkit = self.context.toolkit().clone();
        let window = self.window.clone();
        self.context.dispatcher().invoke(move || {
            let id = window.window_id();
            let blocker = toolkit.windows().into_iter().find(|w| {
                w.owner_id() == Some(id) && w.is_showing() && w.modality().is_blocking()
            });
            match blocker {
                Some(child) => Err(GuiCheckError::assertion(format!(
                    "The stage <{}> is blocked by the modal child window <{}>",
                    window.title().unwrap_or_default(),
                    child.title().unwrap_or_default()
                ))),
                None => Ok(()),
            }
        })
    }
}

impl Component for Stage {
    fn context(&self) -> &GuiCheck {
        &self.context
    }

    fn handle(&self) -> &Handle {
        &self.handle
    }
}
