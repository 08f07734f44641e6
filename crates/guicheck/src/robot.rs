//! Input robot.
//!
//! Every action follows the same sequence:
//!
//! ```text
//! is_alive? ──no──▶ skip (Ok)
//!    │yes
//!    ▼
//! modal child showing? ──yes──▶ assertion failure
//!    │no
//!    ▼
//! inject event ─▶ wait for idle ─▶ next event ...
//! ```
//!
//! Input actions are never retried: a click that landed must not land twice.

use crate::component::Component;
use crate::context::GuiCheck;
use crate::input::{InputEvent, Key, MouseButton};
use crate::locator::Selector;
use crate::node::Node;
use crate::platform::Point;
use crate::result::GuiCheckResult;
use crate::stage::Stage;
use tracing::debug;

/// Simulates keyboard and mouse input on one stage
#[derive(Debug, Clone)]
pub struct Robot {
    stage: Stage,
}

impl Robot {
    pub(crate) const fn new(stage: Stage) -> Self {
        Self { stage }
    }

    /// The stage input goes to
    #[must_use]
    pub const fn stage(&self) -> &Stage {
        &self.stage
    }

    fn context(&self) -> &GuiCheck {
        self.stage.context()
    }

    /// Press `key`
    ///
    /// # Errors
    /// Assertion failure if a modal child window blocks the stage
    pub fn key_press(&self, key: Key) -> GuiCheckResult<&Self> {
        self.inject(&[InputEvent::key_press(key)], true)
    }

    /// Release `key`
    ///
    /// # Errors
    /// As [`Robot::key_press`]
    pub fn key_release(&self, key: Key) -> GuiCheckResult<&Self> {
        self.inject(&[InputEvent::key_release(key)], true)
    }

    /// Type `text`, one key-typed event per character
    ///
    /// # Errors
    /// As [`Robot::key_press`]
    pub fn key_type(&self, text: &str) -> GuiCheckResult<&Self> {
        let events: Vec<_> = text.chars().map(InputEvent::key_type).collect();
        self.inject(&events, true)
    }

    /// Press and release each of `keys` in turn
    ///
    /// # Errors
    /// As [`Robot::key_press`]
    pub fn key_type_keys(&self, keys: &[Key]) -> GuiCheckResult<&Self> {
        let events: Vec<_> = keys
            .iter()
            .flat_map(|&key| [InputEvent::key_press(key), InputEvent::key_release(key)])
            .collect();
        self.inject(&events, true)
    }

    /// Type `text` as a single event carrying `key`
    ///
    /// # Errors
    /// As [`Robot::key_press`]
    pub fn key_type_with(&self, key: Key, text: &str) -> GuiCheckResult<&Self> {
        let event = InputEvent::KeyType {
            key,
            text: text.to_string(),
        };
        self.inject(&[event], true)
    }

    /// Rotate the mouse wheel by `amount` notches
    ///
    /// # Errors
    /// As [`Robot::key_press`]
    pub fn mouse_wheel(&self, amount: i32) -> GuiCheckResult<&Self> {
        self.inject(&[InputEvent::MouseWheel { amount }], true)
    }

    /// Move the pointer to a point in scene coordinates
    ///
    /// # Errors
    /// As [`Robot::key_press`]
    pub fn mouse_move(&self, x: f32, y: f32) -> GuiCheckResult<&Self> {
        self.inject(&[InputEvent::mouse_move(x, y)], true)
    }

    /// Move the pointer to `(x, y)` relative to the top-left corner of `node`
    ///
    /// # Errors
    /// [`GuiCheckError::NodeDetached`](crate::GuiCheckError::NodeDetached)
    /// if the node is gone; otherwise as [`Robot::key_press`]
    pub fn mouse_move_to(&self, node: &Node, x: f32, y: f32) -> GuiCheckResult<&Self> {
        let target = node.resolve()?;
        let point = self.context().dispatcher().invoke(move || {
            let bounds = target.local_bounds();
            Ok(target.local_to_scene(Point::new(bounds.x + x, bounds.y + y)))
        })?;
        self.mouse_move(point.x, point.y)
    }

    /// Move the pointer to the centre of `node`
    ///
    /// # Errors
    /// As [`Robot::mouse_move_to`]
    pub fn mouse_move_to_center(&self, node: &Node) -> GuiCheckResult<&Self> {
        let target = node.resolve()?;
        let point = self
            .context()
            .dispatcher()
            .invoke(move || Ok(target.local_to_scene(target.local_bounds().center())))?;
        self.mouse_move(point.x, point.y)
    }

    /// Find the node for `selector` on the stage, with retry, and move the
    /// pointer to its centre
    ///
    /// # Errors
    /// Lookup failures as [`Component::node`]; otherwise as
    /// [`Robot::mouse_move_to`]
    pub fn mouse_move_to_center_on(&self, selector: impl Into<Selector>) -> GuiCheckResult<&Self> {
        let node = self.stage.node(selector)?;
        self.mouse_move_to_center(&node)
    }

    /// Press the primary button
    ///
    /// # Errors
    /// As [`Robot::key_press`]
    pub fn mouse_press(&self) -> GuiCheckResult<&Self> {
        self.press(MouseButton::Primary, 1)
    }

    /// Press the secondary button
    ///
    /// # Errors
    /// As [`Robot::key_press`]
    pub fn mouse_press_secondary(&self) -> GuiCheckResult<&Self> {
        self.press(MouseButton::Secondary, 1)
    }

    /// Release the primary button
    ///
    /// # Errors
    /// As [`Robot::key_press`]
    pub fn mouse_release(&self) -> GuiCheckResult<&Self> {
        self.release(MouseButton::Primary, 1, true)
    }

    /// Release the secondary button
    ///
    /// # Errors
    /// As [`Robot::key_press`]
    pub fn mouse_release_secondary(&self) -> GuiCheckResult<&Self> {
        self.release(MouseButton::Secondary, 1, true)
    }

    /// Click the primary button at the pointer
    ///
    /// # Errors
    /// As [`Robot::key_press`]
    pub fn mouse_click(&self) -> GuiCheckResult<&Self> {
        self.click(MouseButton::Primary, 1)
    }

    /// Click the secondary button at the pointer
    ///
    /// # Errors
    /// As [`Robot::key_press`]
    pub fn mouse_click_secondary(&self) -> GuiCheckResult<&Self> {
        self.click(MouseButton::Secondary, 1)
    }

    /// Double-click the primary button at the pointer
    ///
    /// # Errors
    /// As [`Robot::key_press`]
    pub fn mouse_double_click(&self) -> GuiCheckResult<&Self> {
        self.click(MouseButton::Primary, 1)?
            .click(MouseButton::Primary, 2)
    }

    /// Double-click the secondary button at the pointer
    ///
    /// # Errors
    /// As [`Robot::key_press`]
    pub fn mouse_double_click_secondary(&self) -> GuiCheckResult<&Self> {
        self.click(MouseButton::Secondary, 1)?
            .click(MouseButton::Secondary, 2)
    }

    /// Drag with the primary button held
    ///
    /// # Errors
    /// Hard failure if the input driver cannot be reached
    pub fn mouse_drag(&self) -> GuiCheckResult<&Self> {
        self.inject(&[InputEvent::MouseDrag { button: MouseButton::Primary }], false)
    }

    /// Drag with the secondary button held
    ///
    /// # Errors
    /// As [`Robot::mouse_drag`]
    pub fn mouse_drag_secondary(&self) -> GuiCheckResult<&Self> {
        self.inject(&[InputEvent::MouseDrag { button: MouseButton::Secondary }], false)
    }

    /// Move keyboard focus to `node`
    ///
    /// # Errors
    /// Assertion failure if a modal child window blocks the stage;
    /// [`GuiCheckError::NodeDetached`](crate::GuiCheckError::NodeDetached)
    /// if the node is gone
    pub fn focus(&self, node: &Node) -> GuiCheckResult<&Self> {
        if !self.context().is_alive() {
            return Ok(self);
        }
        self.stage.ensure_not_blocked()?;
        let target = node.resolve()?;
        self.context().dispatcher().invoke(move || {
            target.request_focus();
            Ok(())
        })?;
        debug!(?node, "focus requested");
        self.context().wait_for_idle();
        Ok(self)
    }

    /// Find the node for `selector` on the stage, with retry, and focus it
    ///
    /// # Errors
    /// Lookup failures as [`Component::node`]; otherwise as [`Robot::focus`]
    pub fn focus_on(&self, selector: impl Into<Selector>) -> GuiCheckResult<&Self> {
        let node = self.stage.node(selector)?;
        self.focus(&node)
    }

    fn press(&self, button: MouseButton, clicks: u32) -> GuiCheckResult<&Self> {
        self.inject(&[InputEvent::MousePress { button, clicks }], true)
    }

    fn release(
        &self,
        button: MouseButton,
        clicks: u32,
        check_modal: bool,
    ) -> GuiCheckResult<&Self> {
        self.inject(&[InputEvent::MouseRelease { button, clicks }], check_modal)
    }

    // The press already checked for a blocking modal window
    fn click(&self, button: MouseButton, clicks: u32) -> GuiCheckResult<&Self> {
        self.press(button, clicks)?
            .release(button, clicks, false)?
            .inject(&[InputEvent::mouse_click(button, clicks)], false)
    }

    /// Deliver `events` in order, waiting for idle after each one.
    ///
    /// A dead event loop skips the action silently so tests that close the
    /// last window can still finish their input sequence.
    fn inject(&self, events: &[InputEvent], check_modal: bool) -> GuiCheckResult<&Self> {
        let context = self.context();
        if !context.is_alive() {
            debug!(count = events.len(), "event loop not alive, input skipped");
            return Ok(self);
        }
        if check_modal {
            self.stage.ensure_not_blocked()?;
        }
        let window = self.stage.window().clone();
        let driver = context.dispatcher().invoke(move || Ok(window.input()))?;
        for event in events {
            debug!(?event, "injecting input");
            driver.dispatch(event.clone());
            context.wait_for_idle();
        }
        Ok(self)
    }
}
