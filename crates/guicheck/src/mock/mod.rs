//! In-memory toolkit for testing.
//!
//! Implements every collaborator trait of [`crate::platform`] without a real
//! UI: an event-loop thread fed by a channel, a node tree with Bean-style
//! properties and a small CSS-like query engine, windows with modality and
//! owners, menus, popup menus, and an input driver that turns injected
//! events into state changes on the loop thread.
//!
//! ## Example
//!
//! ```rust
//! use guicheck::mock::{MockNode, MockToolkit, MockWindow};
//! use guicheck::{Component, GuiCheck, GuiCheckConfig};
//!
//! let toolkit = MockToolkit::start();
//! let root = MockNode::new("VBox");
//! root.add_child(MockNode::new("TextField").with_id("name").with_text(""));
//! toolkit.add_window(MockWindow::new("Editor").with_root(root));
//!
//! let gc = GuiCheck::new(toolkit.clone(), GuiCheckConfig::default());
//! let stage = gc.stage("Edit").unwrap();
//! stage.robot().focus_on("#name").unwrap().key_type("ab").unwrap();
//! stage.node("#name").unwrap().property_is("text", "ab").unwrap();
//! toolkit.shutdown();
//! ```

pub mod event_loop;
pub mod menu;
pub mod node;
pub mod toolkit;
pub mod window;

pub use event_loop::MockEventLoop;
pub use menu::{MockMenuItem, MockPopup};
pub use node::MockNode;
pub use toolkit::MockToolkit;
pub use window::MockWindow;

use std::sync::{Mutex, MutexGuard};

/// Action callback attached to mock nodes and menu items
pub type ActionFn = std::sync::Arc<dyn Fn() + Send + Sync>;

// Mock state stays usable after a panicking test task
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
