//! Toolkit abstraction.
//!
//! GUIcheck never talks to a concrete UI toolkit. An adapter implements the
//! traits in this module and everything else (locating, property checks,
//! menus, input) is written against them:
//!
//! ```text
//! ┌──────────────┐   post / is_alive    ┌─────────────────────────┐
//! │ test thread  │ ───────────────────▶ │ EventLoop (UI thread)   │
//! │              │                      │   owns every UiNode,    │
//! │  GuiCheck    │ ◀─────────────────── │   UiWindow, UiMenuItem  │
//! └──────────────┘   completion signal  └─────────────────────────┘
//! ```
//!
//! Every method on [`UiNode`], [`UiWindow`], [`UiMenuItem`] and
//! [`UiPopupMenu`] is only called from the event-loop thread, through the
//! [`Dispatcher`](crate::dispatch::Dispatcher). The `Send + Sync` bounds exist
//! so handles can travel inside dispatched tasks; they do not license calls
//! from other threads. [`Toolkit::windows`] and [`Toolkit::popup_menus`] are
//! also dispatched.

use crate::input::InputEvent;
use crate::property::Reflect;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Unit of work posted to the event-loop thread
pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// Shared handle to a scene-graph node
pub type NodeRef = Arc<dyn UiNode>;
/// Shared handle to a top-level window
pub type WindowRef = Arc<dyn UiWindow>;
/// Shared handle to a menu or menu item
pub type MenuRef = Arc<dyn UiMenuItem>;
/// Shared handle to a popup (context) menu
pub type PopupRef = Arc<dyn UiPopupMenu>;

/// A point in scene coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounds of a node
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X position
    pub x: f32,
    /// Y position
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Get the center point
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Check if a point is inside this bounding box
    #[must_use]
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// Modality of a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Modality {
    /// Does not block any other window
    #[default]
    None,
    /// Blocks input to its owner chain
    WindowModal,
    /// Blocks input to every other window of the application
    ApplicationModal,
}

impl Modality {
    /// Whether a showing window of this modality blocks its owner
    #[must_use]
    pub const fn is_blocking(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// The UI toolkit's event loop
pub trait EventLoop: Send + Sync {
    /// Schedule `task` on the event-loop thread without waiting.
    ///
    /// Returns `false` if the loop no longer accepts work; the task is
    /// dropped unrun in that case.
    fn post(&self, task: UiTask) -> bool;

    /// Liveness probe. `false` once the loop has shut down.
    fn is_alive(&self) -> bool;

    /// Whether the caller is running on the event-loop thread
    fn is_current_thread(&self) -> bool {
        false
    }
}

/// A node of the scene graph (component tree)
pub trait UiNode: Send + Sync {
    /// Name/id of the node, if it has one
    fn id(&self) -> Option<String>;

    /// Toolkit type name (`Button`, `TextField`, ...)
    fn type_name(&self) -> String;

    /// Ordered direct children
    fn children(&self) -> Vec<NodeRef>;

    /// Whether the node can hold children
    fn is_container(&self) -> bool {
        !self.children().is_empty()
    }

    /// Parent node, `None` for a scene root
    fn parent(&self) -> Option<NodeRef>;

    /// Whether the node itself is visible
    fn is_visible(&self) -> bool;

    /// First node in this subtree matching a CSS-like selector
    fn query(&self, selector: &str) -> Option<NodeRef>;

    /// All nodes in this subtree matching a CSS-like selector, in tree order
    fn query_all(&self, selector: &str) -> Vec<NodeRef>;

    /// Bounds in local coordinates
    fn local_bounds(&self) -> BoundingBox;

    /// Convert a local point into scene coordinates
    fn local_to_scene(&self, point: Point) -> Point;

    /// Ask the toolkit to move keyboard focus here
    fn request_focus(&self);

    /// Top-level menus, if this node is a menu bar
    fn menus(&self) -> Option<Vec<MenuRef>> {
        None
    }

    /// Property access on the underlying toolkit object
    fn as_reflect(&self) -> &dyn Reflect;
}

/// A top-level window (stage)
pub trait UiWindow: Send + Sync {
    /// Identity of the window, stable for its lifetime
    fn window_id(&self) -> u64;

    /// Window title
    fn title(&self) -> Option<String>;

    /// Whether the window is currently on screen
    fn is_showing(&self) -> bool;

    /// Modality of the window
    fn modality(&self) -> Modality;

    /// Identity of the owning window, if any
    fn owner_id(&self) -> Option<u64>;

    /// Root node of the window's scene, `None` if it has no scene
    fn root(&self) -> Option<NodeRef>;

    /// Close the window
    fn close(&self);

    /// Input injection into this window
    fn input(&self) -> Arc<dyn InputDriver>;

    /// Property access on the underlying toolkit object
    fn as_reflect(&self) -> &dyn Reflect;
}

/// A menu (submenu) or a leaf menu item
pub trait UiMenuItem: Send + Sync {
    /// Id of the item
    fn id(&self) -> Option<String>;

    /// Whether the item is a menu holding further items
    fn is_submenu(&self) -> bool;

    /// Children of a submenu, empty for leaf items
    fn items(&self) -> Vec<MenuRef>;

    /// Whether the item is disabled
    fn is_disabled(&self) -> bool;

    /// Open a submenu
    fn show(&self);

    /// Close a submenu
    fn hide(&self);

    /// Activate the item
    fn fire(&self);

    /// Property access on the underlying toolkit object
    fn as_reflect(&self) -> &dyn Reflect;
}

/// An open popup (context) menu
pub trait UiPopupMenu: Send + Sync {
    /// Top-level items of the popup
    fn items(&self) -> Vec<MenuRef>;

    /// Close the popup and every submenu in it
    fn hide(&self);
}

/// Input injection primitives, each a discrete toolkit call.
///
/// Unlike the scene traits, a driver is called from the test thread and
/// delivers the event to the event loop itself, the way a platform robot
/// does.
pub trait InputDriver: Send + Sync {
    /// Inject one input event
    fn dispatch(&self, event: InputEvent);
}

/// Entry point of a toolkit adapter
pub trait Toolkit: Send + Sync {
    /// The toolkit's event loop
    fn event_loop(&self) -> Arc<dyn EventLoop>;

    /// All windows known to the toolkit, showing or not
    fn windows(&self) -> Vec<WindowRef>;

    /// Popup menus currently showing
    fn popup_menus(&self) -> Vec<PopupRef>;
}

/// Something whose properties can be read and written
#[derive(Clone)]
pub enum Target {
    /// A scene-graph node
    Node(NodeRef),
    /// A window
    Window(WindowRef),
    /// A menu or menu item
    MenuItem(MenuRef),
}

impl Target {
    /// Property access on the wrapped object
    #[must_use]
    pub fn reflect(&self) -> &dyn Reflect {
        match self {
            Self::Node(node) => node.as_reflect(),
            Self::Window(window) => window.as_reflect(),
            Self::MenuItem(item) => item.as_reflect(),
        }
    }
}

impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Node(node) => f
                .debug_tuple("Node")
                .field(&node.type_name())
                .field(&node.id())
                .finish(),
            Self::Window(window) => f.debug_tuple("Window").field(&window.window_id()).finish(),
            Self::MenuItem(item) => f.debug_tuple("MenuItem").field(&item.id()).finish(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod geometry {
        use super::*;

        #[test]
        fn test_center() {
            let bounds = BoundingBox::new(10.0, 20.0, 100.0, 40.0);
            assert_eq!(bounds.center(), Point::new(60.0, 40.0));
        }

        #[test]
        fn test_contains_edges() {
            let bounds = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
            assert!(bounds.contains(&Point::new(0.0, 0.0)));
            assert!(bounds.contains(&Point::new(10.0, 10.0)));
            assert!(!bounds.contains(&Point::new(10.1, 5.0)));
        }
    }

    mod modality {
        use super::*;

        #[test]
        fn test_only_none_is_non_blocking() {
            assert!(!Modality::None.is_blocking());
            assert!(Modality::WindowModal.is_blocking());
            assert!(Modality::ApplicationModal.is_blocking());
            assert_eq!(Modality::default(), Modality::None);
        }
    }
}
