//! GUIcheck: retrying, idle-synchronised GUI test automation
//!
//! Test code runs on its own thread while the UI toolkit owns its scene on
//! an event-loop thread. GUIcheck moves every look-up, property read and
//! input action onto that thread, waits until the UI has settled, and
//! retries assertions against "not ready yet" states.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    GUICHECK Architecture                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Stage /    │    │ Evaluator  │    │ Dispatcher │            │
//! │   │ Node /     │───►│ (retry)    │───►│ + Idle     │───► Toolkit│
//! │   │ Robot      │    │            │    │ Waiter     │   (adapter)│
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │         │                 │                                      │
//! │         ▼                 ▼                                      │
//! │   ┌────────────┐    ┌────────────┐                               │
//! │   │ Locator /  │    │ Property   │                               │
//! │   │ Menu path  │    │ accessor   │                               │
//! │   └────────────┘    └────────────┘                               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use guicheck::mock::{MockNode, MockToolkit, MockWindow};
//! use guicheck::{Component, GuiCheck, GuiCheckConfig, GuiCheckResult};
//!
//! fn main() -> GuiCheckResult<()> {
//!     let toolkit = MockToolkit::start();
//!     let root = MockNode::new("VBox");
//!     root.add_child(MockNode::new("Label").with_id("status").with_text("ready"));
//!     toolkit.add_window(MockWindow::new("Main").with_root(root));
//!
//!     let gc = GuiCheck::new(toolkit.clone(), GuiCheckConfig::default());
//!     gc.stage("Main")?.node("#status")?.property_is("text", "ready")?;
//!     toolkit.shutdown();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

/// Retried evaluation and assertion helpers
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
pub mod assertion;

/// Run configuration (YAML file, environment overrides)
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
pub mod config;

/// Cross-thread dispatcher onto the event loop
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
pub mod dispatch;

/// Idle synchronisation
pub mod idle;

/// Input events
pub mod input;

/// Node look-up by selector, name or type
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::unnecessary_wraps,
    clippy::doc_markdown
)]
pub mod locator;

/// Tracing subscriber setup for test binaries
pub mod logging;

/// In-memory toolkit
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
pub mod mock;

/// Toolkit abstraction implemented by adapters
pub mod platform;

/// Bean-style property access
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
pub mod property;

#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
mod component;
mod context;
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::doc_markdown
)]
mod menu;
mod node;
mod result;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod robot;
mod stage;

pub use assertion::{ensure, ensure_eq, ensure_some, Evaluator, RetryPolicy};
pub use component::{Component, Handle};
pub use config::GuiCheckConfig;
pub use context::GuiCheck;
pub use dispatch::{Dispatch, Dispatcher};
pub use idle::{IdleConfig, IdleWaiter};
pub use input::{InputEvent, Key, MouseButton};
pub use locator::{matches, try_matches, Pattern, Selector};
pub use menu::{ContextMenu, MenuBar, MenuPath};
pub use node::Node;
pub use platform::{
    BoundingBox, EventLoop, InputDriver, MenuRef, Modality, NodeRef, Point, PopupRef, Target,
    Toolkit, UiMenuItem, UiNode, UiPopupMenu, UiTask, UiWindow, WindowRef,
};
pub use property::{AccessError, Primitive, PropertyValue, Reflect, ValueType};
pub use result::{ErrorKind, GuiCheckError, GuiCheckResult};
pub use robot::Robot;
pub use stage::Stage;

/// Prelude for test code
pub mod prelude {
    pub use crate::{
        Component, ContextMenu, GuiCheck, GuiCheckConfig, GuiCheckError, GuiCheckResult, Key,
        MenuBar, MouseButton, Node, PropertyValue, RetryPolicy, Robot, Selector, Stage,
    };
}
