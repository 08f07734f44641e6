//! Windows and input handling for the mock toolkit.

use super::{lock, MockNode, MockToolkit};
use crate::input::{InputEvent, Key, MouseButton};
use crate::platform::{EventLoop, InputDriver, Modality, NodeRef, Point, UiWindow};
use crate::property::{AccessError, PropertyValue, Reflect, ValueType};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tracing::{debug, trace};

static NEXT_WINDOW_ID: AtomicU64 = AtomicU64::new(1);

/// A top-level window.
///
/// Windows are showing from creation until [`UiWindow::close`] or
/// [`MockWindow::hide`]. Injected input is recorded in [`MockWindow::events`]
/// and applied to the scene on the toolkit's event loop.
pub struct MockWindow {
    this: Weak<MockWindow>,
    id: u64,
    title: Mutex<Option<String>>,
    showing: AtomicBool,
    modality: Mutex<Modality>,
    owner: Mutex<Option<u64>>,
    root: Mutex<Option<Arc<MockNode>>>,
    events: Mutex<Vec<InputEvent>>,
    pointer: Mutex<Point>,
    toolkit: Mutex<Weak<MockToolkit>>,
}

impl fmt::Debug for MockWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockWindow")
            .field("id", &self.id)
            .field("title", &*lock(&self.title))
            .field("showing", &self.is_showing())
            .field("modality", &self.modality())
            .finish_non_exhaustive()
    }
}

impl MockWindow {
    fn build(title: Option<String>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            id: NEXT_WINDOW_ID.fetch_add(1, Ordering::Relaxed),
            title: Mutex::new(title),
            showing: AtomicBool::new(true),
            modality: Mutex::new(Modality::None),
            owner: Mutex::new(None),
            root: Mutex::new(None),
            events: Mutex::new(Vec::new()),
            pointer: Mutex::new(Point::default()),
            toolkit: Mutex::new(Weak::new()),
        })
    }

    /// A titled window
    #[must_use]
    pub fn new(title: &str) -> Arc<Self> {
        Self::build(Some(title.to_string()))
    }

    /// A window without a title
    #[must_use]
    pub fn untitled() -> Arc<Self> {
        Self::build(None)
    }

    /// Set the scene root
    #[must_use]
    pub fn with_root(self: Arc<Self>, root: Arc<MockNode>) -> Arc<Self> {
        *lock(&self.root) = Some(root);
        self
    }

    /// Set the modality
    #[must_use]
    pub fn with_modality(self: Arc<Self>, modality: Modality) -> Arc<Self> {
        *lock(&self.modality) = modality;
        self
    }

    /// Make `owner` the owner window
    #[must_use]
    pub fn with_owner(self: Arc<Self>, owner: &Arc<Self>) -> Arc<Self> {
        *lock(&self.owner) = Some(owner.id);
        self
    }

    /// Show the window again
    pub fn show(&self) {
        self.showing.store(true, Ordering::Release);
    }

    /// Hide the window
    pub fn hide(&self) {
        self.showing.store(false, Ordering::Release);
    }

    /// Change the title
    pub fn set_title(&self, title: &str) {
        *lock(&self.title) = Some(title.to_string());
    }

    /// Scene root node
    #[must_use]
    pub fn root_node(&self) -> Option<Arc<MockNode>> {
        lock(&self.root).clone()
    }

    /// Every input event dispatched so far, in order
    #[must_use]
    pub fn events(&self) -> Vec<InputEvent> {
        lock(&self.events).clone()
    }

    /// Last pointer position in scene coordinates
    #[must_use]
    pub fn pointer(&self) -> Point {
        *lock(&self.pointer)
    }

    pub(super) fn attach(&self, toolkit: &Arc<MockToolkit>) {
        *lock(&self.toolkit) = Arc::downgrade(toolkit);
    }

    fn focused_node(&self) -> Option<Arc<MockNode>> {
        self.root_node().and_then(|root| root.focus_owner())
    }

    fn node_under_pointer(&self) -> Option<Arc<MockNode>> {
        let pointer = self.pointer();
        self.root_node().and_then(|root| root.hit_test(pointer))
    }

    /// Apply an input event to the scene
    fn apply(&self, event: &InputEvent) {
        trace!(window = self.id, ?event, "applying input");
        match event {
            InputEvent::MouseMove { x, y } => *lock(&self.pointer) = Point::new(*x, *y),
            InputEvent::KeyType { text, .. } => {
                if let Some(node) = self.focused_node().filter(|n| !n.is_disabled()) {
                    if let Some(current) = node.text() {
                        node.put("text", PropertyValue::Str(current + text));
                    }
                }
            }
            InputEvent::KeyPress { key: Key::Backspace } => {
                if let Some(node) = self.focused_node().filter(|n| !n.is_disabled()) {
                    if let Some(mut current) = node.text() {
                        current.pop();
                        node.put("text", PropertyValue::Str(current));
                    }
                }
            }
            InputEvent::KeyPress { key: Key::Enter } => {
                if let Some(node) = self.focused_node().filter(|n| !n.is_disabled()) {
                    node.fire();
                }
            }
            InputEvent::MouseClick {
                button: MouseButton::Primary,
                clicks: 1,
            } => {
                if let Some(node) = self.node_under_pointer().filter(|n| !n.is_disabled()) {
                    node.focus();
                    node.fire();
                }
            }
            InputEvent::MouseClick {
                button: MouseButton::Secondary,
                ..
            } => self.open_context_menu(),
            _ => {}
        }
    }

    fn open_context_menu(&self) {
        // The nearest node under the pointer that has a context menu
        let mut current = self.node_under_pointer();
        while let Some(node) = current {
            if let Some(popup) = node.context_menu() {
                match lock(&self.toolkit).upgrade() {
                    Some(toolkit) => toolkit.show_popup(popup),
                    None => popup.show(),
                }
                return;
            }
            current = node.parent_node();
        }
    }
}

impl UiWindow for MockWindow {
    fn window_id(&self) -> u64 {
        self.id
    }

    fn title(&self) -> Option<String> {
        lock(&self.title).clone()
    }

    fn is_showing(&self) -> bool {
        self.showing.load(Ordering::Acquire)
    }

    fn modality(&self) -> Modality {
        *lock(&self.modality)
    }

    fn owner_id(&self) -> Option<u64> {
        *lock(&self.owner)
    }

    fn root(&self) -> Option<NodeRef> {
        self.root_node().map(|root| root as NodeRef)
    }

    fn close(&self) {
        self.hide();
    }

    fn input(&self) -> Arc<dyn InputDriver> {
        Arc::new(MockInput {
            window: self.this.clone(),
        })
    }

    fn as_reflect(&self) -> &dyn Reflect {
        self
    }
}

impl Reflect for MockWindow {
    fn type_name(&self) -> String {
        "Stage".to_string()
    }

    fn call_getter(&self, accessor: &str) -> Result<PropertyValue, AccessError> {
        match accessor {
            "getTitle" => Ok(self.title().into()),
            "isShowing" => Ok(self.is_showing().into()),
            _ => Err(AccessError::no_such_method(accessor)),
        }
    }

    fn call_setter(
        &self,
        accessor: &str,
        parameter: Option<&ValueType>,
        value: PropertyValue,
    ) -> Result<(), AccessError> {
        match (accessor, parameter, value) {
            ("setTitle", Some(ValueType::String), PropertyValue::Str(title)) => {
                self.set_title(&title);
                Ok(())
            }
            ("setTitle", None, PropertyValue::Null) => {
                *lock(&self.title) = None;
                Ok(())
            }
            (accessor, ..) => Err(AccessError::no_such_method(accessor)),
        }
    }
}

/// Input driver of a [`MockWindow`]
#[derive(Debug)]
pub struct MockInput {
    window: Weak<MockWindow>,
}

impl InputDriver for MockInput {
    fn dispatch(&self, event: InputEvent) {
        let Some(window) = self.window.upgrade() else {
            debug!(?event, "input for a dropped window");
            return;
        };
        lock(&window.events).push(event.clone());
        let toolkit = lock(&window.toolkit).upgrade();
        match toolkit {
            Some(toolkit) => {
                let target = Arc::clone(&window);
                let posted = toolkit
                    .mock_event_loop()
                    .post(Box::new(move || target.apply(&event)));
                if !posted {
                    debug!(window = window.id, "input dropped, event loop stopped");
                }
            }
            None => window.apply(&event),
        }
    }
}
