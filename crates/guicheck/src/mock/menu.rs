//! Menus and popup menus for the mock toolkit.

use super::{lock, ActionFn};
use crate::platform::{MenuRef, UiMenuItem, UiPopupMenu};
use crate::property::{AccessError, Primitive, PropertyValue, Reflect, ValueType};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A menu, submenu or leaf menu item
pub struct MockMenuItem {
    id: String,
    text: Mutex<String>,
    submenu: bool,
    items: Vec<Arc<MockMenuItem>>,
    disabled: AtomicBool,
    visible: AtomicBool,
    showing: AtomicBool,
    fired: AtomicUsize,
    on_action: Mutex<Option<ActionFn>>,
}

impl fmt::Debug for MockMenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockMenuItem")
            .field("id", &self.id)
            .field("items", &self.items.len())
            .field("showing", &self.is_showing())
            .finish_non_exhaustive()
    }
}

impl MockMenuItem {
    fn build(id: &str, submenu: bool, items: Vec<Arc<Self>>) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            text: Mutex::new(id.to_string()),
            submenu,
            items,
            disabled: AtomicBool::new(false),
            visible: AtomicBool::new(true),
            showing: AtomicBool::new(false),
            fired: AtomicUsize::new(0),
            on_action: Mutex::new(None),
        })
    }

    /// A leaf item
    #[must_use]
    pub fn item(id: &str) -> Arc<Self> {
        Self::build(id, false, Vec::new())
    }

    /// A menu holding `items`
    #[must_use]
    pub fn menu(id: &str, items: Vec<Arc<Self>>) -> Arc<Self> {
        Self::build(id, true, items)
    }

    /// Set the display text (defaults to the id)
    #[must_use]
    pub fn with_text(self: Arc<Self>, text: &str) -> Arc<Self> {
        *lock(&self.text) = text.to_string();
        self
    }

    /// Set the disabled flag
    #[must_use]
    pub fn with_disabled(self: Arc<Self>, disabled: bool) -> Arc<Self> {
        self.set_disabled(disabled);
        self
    }

    /// Set the action run when the item fires
    #[must_use]
    pub fn with_on_action(self: Arc<Self>, action: impl Fn() + Send + Sync + 'static) -> Arc<Self> {
        *lock(&self.on_action) = Some(Arc::new(action));
        self
    }

    /// Enable or disable the item
    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.store(disabled, Ordering::Release);
    }

    /// How often the item has fired
    #[must_use]
    pub fn fired_count(&self) -> usize {
        self.fired.load(Ordering::Acquire)
    }

    /// Whether the menu is open
    #[must_use]
    pub fn is_showing(&self) -> bool {
        self.showing.load(Ordering::Acquire)
    }

    /// Child item with the given id
    #[must_use]
    pub fn child(&self, id: &str) -> Option<Arc<Self>> {
        self.items.iter().find(|item| item.id == id).cloned()
    }
}

impl UiMenuItem for MockMenuItem {
    fn id(&self) -> Option<String> {
        Some(self.id.clone())
    }

    fn is_submenu(&self) -> bool {
        self.submenu
    }

    fn items(&self) -> Vec<MenuRef> {
        self.items
            .iter()
            .map(|item| Arc::clone(item) as MenuRef)
            .collect()
    }

    fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    fn show(&self) {
        if self.submenu {
            self.showing.store(true, Ordering::Release);
        }
    }

    fn hide(&self) {
        self.showing.store(false, Ordering::Release);
        for item in &self.items {
            item.hide();
        }
    }

    fn fire(&self) {
        self.fired.fetch_add(1, Ordering::AcqRel);
        let action = lock(&self.on_action).clone();
        if let Some(action) = action {
            action();
        }
    }

    fn as_reflect(&self) -> &dyn Reflect {
        self
    }
}

const BOOLEAN: ValueType = ValueType::Primitive(Primitive::Boolean);

impl Reflect for MockMenuItem {
    fn type_name(&self) -> String {
        let name = if self.submenu { "Menu" } else { "MenuItem" };
        name.to_string()
    }

    fn call_getter(&self, accessor: &str) -> Result<PropertyValue, AccessError> {
        let flag = |b: &AtomicBool| PropertyValue::Bool(b.load(Ordering::Acquire));
        match accessor {
            "getId" => Ok(self.id.as_str().into()),
            "getText" => Ok(lock(&self.text).as_str().into()),
            "isDisable" => Ok(flag(&self.disabled)),
            "isVisible" => Ok(flag(&self.visible)),
            "isShowing" => Ok(flag(&self.showing)),
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
            ("setDisable", Some(p), PropertyValue::Bool(b)) if *p == BOOLEAN => {
                self.set_disabled(b);
                Ok(())
            }
            ("setVisible", Some(p), PropertyValue::Bool(b)) if *p == BOOLEAN => {
                self.visible.store(b, Ordering::Release);
                Ok(())
            }
            ("setText", Some(ValueType::String), PropertyValue::Str(text)) => {
                *lock(&self.text) = text;
                Ok(())
            }
            ("setText", None, PropertyValue::Null) => {
                lock(&self.text).clear();
                Ok(())
            }
            (accessor, ..) => Err(AccessError::no_such_method(accessor)),
        }
    }
}

/// A context menu
pub struct MockPopup {
    items: Vec<Arc<MockMenuItem>>,
    showing: AtomicBool,
}

impl fmt::Debug for MockPopup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockPopup")
            .field("items", &self.items)
            .field("showing", &self.is_showing())
            .finish()
    }
}

impl MockPopup {
    /// A popup holding `items`
    #[must_use]
    pub fn new(items: Vec<Arc<MockMenuItem>>) -> Arc<Self> {
        Arc::new(Self {
            items,
            showing: AtomicBool::new(false),
        })
    }

    /// Open the popup
    pub fn show(&self) {
        self.showing.store(true, Ordering::Release);
    }

    /// Whether the popup is open
    #[must_use]
    pub fn is_showing(&self) -> bool {
        self.showing.load(Ordering::Acquire)
    }
}

impl UiPopupMenu for MockPopup {
    fn items(&self) -> Vec<MenuRef> {
        self.items
            .iter()
            .map(|item| Arc::clone(item) as MenuRef)
            .collect()
    }

    fn hide(&self) {
        self.showing.store(false, Ordering::Release);
        for item in &self.items {
            item.hide();
        }
    }
}
