//! Menu paths and the menu façades.
//!
//! A path such as `"file/recent/a.txt"` names one menu item per segment.
//! Segments are matched left to right against item ids: the first segment
//! against the top-level items, every further one against the children of
//! the submenu matched before it. A leaf item ends the path; any segment
//! after it cannot match. There is no backtracking.

use crate::component::{Component, Handle};
use crate::context::GuiCheck;
use crate::platform::{MenuRef, NodeRef, PopupRef, Target};
use crate::property::{check_property, PropertyValue};
use crate::result::{GuiCheckError, GuiCheckResult};
use std::fmt;
use tracing::debug;

/// A `/`-separated path of menu item ids
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MenuPath {
    full: String,
    segments: Vec<String>,
}

impl MenuPath {
    /// Split `path` on `/`
    #[must_use]
    pub fn parse(path: &str) -> Self {
        Self {
            full: path.to_string(),
            segments: path.split('/').map(str::to_string).collect(),
        }
    }

    /// The path as given
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.full
    }

    /// Item ids in order
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Resolve against `roots`, returning one item per segment.
    ///
    /// Must run on the event-loop thread.
    ///
    /// # Errors
    /// Assertion failure naming the whole path if a segment has no match
    pub fn resolve(&self, roots: &[MenuRef]) -> GuiCheckResult<Vec<MenuRef>> {
        self.walk(roots, |_| Ok(()))
    }

    /// Resolve like [`MenuPath::resolve`], opening every submenu before
    /// its children are searched and rejecting disabled items.
    ///
    /// Submenus opened here are closed again before returning, on success
    /// and on failure, so they cannot swallow the next input event.
    ///
    /// # Errors
    /// Assertion failure if a segment has no match or an item on the path
    /// is disabled
    pub fn open(&self, roots: &[MenuRef]) -> GuiCheckResult<Vec<MenuRef>> {
        let mut opened: Vec<MenuRef> = Vec::new();
        let result = self.walk(roots, |item| {
            if item.is_submenu() {
                item.show();
                opened.push(item.clone());
            }
            if item.is_disabled() {
                return Err(GuiCheckError::assertion(format!(
                    "Menu item is disabled: {}",
                    item.id().unwrap_or_default()
                )));
            }
            Ok(())
        });
        for menu in opened.iter().rev() {
            menu.hide();
        }
        result
    }

    fn walk(
        &self,
        roots: &[MenuRef],
        mut visit: impl FnMut(&MenuRef) -> GuiCheckResult<()>,
    ) -> GuiCheckResult<Vec<MenuRef>> {
        let mut scope = roots.to_vec();
        let mut path = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            let item = scope
                .iter()
                .find(|item| item.id().as_deref() == Some(segment.as_str()))
                .cloned()
                .ok_or_else(|| {
                    GuiCheckError::assertion(format!("Cannot find menu path: {}", self.full))
                })?;
            visit(&item)?;
            scope = if item.is_submenu() {
                item.items()
            } else {
                Vec::new()
            };
            path.push(item);
        }
        Ok(path)
    }
}

impl fmt::Display for MenuPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

impl From<&str> for MenuPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

/// Where the top-level items of a menu come from
#[derive(Clone)]
enum Source {
    Bar(Handle),
    Popup(PopupRef),
}

impl Source {
    fn roots(&self) -> GuiCheckResult<Vec<MenuRef>> {
        match self {
            Self::Bar(handle) => {
                let bar = handle.scene_root()?;
                bar.menus().ok_or_else(|| {
                    GuiCheckError::unsupported(format!("{} is not a menu bar", bar.type_name()))
                })
            }
            Self::Popup(popup) => Ok(popup.items()),
        }
    }

    fn close(&self) {
        if let Self::Popup(popup) = self {
            popup.hide();
        }
    }
}

/// Operations shared by menu bars and context menus
#[derive(Clone)]
struct Menus {
    context: GuiCheck,
    source: Source,
}

impl Menus {
    fn resolve(&self, path: &MenuPath) -> GuiCheckResult<Vec<MenuRef>> {
        self.context.evaluator().eval(|| {
            let source = self.source.clone();
            let path = path.clone();
            self.context
                .dispatcher()
                .invoke(move || path.resolve(&source.roots()?))
        })
    }

    fn path_exists(&self, path: &MenuPath) -> GuiCheckResult<()> {
        self.resolve(path).map(drop)
    }

    fn fire(&self, path: &MenuPath) -> GuiCheckResult<()> {
        let item = self.context.evaluator().eval(|| {
            let source = self.source.clone();
            let path = path.clone();
            self.context.dispatcher().invoke(move || {
                let item = path.open(&source.roots()?)?.pop().ok_or_else(|| {
                    GuiCheckError::assertion(format!("Cannot find menu path: {path}"))
                })?;
                source.close();
                Ok(item)
            })
        })?;
        // Activation may open a modal window; do not wait for it
        debug!(path = %path, "firing menu item");
        if !self.context.dispatcher().run_later(move || item.fire()) {
            return Err(GuiCheckError::event_loop(format!(
                "cannot fire menu item {path}"
            )));
        }
        Ok(())
    }

    fn path_property_is(
        &self,
        path: &MenuPath,
        property: &str,
        expected: &PropertyValue,
    ) -> GuiCheckResult<()> {
        let mut resolved = self.resolve(path)?;
        let item = resolved
            .pop()
            .ok_or_else(|| GuiCheckError::assertion(format!("Cannot find menu path: {path}")))?;
        let target = Target::MenuItem(item);
        let result = self.context.evaluator().eval(|| {
            let target = target.clone();
            let property = property.to_string();
            let expected = expected.clone();
            self.context
                .dispatcher()
                .invoke(move || check_property(target.reflect(), &property, &expected, true))
        });
        if let Source::Popup(popup) = &self.source {
            let popup = popup.clone();
            self.context.dispatcher().run_and_wait(move || popup.hide());
        }
        result
    }
}

/// A menu bar found in a scene
#[derive(Clone)]
pub struct MenuBar {
    menus: Menus,
    handle: Handle,
}

impl fmt::Debug for MenuBar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuBar")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl MenuBar {
    pub(crate) fn new(context: GuiCheck, node: &NodeRef, description: String) -> Self {
        let handle = Handle::for_node(node, description);
        Self {
            menus: Menus {
                context,
                source: Source::Bar(handle.clone()),
            },
            handle,
        }
    }

    /// Check that `path` exists, with retry
    ///
    /// # Errors
    /// Assertion failure naming the path after the last attempt
    pub fn menu_path_exists(&self, path: impl Into<MenuPath>) -> GuiCheckResult<&Self> {
        self.menus.path_exists(&path.into())?;
        Ok(self)
    }

    /// Open the menus along `path` and fire its last item.
    ///
    /// The item is fired asynchronously after the menus are closed again.
    ///
    /// # Errors
    /// Assertion failure if the path does not exist or an item on it is
    /// disabled
    pub fn fire_menu_item(&self, path: impl Into<MenuPath>) -> GuiCheckResult<&Self> {
        self.menus.fire(&path.into())?;
        Ok(self)
    }

    /// Check a property of the last item of `path`
    ///
    /// # Errors
    /// Assertion failure if the path does not exist or the value differs;
    /// hard failure if the property cannot be read
    pub fn menu_path_property_is(
        &self,
        path: impl Into<MenuPath>,
        property: &str,
        expected: impl Into<PropertyValue>,
    ) -> GuiCheckResult<&Self> {
        self.menus
            .path_property_is(&path.into(), property, &expected.into())?;
        Ok(self)
    }
}

impl Component for MenuBar {
    fn context(&self) -> &GuiCheck {
        &self.menus.context
    }

    fn handle(&self) -> &Handle {
        &self.handle
    }
}

/// An open context menu
#[derive(Clone)]
pub struct ContextMenu {
    menus: Menus,
}

impl fmt::Debug for ContextMenu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextMenu").finish_non_exhaustive()
    }
}

impl ContextMenu {
    pub(crate) fn new(context: GuiCheck, popup: PopupRef) -> Self {
        Self {
            menus: Menus {
                context,
                source: Source::Popup(popup),
            },
        }
    }

    /// Check that `path` exists, with retry
    ///
    /// # Errors
    /// Assertion failure naming the path after the last attempt
    pub fn menu_path_exists(&self, path: impl Into<MenuPath>) -> GuiCheckResult<&Self> {
        self.menus.path_exists(&path.into())?;
        Ok(self)
    }

    /// Open the menus along `path`, close the context menu and fire the
    /// path's last item
    ///
    /// # Errors
    /// Assertion failure if the path does not exist or an item on it is
    /// disabled
    pub fn fire_menu_item(&self, path: impl Into<MenuPath>) -> GuiCheckResult<&Self> {
        self.menus.fire(&path.into())?;
        Ok(self)
    }

    /// Check a property of the last item of `path`, then close the context
    /// menu
    ///
    /// # Errors
    /// Assertion failure if the path does not exist or the value differs;
    /// hard failure if the property cannot be read
    pub fn menu_path_property_is(
        &self,
        path: impl Into<MenuPath>,
        property: &str,
        expected: impl Into<PropertyValue>,
    ) -> GuiCheckResult<&Self> {
        self.menus
            .path_property_is(&path.into(), property, &expected.into())?;
        Ok(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::MockMenuItem;
    use std::sync::Arc;

    /// ```text
    /// file
    /// ├── open
    /// ├── recent
    /// │   └── a.txt
    /// └── close
    /// edit (disabled)
    /// └── undo
    /// ```
    fn menus() -> (Vec<Arc<MockMenuItem>>, Vec<MenuRef>) {
        let items = vec![
            MockMenuItem::menu(
                "file",
                vec![
                    MockMenuItem::item("open"),
                    MockMenuItem::menu("recent", vec![MockMenuItem::item("a.txt")]),
                    MockMenuItem::item("close"),
                ],
            ),
            MockMenuItem::menu("edit", vec![MockMenuItem::item("undo")]).with_disabled(true),
        ];
        let roots = items.iter().map(|i| Arc::clone(i) as MenuRef).collect();
        (items, roots)
    }

    fn ids(path: &[MenuRef]) -> Vec<String> {
        path.iter().filter_map(|item| item.id()).collect()
    }

    mod resolve {
        use super::*;

        #[test]
        fn test_resolves_one_item_per_segment() {
            let (_items, roots) = menus();
            let path = MenuPath::parse("file/close").resolve(&roots).unwrap();
            assert_eq!(ids(&path), vec!["file", "close"]);
            let path = MenuPath::parse("file/recent/a.txt").resolve(&roots).unwrap();
            assert_eq!(ids(&path), vec!["file", "recent", "a.txt"]);
        }

        #[test]
        fn test_failure_names_whole_path() {
            let (_items, roots) = menus();
            let err = MenuPath::parse("file/missing").resolve(&roots).err().unwrap();
            assert!(err.is_retryable());
            assert_eq!(err.to_string(), "Cannot find menu path: file/missing");
        }

        #[test]
        fn test_leaf_ends_the_path() {
            let (_items, roots) = menus();
            assert!(MenuPath::parse("file/open/x").resolve(&roots).is_err());
        }

        #[test]
        fn test_segments_are_scoped_to_parent() {
            let (_items, roots) = menus();
            assert!(MenuPath::parse("close").resolve(&roots).is_err());
            assert!(MenuPath::parse("file/a.txt").resolve(&roots).is_err());
        }

        #[test]
        fn test_resolve_ignores_disabled_state() {
            let (_items, roots) = menus();
            assert!(MenuPath::parse("edit/undo").resolve(&roots).is_ok());
        }
    }

    mod open {
        use super::*;

        #[test]
        fn test_opens_and_closes_submenus() {
            let (items, roots) = menus();
            let path = MenuPath::parse("file/recent/a.txt").open(&roots).unwrap();
            assert_eq!(path.len(), 3);
            let file = &items[0];
            assert!(!file.is_showing());
            assert!(!file.child("recent").unwrap().is_showing());
        }

        #[test]
        fn test_disabled_item_is_named() {
            let (items, roots) = menus();
            let err = MenuPath::parse("edit/undo").open(&roots).err().unwrap();
            assert!(err.is_retryable());
            assert_eq!(err.to_string(), "Menu item is disabled: edit");
            assert!(!items[1].is_showing());
        }

        #[test]
        fn test_disabled_leaf_is_rejected() {
            let (items, roots) = menus();
            items[0].child("close").unwrap().set_disabled(true);
            let err = MenuPath::parse("file/close").open(&roots).err().unwrap();
            assert_eq!(err.to_string(), "Menu item is disabled: close");
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_parse_keeps_every_segment(segments in proptest::collection::vec("[a-z.]{1,6}", 1..5)) {
                let joined = segments.join("/");
                let path = MenuPath::parse(&joined);
                prop_assert_eq!(path.segments(), segments.as_slice());
                prop_assert_eq!(path.to_string(), joined);
            }
        }
    }
}
