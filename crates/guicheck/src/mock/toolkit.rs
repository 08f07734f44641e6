//! The mock toolkit itself: event loop, windows and open popups.

use super::{lock, MockEventLoop, MockPopup, MockWindow};
use crate::platform::{EventLoop, PopupRef, Toolkit, WindowRef};
use std::sync::{Arc, Mutex};

/// In-memory [`Toolkit`]
#[derive(Debug)]
pub struct MockToolkit {
    event_loop: Arc<MockEventLoop>,
    windows: Mutex<Vec<Arc<MockWindow>>>,
    popups: Mutex<Vec<Arc<MockPopup>>>,
}

impl MockToolkit {
    /// Start a toolkit with a running event loop and no windows
    #[must_use]
    pub fn start() -> Arc<Self> {
        Arc::new(Self {
            event_loop: MockEventLoop::start(),
            windows: Mutex::new(Vec::new()),
            popups: Mutex::new(Vec::new()),
        })
    }

    /// The event loop
    #[must_use]
    pub const fn mock_event_loop(&self) -> &Arc<MockEventLoop> {
        &self.event_loop
    }

    /// Register `window` and return it
    pub fn add_window(self: &Arc<Self>, window: Arc<MockWindow>) -> Arc<MockWindow> {
        window.attach(self);
        lock(&self.windows).push(Arc::clone(&window));
        window
    }

    /// Open `popup`
    pub fn show_popup(&self, popup: Arc<MockPopup>) {
        popup.show();
        let mut popups = lock(&self.popups);
        if !popups.iter().any(|p| Arc::ptr_eq(p, &popup)) {
            popups.push(popup);
        }
    }

    /// Hide every window
    pub fn close_all(&self) {
        for window in lock(&self.windows).iter() {
            window.hide();
        }
    }

    /// Stop the event loop
    pub fn shutdown(&self) {
        self.event_loop.stop();
    }
}

impl Toolkit for MockToolkit {
    fn event_loop(&self) -> Arc<dyn EventLoop> {
        Arc::clone(&self.event_loop) as Arc<dyn EventLoop>
    }

    /// Windows in creation order
    fn windows(&self) -> Vec<WindowRef> {
        lock(&self.windows)
            .iter()
            .map(|w| Arc::clone(w) as WindowRef)
            .collect()
    }

    fn popup_menus(&self) -> Vec<PopupRef> {
        lock(&self.popups)
            .iter()
            .filter(|p| p.is_showing())
            .map(|p| Arc::clone(p) as PopupRef)
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::input::InputEvent;
    use crate::mock::MockNode;
    use crate::platform::{UiNode, UiPopupMenu, UiWindow};
    use std::time::{Duration, Instant};

    #[test]
    fn test_lists_windows_in_creation_order() {
        let toolkit = MockToolkit::start();
        let main = toolkit.add_window(MockWindow::new("Main"));
        toolkit.add_window(MockWindow::new("Dialog"));
        let titles: Vec<_> = toolkit.windows().iter().filter_map(|w| w.title()).collect();
        assert_eq!(titles, vec!["Main", "Dialog"]);
        main.hide();
        assert_eq!(toolkit.windows().iter().filter(|w| w.is_showing()).count(), 1);
        toolkit.close_all();
        assert!(toolkit.windows().iter().all(|w| !w.is_showing()));
        toolkit.shutdown();
    }

    #[test]
    fn test_popups_listed_while_showing() {
        let toolkit = MockToolkit::start();
        let popup = MockPopup::new(Vec::new());
        toolkit.show_popup(Arc::clone(&popup));
        toolkit.show_popup(Arc::clone(&popup));
        assert_eq!(toolkit.popup_menus().len(), 1);
        popup.hide();
        assert!(toolkit.popup_menus().is_empty());
        toolkit.shutdown();
    }

    #[test]
    fn test_input_applied_on_event_loop() {
        let toolkit = MockToolkit::start();
        let root = MockNode::new("VBox");
        let field = root.add_child(MockNode::new("TextField").with_text(""));
        field.request_focus();
        let window = toolkit.add_window(MockWindow::new("Main").with_root(root));
        window.input().dispatch(InputEvent::key_type('q'));

        let deadline = Instant::now() + Duration::from_secs(2);
        while field.text().as_deref() != Some("q") && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(field.text().as_deref(), Some("q"));
        assert!(toolkit.mock_event_loop().tasks_run() >= 1);
        toolkit.shutdown();
        assert!(!toolkit.event_loop().is_alive());
    }
}
