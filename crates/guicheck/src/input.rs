//! Input event types injected by the [`Robot`](crate::Robot).

use serde::{Deserialize, Serialize};

/// Key codes understood by input drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// A letter or digit key, stored upper-case
    Char(char),
    /// Space bar
    Space,
    /// Enter / Return
    Enter,
    /// Tab
    Tab,
    /// Backspace
    Backspace,
    /// Delete
    Delete,
    /// Escape
    Escape,
    /// Shift modifier
    Shift,
    /// Control modifier
    Control,
    /// Alt modifier
    Alt,
    /// Arrow up
    Up,
    /// Arrow down
    Down,
    /// Arrow left
    Left,
    /// Arrow right
    Right,
    /// No key code; the typed text carries the character
    Undefined,
}

impl Key {
    /// Key code for a typed character.
    ///
    /// Letters map to their key regardless of case; characters without a
    /// key of their own map to [`Key::Undefined`].
    #[must_use]
    pub fn for_char(c: char) -> Self {
        match c {
            ' ' => Self::Space,
            '\n' | '\r' => Self::Enter,
            '\t' => Self::Tab,
            c if c.is_ascii_alphanumeric() => Self::Char(c.to_ascii_uppercase()),
            _ => Self::Undefined,
        }
    }
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MouseButton {
    /// Left button
    #[default]
    Primary,
    /// Right button, opens context menus
    Secondary,
}

/// Input event types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Key press event
    KeyPress {
        /// Key code
        key: Key,
    },
    /// Key release event
    KeyRelease {
        /// Key code
        key: Key,
    },
    /// Key typed (press, character input, release)
    KeyType {
        /// Key code
        key: Key,
        /// Character(s) produced
        text: String,
    },
    /// Mouse move event, scene coordinates
    MouseMove {
        /// X coordinate
        x: f32,
        /// Y coordinate
        y: f32,
    },
    /// Mouse button press
    MousePress {
        /// Button
        button: MouseButton,
        /// Click count (2 for the second press of a double click)
        clicks: u32,
    },
    /// Mouse button release
    MouseRelease {
        /// Button
        button: MouseButton,
        /// Click count
        clicks: u32,
    },
    /// Mouse click at the current pointer position
    MouseClick {
        /// Button
        button: MouseButton,
        /// Click count
        clicks: u32,
    },
    /// Drag with a button held at the current pointer position
    MouseDrag {
        /// Button
        button: MouseButton,
    },
    /// Wheel rotation
    MouseWheel {
        /// Notches, negative is up
        amount: i32,
    },
}

impl InputEvent {
    /// Create a key press event
    #[must_use]
    pub const fn key_press(key: Key) -> Self {
        Self::KeyPress { key }
    }

    /// Create a key release event
    #[must_use]
    pub const fn key_release(key: Key) -> Self {
        Self::KeyRelease { key }
    }

    /// Create a key typed event for one character
    #[must_use]
    pub fn key_type(c: char) -> Self {
        Self::KeyType {
            key: Key::for_char(c),
            text: c.to_string(),
        }
    }

    /// Create a mouse move event
    #[must_use]
    pub const fn mouse_move(x: f32, y: f32) -> Self {
        Self::MouseMove { x, y }
    }

    /// Create a mouse click event
    #[must_use]
    pub const fn mouse_click(button: MouseButton, clicks: u32) -> Self {
        Self::MouseClick { button, clicks }
    }

    /// Whether the event comes from the keyboard
    #[must_use]
    pub const fn is_keyboard(&self) -> bool {
        matches!(
            self,
            Self::KeyPress { .. } | Self::KeyRelease { .. } | Self::KeyType { .. }
        )
    }
}
