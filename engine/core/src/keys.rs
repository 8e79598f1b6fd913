//! Key Codes and Bindings
//!
//! Backends decode raw terminal input into [`Key`]; widgets interpret keys
//! through [`KeyBindings`]. Some physical keys carry more than one meaning:
//! Backspace cancels a menu or viewer but deletes the previous character in
//! a text field, and Delete also deletes the previous character.

use serde::{Deserialize, Serialize};

/// A decoded key press
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    /// Newline / Return (confirm)
    Enter,
    Backspace,
    /// Delete-at-cursor key
    Delete,
    Esc,
    /// Function key F1-F12
    F(u8),
    /// Printable character
    Char(char),
    /// Anything the backend could not map
    Other,
}

impl Key {
    /// Printable character carried by this key, if any
    pub fn printable(self) -> Option<char> {
        match self {
            Key::Char(c) if !c.is_control() => Some(c),
            _ => None,
        }
    }
}

/// Key bindings shared by every widget
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBindings {
    /// Function key number that cancels menus and closes viewers
    pub cancel_function_key: u8,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            cancel_function_key: 3,
        }
    }
}

impl KeyBindings {
    pub fn with_cancel_function_key(mut self, n: u8) -> Self {
        self.cancel_function_key = n;
        self
    }

    pub fn is_confirm(&self, key: Key) -> bool {
        key == Key::Enter
    }

    /// Primary (function key) or secondary (Backspace) cancel
    pub fn is_cancel(&self, key: Key) -> bool {
        match key {
            Key::F(n) => n == self.cancel_function_key,
            Key::Backspace => true,
            _ => false,
        }
    }

    /// Both Backspace and Delete remove the character before the cursor
    pub fn is_delete_previous(&self, key: Key) -> bool {
        matches!(key, Key::Backspace | Key::Delete)
    }

    /// Hint shown on widget frames, e.g. `F3 = Exit`
    pub fn cancel_hint(&self) -> String {
        format!("F{} = Exit", self.cancel_function_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_keys_are_equivalent() {
        let keys = KeyBindings::default();
        assert!(keys.is_cancel(Key::F(3)));
        assert!(keys.is_cancel(Key::Backspace));
        assert!(!keys.is_cancel(Key::F(4)));
        assert!(!keys.is_cancel(Key::Esc));
    }

    #[test]
    fn test_custom_cancel_function_key() {
        let keys = KeyBindings::default().with_cancel_function_key(10);
        assert!(keys.is_cancel(Key::F(10)));
        assert!(!keys.is_cancel(Key::F(3)));
        assert_eq!(keys.cancel_hint(), "F10 = Exit");
    }

    #[test]
    fn test_delete_previous_has_two_codes() {
        let keys = KeyBindings::default();
        assert!(keys.is_delete_previous(Key::Backspace));
        assert!(keys.is_delete_previous(Key::Delete));
        assert!(!keys.is_delete_previous(Key::Left));
    }

    #[test]
    fn test_printable() {
        assert_eq!(Key::Char('a').printable(), Some('a'));
        assert_eq!(Key::Char('\u{7}').printable(), None);
        assert_eq!(Key::Enter.printable(), None);
    }
}
