//! Key Input
//!
//! A [`KeySource`] produces key presses for the backend. The crossterm
//! source also owns the terminal mode: raw input and the alternate screen
//! are entered on `enter` and restored on `leave`.

use std::collections::VecDeque;
use std::io::{self, Write};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};

use modalterm_core::error::BackendError;
use modalterm_core::keys::Key;

/// Where key presses come from
pub trait KeySource {
    /// Prepare the terminal for key-at-a-time input
    fn enter(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Undo [`KeySource::enter`]
    fn leave(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Block until the next key press
    fn next_key(&mut self) -> Result<Key, BackendError>;
}

/// Map a terminal key event; releases and repeats are ignored
pub fn map_key_event(event: KeyEvent) -> Option<Key> {
    if event.kind != KeyEventKind::Press {
        return None;
    }

    let key = match event.code {
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Enter => Key::Enter,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Esc => Key::Esc,
        KeyCode::F(n) => Key::F(n),
        // Raw mode delivers Ctrl-J/Ctrl-M as characters on some terminals
        KeyCode::Char('j' | 'm') if event.modifiers.contains(KeyModifiers::CONTROL) => Key::Enter,
        KeyCode::Char(_) if event.modifiers.contains(KeyModifiers::CONTROL) => Key::Other,
        KeyCode::Char(c) => Key::Char(c),
        _ => Key::Other,
    };
    Some(key)
}

/// Keys from the controlling terminal
#[derive(Debug, Default)]
pub struct CrosstermKeys {
    entered: bool,
}

impl CrosstermKeys {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeySource for CrosstermKeys {
    fn enter(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        self.entered = true;
        Ok(())
    }

    fn leave(&mut self) -> io::Result<()> {
        if !self.entered {
            return Ok(());
        }
        self.entered = false;
        let left = execute!(io::stdout(), LeaveAlternateScreen);
        let raw = disable_raw_mode();
        io::stdout().flush()?;
        left?;
        raw
    }

    fn next_key(&mut self) -> Result<Key, BackendError> {
        loop {
            // Resize, mouse and focus events are not keys
            if let Event::Key(key_event) = event::read()? {
                if let Some(key) = map_key_event(key_event) {
                    return Ok(key);
                }
            }
        }
    }
}

impl Drop for CrosstermKeys {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

/// Fixed key sequence; runs dry with [`BackendError::InputClosed`]
#[derive(Debug, Default)]
pub struct ScriptedKeys {
    keys: VecDeque<Key>,
}

impl ScriptedKeys {
    pub fn new(keys: impl IntoIterator<Item = Key>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.keys.len()
    }
}

impl KeySource for ScriptedKeys {
    fn next_key(&mut self) -> Result<Key, BackendError> {
        self.keys.pop_front().ok_or(BackendError::InputClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_navigation_keys() {
        assert_eq!(map_key_event(press(KeyCode::Down)), Some(Key::Down));
        assert_eq!(map_key_event(press(KeyCode::Enter)), Some(Key::Enter));
        assert_eq!(map_key_event(press(KeyCode::F(12))), Some(Key::F(12)));
        assert_eq!(map_key_event(press(KeyCode::Char('q'))), Some(Key::Char('q')));
        assert_eq!(map_key_event(press(KeyCode::Tab)), Some(Key::Other));
    }

    #[test]
    fn test_release_is_ignored() {
        let release = KeyEvent {
            code: KeyCode::Enter,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(map_key_event(release), None);
    }

    #[test]
    fn test_control_characters() {
        let ctrl_m = KeyEvent::new(KeyCode::Char('m'), KeyModifiers::CONTROL);
        assert_eq!(map_key_event(ctrl_m), Some(Key::Enter));
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key_event(ctrl_c), Some(Key::Other));
    }

    #[test]
    fn test_scripted_keys_run_dry() {
        let mut keys = ScriptedKeys::new([Key::Up]);
        assert_eq!(keys.next_key().unwrap(), Key::Up);
        assert!(matches!(keys.next_key(), Err(BackendError::InputClosed)));
    }
}
