//! Menu Widget
//!
//! Selection over an ordered, caller-owned option list. A [`Menu`] is a plain
//! value the caller constructs and keeps; there is no registry of menus.
//!
//! # State Machine
//!
//! ```text
//!            Down: min(i+1, n-1)
//!            Up:   max(i-1, 0)
//!          ┌──────────────┐
//!          ▼              │
//!   ┌────────────────┐────┘
//!   │ awaiting input │── Enter ──────────► Selected(i)
//!   └────────────────┘── F<n>/Backspace ─► Cancelled
//! ```
//!
//! There is no wrap-around at either end of the list.
//!
//! # Layout
//!
//! The frame is `options + 5` rows by `width(first option) + 10` columns.
//! Only the FIRST option sizes the window; callers pad options themselves
//! when they need a uniform width.

use tracing::debug;
use unicode_width::UnicodeWidthStr;

use crate::backend::{BorderStyle, TerminalBackend};
use crate::chrome::{center_title, pad_to};
use crate::error::WidgetError;
use crate::geometry::{centered, to_cells, Point, Rect, Size};
use crate::keys::{Key, KeyBindings};
use crate::theme::{Attr, DIALOG};
use crate::window::{Window, WindowManager};

/// Rows of frame chrome around the option rows
pub const MENU_CHROME_ROWS: u16 = 5;

/// Columns added to the first option's width
pub const MENU_PADDING_COLS: u16 = 10;

/// Marker drawn before the highlighted option
pub const SELECTION_MARK: &str = "> ";

/// Result of a menu invocation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuOutcome {
    /// Index of the option highlighted on confirm
    Selected(usize),
    /// The user pressed a cancel key
    Cancelled,
}

impl MenuOutcome {
    pub fn selected(self) -> Option<usize> {
        match self {
            MenuOutcome::Selected(i) => Some(i),
            MenuOutcome::Cancelled => None,
        }
    }
}

/// Driver actions decoded from keys
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    Next,
    Previous,
    Confirm,
    Cancel,
}

impl MenuAction {
    pub fn from_key(key: Key, bindings: &KeyBindings) -> Option<Self> {
        if bindings.is_confirm(key) {
            Some(Self::Confirm)
        } else if bindings.is_cancel(key) {
            Some(Self::Cancel)
        } else {
            match key {
                Key::Down => Some(Self::Next),
                Key::Up => Some(Self::Previous),
                _ => None,
            }
        }
    }
}

/// Highlighted index over a list of `len` options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MenuState {
    index: usize,
    len: usize,
}

impl MenuState {
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns whether the selection moved
    pub fn select_next(&mut self) -> bool {
        if self.index + 1 < self.len {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Returns whether the selection moved
    pub fn select_previous(&mut self) -> bool {
        if self.index > 0 {
            self.index -= 1;
            true
        } else {
            false
        }
    }

    /// Apply an action; `Some` once the menu reaches a terminal state
    pub fn apply(&mut self, action: MenuAction) -> Option<MenuOutcome> {
        match action {
            MenuAction::Next => {
                self.select_next();
                None
            }
            MenuAction::Previous => {
                self.select_previous();
                None
            }
            MenuAction::Confirm if self.is_empty() => Some(MenuOutcome::Cancelled),
            MenuAction::Confirm => Some(MenuOutcome::Selected(self.index)),
            MenuAction::Cancel => Some(MenuOutcome::Cancelled),
        }
    }
}

/// Window geometry for a menu
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MenuLayout {
    /// Frame window, absolute
    pub frame: Rect,
    /// Option sub-window, relative to the frame
    pub content: Rect,
    /// Frame row carrying the exit hint
    pub hint_row: u16,
}

/// A menu over borrowed options
#[derive(Debug)]
pub struct Menu<'a, S> {
    options: &'a [S],
    title: String,
}

impl<'a, S: AsRef<str>> Menu<'a, S> {
    pub fn new(options: &'a [S]) -> Self {
        Self {
            options,
            title: String::new(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn options(&self) -> &'a [S] {
        self.options
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn layout(&self, screen: Size) -> MenuLayout {
        let item_rows = to_cells(self.len());
        let first_width = self
            .options
            .first()
            .map_or(0, |o| to_cells(o.as_ref().width()));

        let rows = item_rows.saturating_add(MENU_CHROME_ROWS);
        let cols = first_width.saturating_add(MENU_PADDING_COLS);
        let frame = Rect::from_coords(
            (screen.rows / 3).saturating_sub(4),
            centered(screen.cols, cols),
            rows,
            cols,
        );
        let content = Rect::from_coords(2, 2, item_rows.max(1), cols - 4);

        MenuLayout {
            frame,
            content,
            hint_row: rows - 2,
        }
    }

    /// Post the menu, drive it until confirm or cancel, then unpost it
    ///
    /// # Errors
    ///
    /// Returns backend failures. Windows are destroyed on every path.
    pub fn run<B: TerminalBackend>(
        &self,
        wm: &mut WindowManager<B>,
        bindings: &KeyBindings,
    ) -> Result<MenuOutcome, WidgetError> {
        let layout = self.layout(wm.screen_size());

        let frame = wm.create(layout.frame, Some(BorderStyle::Ascii))?;
        let content = match wm.create_sub(&frame, layout.content) {
            Ok(content) => content,
            Err(e) => {
                let _ = wm.dismiss(vec![frame]);
                return Err(e);
            }
        };
        debug!(options = self.len(), title = %self.title, "menu posted");

        let outcome = self.drive(wm, &frame, &content, &layout, bindings);
        let unposted = wm.dismiss(vec![frame, content]);

        let outcome = outcome?;
        unposted?;
        debug!(?outcome, "menu unposted");
        Ok(outcome)
    }

    fn drive<B: TerminalBackend>(
        &self,
        wm: &mut WindowManager<B>,
        frame: &Window,
        content: &Window,
        layout: &MenuLayout,
        bindings: &KeyBindings,
    ) -> Result<MenuOutcome, WidgetError> {
        let mut state = MenuState::new(self.len());

        self.draw_frame(wm, frame, layout, bindings)?;
        self.draw_items(wm, content, &state)?;
        wm.refresh(frame)?;
        wm.refresh(content)?;

        loop {
            let key = wm.read_key()?;
            let Some(action) = MenuAction::from_key(key, bindings) else {
                continue;
            };
            if let Some(outcome) = state.apply(action) {
                return Ok(outcome);
            }
            self.draw_items(wm, content, &state)?;
            wm.refresh(content)?;
        }
    }

    fn draw_frame<B: TerminalBackend>(
        &self,
        wm: &mut WindowManager<B>,
        frame: &Window,
        layout: &MenuLayout,
        bindings: &KeyBindings,
    ) -> Result<(), WidgetError> {
        let attr = Attr::pair(DIALOG).bold();
        wm.set_background(frame, attr)?;
        wm.clear(frame)?;
        wm.border(frame, BorderStyle::Ascii)?;
        if !self.title.is_empty() {
            center_title(wm, frame, &self.title, attr)?;
        }
        wm.write(
            frame,
            Point::new(layout.hint_row, 2),
            &bindings.cancel_hint(),
            attr,
        )
    }

    fn draw_items<B: TerminalBackend>(
        &self,
        wm: &mut WindowManager<B>,
        content: &Window,
        state: &MenuState,
    ) -> Result<(), WidgetError> {
        wm.set_background(content, Attr::pair(DIALOG))?;
        let width = content.size().cols;
        for (i, option) in self.options.iter().enumerate() {
            let (mark, attr) = if i == state.index() {
                (SELECTION_MARK, Attr::pair(DIALOG).reverse())
            } else {
                ("  ", Attr::pair(DIALOG).bold())
            };
            let line = pad_to(&format!("{mark}{}", option.as_ref()), width);
            wm.write(content, Point::new(to_cells(i), 0), &line, attr)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedBackend;
    use pretty_assertions::assert_eq;

    const OPTIONS: [&str; 3] = ["Add", "Delete", "Exit"];

    fn manager(keys: &[Key]) -> WindowManager<ScriptedBackend> {
        WindowManager::new(ScriptedBackend::new(Size::new(24, 80)).with_keys(keys.iter().copied()))
    }

    #[test]
    fn test_down_down_confirm_selects_last() {
        let mut wm = manager(&[Key::Down, Key::Down, Key::Enter]);
        let outcome = Menu::new(&OPTIONS)
            .run(&mut wm, &KeyBindings::default())
            .unwrap();
        assert_eq!(outcome, MenuOutcome::Selected(2));
        assert_eq!(wm.live_windows(), 0);
        assert_eq!(wm.backend().live_windows(), 0);
    }

    #[test]
    fn test_confirm_without_moving_selects_first() {
        let mut wm = manager(&[Key::Enter]);
        let outcome = Menu::new(&OPTIONS)
            .run(&mut wm, &KeyBindings::default())
            .unwrap();
        assert_eq!(outcome, MenuOutcome::Selected(0));
    }

    #[test]
    fn test_both_cancel_keys() {
        for cancel in [Key::F(3), Key::Backspace] {
            let mut wm = manager(&[Key::Down, cancel]);
            let outcome = Menu::new(&OPTIONS)
                .run(&mut wm, &KeyBindings::default())
                .unwrap();
            assert_eq!(outcome, MenuOutcome::Cancelled);
            assert_eq!(wm.live_windows(), 0);
        }
    }

    #[test]
    fn test_no_wrap_at_ends() {
        let mut state = MenuState::new(3);
        assert!(!state.select_previous());
        assert_eq!(state.index(), 0);
        state.select_next();
        state.select_next();
        assert!(!state.select_next());
        assert_eq!(state.index(), 2);
    }

    #[test]
    fn test_index_stays_in_bounds_for_any_sequence() {
        // Deterministic pseudo-random walk over Up/Down
        let mut seed: u32 = 0x2545_f491;
        for len in 1..8 {
            let mut state = MenuState::new(len);
            for _ in 0..200 {
                seed ^= seed << 13;
                seed ^= seed >> 17;
                seed ^= seed << 5;
                let before = state.index();
                let action = if seed & 1 == 0 {
                    MenuAction::Next
                } else {
                    MenuAction::Previous
                };
                assert_eq!(state.apply(action), None);
                assert!(state.index() < len);
                let at_boundary = (action == MenuAction::Next && before == len - 1)
                    || (action == MenuAction::Previous && before == 0);
                if at_boundary {
                    assert_eq!(state.index(), before);
                }
            }
        }
    }

    #[test]
    fn test_layout_uses_first_option_only() {
        let options = ["Go", "A much longer option"];
        let layout = Menu::new(&options).layout(Size::new(24, 80));
        assert_eq!(layout.frame.rows(), 7);
        assert_eq!(layout.frame.cols(), 12);
        assert_eq!(layout.frame.origin, Point::new(4, 34));
        assert_eq!(layout.content, Rect::from_coords(2, 2, 2, 8));
        assert_eq!(layout.hint_row, 5);
    }

    #[test]
    fn test_empty_menu_renders_and_cancels_on_confirm() {
        let options: [&str; 0] = [];
        let mut wm = manager(&[Key::Down, Key::Enter]);
        let outcome = Menu::new(&options)
            .run(&mut wm, &KeyBindings::default())
            .unwrap();
        assert_eq!(outcome, MenuOutcome::Cancelled);
        assert_eq!(wm.live_windows(), 0);
    }

    #[test]
    fn test_selected_item_is_marked() {
        let mut wm = manager(&[Key::Down, Key::Enter]);
        Menu::new(&OPTIONS)
            .with_title("Main")
            .run(&mut wm, &KeyBindings::default())
            .unwrap();
        let text = wm.backend().all_text();
        assert!(text.iter().any(|t| t.starts_with("> Add")));
        assert!(text.iter().any(|t| t.starts_with("> Delete")));
        assert!(text.iter().any(|t| t == "┤ Main ├"));
        assert!(text.iter().any(|t| t == "F3 = Exit"));
    }

    #[test]
    fn test_input_closed_still_tears_down() {
        let mut wm = manager(&[Key::Down]);
        let err = Menu::new(&OPTIONS)
            .run(&mut wm, &KeyBindings::default())
            .unwrap_err();
        assert!(matches!(err, WidgetError::Backend(_)));
        assert_eq!(wm.live_windows(), 0);
        assert_eq!(wm.backend().live_windows(), 0);
    }

    #[test]
    fn test_failed_sub_window_leaves_nothing_behind() {
        let mut wm = WindowManager::new(
            ScriptedBackend::new(Size::new(24, 80))
                .with_keys([Key::Enter])
                .with_create_budget(1),
        );
        assert!(Menu::new(&OPTIONS)
            .run(&mut wm, &KeyBindings::default())
            .is_err());
        assert_eq!(wm.backend().live_windows(), 0);
    }
}
