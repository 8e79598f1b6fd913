//! Form Widget
//!
//! A single-line text entry dialog over a fixed-capacity [`FieldBuffer`].
//!
//! Keys while editing:
//! - Backspace / Delete: remove the character before the cursor
//! - Left / Right: move the cursor
//! - Enter: move to end of line and finish
//! - printable characters: insert at the cursor, rejected when full

use tracing::debug;
use unicode_width::UnicodeWidthChar;

use crate::backend::{BorderStyle, TerminalBackend};
use crate::chrome::{pad_to, print_in_middle, text_width};
use crate::error::WidgetError;
use crate::geometry::{centered, to_cells, Point, Rect, Size};
use crate::keys::{Key, KeyBindings};
use crate::theme::{Attr, DIALOG};
use crate::window::{Window, WindowManager};

/// Fixed frame height
pub const FORM_ROWS: u16 = 6;

/// Whether an edit changed the buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    /// Capacity exceeded or cursor at a boundary; nothing changed
    Rejected,
}

/// Cells a character takes in the field; zero-width characters count as one
fn cell_width(c: char) -> usize {
    c.width().unwrap_or(0).max(1)
}

/// Fixed-capacity character buffer with a cursor
///
/// Capacity is in terminal cells, so double-width characters use two.
///
/// Invariant: `0 <= cursor <= len <= cells <= capacity`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldBuffer {
    chars: Vec<char>,
    cursor: usize,
    capacity: usize,
}

impl FieldBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            chars: Vec::with_capacity(capacity),
            cursor: 0,
            capacity,
        }
    }

    /// Buffer pre-filled with `text` (truncated to capacity), cursor at end
    pub fn with_text(capacity: usize, text: &str) -> Self {
        let mut used = 0;
        let chars: Vec<char> = text
            .chars()
            .take_while(|&c| {
                used += cell_width(c);
                used <= capacity
            })
            .collect();
        Self {
            cursor: chars.len(),
            chars,
            capacity,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cells the contents take
    pub fn cells(&self) -> usize {
        self.chars.iter().copied().map(cell_width).sum()
    }

    pub fn is_full(&self) -> bool {
        self.cells() >= self.capacity
    }

    /// Contents up to the logical length
    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    /// Insert at the cursor, shifting the rest right
    pub fn insert(&mut self, c: char) -> EditOutcome {
        if self.cells() + cell_width(c) > self.capacity {
            return EditOutcome::Rejected;
        }
        self.chars.insert(self.cursor, c);
        self.cursor += 1;
        EditOutcome::Applied
    }

    /// Remove the character before the cursor and step back
    pub fn delete_previous(&mut self) -> EditOutcome {
        if self.cursor == 0 {
            return EditOutcome::Rejected;
        }
        self.cursor -= 1;
        self.chars.remove(self.cursor);
        EditOutcome::Applied
    }

    pub fn move_left(&mut self) -> EditOutcome {
        if self.cursor == 0 {
            return EditOutcome::Rejected;
        }
        self.cursor -= 1;
        EditOutcome::Applied
    }

    pub fn move_right(&mut self) -> EditOutcome {
        if self.cursor >= self.chars.len() {
            return EditOutcome::Rejected;
        }
        self.cursor += 1;
        EditOutcome::Applied
    }

    pub fn move_to_end(&mut self) {
        self.cursor = self.chars.len();
    }
}

/// Window geometry for a form
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormLayout {
    /// Frame window, absolute
    pub frame: Rect,
    /// Field sub-window, relative to the frame
    pub field: Rect,
}

/// Single-line text entry dialog
#[derive(Clone, Debug)]
pub struct Form {
    prompt: String,
    width: usize,
    initial: String,
}

impl Form {
    /// A dialog accepting at most `width` characters
    pub fn new(prompt: impl Into<String>, width: usize) -> Self {
        Self {
            prompt: prompt.into(),
            width,
            initial: String::new(),
        }
    }

    /// Pre-fill the field
    #[must_use]
    pub fn with_initial(mut self, text: impl Into<String>) -> Self {
        self.initial = text.into();
        self
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn layout(&self, screen: Size) -> FormLayout {
        let field_cols = to_cells(self.width);
        let cols = field_cols
            .saturating_add(4)
            .max(text_width(&self.prompt).saturating_add(4));
        let frame = Rect::from_coords(
            (screen.rows / 3).saturating_sub(4),
            centered(screen.cols, cols),
            FORM_ROWS,
            cols,
        );
        let field = Rect::from_coords(3, 2, FORM_ROWS - 4, field_cols.saturating_add(1));
        FormLayout { frame, field }
    }

    /// Post the dialog, edit until Enter, then unpost it
    ///
    /// # Errors
    ///
    /// Returns backend failures. Windows are destroyed on every path.
    pub fn run<B: TerminalBackend>(
        &self,
        wm: &mut WindowManager<B>,
        bindings: &KeyBindings,
    ) -> Result<String, WidgetError> {
        let layout = self.layout(wm.screen_size());

        let frame = wm.create(layout.frame, Some(BorderStyle::Line))?;
        let field = match wm.create_sub(&frame, layout.field) {
            Ok(field) => field,
            Err(e) => {
                let _ = wm.dismiss(vec![frame]);
                return Err(e);
            }
        };
        debug!(width = self.width, "form posted");

        let text = self.drive(wm, &frame, &field, bindings);
        let hidden = wm.set_cursor(&field, None);
        let unposted = wm.dismiss(vec![frame, field]);

        let text = text?;
        hidden?;
        unposted?;
        debug!(len = text.chars().count(), "form unposted");
        Ok(text)
    }

    fn drive<B: TerminalBackend>(
        &self,
        wm: &mut WindowManager<B>,
        frame: &Window,
        field: &Window,
        bindings: &KeyBindings,
    ) -> Result<String, WidgetError> {
        let mut buffer = FieldBuffer::with_text(self.width, &self.initial);

        let attr = Attr::pair(DIALOG).bold();
        wm.set_background(frame, attr)?;
        wm.clear(frame)?;
        wm.border(frame, BorderStyle::Line)?;
        let inner = frame.size().cols.saturating_sub(2);
        print_in_middle(wm, frame, 1, 1, inner, &self.prompt, Attr::pair(DIALOG))?;
        wm.set_background(field, Attr::pair(DIALOG))?;
        wm.refresh(frame)?;
        self.draw_field(wm, field, &buffer)?;

        loop {
            let key = wm.read_key()?;
            if bindings.is_confirm(key) {
                buffer.move_to_end();
                return Ok(buffer.text());
            }
            let edit = if bindings.is_delete_previous(key) {
                buffer.delete_previous()
            } else {
                match key {
                    Key::Left => buffer.move_left(),
                    Key::Right => buffer.move_right(),
                    other => match other.printable() {
                        Some(c) => buffer.insert(c),
                        None => EditOutcome::Rejected,
                    },
                }
            };
            if edit == EditOutcome::Applied {
                self.draw_field(wm, field, &buffer)?;
            }
        }
    }

    fn draw_field<B: TerminalBackend>(
        &self,
        wm: &mut WindowManager<B>,
        field: &Window,
        buffer: &FieldBuffer,
    ) -> Result<(), WidgetError> {
        let attr = Attr::pair(DIALOG).underline().reverse();
        let line = pad_to(&buffer.text(), to_cells(self.width));
        wm.write(field, Point::ORIGIN, &line, attr)?;
        let before_cursor: String = buffer.chars.iter().take(buffer.cursor()).collect();
        wm.set_cursor(field, Some(Point::new(0, text_width(&before_cursor))))?;
        wm.refresh(field)
    }
}
