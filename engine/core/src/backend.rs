//! Terminal Backend Trait
//!
//! The capability surface the widgets draw through. This abstraction lets
//! the widget drivers run against a real terminal (ratatui + crossterm in the
//! `modalterm-tui` crate) or a scripted recorder in tests, without changing
//! any widget logic.
//!
//! # Semantics
//!
//! - Windows are rectangular regions with their own contents. Drawing into a
//!   window changes nothing on screen until the window is refreshed.
//! - Sub-windows are positioned relative to their parent and move with it.
//! - Pads are off-screen canvases; [`TerminalBackend::refresh_region`] copies
//!   a slice of a pad onto a screen rectangle.
//! - [`WindowId::SCREEN`] names the root screen, which always exists and is
//!   never destroyed.

use crate::error::BackendError;
use crate::geometry::{Point, Rect, Size};
use crate::keys::Key;
use crate::theme::{Attr, Color, ColorPair};

/// Backend-assigned window handle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u32);

impl WindowId {
    /// The root screen
    pub const SCREEN: Self = Self(0);
}

/// Border character set
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BorderStyle {
    /// `|` sides, `-` top/bottom, `+` corners
    #[default]
    Ascii,
    /// Line-drawing characters
    Line,
}

impl BorderStyle {
    /// (vertical, horizontal, top-left, top-right, bottom-left, bottom-right)
    pub const fn glyphs(self) -> (char, char, char, char, char, char) {
        match self {
            BorderStyle::Ascii => ('|', '-', '+', '+', '+', '+'),
            BorderStyle::Line => ('│', '─', '┌', '┐', '└', '┘'),
        }
    }
}

type Result<T> = std::result::Result<T, BackendError>;

/// Terminal capability surface
///
/// Implement this trait to drive the widgets on a new kind of terminal.
pub trait TerminalBackend {
    /// Enter raw/cbreak mode with extended key decoding
    fn init(&mut self) -> Result<()>;

    /// Release the terminal entirely
    fn teardown(&mut self) -> Result<()>;

    /// Register a color pair
    fn register_color(&mut self, pair: ColorPair) -> Result<()>;

    /// Default colors used where no pair is set
    fn set_default_colors(&mut self, fg: Color, bg: Color) -> Result<()>;

    /// Current screen size
    fn screen_size(&self) -> Size;

    /// Create a top-level window at an absolute screen position
    fn create_window(&mut self, area: Rect) -> Result<WindowId>;

    /// Create a window nested in `parent`; `area` is relative to the parent
    fn create_subwindow(&mut self, parent: WindowId, area: Rect) -> Result<WindowId>;

    /// Create an off-screen canvas
    fn create_pad(&mut self, size: Size) -> Result<WindowId>;

    fn destroy_window(&mut self, id: WindowId) -> Result<()>;

    fn move_window(&mut self, id: WindowId, origin: Point) -> Result<()>;

    fn draw_border(&mut self, id: WindowId, style: BorderStyle) -> Result<()>;

    /// Write text at a window-relative position; text past the right edge is
    /// clipped
    fn write_text(&mut self, id: WindowId, at: Point, text: &str, attr: Attr) -> Result<()>;

    /// Set the attribute used for blank cells and apply it to the window
    fn set_background(&mut self, id: WindowId, attr: Attr) -> Result<()>;

    /// Blank every cell of the window
    fn clear(&mut self, id: WindowId) -> Result<()>;

    /// Place the cursor (window-relative) or hide it with `None`
    fn set_cursor(&mut self, id: WindowId, at: Option<Point>) -> Result<()>;

    /// Push the window's contents to the screen
    fn refresh(&mut self, id: WindowId) -> Result<()>;

    /// Copy the pad slice starting at (`top_row`, `left_col`) onto `screen`
    fn refresh_region(
        &mut self,
        pad: WindowId,
        top_row: u16,
        left_col: u16,
        screen: Rect,
    ) -> Result<()>;

    /// Block until the next key press
    fn read_key(&mut self) -> Result<Key>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_border_glyphs() {
        let (v, h, tl, tr, bl, br) = BorderStyle::Ascii.glyphs();
        assert_eq!((v, h), ('|', '-'));
        assert!([tl, tr, bl, br].iter().all(|&c| c == '+'));
    }
}
