//! Window Chrome
//!
//! Titles and centered text shared by the widgets.

use unicode_width::UnicodeWidthStr;

use crate::backend::TerminalBackend;
use crate::error::WidgetError;
use crate::geometry::{centered, to_cells, Point};
use crate::theme::Attr;
use crate::window::{Window, WindowManager};

/// Fallback width when `print_in_middle` is given a zero width
pub const DEFAULT_MIDDLE_WIDTH: u16 = 80;

/// Display width of `text` in cells
pub fn text_width(text: &str) -> u16 {
    to_cells(text.width())
}

/// Right-pad `text` with spaces to `width` cells
pub fn pad_to(text: &str, width: u16) -> String {
    let missing = usize::from(width).saturating_sub(text.width());
    format!("{text}{}", " ".repeat(missing))
}

/// Title decoration as it appears on a border: `┤ title ├`
pub fn title_label(title: &str) -> String {
    format!("┤ {title} ├")
}

/// Draw `title` centered on the window's top border row
///
/// # Errors
///
/// Returns the backend failure.
pub fn center_title<B: TerminalBackend>(
    wm: &mut WindowManager<B>,
    window: &Window,
    title: &str,
    attr: Attr,
) -> Result<(), WidgetError> {
    let label = title_label(title);
    let x = centered(window.size().cols, text_width(&label));
    wm.write(window, Point::new(0, x), &label, attr)
}

/// Print `text` centered within `width` columns starting at `start_x`
///
/// # Errors
///
/// Returns the backend failure.
pub fn print_in_middle<B: TerminalBackend>(
    wm: &mut WindowManager<B>,
    window: &Window,
    row: u16,
    start_x: u16,
    width: u16,
    text: &str,
    attr: Attr,
) -> Result<(), WidgetError> {
    let width = if width == 0 { DEFAULT_MIDDLE_WIDTH } else { width };
    let x = start_x.saturating_add(centered(width, text_width(text)));
    wm.write(window, Point::new(row, x), text, attr)
}

/// Print `text` centered on a root-screen row, reversed
///
/// # Errors
///
/// Returns the backend failure.
pub fn print_centered<B: TerminalBackend>(
    wm: &mut WindowManager<B>,
    row: u16,
    start_x: u16,
    text: &str,
) -> Result<(), WidgetError> {
    let cols = wm.screen_size().cols;
    let x = start_x.saturating_add(centered(cols, text_width(text)));
    wm.print_at(Point::new(row, x), text, Attr::plain().reverse())
}
