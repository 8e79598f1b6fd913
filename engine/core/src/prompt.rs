//! Message Box and Yes/No Prompt
//!
//! Small fixed-height dialogs: a line of text on row 1 and a single row of
//! items on row 4. Enter confirms the highlighted item; there is no cancel.

use tracing::debug;

use crate::backend::{BorderStyle, TerminalBackend};
use crate::chrome::{print_in_middle, text_width};
use crate::error::WidgetError;
use crate::geometry::{centered, to_cells, Point, Rect, Size};
use crate::keys::Key;
use crate::menu::MenuState;
use crate::theme::{Attr, DIALOG};
use crate::window::{Window, WindowManager};

const PROMPT_ROWS: u16 = 6;
const PROMPT_PADDING_COLS: u16 = 10;
const PROMPT_MIN_COLS: u16 = 20;
const ITEM_ROW: u16 = 4;
const ITEM_GAP: u16 = 1;

const OK_ITEM: &str = "  OK  ";
const YES_ITEM: &str = "  YES  ";
const NO_ITEM: &str = "   NO  ";

/// Frame (absolute) and item row sub-window (frame-relative)
fn layout(screen: Size, text: &str) -> (Rect, Rect) {
    let cols = text_width(text)
        .saturating_add(PROMPT_PADDING_COLS)
        .max(PROMPT_MIN_COLS);
    let frame = Rect::from_coords(
        (screen.rows / 3).saturating_sub(4),
        centered(screen.cols, cols),
        PROMPT_ROWS,
        cols,
    );
    let items = Rect::from_coords(ITEM_ROW, 1, 1, cols - 2);
    (frame, items)
}

/// Show `text` with an OK button and wait for Enter
///
/// # Errors
///
/// Returns backend failures. Windows are destroyed on every path.
pub fn message_box<B: TerminalBackend>(
    wm: &mut WindowManager<B>,
    text: &str,
) -> Result<(), WidgetError> {
    run(wm, text, &[OK_ITEM]).map(|_| ())
}

/// Ask a yes/no question; `true` means YES
///
/// Left/Up highlight YES, Right/Down highlight NO, Enter confirms.
///
/// # Errors
///
/// Returns backend failures. Windows are destroyed on every path.
pub fn yes_no<B: TerminalBackend>(
    wm: &mut WindowManager<B>,
    text: &str,
) -> Result<bool, WidgetError> {
    run(wm, text, &[YES_ITEM, NO_ITEM]).map(|index| index == 0)
}

fn run<B: TerminalBackend>(
    wm: &mut WindowManager<B>,
    text: &str,
    items: &[&str],
) -> Result<usize, WidgetError> {
    let (frame_area, items_area) = layout(wm.screen_size(), text);

    let frame = wm.create(frame_area, Some(BorderStyle::Ascii))?;
    let row = match wm.create_sub(&frame, items_area) {
        Ok(row) => row,
        Err(e) => {
            let _ = wm.dismiss(vec![frame]);
            return Err(e);
        }
    };
    debug!(items = items.len(), "prompt posted");

    let chosen = drive(wm, &frame, &row, text, items);
    let unposted = wm.dismiss(vec![frame, row]);

    let chosen = chosen?;
    unposted?;
    debug!(chosen, "prompt unposted");
    Ok(chosen)
}

fn drive<B: TerminalBackend>(
    wm: &mut WindowManager<B>,
    frame: &Window,
    row: &Window,
    text: &str,
    items: &[&str],
) -> Result<usize, WidgetError> {
    let mut state = MenuState::new(items.len());

    wm.set_background(frame, Attr::pair(DIALOG))?;
    wm.clear(frame)?;
    wm.border(frame, BorderStyle::Ascii)?;
    let inner = frame.size().cols.saturating_sub(2);
    print_in_middle(wm, frame, 1, 1, inner, text, Attr::pair(DIALOG).bold())?;
    wm.refresh(frame)?;
    draw_items(wm, row, items, &state)?;

    loop {
        let moved = match wm.read_key()? {
            Key::Enter => return Ok(state.index()),
            Key::Left | Key::Up => state.select_previous(),
            Key::Right | Key::Down => state.select_next(),
            _ => false,
        };
        if moved {
            draw_items(wm, row, items, &state)?;
        }
    }
}

fn draw_items<B: TerminalBackend>(
    wm: &mut WindowManager<B>,
    row: &Window,
    items: &[&str],
    state: &MenuState,
) -> Result<(), WidgetError> {
    wm.set_background(row, Attr::pair(DIALOG))?;
    let gaps = to_cells(items.len().saturating_sub(1)).saturating_mul(ITEM_GAP);
    let total = items
        .iter()
        .map(|item| text_width(item))
        .fold(gaps, u16::saturating_add);

    let mut x = centered(row.size().cols, total);
    for (i, item) in items.iter().enumerate() {
        let attr = if i == state.index() {
            Attr::pair(DIALOG).reverse()
        } else {
            Attr::pair(DIALOG)
        };
        wm.write(row, Point::new(0, x), item, attr)?;
        x = x.saturating_add(text_width(item)).saturating_add(ITEM_GAP);
    }
    wm.refresh(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedBackend;
    use pretty_assertions::assert_eq;

    fn manager(keys: &[Key]) -> WindowManager<ScriptedBackend> {
        WindowManager::new(ScriptedBackend::new(Size::new(24, 80)).with_keys(keys.iter().copied()))
    }

    #[test]
    fn test_yes_is_default() {
        let mut wm = manager(&[Key::Enter]);
        assert!(yes_no(&mut wm, "Delete the file?").unwrap());
        assert_eq!(wm.backend().live_windows(), 0);
    }

    #[test]
    fn test_right_selects_no() {
        let mut wm = manager(&[Key::Right, Key::Enter]);
        assert!(!yes_no(&mut wm, "Continue?").unwrap());
    }

    #[test]
    fn test_selection_clamps_without_wrapping() {
        let mut wm = manager(&[Key::Down, Key::Down, Key::Right, Key::Up, Key::Enter]);
        assert!(yes_no(&mut wm, "Continue?").unwrap());

        let mut wm = manager(&[Key::Left, Key::Left, Key::Down, Key::Enter]);
        assert!(!yes_no(&mut wm, "Continue?").unwrap());
    }

    #[test]
    fn test_message_box_waits_for_enter() {
        let mut wm = manager(&[Key::Down, Key::F(3), Key::Char('x'), Key::Enter]);
        message_box(&mut wm, "Saved").unwrap();
        assert_eq!(wm.backend().keys_remaining(), 0);
        assert!(wm.backend().all_text().contains(&OK_ITEM.to_string()));
        assert_eq!(wm.live_windows(), 0);
    }

    #[test]
    fn test_width_has_a_floor() {
        let (frame, items) = layout(Size::new(24, 80), "Hi");
        assert_eq!(frame.size, Size::new(6, 20));
        assert_eq!(items, Rect::from_coords(4, 1, 1, 18));

        let (frame, _) = layout(Size::new(24, 80), "A rather longer question?");
        assert_eq!(frame.cols(), 35);
    }

    #[test]
    fn test_input_closed_still_tears_down() {
        let mut wm = manager(&[Key::Right]);
        assert!(yes_no(&mut wm, "Continue?").is_err());
        assert_eq!(wm.backend().live_windows(), 0);
    }
}
