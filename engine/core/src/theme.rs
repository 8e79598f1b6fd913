//! Theme and Colors
//!
//! Curses-style color pairs. A backend registers every pair of the
//! [`Palette`] at session start; widgets refer to pairs by [`PairId`].

use serde::{Deserialize, Serialize};

/// The eight basic terminal colors
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

/// Color pair identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairId(pub u8);

// ============================================================================
// Named Pairs
// ============================================================================

/// Status/progress bar - black on green
pub const BAR: PairId = PairId(1);

/// Info and summary text - white on blue
pub const INFO: PairId = PairId(2);

/// Receipt area and screen backdrop - black on white
pub const RECEIPT: PairId = PairId(3);

/// Dialogs, menus and entry areas - black on cyan
pub const DIALOG: PairId = PairId(4);

/// Highlighted submenu entry - white on black
pub const HIGHLIGHT: PairId = PairId(5);

/// Body text - white on blue
pub const BODY: PairId = PairId(6);

/// Status line - white on cyan
pub const STATUS: PairId = PairId(7);

/// Input box - black on cyan
pub const INPUT_BOX: PairId = PairId(8);

/// Edit box - white on black
pub const EDIT_BOX: PairId = PairId(9);

/// A registered foreground/background combination
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColorPair {
    pub id: PairId,
    pub fg: Color,
    pub bg: Color,
}

impl ColorPair {
    pub const fn new(id: PairId, fg: Color, bg: Color) -> Self {
        Self { id, fg, bg }
    }
}

/// The full set of pairs registered at session start
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    pairs: Vec<ColorPair>,
}

impl Palette {
    pub fn standard() -> Self {
        Self {
            pairs: vec![
                ColorPair::new(BAR, Color::Black, Color::Green),
                ColorPair::new(INFO, Color::White, Color::Blue),
                ColorPair::new(RECEIPT, Color::Black, Color::White),
                ColorPair::new(DIALOG, Color::Black, Color::Cyan),
                ColorPair::new(HIGHLIGHT, Color::White, Color::Black),
                ColorPair::new(BODY, Color::White, Color::Blue),
                ColorPair::new(STATUS, Color::White, Color::Cyan),
                ColorPair::new(INPUT_BOX, Color::Black, Color::Cyan),
                ColorPair::new(EDIT_BOX, Color::White, Color::Black),
            ],
        }
    }

    pub fn pairs(&self) -> &[ColorPair] {
        &self.pairs
    }

    pub fn get(&self, id: PairId) -> Option<&ColorPair> {
        self.pairs.iter().find(|p| p.id == id)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::standard()
    }
}

/// Text attributes: optional color pair plus style flags
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Attr {
    pub pair: Option<PairId>,
    pub bold: bool,
    pub reverse: bool,
    pub underline: bool,
}

impl Attr {
    pub const fn plain() -> Self {
        Self {
            pair: None,
            bold: false,
            reverse: false,
            underline: false,
        }
    }

    pub const fn pair(id: PairId) -> Self {
        Self {
            pair: Some(id),
            ..Self::plain()
        }
    }

    #[must_use]
    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    #[must_use]
    pub const fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    #[must_use]
    pub const fn underline(mut self) -> Self {
        self.underline = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_palette_ids_unique() {
        let palette = Palette::standard();
        let mut ids: Vec<_> = palette.pairs().iter().map(|p| p.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), palette.pairs().len());
    }

    #[test]
    fn test_dialog_pair() {
        let palette = Palette::standard();
        let dialog = palette.get(DIALOG).unwrap();
        assert_eq!(dialog.fg, Color::Black);
        assert_eq!(dialog.bg, Color::Cyan);
    }

    #[test]
    fn test_attr_builder() {
        let attr = Attr::pair(DIALOG).bold().reverse();
        assert_eq!(attr.pair, Some(DIALOG));
        assert!(attr.bold && attr.reverse && !attr.underline);
    }
}
