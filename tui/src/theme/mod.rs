//! Theme and Colors
//!
//! Maps the widget palette onto ratatui styles. Pairs are registered by the
//! session at start; attributes that name an unregistered pair fall back to
//! the default colors.

use std::collections::HashMap;

use ratatui::style::{Color, Modifier, Style};

use modalterm_core::theme::{Attr, Color as TermColor, ColorPair, PairId};

/// Terminal color for one of the eight basic colors
pub const fn terminal_color(color: TermColor) -> Color {
    match color {
        TermColor::Black => Color::Black,
        TermColor::Red => Color::Red,
        TermColor::Green => Color::Green,
        TermColor::Yellow => Color::Yellow,
        TermColor::Blue => Color::Blue,
        TermColor::Magenta => Color::Magenta,
        TermColor::Cyan => Color::Cyan,
        TermColor::White => Color::White,
    }
}

/// Registered color pairs plus the default colors
#[derive(Clone, Debug, Default)]
pub struct StyleMap {
    pairs: HashMap<PairId, (Color, Color)>,
    base: Style,
}

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, pair: ColorPair) {
        self.pairs
            .insert(pair.id, (terminal_color(pair.fg), terminal_color(pair.bg)));
    }

    pub fn set_base(&mut self, fg: TermColor, bg: TermColor) {
        self.base = Style::default()
            .fg(terminal_color(fg))
            .bg(terminal_color(bg));
    }

    /// Style for cells that carry no pair of their own
    pub fn base(&self) -> Style {
        self.base
    }

    pub fn style(&self, attr: Attr) -> Style {
        let mut style = match attr.pair.and_then(|id| self.pairs.get(&id)) {
            Some(&(fg, bg)) => Style::default().fg(fg).bg(bg),
            None => Style::default(),
        };
        if attr.bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        if attr.reverse {
            style = style.add_modifier(Modifier::REVERSED);
        }
        if attr.underline {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        style
    }
}
