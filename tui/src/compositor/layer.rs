//! Layer - A single compositable window

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;

use super::LayerId;

/// What a layer stands for on the terminal side
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerKind {
    /// The root screen, always at the bottom
    Screen,
    /// A top-level window or a sub-window
    Window,
    /// Off-screen canvas, shown only through its viewport
    Pad,
}

/// The screen rectangle a pad slice is copied onto
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub screen: Rect,
    pub top_row: u16,
    pub left_col: u16,
}

/// A single layer in the compositor
#[derive(Debug)]
pub struct Layer {
    pub id: LayerId,
    /// Z-order (higher = in front)
    pub z_index: i32,
    /// Absolute screen position and size
    pub bounds: Rect,
    pub visible: bool,
    /// The layer's cells, in layer-local coordinates
    pub buffer: Buffer,
    pub kind: LayerKind,
    /// Enclosing window for sub-windows
    pub parent: Option<LayerId>,
    /// Style of blank cells
    pub background: Style,
    /// Last region shown, pads only
    pub viewport: Option<Viewport>,
}

impl Layer {
    pub fn new(id: LayerId, bounds: Rect, z_index: i32, kind: LayerKind) -> Self {
        // Buffer uses origin coordinates (0,0) internally
        let buffer_area = Rect::new(0, 0, bounds.width, bounds.height);
        Self {
            id,
            z_index,
            bounds,
            visible: kind != LayerKind::Pad,
            buffer: Buffer::empty(buffer_area),
            kind,
            parent: None,
            background: Style::default(),
            viewport: None,
        }
    }

    /// Blank every cell with the background style
    pub fn clear(&mut self) {
        let area = self.buffer.area;
        self.buffer.reset();
        self.buffer.set_style(area, self.background);
    }

    /// Change the background and restyle every cell with it
    pub fn set_background(&mut self, style: Style) {
        self.background = style;
        let area = self.buffer.area;
        self.buffer.set_style(area, style);
    }
}
