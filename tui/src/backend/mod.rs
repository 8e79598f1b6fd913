//! Ratatui Backend
//!
//! [`RatatuiBackend`] implements the widget backend on top of a ratatui
//! [`Terminal`]. Every window is a compositor layer; a refresh raises the
//! window and draws one composited frame.

use ratatui::backend::Backend;
use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect as Area};
use ratatui::Terminal;
use tracing::{debug, trace};
use unicode_width::UnicodeWidthStr;

use modalterm_core::backend::{BorderStyle, TerminalBackend, WindowId};
use modalterm_core::error::BackendError;
use modalterm_core::geometry::{Point, Rect, Size};
use modalterm_core::keys::Key;
use modalterm_core::theme::{Attr, Color, ColorPair};

use crate::compositor::{Compositor, LayerId, LayerKind, Viewport};
use crate::input::KeySource;
use crate::theme::StyleMap;

type Result<T> = std::result::Result<T, BackendError>;

/// Absolute cursor position
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Cursor {
    x: u16,
    y: u16,
}

/// Widget backend drawing through ratatui
pub struct RatatuiBackend<B: Backend, K: KeySource> {
    terminal: Terminal<B>,
    keys: K,
    compositor: Compositor,
    styles: StyleMap,
    cursor: Option<Cursor>,
    /// Screen text captured before each key read, when enabled
    snapshots: Option<Vec<Vec<String>>>,
}

impl<B: Backend, K: KeySource> RatatuiBackend<B, K> {
    /// # Errors
    ///
    /// Returns an error if the terminal size cannot be queried.
    pub fn new(terminal: Terminal<B>, keys: K) -> Result<Self> {
        let size = terminal.size()?;
        Ok(Self {
            terminal,
            keys,
            compositor: Compositor::new(Area::new(0, 0, size.width, size.height)),
            styles: StyleMap::new(),
            cursor: None,
            snapshots: None,
        })
    }

    /// Record the screen text every time a key is read
    #[must_use]
    pub fn with_key_snapshots(mut self) -> Self {
        self.snapshots = Some(Vec::new());
        self
    }

    /// Screens recorded by [`RatatuiBackend::with_key_snapshots`]
    pub fn snapshots(&self) -> &[Vec<String>] {
        self.snapshots.as_deref().unwrap_or_default()
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    pub fn keys(&self) -> &K {
        &self.keys
    }

    /// Windows and pads currently alive
    pub fn live_windows(&self) -> usize {
        self.compositor.layer_count()
    }

    /// The last drawn frame, one string per row
    pub fn screen_text(&self) -> Vec<String> {
        buffer_lines(self.compositor.output())
    }

    fn layer(id: WindowId) -> LayerId {
        LayerId(id.0)
    }

    fn bounds(&self, id: WindowId) -> Result<Area> {
        self.compositor
            .layer(Self::layer(id))
            .map(|layer| layer.bounds)
            .ok_or(BackendError::UnknownWindow(id))
    }

    fn buffer_mut(&mut self, id: WindowId) -> Result<&mut Buffer> {
        self.compositor
            .layer_buffer_mut(Self::layer(id))
            .ok_or(BackendError::UnknownWindow(id))
    }

    /// Composite all layers and draw the frame
    fn flush(&mut self) -> Result<()> {
        let output = self.compositor.composite(self.styles.base());
        let cursor = self.cursor;
        self.terminal.draw(|frame| {
            let target = frame.buffer_mut();
            let width = output.area.width.min(target.area.width);
            let height = output.area.height.min(target.area.height);
            for y in 0..height {
                for x in 0..width {
                    let src = output.index_of(x, y);
                    let dst = target.index_of(x, y);
                    target.content[dst] = output.content[src].clone();
                }
            }
            if let Some(at) = cursor {
                frame.set_cursor_position(Position::new(at.x, at.y));
            }
        })?;
        Ok(())
    }
}

fn to_area(rect: Rect) -> Area {
    Area::new(rect.origin.x, rect.origin.y, rect.size.cols, rect.size.rows)
}

fn buffer_lines(buffer: &Buffer) -> Vec<String> {
    let area = buffer.area;
    (0..area.height)
        .map(|y| {
            (0..area.width)
                .map(|x| buffer.content[buffer.index_of(x, y)].symbol())
                .collect::<String>()
        })
        .collect()
}

impl<B: Backend, K: KeySource> TerminalBackend for RatatuiBackend<B, K> {
    fn init(&mut self) -> Result<()> {
        self.keys.enter()?;
        self.terminal.clear()?;
        let size = self.terminal.size()?;
        self.compositor
            .resize(Area::new(0, 0, size.width, size.height));
        debug!(rows = size.height, cols = size.width, "terminal initialized");
        Ok(())
    }

    fn teardown(&mut self) -> Result<()> {
        let shown = self.terminal.show_cursor();
        self.keys.leave()?;
        shown?;
        debug!("terminal released");
        Ok(())
    }

    fn register_color(&mut self, pair: ColorPair) -> Result<()> {
        self.styles.register(pair);
        Ok(())
    }

    fn set_default_colors(&mut self, fg: Color, bg: Color) -> Result<()> {
        self.styles.set_base(fg, bg);
        Ok(())
    }

    fn screen_size(&self) -> Size {
        let area = self.compositor.area();
        Size::new(area.height, area.width)
    }

    fn create_window(&mut self, area: Rect) -> Result<WindowId> {
        if area.size.is_empty() {
            return Err(BackendError::Geometry(format!("empty window {area:?}")));
        }
        let id = self.compositor.create_layer(to_area(area), None);
        trace!(id = id.0, ?area, "window created");
        Ok(WindowId(id.0))
    }

    fn create_subwindow(&mut self, parent: WindowId, area: Rect) -> Result<WindowId> {
        let outer = self.bounds(parent)?;
        let parent_rect = Rect::from_coords(outer.y, outer.x, outer.height, outer.width);
        if area.size.is_empty() || !parent_rect.fits(&area) {
            return Err(BackendError::Geometry(format!(
                "{area:?} does not fit in window {}",
                parent.0
            )));
        }
        let absolute = Area::new(
            outer.x.saturating_add(area.origin.x),
            outer.y.saturating_add(area.origin.y),
            area.size.cols,
            area.size.rows,
        );
        let id = self
            .compositor
            .create_layer(absolute, Some(Self::layer(parent)));
        trace!(id = id.0, parent = parent.0, ?area, "sub-window created");
        Ok(WindowId(id.0))
    }

    fn create_pad(&mut self, size: Size) -> Result<WindowId> {
        if size.is_empty() {
            return Err(BackendError::Geometry(format!("empty pad {size:?}")));
        }
        let id = self.compositor.create_pad(size.cols, size.rows);
        trace!(id = id.0, ?size, "pad created");
        Ok(WindowId(id.0))
    }

    fn destroy_window(&mut self, id: WindowId) -> Result<()> {
        if id == WindowId::SCREEN {
            return Err(BackendError::UnknownWindow(id));
        }
        self.compositor
            .remove_layer(Self::layer(id))
            .map(|_| trace!(id = id.0, "window destroyed"))
            .ok_or(BackendError::UnknownWindow(id))
    }

    fn move_window(&mut self, id: WindowId, origin: Point) -> Result<()> {
        self.bounds(id)?;
        self.compositor
            .move_layer(Self::layer(id), origin.x, origin.y);
        Ok(())
    }

    fn draw_border(&mut self, id: WindowId, style: BorderStyle) -> Result<()> {
        let (vertical, horizontal, top_left, top_right, bottom_left, bottom_right) =
            style.glyphs();
        let background = self
            .compositor
            .layer(Self::layer(id))
            .map(|layer| layer.background)
            .ok_or(BackendError::UnknownWindow(id))?;
        let buffer = self.buffer_mut(id)?;
        let Area { width, height, .. } = buffer.area;
        if width < 2 || height < 2 {
            return Ok(());
        }
        let (right, bottom) = (width - 1, height - 1);

        let mut put = |x: u16, y: u16, glyph: char| {
            let idx = buffer.index_of(x, y);
            buffer.content[idx].set_char(glyph).set_style(background);
        };
        for x in 1..right {
            put(x, 0, horizontal);
            put(x, bottom, horizontal);
        }
        for y in 1..bottom {
            put(0, y, vertical);
            put(right, y, vertical);
        }
        put(0, 0, top_left);
        put(right, 0, top_right);
        put(0, bottom, bottom_left);
        put(right, bottom, bottom_right);
        Ok(())
    }

    fn write_text(&mut self, id: WindowId, at: Point, text: &str, attr: Attr) -> Result<()> {
        let style = self.styles.style(attr);
        let buffer = self.buffer_mut(id)?;
        let area = buffer.area;
        if at.y >= area.height || at.x >= area.width {
            return Ok(());
        }
        let room = usize::from(area.width - at.x);
        buffer.set_stringn(at.x, at.y, text, room.min(text.width()), style);
        Ok(())
    }

    fn set_background(&mut self, id: WindowId, attr: Attr) -> Result<()> {
        let style = self.styles.style(attr);
        self.compositor
            .layer_mut(Self::layer(id))
            .map(|layer| layer.set_background(style))
            .ok_or(BackendError::UnknownWindow(id))
    }

    fn clear(&mut self, id: WindowId) -> Result<()> {
        self.compositor
            .layer_mut(Self::layer(id))
            .map(|layer| layer.clear())
            .ok_or(BackendError::UnknownWindow(id))
    }

    fn set_cursor(&mut self, id: WindowId, at: Option<Point>) -> Result<()> {
        let bounds = self.bounds(id)?;
        self.cursor = at.map(|at| Cursor {
            x: bounds.x.saturating_add(at.x),
            y: bounds.y.saturating_add(at.y),
        });
        Ok(())
    }

    fn refresh(&mut self, id: WindowId) -> Result<()> {
        let layer = self
            .compositor
            .layer(Self::layer(id))
            .ok_or(BackendError::UnknownWindow(id))?;
        if layer.kind == LayerKind::Pad {
            return Err(BackendError::Geometry(format!(
                "pad {} can only be shown through a region",
                id.0
            )));
        }
        self.compositor.raise(Self::layer(id));
        self.flush()
    }

    fn refresh_region(
        &mut self,
        pad: WindowId,
        top_row: u16,
        left_col: u16,
        screen: Rect,
    ) -> Result<()> {
        self.bounds(pad)?;
        self.compositor.show_region(
            Self::layer(pad),
            Viewport {
                screen: to_area(screen),
                top_row,
                left_col,
            },
        );
        self.flush()
    }

    fn read_key(&mut self) -> Result<Key> {
        if self.snapshots.is_some() {
            let screen = self.screen_text();
            if let Some(snapshots) = self.snapshots.as_mut() {
                snapshots.push(screen);
            }
        }
        self.keys.next_key()
    }
}
