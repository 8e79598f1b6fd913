//! Layered Compositor
//!
//! Each window is a layer with its own buffer. Refreshing a window raises it
//! (and its sub-windows) to the front; the compositor then composites all
//! visible layers into a final output buffer, back to front.
//!
//! Layers are opaque: every cell of a window covers what lies beneath it,
//! blank cells included.

mod layer;

use std::collections::HashMap;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};

pub use layer::{Layer, LayerKind, Viewport};

/// Unique identifier for a layer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u32);

impl LayerId {
    /// The root screen layer
    pub const SCREEN: Self = Self(0);
}

/// The compositor manages all layers and composites them together
pub struct Compositor {
    /// All layers by ID
    layers: HashMap<LayerId, Layer>,
    /// Layers sorted by z-index for rendering
    render_order: Vec<LayerId>,
    next_id: u32,
    next_z: i32,
    /// Output buffer (composited result)
    output: Buffer,
    /// Total area
    area: Rect,
}

impl Compositor {
    /// Create a compositor whose screen layer covers `area`
    pub fn new(area: Rect) -> Self {
        let mut layers = HashMap::new();
        layers.insert(
            LayerId::SCREEN,
            Layer::new(LayerId::SCREEN, area, i32::MIN, LayerKind::Screen),
        );
        Self {
            layers,
            render_order: vec![LayerId::SCREEN],
            next_id: 1,
            next_z: 0,
            output: Buffer::empty(area),
            area,
        }
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    /// Number of layers besides the screen
    pub fn layer_count(&self) -> usize {
        self.layers.len() - 1
    }

    /// Create a window layer in front of everything else
    pub fn create_layer(&mut self, bounds: Rect, parent: Option<LayerId>) -> LayerId {
        let id = self.allocate();
        let z = self.bump_z();
        let mut layer = Layer::new(id, bounds, z, LayerKind::Window);
        layer.parent = parent;
        self.layers.insert(id, layer);
        self.update_render_order();
        id
    }

    /// Create a hidden off-screen layer
    pub fn create_pad(&mut self, width: u16, height: u16) -> LayerId {
        let id = self.allocate();
        let z = self.bump_z();
        self.layers.insert(
            id,
            Layer::new(id, Rect::new(0, 0, width, height), z, LayerKind::Pad),
        );
        self.update_render_order();
        id
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(&id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.get_mut(&id)
    }

    /// Get mutable access to a layer's buffer for rendering
    pub fn layer_buffer_mut(&mut self, id: LayerId) -> Option<&mut Buffer> {
        self.layers.get_mut(&id).map(|l| &mut l.buffer)
    }

    /// Layers whose parent is `id`
    pub fn children(&self, id: LayerId) -> Vec<LayerId> {
        let mut children: Vec<_> = self
            .layers
            .values()
            .filter(|l| l.parent == Some(id))
            .map(|l| l.id)
            .collect();
        children.sort_by_key(|child| self.layers.get(child).map_or(0, |l| l.z_index));
        children
    }

    /// Remove a layer; the screen layer is never removed
    pub fn remove_layer(&mut self, id: LayerId) -> Option<Layer> {
        if id == LayerId::SCREEN {
            return None;
        }
        let removed = self.layers.remove(&id);
        if removed.is_some() {
            self.update_render_order();
        }
        removed
    }

    /// Bring a layer to the front, keeping its sub-windows above it
    pub fn raise(&mut self, id: LayerId) {
        if id == LayerId::SCREEN {
            return;
        }
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            let z = self.bump_z();
            match self.layers.get_mut(&next) {
                Some(layer) => layer.z_index = z,
                None => continue,
            }
            // Reversed so the lowest child is raised first
            pending.extend(self.children(next).into_iter().rev());
        }
        self.update_render_order();
    }

    /// Move a layer; sub-windows keep their relative position
    pub fn move_layer(&mut self, id: LayerId, x: u16, y: u16) {
        let Some(layer) = self.layers.get(&id) else {
            return;
        };
        let dx = i32::from(x) - i32::from(layer.bounds.x);
        let dy = i32::from(y) - i32::from(layer.bounds.y);

        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(layer) = self.layers.get_mut(&next) {
                layer.bounds.x = shift(layer.bounds.x, dx);
                layer.bounds.y = shift(layer.bounds.y, dy);
            }
            pending.extend(self.children(next));
        }
    }

    /// Show a slice of a pad on screen, in front of everything else
    pub fn show_region(&mut self, id: LayerId, viewport: Viewport) {
        if let Some(layer) = self.layers.get_mut(&id) {
            layer.viewport = Some(viewport);
            layer.visible = true;
        }
        self.raise(id);
    }

    /// Resize the entire compositor and the screen layer with it
    pub fn resize(&mut self, area: Rect) {
        self.area = area;
        self.output = Buffer::empty(area);
        if let Some(screen) = self.layers.get_mut(&LayerId::SCREEN) {
            screen.bounds = area;
            screen.buffer = Buffer::empty(Rect::new(0, 0, area.width, area.height));
            let background = screen.background;
            screen.set_background(background);
        }
    }

    /// Composite all visible layers into the output buffer
    ///
    /// Cells left at the terminal's default colors take `base` instead.
    pub fn composite(&mut self, base: Style) -> &Buffer {
        self.output.reset();
        self.output.set_style(self.area, base);

        for id in &self.render_order {
            if let Some(layer) = self.layers.get(id) {
                if !layer.visible {
                    continue;
                }
                match (layer.kind, layer.viewport) {
                    (LayerKind::Pad, Some(viewport)) => {
                        Self::blit_region(&mut self.output, self.area, layer, viewport, base);
                    }
                    (LayerKind::Pad, None) => {}
                    _ => Self::blit_layer(&mut self.output, self.area, layer, base),
                }
            }
        }

        &self.output
    }

    /// The last composited output
    pub fn output(&self) -> &Buffer {
        &self.output
    }

    /// Blit a whole layer onto the output buffer (opaque)
    fn blit_layer(output: &mut Buffer, area: Rect, layer: &Layer, base: Style) {
        let lb = layer.bounds;
        for ly in 0..lb.height {
            for lx in 0..lb.width {
                let dst_x = lb.x.saturating_add(lx);
                let dst_y = lb.y.saturating_add(ly);
                Self::copy_cell(output, area, layer, (lx, ly), (dst_x, dst_y), base);
            }
        }
    }

    /// Blit the viewport slice of a pad onto the output buffer
    fn blit_region(output: &mut Buffer, area: Rect, layer: &Layer, viewport: Viewport, base: Style) {
        let screen = viewport.screen;
        for dy in 0..screen.height {
            for dx in 0..screen.width {
                let src = (
                    viewport.left_col.saturating_add(dx),
                    viewport.top_row.saturating_add(dy),
                );
                let dst = (screen.x.saturating_add(dx), screen.y.saturating_add(dy));
                Self::copy_cell(output, area, layer, src, dst, base);
            }
        }
    }

    fn copy_cell(
        output: &mut Buffer,
        area: Rect,
        layer: &Layer,
        (src_x, src_y): (u16, u16),
        (dst_x, dst_y): (u16, u16),
        base: Style,
    ) {
        let src_area = layer.buffer.area;
        if src_x >= src_area.width || src_y >= src_area.height {
            return;
        }
        if dst_x >= area.width || dst_y >= area.height {
            return;
        }

        let mut cell = layer.buffer.content[layer.buffer.index_of(src_x, src_y)].clone();
        if cell.fg == Color::Reset {
            cell.fg = base.fg.unwrap_or(Color::Reset);
        }
        if cell.bg == Color::Reset {
            cell.bg = base.bg.unwrap_or(Color::Reset);
        }
        let dst_idx = output.index_of(dst_x, dst_y);
        output.content[dst_idx] = cell;
    }

    fn allocate(&mut self) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        id
    }

    fn bump_z(&mut self) -> i32 {
        self.next_z = self.next_z.saturating_add(1);
        self.next_z
    }

    /// Update render order based on z-indices
    fn update_render_order(&mut self) {
        self.render_order = self.layers.keys().copied().collect();
        self.render_order
            .sort_by_key(|id| self.layers.get(id).map_or(0, |l| l.z_index));
    }
}

fn shift(value: u16, by: i32) -> u16 {
    u16::try_from((i32::from(value) + by).max(0)).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(buffer: &Buffer, y: u16) -> String {
        (0..buffer.area.width)
            .map(|x| buffer.content[buffer.index_of(x, y)].symbol().to_string())
            .collect()
    }

    fn fill(compositor: &mut Compositor, id: LayerId, ch: &str) {
        let buffer = compositor.layer_buffer_mut(id).unwrap();
        let area = buffer.area;
        for y in 0..area.height {
            for x in 0..area.width {
                buffer.set_string(x, y, ch, Style::default());
            }
        }
    }

    #[test]
    fn test_blank_cells_occlude() {
        let mut compositor = Compositor::new(Rect::new(0, 0, 6, 1));
        let back = compositor.create_layer(Rect::new(0, 0, 6, 1), None);
        fill(&mut compositor, back, "x");
        let _front = compositor.create_layer(Rect::new(1, 0, 2, 1), None);

        let output = compositor.composite(Style::default());
        assert_eq!(row(output, 0), "x  xxx");
    }

    #[test]
    fn test_raise_keeps_children_on_top() {
        let mut compositor = Compositor::new(Rect::new(0, 0, 6, 1));
        let parent = compositor.create_layer(Rect::new(0, 0, 6, 1), None);
        let child = compositor.create_layer(Rect::new(2, 0, 2, 1), Some(parent));
        let other = compositor.create_layer(Rect::new(0, 0, 6, 1), None);
        fill(&mut compositor, parent, "p");
        fill(&mut compositor, child, "c");
        fill(&mut compositor, other, "o");

        assert_eq!(row(compositor.composite(Style::default()), 0), "oooooo");
        compositor.raise(parent);
        assert_eq!(row(compositor.composite(Style::default()), 0), "ppccpp");
        assert_eq!(compositor.render_order.last(), Some(&child));
    }

    #[test]
    fn test_move_carries_children() {
        let mut compositor = Compositor::new(Rect::new(0, 0, 20, 10));
        let parent = compositor.create_layer(Rect::new(2, 1, 8, 4), None);
        let child = compositor.create_layer(Rect::new(4, 2, 2, 1), Some(parent));

        compositor.move_layer(parent, 10, 5);
        assert_eq!(compositor.layer(parent).unwrap().bounds, Rect::new(10, 5, 8, 4));
        assert_eq!(compositor.layer(child).unwrap().bounds, Rect::new(12, 6, 2, 1));
    }

    #[test]
    fn test_pad_only_shows_its_viewport() {
        let mut compositor = Compositor::new(Rect::new(0, 0, 4, 2));
        let pad = compositor.create_pad(4, 10);
        {
            let buffer = compositor.layer_buffer_mut(pad).unwrap();
            for y in 0..10u16 {
                buffer.set_string(0, y, y.to_string(), Style::default());
            }
        }
        assert_eq!(row(compositor.composite(Style::default()), 0), "    ");

        compositor.show_region(
            pad,
            Viewport {
                screen: Rect::new(1, 0, 2, 2),
                top_row: 3,
                left_col: 0,
            },
        );
        let output = compositor.composite(Style::default());
        assert_eq!(row(output, 0), " 3  ");
        assert_eq!(row(output, 1), " 4  ");
    }

    #[test]
    fn test_default_colors_fill_unstyled_cells() {
        let mut compositor = Compositor::new(Rect::new(0, 0, 2, 1));
        let window = compositor.create_layer(Rect::new(1, 0, 1, 1), None);
        compositor
            .layer_mut(window)
            .unwrap()
            .set_background(Style::default().bg(Color::Cyan));

        let base = Style::default().fg(Color::White).bg(Color::Blue);
        let output = compositor.composite(base);
        assert_eq!(output.content[0].bg, Color::Blue);
        assert_eq!(output.content[1].bg, Color::Cyan);
        assert_eq!(output.content[1].fg, Color::White);
    }

    #[test]
    fn test_screen_layer_is_permanent() {
        let mut compositor = Compositor::new(Rect::new(0, 0, 2, 1));
        assert!(compositor.remove_layer(LayerId::SCREEN).is_none());
        let window = compositor.create_layer(Rect::new(0, 0, 1, 1), None);
        assert_eq!(compositor.layer_count(), 1);
        assert!(compositor.remove_layer(window).is_some());
        assert_eq!(compositor.layer_count(), 0);
    }
}
