//! Cell Geometry
//!
//! Row/column coordinates for character-cell screens. Rows come first,
//! matching the `(y, x)` convention of curses-style terminal APIs.

/// A cell position (row, column)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    /// Row
    pub y: u16,
    /// Column
    pub x: u16,
}

impl Point {
    pub const ORIGIN: Self = Self { y: 0, x: 0 };

    pub const fn new(y: u16, x: u16) -> Self {
        Self { y, x }
    }

    /// Offset this point by another (saturating)
    #[must_use]
    pub const fn offset(self, by: Point) -> Self {
        Self {
            y: self.y.saturating_add(by.y),
            x: self.x.saturating_add(by.x),
        }
    }
}

/// A size in cells
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub rows: u16,
    pub cols: u16,
}

impl Size {
    pub const fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }

    pub const fn is_empty(self) -> bool {
        self.rows == 0 || self.cols == 0
    }
}

/// A rectangular region: origin plus size
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    pub const fn from_coords(y: u16, x: u16, rows: u16, cols: u16) -> Self {
        Self {
            origin: Point::new(y, x),
            size: Size::new(rows, cols),
        }
    }

    pub const fn rows(&self) -> u16 {
        self.size.rows
    }

    pub const fn cols(&self) -> u16 {
        self.size.cols
    }

    /// One past the last row
    pub const fn bottom(&self) -> u16 {
        self.origin.y.saturating_add(self.size.rows)
    }

    /// One past the last column
    pub const fn right(&self) -> u16 {
        self.origin.x.saturating_add(self.size.cols)
    }

    pub const fn contains(&self, at: Point) -> bool {
        at.y >= self.origin.y && at.y < self.bottom() && at.x >= self.origin.x && at.x < self.right()
    }

    /// Whether `inner` (relative to this rect's origin) fits inside it
    pub const fn fits(&self, inner: &Rect) -> bool {
        inner.bottom() <= self.size.rows && inner.right() <= self.size.cols
    }
}

/// Column at which text of `text_width` starts when centered in `container`
pub fn centered(container: u16, text_width: u16) -> u16 {
    container.saturating_sub(text_width) / 2
}

/// Clamp a `usize` measurement into the cell coordinate range
pub fn to_cells(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}
