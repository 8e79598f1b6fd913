//! Pagination Engine
//!
//! Splits a document into logical lines, wraps each onto physical rows of a
//! fixed content width, and places them at monotonically increasing rows of
//! a virtual canvas. [`ScrollState`] tracks the first visible canvas row.
//!
//! # Line Spans
//!
//! A logical line of display width `w` occupies `max(1, ceil(w / width))`
//! rows. An empty line takes one row, and a line exactly filling the width
//! takes one row, not two.
//!
//! # Normalization
//!
//! Tabs expand to the next multiple of [`TAB_WIDTH`] columns. Other control
//! characters (including the `\r` of CRLF endings) are dropped so every
//! character placed on the canvas has a known width.

use unicode_width::UnicodeWidthChar;

/// Tab stop interval in columns
pub const TAB_WIDTH: usize = 8;

/// One logical line and the physical rows it occupies
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedLine {
    /// First canvas row of this line
    pub row: usize,
    /// Wrapped pieces, one per physical row (never empty)
    pub chunks: Vec<String>,
}

impl PlacedLine {
    /// Number of physical rows this line spans
    pub fn span(&self) -> usize {
        self.chunks.len()
    }
}

/// A document laid out for a given content width
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pagination {
    width: usize,
    lines: Vec<PlacedLine>,
    total_rows: usize,
}

impl Pagination {
    /// Lay out `text` at `width` columns (a width of 0 is treated as 1)
    pub fn new(text: &str, width: usize) -> Self {
        let width = width.max(1);
        let mut lines = Vec::new();
        let mut row = 0;
        for logical in split_lines(text) {
            let chunks = wrap(&expand(logical), width);
            let span = chunks.len();
            lines.push(PlacedLine { row, chunks });
            row += span;
        }
        Self {
            width,
            lines,
            total_rows: row,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn lines(&self) -> &[PlacedLine] {
        &self.lines
    }

    /// Logical line count (at least 1)
    pub fn logical_lines(&self) -> usize {
        self.lines.len()
    }

    /// Physical row count (at least 1)
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// Every physical row with its canvas row index, in order
    pub fn rows(&self) -> impl Iterator<Item = (usize, &str)> {
        self.lines.iter().flat_map(|line| {
            line.chunks
                .iter()
                .enumerate()
                .map(move |(i, chunk)| (line.row + i, chunk.as_str()))
        })
    }
}

/// Logical lines; a trailing line break adds no extra line and an empty
/// document is one empty line
fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        vec![""]
    } else {
        text.lines().collect()
    }
}

fn expand(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut col = 0;
    for c in line.chars() {
        if c == '\t' {
            let stop = (col / TAB_WIDTH + 1) * TAB_WIDTH;
            out.extend(std::iter::repeat(' ').take(stop - col));
            col = stop;
        } else if !c.is_control() {
            out.push(c);
            col += c.width().unwrap_or(0);
        }
    }
    out
}

/// Break `line` into pieces no wider than `width`
///
/// A character wider than `width` gets a row to itself.
fn wrap(line: &str, width: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut used = 0;
    for c in line.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            used = 0;
        }
        current.push(c);
        used += w;
    }
    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// First visible row of a canvas shown through a fixed viewport
///
/// Invariant: `0 <= first_row <= max(0, total_rows - visible_rows)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScrollState {
    first_row: usize,
    total_rows: usize,
    visible_rows: usize,
}

impl ScrollState {
    pub fn new(total_rows: usize, visible_rows: usize) -> Self {
        Self {
            first_row: 0,
            total_rows,
            visible_rows,
        }
    }

    pub fn first_row(&self) -> usize {
        self.first_row
    }

    pub fn max_first_row(&self) -> usize {
        self.total_rows.saturating_sub(self.visible_rows)
    }

    /// Returns whether the view moved
    pub fn scroll_down(&mut self) -> bool {
        if self.first_row < self.max_first_row() {
            self.first_row += 1;
            true
        } else {
            false
        }
    }

    /// Returns whether the view moved
    pub fn scroll_up(&mut self) -> bool {
        if self.first_row > 0 {
            self.first_row -= 1;
            true
        } else {
            false
        }
    }
}
