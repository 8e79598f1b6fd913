//! Paged Document Viewer
//!
//! Renders a document into an off-screen pad and shows a slice of it through
//! a fixed viewport inside a bordered frame. Two modes:
//!
//! - [`Viewer::run`]: Up/Down scroll, F<n> or Backspace closes and is returned
//! - [`Viewer::run_until_signal`]: renders once, then blocks on a
//!   [`RendezvousWaiter`] and returns the delivered value; the keyboard is
//!   never read
//!
//! # Layout
//!
//! For a screen of `rows x cols`:
//!
//! ```text
//! frame     (2, 1)  sized rows-4 x cols-2, bordered
//! viewport  rows 3..=rows-7, cols 2..=cols-5 of the screen
//! pad       total_rows x cols-6, text from column 1, wrapped at cols-7
//! ```
//!
//! A pad holds at most [`PAD_ROW_LIMIT`] rows. Longer documents keep a band
//! of that many rows in the pad and refill it around the view when scrolling
//! leaves the band.

use tracing::{debug, info};

use crate::backend::{BorderStyle, TerminalBackend};
use crate::chrome::center_title;
use crate::error::WidgetError;
use crate::geometry::{to_cells, Point, Rect, Size};
use crate::keys::{Key, KeyBindings};
use crate::pager::{Pagination, ScrollState};
use crate::rendezvous::{RendezvousSettings, RendezvousWaiter, SignalValue};
use crate::theme::Attr;
use crate::window::{Window, WindowManager};

/// Smallest screen that leaves a one-row viewport
pub const MIN_VIEWER_SCREEN: Size = Size::new(10, 10);

/// Column of the pad where text starts
const TEXT_MARGIN: u16 = 1;

/// Tallest pad a backend can address
pub const PAD_ROW_LIMIT: usize = u16::MAX as usize;

/// Viewer geometry for one screen size
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewerLayout {
    /// Bordered frame, absolute
    pub frame: Rect,
    /// Screen rectangle the pad slice is copied into
    pub viewport: Rect,
    /// Wrap width for document lines
    pub content_width: u16,
}

impl ViewerLayout {
    /// # Errors
    ///
    /// [`WidgetError::LayoutTooSmall`] below [`MIN_VIEWER_SCREEN`].
    pub fn for_screen(screen: Size) -> Result<Self, WidgetError> {
        if screen.rows < MIN_VIEWER_SCREEN.rows || screen.cols < MIN_VIEWER_SCREEN.cols {
            return Err(WidgetError::LayoutTooSmall {
                screen,
                needed: MIN_VIEWER_SCREEN,
            });
        }
        Ok(Self {
            frame: Rect::from_coords(2, 1, screen.rows - 4, screen.cols - 2),
            viewport: Rect::from_coords(3, 2, screen.rows - 9, screen.cols - 6),
            content_width: screen.cols - 7,
        })
    }

    pub fn visible_rows(&self) -> usize {
        usize::from(self.viewport.rows())
    }

    fn pad_size(&self, band: &Band) -> Size {
        Size::new(to_cells(band.rows), self.content_width + TEXT_MARGIN)
    }
}

/// Document rows currently held by the pad
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Band {
    start: usize,
    rows: usize,
    total: usize,
}

impl Band {
    fn new(total: usize, capacity: usize) -> Self {
        Self {
            start: 0,
            rows: total.min(capacity).max(1),
            total,
        }
    }

    fn holds(&self, first_row: usize, visible: usize) -> bool {
        let end = (first_row + visible).min(self.total);
        first_row >= self.start && end <= self.start + self.rows
    }

    /// Center the band on the view if the view left it; returns whether it moved
    fn follow(&mut self, first_row: usize, visible: usize) -> bool {
        if self.holds(first_row, visible) {
            return false;
        }
        let slack = self.rows.saturating_sub(visible) / 2;
        let last_start = self.total.saturating_sub(self.rows);
        self.start = first_row.saturating_sub(slack).min(last_start);
        true
    }

    /// Pad row showing document row `row`
    fn pad_row(&self, row: usize) -> usize {
        row.saturating_sub(self.start)
    }
}

/// A document to view
#[derive(Clone, Debug, Default)]
pub struct Viewer {
    text: String,
    title: String,
}

impl Viewer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            title: String::new(),
        }
    }

    /// Title centered on the frame's top border
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Lay the document out for `layout`
    pub fn paginate(&self, layout: &ViewerLayout) -> Pagination {
        Pagination::new(&self.text, usize::from(layout.content_width))
    }

    /// Browse with Up/Down until a cancel key; returns that key
    ///
    /// # Errors
    ///
    /// Returns layout and backend failures. Windows are destroyed on every
    /// path.
    pub fn run<B: TerminalBackend>(
        &self,
        wm: &mut WindowManager<B>,
        bindings: &KeyBindings,
    ) -> Result<Key, WidgetError> {
        let layout = ViewerLayout::for_screen(wm.screen_size())?;
        let pages = self.paginate(&layout);
        let mut band = Band::new(pages.total_rows(), PAD_ROW_LIMIT);
        let (pad, frame) = self.post(wm, &layout, &pages, &band)?;
        debug!(rows = pages.total_rows(), pad_rows = band.rows, "viewer posted");

        let key = Self::browse(wm, &pad, &frame, &layout, &pages, &mut band, bindings);
        let unposted = wm.dismiss(vec![pad, frame]);

        let key = key?;
        unposted?;
        debug!(?key, "viewer closed");
        Ok(key)
    }

    /// Render once and block until another process delivers a value
    ///
    /// # Errors
    ///
    /// Channel failures come back as [`WidgetError::Rendezvous`] and are not
    /// fatal. Windows are destroyed on every path.
    pub fn run_until_signal<B: TerminalBackend, W: RendezvousWaiter>(
        &self,
        wm: &mut WindowManager<B>,
        waiter: &mut W,
        settings: &RendezvousSettings,
    ) -> Result<SignalValue, WidgetError> {
        let layout = ViewerLayout::for_screen(wm.screen_size())?;
        let pages = self.paginate(&layout);
        let band = Band::new(pages.total_rows(), PAD_ROW_LIMIT);
        let (pad, frame) = self.post(wm, &layout, &pages, &band)?;
        debug!(
            rows = pages.total_rows(),
            channel = %settings.channel,
            "viewer posted, awaiting signal"
        );

        let shown = Self::show(wm, &pad, &frame, &layout, 0);
        let value = match shown {
            Ok(()) => waiter
                .wait_for_signal(settings.channel, settings.timeout)
                .map_err(WidgetError::from),
            Err(e) => Err(e),
        };
        let unposted = wm.dismiss(vec![pad, frame]);

        let value = value?;
        unposted?;
        info!(%value, "viewer closed by signal");
        Ok(value)
    }

    /// Create and fill the pad and frame; nothing is left behind on error
    fn post<B: TerminalBackend>(
        &self,
        wm: &mut WindowManager<B>,
        layout: &ViewerLayout,
        pages: &Pagination,
        band: &Band,
    ) -> Result<(Window, Window), WidgetError> {
        let pad = wm.create_pad(layout.pad_size(band))?;
        let frame = match wm.create(layout.frame, Some(BorderStyle::Ascii)) {
            Ok(frame) => frame,
            Err(e) => {
                let _ = wm.dismiss(vec![pad]);
                return Err(e);
            }
        };
        if let Err(e) = self.draw(wm, &pad, &frame, pages, band) {
            let _ = wm.dismiss(vec![pad, frame]);
            return Err(e);
        }
        Ok((pad, frame))
    }

    fn draw<B: TerminalBackend>(
        &self,
        wm: &mut WindowManager<B>,
        pad: &Window,
        frame: &Window,
        pages: &Pagination,
        band: &Band,
    ) -> Result<(), WidgetError> {
        wm.set_background(pad, Attr::plain())?;
        Self::fill(wm, pad, pages, band)?;

        wm.set_background(frame, Attr::plain())?;
        wm.clear(frame)?;
        wm.border(frame, BorderStyle::Ascii)?;
        if !self.title.is_empty() {
            center_title(wm, frame, &self.title, Attr::plain().bold())?;
        }
        Ok(())
    }

    /// Write the band's rows into the pad
    fn fill<B: TerminalBackend>(
        wm: &mut WindowManager<B>,
        pad: &Window,
        pages: &Pagination,
        band: &Band,
    ) -> Result<(), WidgetError> {
        for (row, chunk) in pages.rows().skip(band.start).take(band.rows) {
            let at = Point::new(to_cells(band.pad_row(row)), TEXT_MARGIN);
            wm.write(pad, at, chunk, Attr::plain())?;
        }
        Ok(())
    }

    fn browse<B: TerminalBackend>(
        wm: &mut WindowManager<B>,
        pad: &Window,
        frame: &Window,
        layout: &ViewerLayout,
        pages: &Pagination,
        band: &mut Band,
        bindings: &KeyBindings,
    ) -> Result<Key, WidgetError> {
        let visible = layout.visible_rows();
        let mut scroll = ScrollState::new(pages.total_rows(), visible);
        Self::show(wm, pad, frame, layout, band.pad_row(scroll.first_row()))?;

        loop {
            let key = wm.read_key()?;
            if bindings.is_cancel(key) {
                return Ok(key);
            }
            let moved = match key {
                Key::Down => scroll.scroll_down(),
                Key::Up => scroll.scroll_up(),
                _ => false,
            };
            if !moved {
                continue;
            }
            if band.follow(scroll.first_row(), visible) {
                debug!(start = band.start, "viewer pad refilled");
                wm.clear(pad)?;
                Self::fill(wm, pad, pages, band)?;
            }
            Self::show(wm, pad, frame, layout, band.pad_row(scroll.first_row()))?;
        }
    }

    /// Frame first, then the visible pad slice on top of it
    fn show<B: TerminalBackend>(
        wm: &mut WindowManager<B>,
        pad: &Window,
        frame: &Window,
        layout: &ViewerLayout,
        pad_row: usize,
    ) -> Result<(), WidgetError> {
        wm.refresh(frame)?;
        wm.refresh_region(pad, to_cells(pad_row), 0, layout.viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendezvous::{ChannelKey, RendezvousError};
    use crate::testing::{Call, ScriptedBackend, ScriptedWaiter};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn manager(keys: impl IntoIterator<Item = Key>) -> WindowManager<ScriptedBackend> {
        WindowManager::new(ScriptedBackend::new(Size::new(24, 80)).with_keys(keys))
    }

    fn numbered(lines: usize) -> String {
        (0..lines).map(|i| format!("line {i}\n")).collect()
    }

    #[test]
    fn test_layout_for_standard_screen() {
        let layout = ViewerLayout::for_screen(Size::new(24, 80)).unwrap();
        assert_eq!(layout.frame, Rect::from_coords(2, 1, 20, 78));
        assert_eq!(layout.viewport, Rect::from_coords(3, 2, 15, 74));
        assert_eq!(layout.content_width, 73);
        // Last viewport cell is (rows-7, cols-5)
        assert_eq!(layout.viewport.bottom() - 1, 17);
        assert_eq!(layout.viewport.right() - 1, 75);
    }

    #[test]
    fn test_short_document_never_scrolls() {
        let mut wm = manager(std::iter::repeat(Key::Down).take(5).chain([Key::F(3)]));
        let key = Viewer::new("a\nb\nc\n")
            .run(&mut wm, &KeyBindings::default())
            .unwrap();
        assert_eq!(key, Key::F(3));
        assert_eq!(wm.backend().region_tops(), vec![0]);
        assert_eq!(wm.live_windows(), 0);
        assert_eq!(wm.backend().live_windows(), 0);
    }

    #[test]
    fn test_down_clamps_at_last_page() {
        // 40 rows through a 15-row viewport: bottom at 25
        let mut wm = manager(std::iter::repeat(Key::Down).take(30).chain([Key::F(3)]));
        Viewer::new(numbered(40))
            .run(&mut wm, &KeyBindings::default())
            .unwrap();
        let tops = wm.backend().region_tops();
        assert_eq!(tops, (0..=25).collect::<Vec<u16>>());
    }

    #[test]
    fn test_up_at_top_does_not_redraw() {
        let mut wm = manager([Key::Up, Key::Up, Key::Down, Key::Up, Key::Backspace]);
        let key = Viewer::new(numbered(40))
            .run(&mut wm, &KeyBindings::default())
            .unwrap();
        assert_eq!(key, Key::Backspace);
        assert_eq!(wm.backend().region_tops(), vec![0, 1, 0]);
    }

    #[test]
    fn test_frame_refreshed_before_pad_slice() {
        let mut wm = manager([Key::F(3)]);
        Viewer::new("text").run(&mut wm, &KeyBindings::default()).unwrap();
        let calls = wm.backend().calls();
        let region = calls
            .iter()
            .position(|c| matches!(c, Call::RefreshRegion { .. }))
            .unwrap();
        assert!(matches!(calls[region - 1], Call::Refresh(_)));
    }

    #[test]
    fn test_text_written_after_margin() {
        let mut wm = manager([Key::F(3)]);
        Viewer::new("hello\nworld")
            .run(&mut wm, &KeyBindings::default())
            .unwrap();
        let pad = wm.backend().created()[0];
        assert_eq!(
            wm.backend().writes_to(pad),
            vec![
                (Point::new(0, 1), "hello".to_string()),
                (Point::new(1, 1), "world".to_string()),
            ]
        );
    }

    #[test]
    fn test_tiny_screen_is_rejected_without_windows() {
        let mut wm = WindowManager::new(ScriptedBackend::new(Size::new(8, 40)));
        let err = Viewer::new("x")
            .run(&mut wm, &KeyBindings::default())
            .unwrap_err();
        assert!(matches!(err, WidgetError::LayoutTooSmall { .. }));
        assert!(wm.backend().created().is_empty());
    }

    #[test]
    fn test_band_follows_view_at_both_ends() {
        let mut band = Band::new(100, 20);
        assert_eq!(band.rows, 20);
        assert!(!band.follow(5, 15));
        assert!(band.follow(6, 15));
        // Slack of (20 - 15) / 2 rows above the view
        assert_eq!(band.start, 4);
        assert!(band.follow(90, 15));
        assert_eq!(band.start, 80);
        assert_eq!(band.pad_row(85), 5);
        assert!(band.follow(0, 15));
        assert_eq!(band.start, 0);
    }

    #[test]
    fn test_short_band_holds_whole_document() {
        let band = Band::new(3, PAD_ROW_LIMIT);
        assert_eq!(band.rows, 3);
        assert!(band.holds(0, 15));
    }

    #[test]
    fn test_document_taller_than_pad_limit_reaches_its_end() {
        let total = PAD_ROW_LIMIT + 4465;
        let downs = total - 15;
        let mut wm = manager(std::iter::repeat(Key::Down).take(downs).chain([Key::F(3)]));
        Viewer::new(numbered(total))
            .run(&mut wm, &KeyBindings::default())
            .unwrap();

        let backend = wm.backend();
        let pad = backend.created()[0];
        let writes = backend.writes_to(pad);
        assert!(writes.iter().all(|(at, _)| usize::from(at.y) < PAD_ROW_LIMIT));
        assert_eq!(
            writes.last(),
            Some(&(
                Point::new(to_cells(PAD_ROW_LIMIT - 1), 1),
                format!("line {}", total - 1)
            ))
        );
        // Last view: document rows total-15.. shown from the refilled band
        let tops = backend.region_tops();
        assert_eq!(tops.len(), downs + 1);
        assert_eq!(tops.last(), Some(&to_cells(PAD_ROW_LIMIT - 15)));
        assert_eq!(wm.live_windows(), 0);
    }

    #[test]
    fn test_signal_value_returned_without_reading_keys() {
        let mut wm = manager([Key::Down]);
        let mut waiter = ScriptedWaiter::value(7);
        let value = Viewer::new("a\nb\nc\n")
            .run_until_signal(&mut wm, &mut waiter, &RendezvousSettings::default())
            .unwrap();

        assert_eq!(value, SignalValue(7));
        assert_eq!(wm.backend().keys_remaining(), 1);
        assert!(!wm
            .backend()
            .calls()
            .iter()
            .any(|c| matches!(c, Call::ReadKey(_))));
        assert_eq!(waiter.waits(), &[(ChannelKey::DEFAULT, None)]);
        assert_eq!(wm.backend().live_windows(), 0);
    }

    #[test]
    fn test_signal_settings_forwarded() {
        let mut wm = WindowManager::new(ScriptedBackend::new(Size::new(24, 80)));
        let mut waiter = ScriptedWaiter::value(1);
        let settings = RendezvousSettings::default()
            .with_channel(ChannelKey(99))
            .with_timeout(Some(Duration::from_secs(2)));
        Viewer::new("")
            .run_until_signal(&mut wm, &mut waiter, &settings)
            .unwrap();
        assert_eq!(
            waiter.waits(),
            &[(ChannelKey(99), Some(Duration::from_secs(2)))]
        );
    }

    #[test]
    fn test_unavailable_channel_is_sentinel_and_tears_down() {
        let mut wm = WindowManager::new(ScriptedBackend::new(Size::new(24, 80)));
        let mut waiter = ScriptedWaiter::unavailable();
        let err = Viewer::new("doc")
            .run_until_signal(&mut wm, &mut waiter, &RendezvousSettings::default())
            .unwrap_err();
        assert!(matches!(
            err,
            WidgetError::Rendezvous(RendezvousError::ChannelUnavailable { .. })
        ));
        assert!(!err.is_fatal());
        assert_eq!(wm.live_windows(), 0);
        assert_eq!(wm.backend().live_windows(), 0);
    }
}
