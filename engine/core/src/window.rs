//! Window Ownership and Lifecycle
//!
//! The [`WindowManager`] owns the backend and every window created through
//! it. A [`Window`] is an owned, non-clonable handle: destroying it consumes
//! the handle, so a window is destroyed at most once, and the raw backend id
//! never leaves this crate.
//!
//! Widgets follow one discipline on every exit path:
//!
//! ```text
//! create frame → create content (child) → draw/refresh → drive input
//!     → dismiss: clear all → refresh all → destroy child → destroy frame
//! ```
//!
//! Destroying a parent that still has live children is refused.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::backend::{BorderStyle, TerminalBackend, WindowId};
use crate::error::{BackendError, WidgetError};
use crate::geometry::{Point, Rect, Size};
use crate::keys::Key;
use crate::theme::Attr;

type Result<T> = std::result::Result<T, WidgetError>;

/// What kind of region a window is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowKind {
    /// Positioned on the screen
    TopLevel,
    /// Nested in (and positioned relative to) a parent window
    Sub { parent: WindowId },
    /// Off-screen canvas
    Pad,
}

/// Owned handle to a backend window
#[derive(Debug)]
pub struct Window {
    id: WindowId,
    area: Rect,
    kind: WindowKind,
}

impl Window {
    /// Area as given at creation: absolute for top-level windows, relative
    /// to the parent for sub-windows, origin-anchored for pads
    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn size(&self) -> Size {
        self.area.size
    }

    pub fn kind(&self) -> WindowKind {
        self.kind
    }

    pub fn is_pad(&self) -> bool {
        self.kind == WindowKind::Pad
    }

    pub(crate) fn id(&self) -> WindowId {
        self.id
    }
}

#[derive(Debug)]
struct LiveWindow {
    kind: WindowKind,
    children: usize,
}

/// Owns the backend and tracks live windows
pub struct WindowManager<B> {
    backend: B,
    live: BTreeMap<WindowId, LiveWindow>,
}

impl<B: TerminalBackend> WindowManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            live: BTreeMap::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn screen_size(&self) -> Size {
        self.backend.screen_size()
    }

    /// Number of windows created and not yet destroyed
    pub fn live_windows(&self) -> usize {
        self.live.len()
    }

    /// Create a top-level window, optionally bordered
    ///
    /// # Errors
    ///
    /// Returns the backend failure; no window is left behind on error.
    pub fn create(&mut self, area: Rect, border: Option<BorderStyle>) -> Result<Window> {
        let id = self.backend.create_window(area)?;
        if let Some(style) = border {
            if let Err(e) = self.backend.draw_border(id, style) {
                let _ = self.backend.destroy_window(id);
                return Err(e.into());
            }
        }
        self.track(id, WindowKind::TopLevel);
        debug!(window = id.0, ?area, "window created");
        Ok(Window {
            id,
            area,
            kind: WindowKind::TopLevel,
        })
    }

    /// Create a window nested in `parent`; `area` is parent-relative
    ///
    /// # Errors
    ///
    /// Fails if `area` does not fit inside the parent or the backend refuses.
    pub fn create_sub(&mut self, parent: &Window, area: Rect) -> Result<Window> {
        if !parent.area.fits(&area) {
            return Err(BackendError::Geometry(format!(
                "sub-window {area:?} does not fit in parent of size {:?}",
                parent.size()
            ))
            .into());
        }
        let id = self.backend.create_subwindow(parent.id, area)?;
        let kind = WindowKind::Sub { parent: parent.id };
        self.track(id, kind);
        if let Some(record) = self.live.get_mut(&parent.id) {
            record.children += 1;
        }
        debug!(window = id.0, parent = parent.id.0, ?area, "sub-window created");
        Ok(Window { id, area, kind })
    }

    /// Create an off-screen canvas
    ///
    /// # Errors
    ///
    /// Returns the backend failure.
    pub fn create_pad(&mut self, size: Size) -> Result<Window> {
        let id = self.backend.create_pad(size)?;
        self.track(id, WindowKind::Pad);
        debug!(window = id.0, ?size, "pad created");
        Ok(Window {
            id,
            area: Rect::new(Point::ORIGIN, size),
            kind: WindowKind::Pad,
        })
    }

    /// Reposition a window (children move with it)
    ///
    /// # Errors
    ///
    /// Returns the backend failure.
    pub fn move_to(&mut self, window: &mut Window, origin: Point) -> Result<()> {
        self.backend.move_window(window.id, origin)?;
        self.backend.refresh(window.id)?;
        window.area.origin = origin;
        Ok(())
    }

    /// Destroy a window, consuming its handle
    ///
    /// # Errors
    ///
    /// Refuses with [`WidgetError::WindowInUse`] while children are live;
    /// the backend window then stays allocated until [`Self::sweep`].
    pub fn destroy(&mut self, window: Window) -> Result<()> {
        let children = self.live.get(&window.id).map_or(0, |w| w.children);
        if children > 0 {
            warn!(window = window.id.0, children, "refusing to destroy parent before children");
            return Err(WidgetError::WindowInUse {
                id: window.id,
                children,
            });
        }
        self.backend.destroy_window(window.id)?;
        self.untrack(window.id);
        debug!(window = window.id.0, "window destroyed");
        Ok(())
    }

    /// Unpost a widget's windows: clear and refresh them all, then destroy
    /// them in reverse creation order
    ///
    /// `windows` must be in creation order. Every window is destroyed even if
    /// an earlier step fails; the first failure is returned.
    ///
    /// # Errors
    ///
    /// Returns the first backend failure encountered.
    pub fn dismiss(&mut self, windows: Vec<Window>) -> Result<()> {
        let mut first_error: Option<WidgetError> = None;
        let mut note = |result: Result<()>| {
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        };

        for window in windows.iter().filter(|w| !w.is_pad()) {
            note(self.clear(window));
        }
        for window in windows.iter().filter(|w| !w.is_pad()) {
            note(self.refresh(window));
        }
        for window in windows.into_iter().rev() {
            note(self.destroy(window));
        }
        note(self.backend.refresh(WindowId::SCREEN).map_err(Into::into));

        first_error.map_or(Ok(()), Err)
    }

    /// Destroy every window still live, children first
    ///
    /// Returns the number of windows swept. Only reached when a widget
    /// failed to dismiss its windows.
    pub fn sweep(&mut self) -> usize {
        let mut swept = 0;
        loop {
            let Some(id) = self
                .live
                .iter()
                .find(|(_, w)| w.children == 0)
                .map(|(id, _)| *id)
            else {
                break;
            };
            warn!(window = id.0, "sweeping leaked window");
            if let Err(e) = self.backend.destroy_window(id) {
                warn!(window = id.0, error = %e, "backend refused to destroy leaked window");
            }
            self.untrack(id);
            swept += 1;
        }
        swept
    }

    // ------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns the backend failure.
    pub fn write(&mut self, window: &Window, at: Point, text: &str, attr: Attr) -> Result<()> {
        Ok(self.backend.write_text(window.id, at, text, attr)?)
    }

    /// # Errors
    ///
    /// Returns the backend failure.
    pub fn border(&mut self, window: &Window, style: BorderStyle) -> Result<()> {
        Ok(self.backend.draw_border(window.id, style)?)
    }

    /// # Errors
    ///
    /// Returns the backend failure.
    pub fn set_background(&mut self, window: &Window, attr: Attr) -> Result<()> {
        Ok(self.backend.set_background(window.id, attr)?)
    }

    /// # Errors
    ///
    /// Returns the backend failure.
    pub fn clear(&mut self, window: &Window) -> Result<()> {
        Ok(self.backend.clear(window.id)?)
    }

    /// # Errors
    ///
    /// Returns the backend failure.
    pub fn set_cursor(&mut self, window: &Window, at: Option<Point>) -> Result<()> {
        Ok(self.backend.set_cursor(window.id, at)?)
    }

    /// # Errors
    ///
    /// Returns the backend failure.
    pub fn refresh(&mut self, window: &Window) -> Result<()> {
        Ok(self.backend.refresh(window.id)?)
    }

    /// Copy the visible slice of a pad onto `screen`
    ///
    /// # Errors
    ///
    /// Returns the backend failure.
    pub fn refresh_region(
        &mut self,
        pad: &Window,
        top_row: u16,
        left_col: u16,
        screen: Rect,
    ) -> Result<()> {
        Ok(self.backend.refresh_region(pad.id, top_row, left_col, screen)?)
    }

    /// Block until the next key press
    ///
    /// # Errors
    ///
    /// Returns the backend failure.
    pub fn read_key(&mut self) -> Result<Key> {
        Ok(self.backend.read_key()?)
    }

    // ------------------------------------------------------------------
    // Root screen
    // ------------------------------------------------------------------

    /// Print text on the root screen and refresh it
    ///
    /// # Errors
    ///
    /// Returns the backend failure.
    pub fn print_at(&mut self, at: Point, text: &str, attr: Attr) -> Result<()> {
        self.backend.write_text(WindowId::SCREEN, at, text, attr)?;
        Ok(self.backend.refresh(WindowId::SCREEN)?)
    }

    /// Fill the root screen with `attr`, border it and refresh
    ///
    /// # Errors
    ///
    /// Returns the backend failure.
    pub fn backdrop(&mut self, attr: Attr, style: BorderStyle) -> Result<()> {
        self.backend.set_background(WindowId::SCREEN, attr)?;
        self.backend.clear(WindowId::SCREEN)?;
        self.backend.draw_border(WindowId::SCREEN, style)?;
        Ok(self.backend.refresh(WindowId::SCREEN)?)
    }

    /// # Errors
    ///
    /// Returns the backend failure.
    pub fn clear_screen(&mut self) -> Result<()> {
        self.backend.clear(WindowId::SCREEN)?;
        Ok(self.backend.refresh(WindowId::SCREEN)?)
    }

    fn track(&mut self, id: WindowId, kind: WindowKind) {
        self.live.insert(id, LiveWindow { kind, children: 0 });
    }

    fn untrack(&mut self, id: WindowId) {
        if let Some(LiveWindow {
            kind: WindowKind::Sub { parent },
            ..
        }) = self.live.remove(&id)
        {
            if let Some(record) = self.live.get_mut(&parent) {
                record.children = record.children.saturating_sub(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, ScriptedBackend};
    use pretty_assertions::assert_eq;

    fn manager() -> WindowManager<ScriptedBackend> {
        WindowManager::new(ScriptedBackend::new(Size::new(24, 80)))
    }

    #[test]
    fn test_create_and_destroy() {
        let mut wm = manager();
        let frame = wm
            .create(Rect::from_coords(2, 2, 6, 20), Some(BorderStyle::Ascii))
            .unwrap();
        assert_eq!(wm.live_windows(), 1);
        wm.destroy(frame).unwrap();
        assert_eq!(wm.live_windows(), 0);
        assert_eq!(wm.backend().live_windows(), 0);
    }

    #[test]
    fn test_parent_destroy_refused_while_child_live() {
        let mut wm = manager();
        let frame = wm.create(Rect::from_coords(2, 2, 6, 20), None).unwrap();
        let content = wm.create_sub(&frame, Rect::from_coords(3, 2, 2, 11)).unwrap();

        let err = wm.destroy(frame).unwrap_err();
        assert!(matches!(err, WidgetError::WindowInUse { children: 1, .. }));

        wm.destroy(content).unwrap();
        assert_eq!(wm.sweep(), 1);
        assert_eq!(wm.live_windows(), 0);
    }

    #[test]
    fn test_sub_window_must_fit() {
        let mut wm = manager();
        let frame = wm.create(Rect::from_coords(2, 2, 6, 20), None).unwrap();
        let err = wm
            .create_sub(&frame, Rect::from_coords(5, 2, 2, 11))
            .unwrap_err();
        assert!(matches!(err, WidgetError::Backend(BackendError::Geometry(_))));
        assert_eq!(wm.live_windows(), 1);
        wm.destroy(frame).unwrap();
    }

    #[test]
    fn test_dismiss_destroys_children_first() {
        let mut wm = manager();
        let frame = wm.create(Rect::from_coords(2, 2, 6, 20), None).unwrap();
        let content = wm.create_sub(&frame, Rect::from_coords(1, 1, 2, 5)).unwrap();
        let (frame_id, content_id) = (frame.id(), content.id());

        wm.backend_mut().take_calls();
        wm.dismiss(vec![frame, content]).unwrap();

        let destroyed: Vec<_> = wm
            .backend()
            .calls()
            .iter()
            .filter_map(|c| match c {
                Call::Destroy(id) => Some(*id),
                _ => None,
            })
            .collect();
        assert_eq!(destroyed, vec![content_id, frame_id]);
        assert_eq!(wm.live_windows(), 0);
    }

    #[test]
    fn test_dismiss_clears_before_destroying() {
        let mut wm = manager();
        let frame = wm.create(Rect::from_coords(0, 0, 4, 10), None).unwrap();
        let id = frame.id();
        wm.backend_mut().take_calls();
        wm.dismiss(vec![frame]).unwrap();

        let calls = wm.backend().calls();
        let clear = calls.iter().position(|c| *c == Call::Clear(id)).unwrap();
        let refresh = calls.iter().position(|c| *c == Call::Refresh(id)).unwrap();
        let destroy = calls.iter().position(|c| *c == Call::Destroy(id)).unwrap();
        assert!(clear < refresh && refresh < destroy);
    }

    #[test]
    fn test_move_updates_origin() {
        let mut wm = manager();
        let mut frame = wm.create(Rect::from_coords(0, 0, 4, 10), None).unwrap();
        wm.move_to(&mut frame, Point::new(5, 7)).unwrap();
        assert_eq!(frame.area().origin, Point::new(5, 7));
        wm.destroy(frame).unwrap();
    }
}
