//! Test Utilities
//!
//! A [`ScriptedBackend`] that records every backend call and replays a fixed
//! key sequence, and a [`ScriptedWaiter`] that hands out a preset rendezvous
//! result. Both are available to unit tests and, through the `testing`
//! feature, to integration tests.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use crate::backend::{BorderStyle, TerminalBackend, WindowId};
use crate::error::BackendError;
use crate::geometry::{Point, Rect, Size};
use crate::keys::Key;
use crate::rendezvous::{ChannelKey, ChannelOp, RendezvousError, RendezvousWaiter, SignalValue};
use crate::theme::{Attr, Color, ColorPair, PairId};

/// One recorded backend call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Init,
    Teardown,
    RegisterColor(PairId),
    DefaultColors(Color, Color),
    CreateWindow(WindowId, Rect),
    CreateSub {
        id: WindowId,
        parent: WindowId,
        area: Rect,
    },
    CreatePad(WindowId, Size),
    Destroy(WindowId),
    Move(WindowId, Point),
    Border(WindowId, BorderStyle),
    Write {
        window: WindowId,
        at: Point,
        text: String,
        attr: Attr,
    },
    Background(WindowId, Attr),
    Clear(WindowId),
    Cursor(WindowId, Option<Point>),
    Refresh(WindowId),
    RefreshRegion {
        pad: WindowId,
        top_row: u16,
        left_col: u16,
        screen: Rect,
    },
    ReadKey(Key),
}

/// Recording backend with a scripted key queue
#[derive(Debug)]
pub struct ScriptedBackend {
    size: Size,
    keys: VecDeque<Key>,
    calls: Vec<Call>,
    live: BTreeMap<WindowId, Option<WindowId>>,
    next_id: u32,
    fail_init: bool,
    create_budget: Option<usize>,
}

impl ScriptedBackend {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            keys: VecDeque::new(),
            calls: Vec::new(),
            live: BTreeMap::new(),
            next_id: 1,
            fail_init: false,
            create_budget: None,
        }
    }

    /// Queue keys returned by successive `read_key` calls
    #[must_use]
    pub fn with_keys(mut self, keys: impl IntoIterator<Item = Key>) -> Self {
        self.keys.extend(keys);
        self
    }

    /// Make `init` fail
    #[must_use]
    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// Allow only `n` more window creations; the next one fails
    #[must_use]
    pub fn with_create_budget(mut self, n: usize) -> Self {
        self.create_budget = Some(n);
        self
    }

    pub fn push_keys(&mut self, keys: impl IntoIterator<Item = Key>) {
        self.keys.extend(keys);
    }

    pub fn keys_remaining(&self) -> usize {
        self.keys.len()
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    /// Windows created and not destroyed (the root screen excluded)
    pub fn live_windows(&self) -> usize {
        self.live.len()
    }

    /// Every text written to `window`, in order
    pub fn writes_to(&self, window: WindowId) -> Vec<(Point, String)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Write {
                    window: w, at, text, ..
                } if *w == window => Some((*at, text.clone())),
                _ => None,
            })
            .collect()
    }

    /// Every text written anywhere, in order
    pub fn all_text(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Write { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Top rows passed to successive pad refreshes
    pub fn region_tops(&self) -> Vec<u16> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::RefreshRegion { top_row, .. } => Some(*top_row),
                _ => None,
            })
            .collect()
    }

    /// Ids of created windows (any kind) in creation order
    pub fn created(&self) -> Vec<WindowId> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::CreateWindow(id, _) | Call::CreatePad(id, _) => Some(*id),
                Call::CreateSub { id, .. } => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Ids of destroyed windows in destruction order
    pub fn destroyed(&self) -> Vec<WindowId> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Destroy(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    fn allocate(&mut self, parent: Option<WindowId>) -> Result<WindowId, BackendError> {
        if let Some(budget) = self.create_budget.as_mut() {
            if *budget == 0 {
                return Err(BackendError::Geometry("creation budget exhausted".into()));
            }
            *budget -= 1;
        }
        let id = WindowId(self.next_id);
        self.next_id += 1;
        self.live.insert(id, parent);
        Ok(id)
    }

    fn check(&self, id: WindowId) -> Result<(), BackendError> {
        if id == WindowId::SCREEN || self.live.contains_key(&id) {
            Ok(())
        } else {
            Err(BackendError::UnknownWindow(id))
        }
    }
}

impl TerminalBackend for ScriptedBackend {
    fn init(&mut self) -> Result<(), BackendError> {
        if self.fail_init {
            return Err(BackendError::Io(std::io::Error::other("not a terminal")));
        }
        self.calls.push(Call::Init);
        Ok(())
    }

    fn teardown(&mut self) -> Result<(), BackendError> {
        self.calls.push(Call::Teardown);
        Ok(())
    }

    fn register_color(&mut self, pair: ColorPair) -> Result<(), BackendError> {
        self.calls.push(Call::RegisterColor(pair.id));
        Ok(())
    }

    fn set_default_colors(&mut self, fg: Color, bg: Color) -> Result<(), BackendError> {
        self.calls.push(Call::DefaultColors(fg, bg));
        Ok(())
    }

    fn screen_size(&self) -> Size {
        self.size
    }

    fn create_window(&mut self, area: Rect) -> Result<WindowId, BackendError> {
        let id = self.allocate(None)?;
        self.calls.push(Call::CreateWindow(id, area));
        Ok(id)
    }

    fn create_subwindow(&mut self, parent: WindowId, area: Rect) -> Result<WindowId, BackendError> {
        self.check(parent)?;
        let id = self.allocate(Some(parent))?;
        self.calls.push(Call::CreateSub { id, parent, area });
        Ok(id)
    }

    fn create_pad(&mut self, size: Size) -> Result<WindowId, BackendError> {
        let id = self.allocate(None)?;
        self.calls.push(Call::CreatePad(id, size));
        Ok(id)
    }

    fn destroy_window(&mut self, id: WindowId) -> Result<(), BackendError> {
        if self.live.remove(&id).is_none() {
            return Err(BackendError::UnknownWindow(id));
        }
        self.calls.push(Call::Destroy(id));
        Ok(())
    }

    fn move_window(&mut self, id: WindowId, origin: Point) -> Result<(), BackendError> {
        self.check(id)?;
        self.calls.push(Call::Move(id, origin));
        Ok(())
    }

    fn draw_border(&mut self, id: WindowId, style: BorderStyle) -> Result<(), BackendError> {
        self.check(id)?;
        self.calls.push(Call::Border(id, style));
        Ok(())
    }

    fn write_text(
        &mut self,
        id: WindowId,
        at: Point,
        text: &str,
        attr: Attr,
    ) -> Result<(), BackendError> {
        self.check(id)?;
        self.calls.push(Call::Write {
            window: id,
            at,
            text: text.to_string(),
            attr,
        });
        Ok(())
    }

    fn set_background(&mut self, id: WindowId, attr: Attr) -> Result<(), BackendError> {
        self.check(id)?;
        self.calls.push(Call::Background(id, attr));
        Ok(())
    }

    fn clear(&mut self, id: WindowId) -> Result<(), BackendError> {
        self.check(id)?;
        self.calls.push(Call::Clear(id));
        Ok(())
    }

    fn set_cursor(&mut self, id: WindowId, at: Option<Point>) -> Result<(), BackendError> {
        self.check(id)?;
        self.calls.push(Call::Cursor(id, at));
        Ok(())
    }

    fn refresh(&mut self, id: WindowId) -> Result<(), BackendError> {
        self.check(id)?;
        self.calls.push(Call::Refresh(id));
        Ok(())
    }

    fn refresh_region(
        &mut self,
        pad: WindowId,
        top_row: u16,
        left_col: u16,
        screen: Rect,
    ) -> Result<(), BackendError> {
        self.check(pad)?;
        self.calls.push(Call::RefreshRegion {
            pad,
            top_row,
            left_col,
            screen,
        });
        Ok(())
    }

    fn read_key(&mut self) -> Result<Key, BackendError> {
        let key = self.keys.pop_front().ok_or(BackendError::InputClosed)?;
        self.calls.push(Call::ReadKey(key));
        Ok(key)
    }
}

/// Rendezvous waiter returning a preset outcome
#[derive(Debug)]
pub struct ScriptedWaiter {
    outcome: Option<Result<SignalValue, RendezvousError>>,
    waits: Vec<(ChannelKey, Option<Duration>)>,
}

impl ScriptedWaiter {
    /// Deliver `value` on the first wait
    pub fn value(value: i32) -> Self {
        Self {
            outcome: Some(Ok(SignalValue(value))),
            waits: Vec::new(),
        }
    }

    /// Fail the first wait as if the channel could not be opened
    pub fn unavailable() -> Self {
        Self {
            outcome: None,
            waits: Vec::new(),
        }
    }

    /// Channels waited on, with their timeouts
    pub fn waits(&self) -> &[(ChannelKey, Option<Duration>)] {
        &self.waits
    }
}

impl RendezvousWaiter for ScriptedWaiter {
    fn wait_for_signal(
        &mut self,
        key: ChannelKey,
        timeout: Option<Duration>,
    ) -> Result<SignalValue, RendezvousError> {
        self.waits.push((key, timeout));
        self.outcome
            .take()
            .unwrap_or_else(|| {
                Err(RendezvousError::ChannelUnavailable {
                    key,
                    op: ChannelOp::Open,
                    source: std::io::Error::other("scripted channel unavailable"),
                })
            })
    }
}
