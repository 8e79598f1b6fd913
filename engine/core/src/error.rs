//! Error Types
//!
//! Text-field overflow and empty option lists are not errors: overflowing
//! inserts are rejected in place (see [`crate::form::EditOutcome`]) and empty
//! inputs render a minimal empty state.

use thiserror::Error;

use crate::backend::WindowId;
use crate::geometry::Size;
use crate::rendezvous::RendezvousError;

/// Failures reported by a [`crate::TerminalBackend`]
#[derive(Debug, Error)]
pub enum BackendError {
    /// Terminal I/O failed
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The handle does not name a live window
    #[error("unknown window {0:?}")]
    UnknownWindow(WindowId),

    /// The requested geometry does not fit
    #[error("window geometry rejected: {0}")]
    Geometry(String),

    /// Input stream ended while a key was awaited
    #[error("input stream closed")]
    InputClosed,
}

/// Errors surfaced by widgets and the session
#[derive(Debug, Error)]
pub enum WidgetError {
    /// The terminal could not be initialized; startup must abort
    #[error("terminal backend unavailable: {0}")]
    BackendUnavailable(#[source] BackendError),

    /// A backend call failed while a widget was posted
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A parent window was destroyed while it still had children
    #[error("window {id:?} still has {children} live child window(s)")]
    WindowInUse { id: WindowId, children: usize },

    /// The screen is too small for the widget's layout
    #[error("screen {screen:?} is too small, need at least {needed:?}")]
    LayoutTooSmall { screen: Size, needed: Size },

    /// The rendezvous channel failed or timed out
    #[error(transparent)]
    Rendezvous(#[from] RendezvousError),
}

impl WidgetError {
    /// Whether the process should abort rather than continue the session
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_))
    }
}
