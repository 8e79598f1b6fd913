//! modalterm Core - Headless Modal Widgets for Character-Cell Terminals
//!
//! This crate holds the widget state machines and the pagination engine of
//! modalterm, completely independent of any terminal framework. Rendering is
//! delegated to a [`TerminalBackend`] and external rendezvous signals to a
//! [`RendezvousWaiter`]; the crate itself only decides what to draw, when to
//! redraw, and in which order windows are created and destroyed.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Session                             │
//! │   start() ── palette ── menu / dialog / prompts / views ── stop()
//! │        │                                                     │
//! │  ┌─────┴──────┐ ┌────────────┐ ┌──────────┐ ┌─────────────┐  │
//! │  │    Menu    │ │    Form    │ │  Viewer  │ │   Prompts   │  │
//! │  │ MenuState  │ │FieldBuffer │ │Pagination│ │ yes/no, OK  │  │
//! │  └─────┬──────┘ └─────┬──────┘ └────┬─────┘ └──────┬──────┘  │
//! │        └──────────────┴──────┬──────┴──────────────┘         │
//! │                        WindowManager                         │
//! └──────────────────────────────┼───────────────────────────────┘
//!                                │
//!            TerminalBackend ────┴──── RendezvousWaiter
//!          (ratatui/crossterm)        (System V message queue)
//! ```
//!
//! # Window Lifecycle
//!
//! Every widget follows create → post → interact → unpost → destroy. All
//! windows a widget creates are destroyed before it returns, on every exit
//! path, in reverse creation order (children before parents). [`Window`]
//! handles are owned and not clonable, so a handle is destroyed at most once.
//!
//! # Module Overview
//!
//! - [`backend`]: the terminal capability surface consumed by the widgets
//! - [`window`]: window ownership and lifecycle
//! - [`menu`]: option-list selection widget
//! - [`prompt`]: message box and yes/no prompt
//! - [`form`]: single-line text entry widget
//! - [`pager`]: line wrapping, pagination and scroll state
//! - [`viewer`]: keyboard-driven and rendezvous-driven document viewer
//! - [`rendezvous`]: one-shot inter-process signal channel
//! - [`session`]: terminal session bracket and convenience surface
//! - [`config`]: TOML + environment configuration
//!
//! # No Terminal Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! terminal framework.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod chrome;
pub mod config;
pub mod error;
pub mod form;
pub mod geometry;
pub mod keys;
pub mod menu;
pub mod pager;
pub mod prompt;
pub mod rendezvous;
pub mod session;
pub mod theme;
pub mod viewer;
pub mod window;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-exports for convenience
pub use backend::{BorderStyle, TerminalBackend, WindowId};
pub use error::{BackendError, WidgetError};
pub use form::{EditOutcome, FieldBuffer, Form, FormLayout};
pub use geometry::{Point, Rect, Size};
pub use keys::{Key, KeyBindings};
pub use menu::{Menu, MenuAction, MenuLayout, MenuOutcome, MenuState};
pub use pager::{Pagination, PlacedLine, ScrollState};
pub use prompt::{message_box, yes_no};
pub use rendezvous::{
    ChannelKey, ChannelOp, RendezvousError, RendezvousSettings, RendezvousWaiter, SignalValue,
};
pub use session::{Session, SessionSettings};
pub use theme::{Attr, Color, ColorPair, PairId, Palette};
pub use viewer::{Viewer, ViewerLayout};
pub use window::{Window, WindowManager};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, LoggingSettings, ModaltermConfig, ModaltermToml,
};
