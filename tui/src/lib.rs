//! modalterm TUI - Terminal backend for the modalterm widgets
//!
//! This crate puts the headless widgets of `modalterm-core` on a real
//! terminal.
//!
//! # Architecture
//!
//! - **Backend**: [`RatatuiBackend`] implements the widget backend trait
//! - **Compositor**: Layered rendering with z-ordering, one layer per window
//! - **Input**: Crossterm key events (or a scripted sequence in tests)
//! - **Sources**: Files and shell commands as viewer documents

pub mod backend;
pub mod compositor;
pub mod input;
pub mod sources;
pub mod theme;

pub use backend::RatatuiBackend;
pub use input::{map_key_event, CrosstermKeys, KeySource, ScriptedKeys};
pub use sources::{
    command_output, exec_view, file_view, file_view_until_signal, read_document, SourceError,
};

#[cfg(target_os = "linux")]
pub use sources::file_view_ipc;
