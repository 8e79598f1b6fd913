//! Document Sources
//!
//! Feed the viewer from a file or from a shell command's standard output.

use std::fs;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::{debug, warn};

use modalterm_core::backend::TerminalBackend;
use modalterm_core::error::WidgetError;
use modalterm_core::keys::Key;
use modalterm_core::rendezvous::{RendezvousWaiter, SignalValue};
use modalterm_core::session::Session;
use modalterm_core::viewer::Viewer;

/// Failures while producing or showing a document
#[derive(Debug, Error)]
pub enum SourceError {
    /// The command could not be started
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Widget(#[from] WidgetError),
}

/// File contents as text; unreadable files read as an empty document
pub fn read_document(path: &Path) -> String {
    match fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable file viewed as empty");
            String::new()
        }
    }
}

/// Standard output of `sh -c command`
///
/// # Errors
///
/// [`SourceError::Spawn`] if the shell cannot be started. A command that
/// runs and fails still yields whatever it printed.
pub fn command_output(command: &str) -> Result<String, SourceError> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|source| SourceError::Spawn {
            command: command.to_string(),
            source,
        })?;
    debug!(command, status = %output.status, bytes = output.stdout.len(), "command finished");
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn file_viewer(path: &Path) -> Viewer {
    let title = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Viewer::new(read_document(path)).with_title(title)
}

/// Browse a file; returns the key that closed the viewer
///
/// # Errors
///
/// Returns layout and backend failures.
pub fn file_view<B: TerminalBackend>(
    session: &mut Session<B>,
    path: &Path,
) -> Result<Key, SourceError> {
    Ok(session.view(&file_viewer(path))?)
}

/// Browse the output of a shell command
///
/// # Errors
///
/// Returns spawn, layout and backend failures.
pub fn exec_view<B: TerminalBackend>(
    session: &mut Session<B>,
    command: &str,
) -> Result<Key, SourceError> {
    let text = command_output(command)?;
    Ok(session.view(&Viewer::new(text).with_title(command))?)
}

/// Show a file until another process sends a value on the session channel
///
/// # Errors
///
/// Returns channel, layout and backend failures.
pub fn file_view_until_signal<B: TerminalBackend, W: RendezvousWaiter>(
    session: &mut Session<B>,
    path: &Path,
    waiter: &mut W,
) -> Result<SignalValue, SourceError> {
    Ok(session.view_until_signal(&file_viewer(path), waiter)?)
}

/// [`file_view_until_signal`] on the System V message queue
///
/// # Errors
///
/// Returns channel, layout and backend failures.
#[cfg(target_os = "linux")]
pub fn file_view_ipc<B: TerminalBackend>(
    session: &mut Session<B>,
    path: &Path,
) -> Result<SignalValue, SourceError> {
    let mut waiter = modalterm_core::rendezvous::MessageQueueWaiter::new();
    file_view_until_signal(session, path, &mut waiter)
}
