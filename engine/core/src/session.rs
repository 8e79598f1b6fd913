//! Terminal Session
//!
//! [`Session::start`] and [`Session::stop`] bracket the interactive lifetime
//! of the process. Widgets are run through the session, which hands them the
//! window manager and the configured key bindings.

use tracing::{info, warn};

use crate::backend::{BorderStyle, TerminalBackend};
use crate::chrome::print_centered;
use crate::error::{BackendError, WidgetError};
use crate::form::Form;
use crate::geometry::{Point, Size};
use crate::keys::{Key, KeyBindings};
use crate::menu::{Menu, MenuOutcome};
use crate::prompt;
use crate::rendezvous::{RendezvousSettings, RendezvousWaiter, SignalValue};
use crate::theme::{Attr, Color, Palette, RECEIPT};
use crate::viewer::Viewer;
use crate::window::WindowManager;

/// Per-session settings, usually derived from the loaded configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionSettings {
    pub bindings: KeyBindings,
    pub rendezvous: RendezvousSettings,
}

/// An initialized terminal
pub struct Session<B: TerminalBackend> {
    wm: WindowManager<B>,
    settings: SessionSettings,
}

impl<B: TerminalBackend> Session<B> {
    /// Initialize the backend and register the palette
    ///
    /// # Errors
    ///
    /// [`WidgetError::BackendUnavailable`] if the terminal cannot be set up.
    /// The backend is torn down again when setup fails after `init`.
    pub fn start(mut backend: B, settings: SessionSettings) -> Result<Self, WidgetError> {
        backend.init().map_err(WidgetError::BackendUnavailable)?;
        if let Err(e) = Self::prepare(&mut backend) {
            let _ = backend.teardown();
            return Err(WidgetError::BackendUnavailable(e));
        }

        let size = backend.screen_size();
        info!(
            rows = size.rows,
            cols = size.cols,
            cancel_key = settings.bindings.cancel_function_key,
            "session started"
        );
        Ok(Self {
            wm: WindowManager::new(backend),
            settings,
        })
    }

    fn prepare(backend: &mut B) -> Result<(), BackendError> {
        for pair in Palette::standard().pairs() {
            backend.register_color(*pair)?;
        }
        backend.set_default_colors(Color::White, Color::Blue)
    }

    /// Restore a neutral palette, clear the screen and release the backend
    ///
    /// Windows a failed widget left behind are destroyed first.
    ///
    /// # Errors
    ///
    /// Returns the first failure; teardown is attempted regardless.
    pub fn stop(self) -> Result<B, WidgetError> {
        let mut wm = self.wm;
        let swept = wm.sweep();
        if swept > 0 {
            warn!(swept, "windows still live at session stop");
        }

        let restored = wm.backend_mut().set_default_colors(Color::White, Color::Black);
        let cleared = wm.clear_screen();
        let released = wm.backend_mut().teardown();

        restored?;
        cleared?;
        released?;
        info!("session stopped");
        Ok(wm.into_backend())
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.settings.bindings
    }

    pub fn screen_size(&self) -> Size {
        self.wm.screen_size()
    }

    pub fn window_manager(&mut self) -> &mut WindowManager<B> {
        &mut self.wm
    }

    /// # Errors
    ///
    /// Returns backend failures.
    pub fn menu<S: AsRef<str>>(&mut self, menu: &Menu<'_, S>) -> Result<MenuOutcome, WidgetError> {
        menu.run(&mut self.wm, &self.settings.bindings)
    }

    /// Single-line entry of at most `width` characters
    ///
    /// # Errors
    ///
    /// Returns backend failures.
    pub fn dialog(&mut self, prompt: &str, width: usize) -> Result<String, WidgetError> {
        self.form(&Form::new(prompt, width))
    }

    /// # Errors
    ///
    /// Returns backend failures.
    pub fn form(&mut self, form: &Form) -> Result<String, WidgetError> {
        form.run(&mut self.wm, &self.settings.bindings)
    }

    /// # Errors
    ///
    /// Returns backend failures.
    pub fn message_box(&mut self, text: &str) -> Result<(), WidgetError> {
        prompt::message_box(&mut self.wm, text)
    }

    /// # Errors
    ///
    /// Returns backend failures.
    pub fn yes_no(&mut self, text: &str) -> Result<bool, WidgetError> {
        prompt::yes_no(&mut self.wm, text)
    }

    /// Browse a document; returns the key that closed it
    ///
    /// # Errors
    ///
    /// Returns layout and backend failures.
    pub fn view(&mut self, viewer: &Viewer) -> Result<Key, WidgetError> {
        viewer.run(&mut self.wm, &self.settings.bindings)
    }

    /// Show a document until another process sends a value on the
    /// configured channel
    ///
    /// # Errors
    ///
    /// Channel failures are returned as [`WidgetError::Rendezvous`].
    pub fn view_until_signal<W: RendezvousWaiter>(
        &mut self,
        viewer: &Viewer,
        waiter: &mut W,
    ) -> Result<SignalValue, WidgetError> {
        viewer.run_until_signal(&mut self.wm, waiter, &self.settings.rendezvous)
    }

    /// # Errors
    ///
    /// Returns backend failures.
    pub fn print_at(&mut self, at: Point, text: &str) -> Result<(), WidgetError> {
        self.wm.print_at(at, text, Attr::plain())
    }

    /// Centered, reversed title on the top screen row
    ///
    /// # Errors
    ///
    /// Returns backend failures.
    pub fn print_title(&mut self, title: &str) -> Result<(), WidgetError> {
        print_centered(&mut self.wm, 0, 1, title)
    }

    /// Bordered backdrop over the whole screen
    ///
    /// # Errors
    ///
    /// Returns backend failures.
    pub fn print_box(&mut self) -> Result<(), WidgetError> {
        self.wm.backdrop(Attr::pair(RECEIPT), BorderStyle::Ascii)
    }
}
