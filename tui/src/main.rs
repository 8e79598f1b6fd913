//! modalterm Entry Point
//!
//! Runs one widget from the command line, or an interactive main menu that
//! drives all of them.
//!
//! Usage:
//!   modalterm [OPTIONS] [COMMAND]
//!
//! Commands:
//!   menu <OPTION>...   Pick one option; prints its index
//!   dialog <PROMPT>    Single-line entry; prints the text
//!   yesno <TEXT>       Yes/No prompt; exit status 0 for YES
//!   message <TEXT>     Message box
//!   view <FILE>        Browse a file
//!   exec <COMMAND>     Browse the output of a shell command
//!   view-ipc <FILE>    Show a file until `modalterm-signal` sends a value

use std::fs::{self, OpenOptions};
use std::io::{self, IsTerminal};
use std::panic;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use modalterm_core::config::{default_config_path, load_config_from_path, ConfigOverrides};
use modalterm_core::{
    LoggingSettings, Menu, MenuOutcome, ModaltermConfig, Session, SignalValue, TerminalBackend,
};
use modalterm_tui::{exec_view, file_view, CrosstermKeys, RatatuiBackend};

const DEFAULT_ENTRY_WIDTH: usize = 40;

/// Modal text-terminal widgets
#[derive(Parser, Debug)]
#[command(name = "modalterm")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "MODALTERM_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Function key that cancels menus (1-12)
    #[arg(long, value_name = "N")]
    cancel_key: Option<u8>,

    /// Rendezvous message queue key
    #[arg(short = 'k', long, value_name = "KEY")]
    channel_key: Option<i32>,

    /// Rendezvous timeout in milliseconds (0 waits forever)
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Log file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Log filter (e.g. "debug", "modalterm_core=trace")
    #[arg(short = 'l', long, value_name = "FILTER")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Pick one option; prints its index
    Menu {
        #[arg(required = true)]
        options: Vec<String>,
        #[arg(short, long, default_value = "")]
        title: String,
    },
    /// Single-line entry; prints the text
    Dialog {
        prompt: String,
        #[arg(short, long, default_value_t = DEFAULT_ENTRY_WIDTH)]
        width: usize,
    },
    /// Yes/No prompt; exit status 0 for YES
    Yesno { text: String },
    /// Message box
    Message { text: String },
    /// Browse a file
    View { file: PathBuf },
    /// Browse the output of a shell command
    Exec { command: String },
    /// Show a file until another process sends a value
    ViewIpc { file: PathBuf },
}

/// What to print once the terminal is restored
#[derive(Debug, Default, PartialEq, Eq)]
struct Report {
    line: Option<String>,
    declined: bool,
}

impl Report {
    fn line(line: impl Into<String>) -> Self {
        Self {
            line: Some(line.into()),
            declined: false,
        }
    }

    fn declined() -> Self {
        Self {
            line: None,
            declined: true,
        }
    }
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(key) = self.cancel_key {
            overrides = overrides.with_cancel_function_key(key);
        }
        if let Some(key) = self.channel_key {
            overrides = overrides.with_channel_key(key);
        }
        if let Some(ms) = self.timeout_ms {
            overrides = overrides.with_timeout_ms(ms);
        }
        if let Some(ref file) = self.log_file {
            overrides = overrides.with_log_file(file.clone());
        }
        if let Some(ref filter) = self.log_level {
            overrides = overrides.with_log_filter(filter.clone());
        }
        overrides
    }
}

fn resolve_config(args: &Args) -> Result<ModaltermConfig> {
    let path = args.config.clone().or_else(default_config_path);
    let mut config = load_config_from_path(path).context("Failed to load configuration")?;
    args.overrides()
        .apply(&mut config)
        .context("Invalid command-line override")?;
    Ok(config)
}

/// Log to a file; the terminal belongs to the widgets
fn init_logging(logging: &LoggingSettings) -> Result<()> {
    if let Some(dir) = logging.file.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&logging.file)
        .with_context(|| format!("Failed to open log file {}", logging.file.display()))?;

    // RUST_LOG only fills in when no configuration layer set a filter
    let rust_log = std::env::var(tracing_subscriber::EnvFilter::DEFAULT_ENV).ok();
    let filter = tracing_subscriber::EnvFilter::new(logging.filter_or(rust_log));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .with(filter)
        .init();
    Ok(())
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let config = resolve_config(&args)?;
    init_logging(&config.logging)?;
    info!(source = %config.source(), command = ?args.command, "modalterm starting");

    // Check if we have a TTY before attempting initialization
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: modalterm requires a terminal (TTY)");
        eprintln!();
        eprintln!("Run it interactively, or over SSH with the -t flag.");
        return Ok(ExitCode::FAILURE);
    }

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    let backend = RatatuiBackend::new(terminal, CrosstermKeys::new())?;
    let mut session = Session::start(backend, config.session_settings())?;

    let result = match args.command {
        Some(ref command) => run_command(&mut session, command),
        None => main_menu(&mut session).map(|()| Report::default()),
    };
    let stopped = session.stop();

    let report = result?;
    stopped?;
    if let Some(line) = report.line {
        println!("{line}");
    }
    Ok(if report.declined {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn run_command<B: TerminalBackend>(session: &mut Session<B>, command: &Command) -> Result<Report> {
    let report = match command {
        Command::Menu { options, title } => {
            match session.menu(&Menu::new(options).with_title(title.as_str()))? {
                MenuOutcome::Selected(index) => Report::line(index.to_string()),
                MenuOutcome::Cancelled => Report::declined(),
            }
        }
        Command::Dialog { prompt, width } => Report::line(session.dialog(prompt, *width)?),
        Command::Yesno { text } => {
            if session.yes_no(text)? {
                Report::default()
            } else {
                Report::declined()
            }
        }
        Command::Message { text } => {
            session.message_box(text)?;
            Report::default()
        }
        Command::View { file } => {
            file_view(session, file)?;
            Report::default()
        }
        Command::Exec { command } => {
            exec_view(session, command)?;
            Report::default()
        }
        Command::ViewIpc { file } => Report::line(view_ipc(session, file)?.to_string()),
    };
    Ok(report)
}

#[cfg(target_os = "linux")]
fn view_ipc<B: TerminalBackend>(session: &mut Session<B>, file: &Path) -> Result<SignalValue> {
    Ok(modalterm_tui::file_view_ipc(session, file)?)
}

#[cfg(not(target_os = "linux"))]
fn view_ipc<B: TerminalBackend>(_session: &mut Session<B>, file: &Path) -> Result<SignalValue> {
    anyhow::bail!(
        "cannot wait on {}: rendezvous viewing needs System V message queues",
        file.display()
    )
}

const MAIN_OPTIONS: [&str; 6] = [
    "View a file",
    "Run a command",
    "Text entry",
    "Yes/No prompt",
    "Wait for a signal",
    "Exit",
];

/// Interactive loop over every widget
fn main_menu<B: TerminalBackend>(session: &mut Session<B>) -> Result<()> {
    let menu = Menu::new(&MAIN_OPTIONS).with_title("Main menu");
    loop {
        session.print_box()?;
        session.print_title(" modalterm ")?;

        let choice = session.menu(&menu)?.selected();
        let step: Result<()> = match choice {
            Some(0) => {
                let path = session.dialog("File to view", DEFAULT_ENTRY_WIDTH)?;
                file_view(session, Path::new(path.trim())).map(|_| ()).map_err(Into::into)
            }
            Some(1) => {
                let command = session.dialog("Shell command", DEFAULT_ENTRY_WIDTH)?;
                exec_view(session, &command).map(|_| ()).map_err(Into::into)
            }
            Some(2) => {
                let name = session.dialog("Your name", 20)?;
                session
                    .message_box(&format!("Hello, {name}"))
                    .map_err(Into::into)
            }
            Some(3) => {
                let answer = if session.yes_no("Do you like menus?")? {
                    "Glad to hear it"
                } else {
                    "Fair enough"
                };
                session.message_box(answer).map_err(Into::into)
            }
            Some(4) => {
                let path = session.dialog("File to show", DEFAULT_ENTRY_WIDTH)?;
                view_ipc(session, Path::new(path.trim()))
                    .and_then(|value| Ok(session.message_box(&format!("Received {value}"))?))
            }
            _ => {
                if session.yes_no("Exit modalterm?")? {
                    return Ok(());
                }
                Ok(())
            }
        };

        // A failed step is reported and the menu comes back
        if let Err(e) = step {
            warn!(error = %e, "main menu step failed");
            session.message_box(&first_line(&e.to_string()))?;
        }
    }
}

fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use modalterm_core::testing::ScriptedBackend;
    use modalterm_core::{Key, SessionSettings, Size};
    use pretty_assertions::assert_eq;

    fn start(keys: &[Key]) -> Session<ScriptedBackend> {
        let backend = ScriptedBackend::new(Size::new(24, 80)).with_keys(keys.iter().copied());
        Session::start(backend, SessionSettings::default()).unwrap()
    }

    #[test]
    fn test_parse_menu_command() {
        let args = Args::try_parse_from(["modalterm", "menu", "-t", "Pick", "a", "b"]).unwrap();
        assert_eq!(
            args.command,
            Some(Command::Menu {
                options: vec!["a".into(), "b".into()],
                title: "Pick".into(),
            })
        );
    }

    #[test]
    fn test_menu_needs_options() {
        assert!(Args::try_parse_from(["modalterm", "menu"]).is_err());
    }

    #[test]
    fn test_no_command_runs_main_menu() {
        let args = Args::try_parse_from(["modalterm"]).unwrap();
        assert_eq!(args.command, None);
        assert!(args.overrides().channel_key.is_none());
    }

    #[test]
    fn test_overrides_from_flags() {
        let args = Args::try_parse_from([
            "modalterm",
            "--cancel-key",
            "10",
            "-k",
            "77",
            "--timeout-ms",
            "500",
            "view",
            "notes.txt",
        ])
        .unwrap();
        let overrides = args.overrides();
        assert_eq!(overrides.cancel_function_key, Some(10));
        assert_eq!(overrides.channel_key, Some(77));
        assert_eq!(overrides.timeout_ms, Some(500));
    }

    #[test]
    fn test_log_level_flag_beats_rust_log() {
        let args = Args::try_parse_from(["modalterm", "-l", "debug"]).unwrap();
        let mut config = ModaltermConfig::default();
        args.overrides().apply(&mut config).unwrap();
        assert_eq!(config.logging.filter_or(Some("trace".into())), "debug");
    }

    #[test]
    fn test_menu_command_reports_index() {
        let mut session = start(&[Key::Down, Key::Enter]);
        let command = Command::Menu {
            options: vec!["Add".into(), "Delete".into()],
            title: String::new(),
        };
        assert_eq!(run_command(&mut session, &command).unwrap(), Report::line("1"));
    }

    #[test]
    fn test_cancelled_menu_is_declined() {
        let mut session = start(&[Key::F(3)]);
        let command = Command::Menu {
            options: vec!["Add".into()],
            title: String::new(),
        };
        assert!(run_command(&mut session, &command).unwrap().declined);
    }

    #[test]
    fn test_dialog_and_yesno_commands() {
        let mut session = start(&[Key::Char('o'), Key::Char('k'), Key::Enter]);
        let command = Command::Dialog {
            prompt: "Name".into(),
            width: 10,
        };
        assert_eq!(run_command(&mut session, &command).unwrap(), Report::line("ok"));

        let mut session = start(&[Key::Right, Key::Enter]);
        let command = Command::Yesno { text: "Sure?".into() };
        assert!(run_command(&mut session, &command).unwrap().declined);
    }

    #[test]
    fn test_main_menu_exit() {
        let mut session = start(&[
            Key::Down,
            Key::Down,
            Key::Down,
            Key::Down,
            Key::Down,
            Key::Enter,
            Key::Enter,
        ]);
        main_menu(&mut session).unwrap();
        assert_eq!(session.window_manager().live_windows(), 0);
    }

    #[test]
    fn test_main_menu_reports_failed_step() {
        // Run a command that cannot be viewed on a tiny screen, then exit
        let backend = ScriptedBackend::new(Size::new(9, 30)).with_keys([
            Key::Down,
            Key::Enter,
            Key::Char('t'),
            Key::Char('r'),
            Key::Char('u'),
            Key::Char('e'),
            Key::Enter,
            Key::Enter,
            Key::F(3),
            Key::Enter,
        ]);
        let mut session = Session::start(backend, SessionSettings::default()).unwrap();
        main_menu(&mut session).unwrap();
        assert_eq!(session.window_manager().backend().keys_remaining(), 0);
    }
}
