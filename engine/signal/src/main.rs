//! modalterm-signal - Close a Waiting Viewer
//!
//! Sends one integer on a rendezvous channel. A modalterm viewer blocked in
//! `view-ipc` mode receives it, closes, and reports the value.
//!
//! # Usage
//!
//! ```bash
//! # Send 7 on the configured channel (default key 42114)
//! modalterm-signal 7
//!
//! # Explicit channel key
//! modalterm-signal --channel-key 5150 -- -1
//!
//! # Verbose logging
//! RUST_LOG=debug modalterm-signal 0
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use modalterm_core::config::{default_config_path, load_config_from_path, ConfigOverrides};
use modalterm_core::rendezvous::send_signal;
use modalterm_core::{ChannelKey, SignalValue};

/// Send a rendezvous value to a waiting modalterm viewer
#[derive(Parser, Debug)]
#[command(name = "modalterm-signal")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Value delivered to the viewer
    #[arg(allow_negative_numbers = true)]
    value: i32,

    /// Message queue key (overrides config and MODALTERM_CHANNEL_KEY)
    #[arg(short = 'k', long, value_name = "KEY")]
    channel_key: Option<i32>,

    /// Configuration file path
    #[arg(short = 'c', long, env = "MODALTERM_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "warn")]
    log_level: String,
}

/// Initialize logging with the specified level
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "modalterm_signal={level},modalterm_core={level}"
        ))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Channel from CLI, environment, config file or default, in that order
fn resolve_channel(args: &Args) -> Result<ChannelKey> {
    let path = args.config.clone().or_else(default_config_path);
    let mut config = load_config_from_path(path).context("Failed to load configuration")?;

    let mut overrides = ConfigOverrides::new();
    if let Some(key) = args.channel_key {
        overrides = overrides.with_channel_key(key);
    }
    overrides
        .apply(&mut config)
        .context("Invalid command-line override")?;

    info!(channel = %config.rendezvous.channel, source = %config.source(), "Channel resolved");
    Ok(config.rendezvous.channel)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let channel = resolve_channel(&args)?;
    send_signal(channel, SignalValue(args.value))
        .with_context(|| format!("Failed to send {} on channel {channel}", args.value))?;

    info!(%channel, value = args.value, "Signal sent");
    Ok(())
}
