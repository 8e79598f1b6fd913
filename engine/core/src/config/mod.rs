//! TOML Configuration File Support
//!
//! Centralized configuration loading for modalterm, from a TOML file at
//! `~/.config/modalterm/config.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! - `$XDG_CONFIG_HOME/modalterm/config.toml` (typically `~/.config/modalterm/config.toml`)
//! - log file defaults to `$XDG_STATE_HOME/modalterm/modalterm.log`
//!
//! # Example Configuration
//!
//! ```toml
//! [keys]
//! cancel_function_key = 3
//!
//! [rendezvous]
//! channel_key = 42114
//! timeout_ms = 0        # 0 = wait forever
//!
//! [logging]
//! file = "/tmp/modalterm.log"
//! filter = "info"
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `MODALTERM_CANCEL_KEY` | `keys.cancel_function_key` |
//! | `MODALTERM_CHANNEL_KEY` | `rendezvous.channel_key` |
//! | `MODALTERM_RENDEZVOUS_TIMEOUT_MS` | `rendezvous.timeout_ms` |
//! | `MODALTERM_LOG_FILE` | `logging.file` |
//! | `MODALTERM_LOG` | `logging.filter` |

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keys::KeyBindings;
use crate::rendezvous::{ChannelKey, RendezvousSettings};
use crate::session::SessionSettings;

/// Highest function key a terminal reports
pub const MAX_FUNCTION_KEY: u8 = 12;

pub const ENV_CANCEL_KEY: &str = "MODALTERM_CANCEL_KEY";
pub const ENV_CHANNEL_KEY: &str = "MODALTERM_CHANNEL_KEY";
pub const ENV_RENDEZVOUS_TIMEOUT_MS: &str = "MODALTERM_RENDEZVOUS_TIMEOUT_MS";
pub const ENV_LOG_FILE: &str = "MODALTERM_LOG_FILE";

/// Log filter when no configuration layer and no fallback sets one
pub const DEFAULT_LOG_FILTER: &str = "info";
pub const ENV_LOG_FILTER: &str = "MODALTERM_LOG";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Keys section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysToml {
    /// Function key (1-12) that cancels menus and closes viewers
    pub cancel_function_key: Option<u8>,
}

/// Rendezvous section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RendezvousToml {
    /// Message queue key
    pub channel_key: Option<i32>,

    /// Wait limit in milliseconds (0 = forever)
    pub timeout_ms: Option<u64>,
}

/// Logging section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingToml {
    /// Log file path
    pub file: Option<String>,

    /// `tracing` filter directive, e.g. `info` or `modalterm_core=debug`
    pub filter: Option<String>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModaltermToml {
    pub keys: KeysToml,
    pub rendezvous: RendezvousToml,
    pub logging: LoggingToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Where and how much to log
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Log file; the terminal is in raw mode so logs never go to the screen
    pub file: PathBuf,
    /// `tracing` filter directive; `None` when no layer set one
    pub filter: Option<String>,
}

impl LoggingSettings {
    /// Configured filter, else `fallback` (usually `RUST_LOG`), else
    /// [`DEFAULT_LOG_FILTER`]
    pub fn filter_or(&self, fallback: Option<String>) -> String {
        self.filter
            .clone()
            .or(fallback)
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: default_log_path(),
            filter: None,
        }
    }
}

/// Resolved configuration
#[derive(Clone, Debug)]
pub struct ModaltermConfig {
    /// Widget key bindings
    pub bindings: KeyBindings,

    /// Rendezvous channel and timeout
    pub rendezvous: RendezvousSettings,

    /// Logging destination and filter
    pub logging: LoggingSettings,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for ModaltermConfig {
    fn default() -> Self {
        Self {
            bindings: KeyBindings::default(),
            rendezvous: RendezvousSettings::default(),
            logging: LoggingSettings::default(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ModaltermConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Settings handed to [`crate::Session::start`]
    #[must_use]
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            bindings: self.bindings,
            rendezvous: self.rendezvous,
        }
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let key = self.bindings.cancel_function_key;
        if !(1..=MAX_FUNCTION_KEY).contains(&key) {
            return Err(ConfigError::ValidationError(format!(
                "cancel_function_key must be between 1 and {MAX_FUNCTION_KEY}, got {key}"
            )));
        }
        if self.rendezvous.channel.0 == 0 {
            return Err(ConfigError::ValidationError(
                "channel_key must be non-zero (0 is IPC_PRIVATE)".to_string(),
            ));
        }
        Ok(())
    }
}

/// `0` means wait forever
fn timeout_from_ms(ms: u64) -> Option<Duration> {
    if ms == 0 {
        None
    } else {
        Some(Duration::from_millis(ms))
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/modalterm/config.toml` or
/// `~/.config/modalterm/config.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("modalterm").join("config.toml"))
}

/// Default log file: the state directory where there is one, else the
/// cache directory, else the system temp directory
#[must_use]
pub fn default_log_path() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::cache_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("modalterm")
        .join("modalterm.log")
}

/// Load configuration from all sources with proper priority
///
/// CLI overrides are not handled here; apply [`ConfigOverrides`] after.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if
/// the resulting values are out of range. A missing config file is not an
/// error (defaults are used).
pub fn load_config() -> Result<ModaltermConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Arguments
///
/// * `path` - Optional path to the configuration file. If `None`, only defaults
///   and environment variables are used.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or fails validation.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<ModaltermConfig, ConfigError> {
    load_config_with_env(path, |name| std::env::var(name).ok())
}

/// Load configuration with an explicit environment lookup
///
/// # Errors
///
/// As [`load_config_from_path`].
pub fn load_config_with_env<F>(path: Option<PathBuf>, lookup: F) -> Result<ModaltermConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // Start with defaults
    let mut config = ModaltermConfig::default();

    // Try to load from file
    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: ModaltermToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    // Apply environment variables (overrides file values)
    apply_env_from(&mut config, lookup);

    config.validate()?;
    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut ModaltermConfig, toml: &ModaltermToml) {
    if let Some(key) = toml.keys.cancel_function_key {
        config.bindings.cancel_function_key = key;
    }

    if let Some(key) = toml.rendezvous.channel_key {
        config.rendezvous.channel = ChannelKey(key);
    }
    if let Some(ms) = toml.rendezvous.timeout_ms {
        config.rendezvous.timeout = timeout_from_ms(ms);
    }

    if let Some(ref file) = toml.logging.file {
        config.logging.file = PathBuf::from(file);
    }
    if let Some(ref filter) = toml.logging.filter {
        config.logging.filter = Some(filter.clone());
    }
}

fn parsed<T: std::str::FromStr>(name: &str, raw: &str) -> Option<T> {
    let value = raw.trim().parse().ok();
    if value.is_none() {
        tracing::warn!(variable = name, value = raw, "Ignoring unparsable environment value");
    }
    value
}

/// Apply environment overrides read through `lookup`
pub fn apply_env_from<F>(config: &mut ModaltermConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(ENV_CANCEL_KEY) {
        if let Some(key) = parsed::<u8>(ENV_CANCEL_KEY, &raw) {
            config.bindings.cancel_function_key = key;
            config.source = ConfigSource::Env;
        }
    }

    if let Some(raw) = lookup(ENV_CHANNEL_KEY) {
        if let Some(key) = parsed::<i32>(ENV_CHANNEL_KEY, &raw) {
            config.rendezvous.channel = ChannelKey(key);
            config.source = ConfigSource::Env;
        }
    }
    if let Some(raw) = lookup(ENV_RENDEZVOUS_TIMEOUT_MS) {
        if let Some(ms) = parsed::<u64>(ENV_RENDEZVOUS_TIMEOUT_MS, &raw) {
            config.rendezvous.timeout = timeout_from_ms(ms);
            config.source = ConfigSource::Env;
        }
    }

    if let Some(file) = lookup(ENV_LOG_FILE) {
        config.logging.file = PathBuf::from(file);
        config.source = ConfigSource::Env;
    }
    if let Some(filter) = lookup(ENV_LOG_FILTER) {
        config.logging.filter = Some(filter);
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Cancel function key override
    pub cancel_function_key: Option<u8>,

    /// Rendezvous channel key override
    pub channel_key: Option<i32>,

    /// Rendezvous timeout override (milliseconds, 0 = forever)
    pub timeout_ms: Option<u64>,

    /// Log file override
    pub log_file: Option<PathBuf>,

    /// Log filter override
    pub log_filter: Option<String>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cancel_function_key(mut self, key: u8) -> Self {
        self.cancel_function_key = Some(key);
        self
    }

    #[must_use]
    pub fn with_channel_key(mut self, key: i32) -> Self {
        self.channel_key = Some(key);
        self
    }

    #[must_use]
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }

    #[must_use]
    pub fn with_log_file(mut self, path: PathBuf) -> Self {
        self.log_file = Some(path);
        self
    }

    #[must_use]
    pub fn with_log_filter(mut self, filter: String) -> Self {
        self.log_filter = Some(filter);
        self
    }

    fn is_empty(&self) -> bool {
        self.cancel_function_key.is_none()
            && self.channel_key.is_none()
            && self.timeout_ms.is_none()
            && self.log_file.is_none()
            && self.log_filter.is_none()
    }

    /// Apply overrides to a configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if an override is out of range.
    pub fn apply(&self, config: &mut ModaltermConfig) -> Result<(), ConfigError> {
        if !self.is_empty() {
            config.source = ConfigSource::Cli;
        }

        if let Some(key) = self.cancel_function_key {
            config.bindings.cancel_function_key = key;
        }
        if let Some(key) = self.channel_key {
            config.rendezvous.channel = ChannelKey(key);
        }
        if let Some(ms) = self.timeout_ms {
            config.rendezvous.timeout = timeout_from_ms(ms);
        }
        if let Some(ref file) = self.log_file {
            config.logging.file = file.clone();
        }
        if let Some(ref filter) = self.log_filter {
            config.logging.filter = Some(filter.clone());
        }

        config.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================
