//! Rendezvous Signals
//!
//! A one-shot integer delivered by another process. The rendezvous viewer
//! blocks on a [`RendezvousWaiter`] instead of the keyboard; whoever sends
//! the value decides when the view closes and what it reports.
//!
//! The production waiter is a System V message queue identified by a
//! well-known key: the queue is created if absent, exactly one message is
//! consumed, then the queue is removed.
//!
//! ```text
//!   modalterm-signal 7 ──msgsnd──► [queue 42114] ──msgrcv──► viewer returns 7
//!                                         │
//!                                   IPC_RMID after receive
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(target_os = "linux")]
pub mod sysv;

#[cfg(target_os = "linux")]
pub use sysv::{send_signal, MessageQueueWaiter};

/// Well-known key identifying a rendezvous channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelKey(pub i32);

impl ChannelKey {
    /// The key used when none is configured
    pub const DEFAULT: Self = Self(42114);
}

impl Default for ChannelKey {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The integer carried by a rendezvous message (one machine word)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SignalValue(pub i32);

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Channel operation that failed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelOp {
    Open,
    Receive,
    Remove,
    Send,
}

impl fmt::Display for ChannelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelOp::Open => write!(f, "open"),
            ChannelOp::Receive => write!(f, "receive"),
            ChannelOp::Remove => write!(f, "remove"),
            ChannelOp::Send => write!(f, "send"),
        }
    }
}

/// Rendezvous failures; never fatal to the session
#[derive(Debug, Error)]
pub enum RendezvousError {
    /// The channel could not be created, read, written or removed
    #[error("rendezvous channel {key} unavailable during {op}: {source}")]
    ChannelUnavailable {
        key: ChannelKey,
        op: ChannelOp,
        #[source]
        source: std::io::Error,
    },

    /// No signal arrived before the deadline
    #[error("no signal on rendezvous channel {key} within {timeout:?}")]
    TimedOut { key: ChannelKey, timeout: Duration },
}

impl RendezvousError {
    pub fn key(&self) -> ChannelKey {
        match self {
            Self::ChannelUnavailable { key, .. } | Self::TimedOut { key, .. } => *key,
        }
    }
}

/// Which channel to wait on, and for how long
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RendezvousSettings {
    pub channel: ChannelKey,
    /// `None` waits forever
    pub timeout: Option<Duration>,
}

impl RendezvousSettings {
    #[must_use]
    pub fn with_channel(mut self, channel: ChannelKey) -> Self {
        self.channel = channel;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Blocking wait for one external signal value
pub trait RendezvousWaiter {
    /// Block until one value arrives on `key`, consuming it
    ///
    /// # Errors
    ///
    /// [`RendezvousError::ChannelUnavailable`] when the channel cannot be
    /// used, [`RendezvousError::TimedOut`] when `timeout` elapses first.
    fn wait_for_signal(
        &mut self,
        key: ChannelKey,
        timeout: Option<Duration>,
    ) -> Result<SignalValue, RendezvousError>;
}

impl<W: RendezvousWaiter + ?Sized> RendezvousWaiter for &mut W {
    fn wait_for_signal(
        &mut self,
        key: ChannelKey,
        timeout: Option<Duration>,
    ) -> Result<SignalValue, RendezvousError> {
        (**self).wait_for_signal(key, timeout)
    }
}
