//! System V message queue rendezvous
//!
//! Messages are `{ mtype: c_long, value: c_int }`. Receives ask for any
//! message type with `MSG_NOERROR`, so larger payloads from foreign senders
//! are truncated to the leading word instead of failing.

use std::io;
use std::mem::size_of;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{ChannelKey, ChannelOp, RendezvousError, RendezvousWaiter, SignalValue};

/// Message type used by [`send_signal`]
const SIGNAL_MESSAGE_TYPE: libc::c_long = 1;

/// Payload size, excluding the type field
const PAYLOAD_SIZE: usize = size_of::<libc::c_int>();

#[repr(C)]
struct SignalMessage {
    mtype: libc::c_long,
    value: libc::c_int,
}

fn unavailable(key: ChannelKey, op: ChannelOp, source: io::Error) -> RendezvousError {
    RendezvousError::ChannelUnavailable { key, op, source }
}

/// Create or open the queue for `key`
fn open(key: ChannelKey) -> Result<libc::c_int, RendezvousError> {
    let id = unsafe { libc::msgget(key.0, 0o666 | libc::IPC_CREAT) };
    if id == -1 {
        return Err(unavailable(key, ChannelOp::Open, io::Error::last_os_error()));
    }
    Ok(id)
}

/// Block for one message; EINTR continues the wait
fn receive(key: ChannelKey, queue: libc::c_int) -> Result<SignalValue, RendezvousError> {
    let mut message = SignalMessage { mtype: 0, value: 0 };
    loop {
        let received = unsafe {
            libc::msgrcv(
                queue,
                (&mut message as *mut SignalMessage).cast::<libc::c_void>(),
                PAYLOAD_SIZE,
                0,
                libc::MSG_NOERROR,
            )
        };
        if received >= 0 {
            return Ok(SignalValue(message.value));
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(unavailable(key, ChannelOp::Receive, err));
        }
    }
}

fn remove(key: ChannelKey, queue: libc::c_int) -> Result<(), RendezvousError> {
    let rc = unsafe { libc::msgctl(queue, libc::IPC_RMID, std::ptr::null_mut()) };
    if rc == -1 {
        return Err(unavailable(key, ChannelOp::Remove, io::Error::last_os_error()));
    }
    Ok(())
}

/// Whether a process running as `euid` may `IPC_RMID` a queue
fn may_remove(euid: libc::uid_t, owner: libc::uid_t, creator: libc::uid_t) -> bool {
    euid == 0 || euid == owner || euid == creator
}

/// Fail up front when the queue could not be removed at the deadline
fn ensure_removable(key: ChannelKey, queue: libc::c_int) -> Result<(), RendezvousError> {
    let mut stat: libc::msqid_ds = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::msgctl(queue, libc::IPC_STAT, &mut stat) };
    if rc == -1 {
        return Err(unavailable(key, ChannelOp::Remove, io::Error::last_os_error()));
    }
    let euid = unsafe { libc::geteuid() };
    if !may_remove(euid, stat.msg_perm.uid, stat.msg_perm.cuid) {
        return Err(unavailable(
            key,
            ChannelOp::Remove,
            io::Error::from(io::ErrorKind::PermissionDenied),
        ));
    }
    Ok(())
}

/// Rendezvous over a System V message queue
#[derive(Clone, Copy, Debug, Default)]
pub struct MessageQueueWaiter;

impl MessageQueueWaiter {
    pub fn new() -> Self {
        Self
    }

    /// Receive on a helper thread; at the deadline the queue is removed,
    /// which fails the blocked receive with `EIDRM`
    ///
    /// A queue this process may not remove is refused before the thread
    /// starts, so no receiver outlives the wait.
    fn wait_bounded(
        key: ChannelKey,
        queue: libc::c_int,
        timeout: Duration,
    ) -> Result<SignalValue, RendezvousError> {
        ensure_removable(key, queue)?;
        let (tx, rx) = mpsc::channel();
        let receiver = thread::Builder::new()
            .name("rendezvous-receive".into())
            .spawn(move || {
                let _ = tx.send(receive(key, queue));
            })
            .map_err(|e| unavailable(key, ChannelOp::Receive, e))?;

        match rx.recv_timeout(timeout) {
            Ok(result) => {
                let _ = receiver.join();
                let value = result?;
                remove(key, queue)?;
                Ok(value)
            }
            Err(RecvTimeoutError::Timeout) => {
                remove(key, queue)?;
                let _ = receiver.join();
                // A value may have landed between the deadline and the removal
                match rx.try_recv() {
                    Ok(Ok(value)) => Ok(value),
                    _ => {
                        warn!(%key, ?timeout, "rendezvous wait timed out");
                        Err(RendezvousError::TimedOut { key, timeout })
                    }
                }
            }
            Err(RecvTimeoutError::Disconnected) => Err(unavailable(
                key,
                ChannelOp::Receive,
                io::Error::other("receiver thread exited without a result"),
            )),
        }
    }
}

impl RendezvousWaiter for MessageQueueWaiter {
    fn wait_for_signal(
        &mut self,
        key: ChannelKey,
        timeout: Option<Duration>,
    ) -> Result<SignalValue, RendezvousError> {
        let queue = open(key)?;
        debug!(%key, queue, ?timeout, "waiting for rendezvous signal");

        let value = match timeout {
            None => {
                let value = receive(key, queue)?;
                remove(key, queue)?;
                value
            }
            Some(timeout) => Self::wait_bounded(key, queue, timeout)?,
        };

        info!(%key, %value, "rendezvous signal received");
        Ok(value)
    }
}

/// Send one value on `key`, creating the queue if needed
///
/// # Errors
///
/// Returns [`RendezvousError::ChannelUnavailable`] when the queue cannot be
/// opened or written.
pub fn send_signal(key: ChannelKey, value: SignalValue) -> Result<(), RendezvousError> {
    let queue = open(key)?;
    let message = SignalMessage {
        mtype: SIGNAL_MESSAGE_TYPE,
        value: value.0,
    };
    loop {
        let rc = unsafe {
            libc::msgsnd(
                queue,
                (&message as *const SignalMessage).cast::<libc::c_void>(),
                PAYLOAD_SIZE,
                0,
            )
        };
        if rc == 0 {
            debug!(%key, %value, "rendezvous signal sent");
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(unavailable(key, ChannelOp::Send, err));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Private keys so parallel test runs never share a queue
    fn test_key(salt: i32) -> ChannelKey {
        let pid = i32::try_from(std::process::id() & 0x00ff_ffff).unwrap_or(1);
        ChannelKey(0x5a00_0000 | (pid << 4) & 0x00ff_fff0 | salt)
    }

    #[test]
    fn test_send_then_wait_consumes_value() {
        let key = test_key(1);
        send_signal(key, SignalValue(7)).unwrap();

        let value = MessageQueueWaiter::new().wait_for_signal(key, None).unwrap();
        assert_eq!(value, SignalValue(7));
    }

    #[test]
    fn test_value_sent_from_another_thread() {
        let key = test_key(2);
        let sender = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            send_signal(key, SignalValue(-3)).unwrap();
        });

        let value = MessageQueueWaiter::new()
            .wait_for_signal(key, Some(Duration::from_secs(10)))
            .unwrap();
        sender.join().unwrap();
        assert_eq!(value, SignalValue(-3));
    }

    #[test]
    fn test_only_owner_creator_or_root_may_remove() {
        assert!(may_remove(0, 1000, 1000));
        assert!(may_remove(1000, 1000, 2000));
        assert!(may_remove(2000, 1000, 2000));
        assert!(!may_remove(3000, 1000, 2000));
    }

    #[test]
    fn test_own_queue_is_removable() {
        let key = test_key(4);
        let queue = open(key).unwrap();
        ensure_removable(key, queue).unwrap();
        remove(key, queue).unwrap();
    }

    #[test]
    fn test_bounded_wait_times_out() {
        let key = test_key(3);
        let err = MessageQueueWaiter::new()
            .wait_for_signal(key, Some(Duration::from_millis(50)))
            .unwrap_err();
        assert!(matches!(err, RendezvousError::TimedOut { .. }));
    }
}
