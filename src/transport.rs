//! Notification transport abstraction and its POSIX-signal implementation.
//!
//! A transport delivers a [`Pulse`] to a process identified by [`Pid`] and
//! surfaces inbound pulses together with the sender's identity.  All
//! protocol logic lives elsewhere; this module owns only signal I/O.
//!
//! [`SignalTransport`] is the real thing: it subscribes to SIGUSR1/SIGUSR2
//! with extended siginfo (to recover the origin PID) and parks a dedicated
//! forwarder thread on the signal iterator, posting each delivery into a
//! channel the async side awaits on.  Between a delivery and the channel
//! there is no shared mutable state — the handler-side work is confined to
//! `signal-hook`'s async-signal-safe machinery.
//!
//! Tests use [`crate::loopback`] instead of real signals.

use std::fmt;
use std::str::FromStr;
use std::thread;

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use signal_hook::iterator::exfiltrator::WithOrigin;
use signal_hook::iterator::SignalsInfo;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::wire::Pulse;

// ---------------------------------------------------------------------------
// Pid
// ---------------------------------------------------------------------------

/// A validated, strictly positive process identifier.
///
/// Non-positive values never exist as a [`Pid`]: `kill(0, …)` and friends
/// address process groups, which is never what this protocol means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pid(i32);

/// A process id that failed validation.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid process id `{0}`: expected a positive integer")]
pub struct InvalidPid(pub String);

impl Pid {
    /// Validate `raw` as a process id.
    pub fn new(raw: i32) -> Result<Self, InvalidPid> {
        if raw > 0 {
            Ok(Self(raw))
        } else {
            Err(InvalidPid(raw.to_string()))
        }
    }

    /// The identifier of the current process.
    pub fn current() -> Self {
        Self(std::process::id() as i32)
    }

    /// The raw numeric id.
    pub fn raw(self) -> i32 {
        self.0
    }
}

impl FromStr for Pid {
    type Err = InvalidPid;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i32>()
            .map_err(|_| InvalidPid(s.to_string()))
            .and_then(Pid::new)
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Event & errors
// ---------------------------------------------------------------------------

/// One inbound notification: which pulse arrived, and from whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub pulse: Pulse,
    /// The sending process, recovered from the delivery metadata.
    pub from: Pid,
}

/// Errors that can arise from transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The target process does not exist (ESRCH).  Fatal for the sender: a
    /// dead peer can never acknowledge.
    #[error("cannot deliver to pid {0}: no such process")]
    NoSuchPeer(Pid),

    /// The OS refused delivery for another reason (e.g. EPERM).
    #[error("cannot deliver to pid {pid}: {errno}")]
    Deliver { pid: Pid, errno: Errno },

    /// Registering the signal subscription failed.
    #[error("signal subscription failed: {0}")]
    Subscribe(#[from] std::io::Error),

    /// The inbound notification stream ended.
    #[error("notification stream closed")]
    Closed,
}

// ---------------------------------------------------------------------------
// Transport trait
// ---------------------------------------------------------------------------

/// A bidirectional, payload-less notification channel addressed by [`Pid`].
///
/// No ordering guarantees are assumed between pulses of different values;
/// the lockstep ACK discipline in [`crate::session`] recovers ordering.
pub trait Transport {
    /// Deliver `pulse` to `peer`.
    fn send(
        &self,
        peer: Pid,
        pulse: Pulse,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;

    /// Suspend until the next inbound notification arrives.
    fn recv(&mut self) -> impl std::future::Future<Output = Result<Event, TransportError>> + Send;
}

// ---------------------------------------------------------------------------
// SignalTransport
// ---------------------------------------------------------------------------

/// The real transport: POSIX signals routed by process id.
pub struct SignalTransport {
    events: mpsc::UnboundedReceiver<Event>,
    /// Closes the signal iterator on drop so the forwarder thread exits.
    handle: signal_hook::iterator::Handle,
}

impl SignalTransport {
    /// Subscribe to the protocol signals and start the forwarder thread.
    ///
    /// The thread blocks on the signal iterator and pushes each decoded
    /// [`Event`] into an unbounded channel; [`Transport::recv`] awaits on
    /// the channel, which is the suspension point the protocol relies on.
    pub fn bind() -> Result<Self, TransportError> {
        let mut signals =
            SignalsInfo::<WithOrigin>::new([Pulse::Usr1.to_raw(), Pulse::Usr2.to_raw()])?;
        let handle = signals.handle();
        let (tx, events) = mpsc::unbounded_channel();

        thread::spawn(move || {
            for origin in signals.forever() {
                let Some(pulse) = Pulse::from_raw(origin.signal) else {
                    continue;
                };
                let from = match origin.process.and_then(|p| Pid::new(p.pid).ok()) {
                    Some(pid) => pid,
                    None => {
                        // Kernel-originated or anonymous delivery: nothing to
                        // acknowledge, so the protocol cannot use it.
                        log::warn!("[transport] dropping {pulse:?} without a sender identity");
                        continue;
                    }
                };
                if tx.send(Event { pulse, from }).is_err() {
                    break; // transport dropped
                }
            }
        });

        Ok(Self { events, handle })
    }
}

impl Transport for SignalTransport {
    async fn send(&self, peer: Pid, pulse: Pulse) -> Result<(), TransportError> {
        let sig = match pulse {
            Pulse::Usr1 => Signal::SIGUSR1,
            Pulse::Usr2 => Signal::SIGUSR2,
        };
        match signal::kill(nix::unistd::Pid::from_raw(peer.raw()), sig) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => Err(TransportError::NoSuchPeer(peer)),
            Err(errno) => Err(TransportError::Deliver { pid: peer, errno }),
        }
    }

    async fn recv(&mut self) -> Result<Event, TransportError> {
        self.events.recv().await.ok_or(TransportError::Closed)
    }
}

impl Drop for SignalTransport {
    fn drop(&mut self) {
        self.handle.close();
    }
}
