//! In-memory transport pair for deterministic testing.
//!
//! Real signal delivery needs two live processes and an operator-mediated
//! PID exchange.  To exercise the protocol state machines without forking,
//! this module provides [`pair`]: two crossed [`LoopbackTransport`]
//! endpoints with fixed PIDs that route pulses to each other through
//! channels.  Sending to any PID other than the paired endpoint fails the
//! same way the real transport fails for a vanished process.
//!
//! The loopback channel is FIFO, which is *stronger* than real signal
//! delivery (pending signals of different numbers are unordered); tests
//! that rely on ordering therefore exercise the protocol's happy path,
//! while reply-reordering is covered by the sender's unit tests.

use tokio::sync::mpsc;

use crate::transport::{Event, Pid, Transport, TransportError};
use crate::wire::Pulse;

/// One endpoint of an in-memory transport pair.
pub struct LoopbackTransport {
    pid: Pid,
    peer_pid: Pid,
    to_peer: mpsc::UnboundedSender<Event>,
    inbox: mpsc::UnboundedReceiver<Event>,
}

impl LoopbackTransport {
    /// The PID this endpoint answers to.
    pub fn pid(&self) -> Pid {
        self.pid
    }
}

/// Create two connected endpoints identified as `a` and `b`.
pub fn pair(a: Pid, b: Pid) -> (LoopbackTransport, LoopbackTransport) {
    let (a_tx, b_inbox) = mpsc::unbounded_channel();
    let (b_tx, a_inbox) = mpsc::unbounded_channel();
    (
        LoopbackTransport {
            pid: a,
            peer_pid: b,
            to_peer: a_tx,
            inbox: a_inbox,
        },
        LoopbackTransport {
            pid: b,
            peer_pid: a,
            to_peer: b_tx,
            inbox: b_inbox,
        },
    )
}

impl Transport for LoopbackTransport {
    async fn send(&self, peer: Pid, pulse: Pulse) -> Result<(), TransportError> {
        if peer != self.peer_pid {
            return Err(TransportError::NoSuchPeer(peer));
        }
        self.to_peer
            .send(Event {
                pulse,
                from: self.pid,
            })
            .map_err(|_| TransportError::NoSuchPeer(peer))
    }

    async fn recv(&mut self) -> Result<Event, TransportError> {
        self.inbox.recv().await.ok_or(TransportError::Closed)
    }
}
