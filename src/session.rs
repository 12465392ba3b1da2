//! Protocol sessions: the loops that drive the state machines over a transport.
//!
//! # Architecture
//!
//! ```text
//!  send_message                          receive_message / serve
//!  ┌──────────────┐   bit pulses    ┌──────────────────┐
//!  │ MessageSender│────────────────▶│ MessageReceiver  │──▶ output sink
//!  └──────┬───────┘                 └────────┬─────────┘
//!         │        ACK / COMPLETE            │
//!         │◀──────────────────────────────────┘
//!         │
//!  ┌──────▼──────┐
//!  │  Transport  │  (SignalTransport in production, loopback in tests)
//!  └─────────────┘
//! ```
//!
//! Both loops suspend on [`Transport::recv`] between steps — there is no
//! polling and, deliberately, no timeout: a peer that never replies leaves
//! the session blocked forever (operator-observable, by design).

use std::io::Write;

use thiserror::Error;

use crate::receiver::{BitOutcome, MessageReceiver};
use crate::sender::{MessageSender, SendState};
use crate::transport::{Pid, Transport, TransportError};
use crate::wire::{BitSignal, ReplySignal};

/// Errors that end a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The transport failed to deliver or receive a notification.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The receiver's output sink failed.
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Send side
// ---------------------------------------------------------------------------

/// Transmit `message` to `peer`, bit by bit, in lockstep.
///
/// Each bit is followed by a suspension until the peer's ACK; after the
/// terminator byte's final ACK the call suspends again until COMPLETE.
/// Notifications from any process other than `peer` are ignored.
pub async fn send_message<T: Transport>(
    transport: &mut T,
    peer: Pid,
    message: &[u8],
) -> Result<(), SessionError> {
    let mut state = MessageSender::new(message);
    log::info!(
        "[send] {} byte(s) + terminator ({} bits) to pid {peer}",
        message.len(),
        state.bits_total()
    );

    while let Some(bit) = state.next_bit() {
        transport.send(peer, bit.pulse()).await?;
        log::trace!("[send] → {bit:?}");

        // Suspend until this bit's ACK (or an out-of-order COMPLETE on the
        // final bit) before the next bit may go out.
        while state.state() == SendState::AwaitingAck {
            let ev = transport.recv().await?;
            if ev.from != peer {
                log::debug!("[send] ignoring notification from unrelated pid {}", ev.from);
                continue;
            }
            let reply = ReplySignal::from_pulse(ev.pulse);
            if !state.on_reply(reply) {
                log::debug!("[send] ignoring stray {reply:?}");
            }
        }
    }

    // Terminator acked; wait for the receiver to confirm the whole message.
    while !state.is_done() {
        let ev = transport.recv().await?;
        if ev.from != peer {
            continue;
        }
        let reply = ReplySignal::from_pulse(ev.pulse);
        if !state.on_reply(reply) {
            log::debug!("[send] ignoring stray {reply:?} while awaiting COMPLETE");
        }
    }

    log::info!("[send] complete");
    Ok(())
}

// ---------------------------------------------------------------------------
// Receive side
// ---------------------------------------------------------------------------

/// Reassemble exactly one message, writing each completed byte to `out`.
///
/// Every bit is ACKed back to whichever process sent it (discovered from the
/// notification's origin); the terminator byte triggers one COMPLETE instead
/// of output.  Returns once the message is finished, leaving the receiver
/// state fully reset.
pub async fn receive_message<T: Transport, W: Write>(
    transport: &mut T,
    out: &mut W,
) -> Result<(), SessionError> {
    let mut state = MessageReceiver::new();
    loop {
        let ev = transport.recv().await?;
        let bit = BitSignal::from_pulse(ev.pulse);
        log::trace!("[recv] ← {bit:?} from pid {}", ev.from);

        match state.on_bit(bit, ev.from) {
            BitOutcome::Partial => {
                transport.send(ev.from, ReplySignal::Ack.pulse()).await?;
            }
            BitOutcome::Byte(byte) => {
                out.write_all(&[byte])?;
                out.flush()?;
                transport.send(ev.from, ReplySignal::Ack.pulse()).await?;
                log::debug!("[recv] byte 0x{byte:02x} from pid {}", ev.from);
            }
            BitOutcome::Terminated => {
                transport.send(ev.from, ReplySignal::Ack.pulse()).await?;
                transport
                    .send(ev.from, ReplySignal::Complete.pulse())
                    .await?;
                log::info!("[recv] message complete from pid {}", ev.from);
                return Ok(());
            }
        }
    }
}

/// Reassemble messages forever, one after another.
///
/// The receiver stays live across messages; only a transport or output
/// failure ends the loop.
pub async fn serve<T: Transport, W: Write>(
    transport: &mut T,
    out: &mut W,
) -> Result<(), SessionError> {
    loop {
        receive_message(transport, out).await?;
    }
}
