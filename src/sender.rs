//! Lockstep send-side state machine.
//!
//! [`MessageSender`] walks a message one bit at a time, MSB-first, with at
//! most **one** bit in flight.  It does not touch the transport;
//! [`crate::session::send_message`] calls these methods and owns the actual
//! send/receive loop.
//!
//! # Lockstep contract
//!
//! - A new bit may only be produced once the previous one has been ACKed.
//! - After every byte of the message, one extra [`TERMINATOR`] byte is sent,
//!   even when the message is empty.
//! - After the terminator's final ACK the sender waits for COMPLETE.
//! - Replies of different kinds ride different signal numbers and may be
//!   observed out of order; a COMPLETE overtaking the final ACK still
//!   finishes the transfer.

use crate::wire::{BitSignal, ReplySignal, TERMINATOR};

// ---------------------------------------------------------------------------
// BitCursor
// ---------------------------------------------------------------------------

/// Walks the bits of one byte, most significant first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitCursor {
    byte: u8,
    /// Bits already produced, 0..=8.
    sent: u8,
}

impl BitCursor {
    /// Start a cursor over `byte` with no bits produced yet.
    pub fn new(byte: u8) -> Self {
        Self { byte, sent: 0 }
    }

    /// Produce the next bit, or `None` once all 8 have been produced.
    pub fn next_bit(&mut self) -> Option<BitSignal> {
        if self.sent == 8 {
            return None;
        }
        let index = 7 - self.sent;
        self.sent += 1;
        if (self.byte >> index) & 1 == 1 {
            Some(BitSignal::One)
        } else {
            Some(BitSignal::Zero)
        }
    }

    /// `true` once all 8 bits have been produced.
    pub fn exhausted(&self) -> bool {
        self.sent == 8
    }
}

// ---------------------------------------------------------------------------
// MessageSender
// ---------------------------------------------------------------------------

/// Where the send side currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    /// The next bit may be produced.
    Ready,
    /// One bit is in flight; waiting for its ACK.
    AwaitingAck,
    /// All bits (including the terminator's) are ACKed; waiting for COMPLETE.
    AwaitingComplete,
    /// COMPLETE observed; the transfer succeeded.
    Done,
}

/// Lockstep send-side state for one message.
///
/// ```text
///   Ready ──next_bit──▶ AwaitingAck ──Ack──▶ Ready …
///                            │                  │ (terminator exhausted)
///                            │ Complete         ▼
///                            └────────▶ AwaitingComplete ──Complete──▶ Done
/// ```
#[derive(Debug)]
pub struct MessageSender {
    /// Message bytes followed by the terminator.
    bytes: Vec<u8>,
    /// Index of the next byte to load into the cursor.
    next_byte: usize,
    cursor: BitCursor,
    state: SendState,
}

impl MessageSender {
    /// Create a sender for `message`.
    ///
    /// The [`TERMINATOR`] sentinel is appended unconditionally, so even an
    /// empty message produces 8 bits on the wire.
    pub fn new(message: &[u8]) -> Self {
        let mut bytes = message.to_vec();
        bytes.push(TERMINATOR);
        Self {
            cursor: BitCursor::new(bytes[0]),
            bytes,
            next_byte: 1,
            state: SendState::Ready,
        }
    }

    /// Current state.
    pub fn state(&self) -> SendState {
        self.state
    }

    /// `true` once COMPLETE has been observed.
    pub fn is_done(&self) -> bool {
        self.state == SendState::Done
    }

    /// Total number of bits this message occupies on the wire.
    pub fn bits_total(&self) -> usize {
        self.bytes.len() * 8
    }

    /// Produce the next bit to transmit, transitioning to `AwaitingAck`.
    ///
    /// Returns `None` while an ACK is outstanding, while awaiting COMPLETE,
    /// and after the transfer is done — the lockstep guard.
    pub fn next_bit(&mut self) -> Option<BitSignal> {
        if self.state != SendState::Ready {
            return None;
        }
        // Ready implies the cursor still has bits; see on_reply.
        let bit = self.cursor.next_bit()?;
        self.state = SendState::AwaitingAck;
        Some(bit)
    }

    /// Process a reply from the receiver.
    ///
    /// Returns `true` when the reply advanced the state machine; stray or
    /// duplicate replies return `false` and are otherwise ignored.
    pub fn on_reply(&mut self, reply: ReplySignal) -> bool {
        match (self.state, reply) {
            (SendState::AwaitingAck, ReplySignal::Ack) => {
                if !self.cursor.exhausted() {
                    self.state = SendState::Ready;
                } else if self.next_byte < self.bytes.len() {
                    self.cursor = BitCursor::new(self.bytes[self.next_byte]);
                    self.next_byte += 1;
                    self.state = SendState::Ready;
                } else {
                    self.state = SendState::AwaitingComplete;
                }
                true
            }
            (SendState::AwaitingAck, ReplySignal::Complete) if self.at_final_bit() => {
                // Pending signals of different numbers are not ordered, so
                // COMPLETE can overtake the final ACK.  The transfer is
                // finished either way.
                self.state = SendState::Done;
                true
            }
            (SendState::AwaitingComplete, ReplySignal::Complete) => {
                self.state = SendState::Done;
                true
            }
            _ => false,
        }
    }

    /// `true` when the in-flight bit is the last bit of the terminator.
    fn at_final_bit(&self) -> bool {
        self.cursor.exhausted() && self.next_byte == self.bytes.len()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
