//! Receive-side bit accumulation and peer binding.
//!
//! [`MessageReceiver`] implements the receiving half of the protocol:
//!
//! - Bits arrive one per notification and are shifted into a
//!   [`ByteAccumulator`], MSB-first.
//! - Every bit is ACKed by the caller; the 8th bit of a byte additionally
//!   yields the byte, or — when the byte is the [`TERMINATOR`] sentinel —
//!   ends the message.
//! - The sender's identity is learned from each notification's origin,
//!   last-writer-wins: a second sender barging in mid-byte corrupts the
//!   in-flight byte.  One active peer at a time is a protocol assumption.
//!
//! This module only manages state; all signal I/O is the caller's
//! responsibility (same pattern as [`crate::sender`]).

use crate::transport::Pid;
use crate::wire::{BitSignal, TERMINATOR};

// ---------------------------------------------------------------------------
// ByteAccumulator
// ---------------------------------------------------------------------------

/// The byte currently under construction, plus how many bits it holds.
///
/// The bit count is always in `[0, 8)` between calls: the 8th bit drains the
/// accumulator and resets it in the same operation, so a partially-built
/// byte is never observable alongside a full count.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ByteAccumulator {
    acc: u8,
    nbits: u8,
}

impl ByteAccumulator {
    /// An empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shift `bit` in at the least significant position.
    ///
    /// Returns `Some(byte)` when this was the 8th bit; the accumulator is
    /// reset to empty before returning.
    pub fn push(&mut self, bit: BitSignal) -> Option<u8> {
        self.acc = (self.acc << 1) | bit.value();
        self.nbits += 1;
        if self.nbits == 8 {
            let byte = self.acc;
            *self = Self::new();
            Some(byte)
        } else {
            None
        }
    }

    /// Number of bits accumulated so far (0..8).
    pub fn bit_count(&self) -> u8 {
        self.nbits
    }

    /// `true` when no bits have been accumulated.
    pub fn is_empty(&self) -> bool {
        self.nbits == 0
    }
}

// ---------------------------------------------------------------------------
// MessageReceiver
// ---------------------------------------------------------------------------

/// What a just-processed bit means for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOutcome {
    /// Mid-byte; ACK and keep going.
    Partial,
    /// A data byte completed; emit it, then ACK.
    Byte(u8),
    /// The terminator completed; ACK, send COMPLETE, message is over.
    Terminated,
}

/// Receive-side state for one logical message.
#[derive(Debug, Default)]
pub struct MessageReceiver {
    acc: ByteAccumulator,
    /// The sender we are currently bound to, if any.
    peer: Option<Pid>,
}

impl MessageReceiver {
    /// Create a receiver with an empty accumulator and no bound peer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one inbound bit from `from`.
    ///
    /// Rebinds the current peer to `from` (last-writer-wins) and classifies
    /// the accumulator's progress.  On [`BitOutcome::Terminated`] the
    /// receiver resets itself — accumulator and peer binding together — so
    /// it is immediately ready for a future message.
    pub fn on_bit(&mut self, bit: BitSignal, from: Pid) -> BitOutcome {
        self.peer = Some(from);
        match self.acc.push(bit) {
            None => BitOutcome::Partial,
            Some(TERMINATOR) => {
                *self = Self::new();
                BitOutcome::Terminated
            }
            Some(byte) => BitOutcome::Byte(byte),
        }
    }

    /// The peer currently bound to this message, if a bit has arrived.
    pub fn peer(&self) -> Option<Pid> {
        self.peer
    }

    /// Bits accumulated toward the in-progress byte.
    pub fn bit_count(&self) -> u8 {
        self.acc.bit_count()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
