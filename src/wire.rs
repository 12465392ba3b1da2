//! Wire-format definitions for the signal protocol.
//!
//! Every notification exchanged between peers is one of exactly two POSIX
//! signals; there is no payload.  This module is responsible for:
//! - Defining the on-wire alphabet ([`Pulse`]) and its raw signal numbers.
//! - Mapping pulses to their direction-sensitive meanings: [`BitSignal`]
//!   toward the receiver, [`ReplySignal`] back toward the sender.
//! - Defining the end-of-message sentinel ([`TERMINATOR`]).
//!
//! No I/O happens here — this is pure data transformation.
//!
//! # Wire format
//!
//! ```text
//!              sender ──▶ receiver        receiver ──▶ sender
//!  SIGUSR1     bit 0                      COMPLETE (message done)
//!  SIGUSR2     bit 1                      ACK (bit received)
//! ```
//!
//! Bits are transmitted MSB-first, 8 per byte, and a message is terminated
//! by one extra [`TERMINATOR`] byte.  The same two signal numbers carry both
//! bits and replies; only the direction of travel disambiguates them.
//!
//! # Known limitation
//!
//! Because [`TERMINATOR`] is an in-band value, a NUL byte *inside* a message
//! is indistinguishable from end-of-message: the receiver completes early
//! and treats the remaining bytes as the start of a new message.  This is
//! inherent to the termination convention and is not worked around.

use std::os::raw::c_int;

use signal_hook::consts::signal::{SIGUSR1, SIGUSR2};

/// End-of-message sentinel byte, sent after the last message byte.
pub const TERMINATOR: u8 = 0x00;

// ---------------------------------------------------------------------------
// Pulse
// ---------------------------------------------------------------------------

/// One of the two deliverable signal values — the entire wire alphabet.
///
/// A [`Pulse`] is what a transport actually sends and receives; its meaning
/// depends on direction (see [`BitSignal`] and [`ReplySignal`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pulse {
    /// SIGUSR1 on the wire.
    Usr1,
    /// SIGUSR2 on the wire.
    Usr2,
}

impl Pulse {
    /// Map a raw signal number to a [`Pulse`].
    ///
    /// Returns `None` for any signal outside the protocol alphabet; the
    /// transport drops such deliveries.
    pub fn from_raw(signal: c_int) -> Option<Self> {
        match signal {
            SIGUSR1 => Some(Pulse::Usr1),
            SIGUSR2 => Some(Pulse::Usr2),
            _ => None,
        }
    }

    /// The raw signal number to deliver for this pulse.
    pub fn to_raw(self) -> c_int {
        match self {
            Pulse::Usr1 => SIGUSR1,
            Pulse::Usr2 => SIGUSR2,
        }
    }
}

// ---------------------------------------------------------------------------
// BitSignal (sender → receiver)
// ---------------------------------------------------------------------------

/// A single message bit as carried toward the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitSignal {
    /// Bit value 0 (SIGUSR1).
    Zero,
    /// Bit value 1 (SIGUSR2).
    One,
}

impl BitSignal {
    /// The pulse that carries this bit.
    pub fn pulse(self) -> Pulse {
        match self {
            BitSignal::Zero => Pulse::Usr1,
            BitSignal::One => Pulse::Usr2,
        }
    }

    /// Interpret a pulse arriving at the receiver as a bit.
    pub fn from_pulse(pulse: Pulse) -> Self {
        match pulse {
            Pulse::Usr1 => BitSignal::Zero,
            Pulse::Usr2 => BitSignal::One,
        }
    }

    /// Numeric bit value (0 or 1).
    pub fn value(self) -> u8 {
        match self {
            BitSignal::Zero => 0,
            BitSignal::One => 1,
        }
    }
}

// ---------------------------------------------------------------------------
// ReplySignal (receiver → sender)
// ---------------------------------------------------------------------------

/// A reply as carried back toward the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySignal {
    /// The receiver accepted one bit; the sender may emit the next (SIGUSR2).
    Ack,
    /// The terminator byte was fully accumulated; the transfer is done (SIGUSR1).
    Complete,
}

impl ReplySignal {
    /// The pulse that carries this reply.
    pub fn pulse(self) -> Pulse {
        match self {
            ReplySignal::Ack => Pulse::Usr2,
            ReplySignal::Complete => Pulse::Usr1,
        }
    }

    /// Interpret a pulse arriving back at the sender as a reply.
    pub fn from_pulse(pulse: Pulse) -> Self {
        match pulse {
            Pulse::Usr2 => ReplySignal::Ack,
            Pulse::Usr1 => ReplySignal::Complete,
        }
    }
}
