//! `sigwire` — a reliable, ordered byte stream between two processes carried
//! entirely by payload-less POSIX signals.
//!
//! # Architecture
//!
//! ```text
//!  ┌──────────┐  bit signals   ┌──────────┐
//!  │  Sender  │───────────────▶│ Receiver │──▶ stdout
//!  └────┬─────┘                └─────┬────┘
//!       │     ACK / COMPLETE         │
//!       │◀───────────────────────────┘
//!       │
//!  ┌────▼──────────────────────────────┐
//!  │            Session                │
//!  │  (owns state machine + transport) │
//!  └────┬──────────────────────────────┘
//!       │ SIGUSR1 / SIGUSR2
//!  ┌────▼──────────┐
//!  │   Transport   │  (signal-hook subscription + kill)
//!  └───────────────┘
//! ```
//!
//! Each byte travels as 8 signals, MSB-first: SIGUSR1 carries a 0 bit,
//! SIGUSR2 a 1.  The receiver acknowledges every bit back to the signal's
//! origin PID and the sender waits for each ACK before the next bit goes
//! out (lockstep, window 1) — the discipline that turns an unordered,
//! fire-and-forget primitive into an ordered stream.  A NUL terminator byte
//! ends every message and is answered with a COMPLETE signal instead of
//! output.
//!
//! Each module has a single responsibility:
//! - [`wire`]      — the two-signal alphabet and its direction-sensitive meanings
//! - [`sender`]    — lockstep outbound bit state machine
//! - [`receiver`]  — inbound bit accumulation and peer binding
//! - [`session`]   — the send/receive loops driving state machines over a transport
//! - [`transport`] — `Pid`, the `Transport` trait, and the real signal transport
//! - [`loopback`]  — in-memory transport pair for deterministic tests
//!
//! # Limitations
//!
//! - The NUL terminator is in-band: a NUL byte inside a message is
//!   indistinguishable from end-of-message and splits the transmission.
//! - One active sender per receiver; a second concurrent sender corrupts the
//!   in-flight byte (the receiver binds to origins last-writer-wins).
//! - No timeouts: a peer that stops replying leaves the other side suspended
//!   forever.  Lost or duplicated deliveries desynchronize the lockstep
//!   silently — there are no sequence numbers to detect it.

pub mod loopback;
pub mod receiver;
pub mod sender;
pub mod session;
pub mod transport;
pub mod wire;
