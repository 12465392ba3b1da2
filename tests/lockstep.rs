//! End-to-end tests of the lockstep protocol over the in-memory transport.
//!
//! Each test spins up the two session loops as separate tokio tasks talking
//! through a [`sigwire::loopback`] pair, so both sides make progress
//! concurrently.  Every await is wrapped in a timeout: the protocol itself
//! has no watchdog, so a regression would otherwise hang the suite.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::timeout;

use sigwire::loopback::{pair, LoopbackTransport};
use sigwire::session::{receive_message, send_message};
use sigwire::transport::{Event, Pid, Transport, TransportError};
use sigwire::wire::Pulse;

const SENDER_PID: i32 = 100;
const RECEIVER_PID: i32 = 200;

fn pid(raw: i32) -> Pid {
    Pid::new(raw).unwrap()
}

/// Run one full exchange: sender transmits `message`, receiver reassembles
/// exactly one logical message.  Returns the bytes the receiver emitted.
async fn exchange(message: &[u8]) -> Vec<u8> {
    let (mut tx_end, mut rx_end) = pair(pid(SENDER_PID), pid(RECEIVER_PID));
    let message = message.to_vec();

    let receiver = tokio::spawn(async move {
        let mut out = Vec::new();
        receive_message(&mut rx_end, &mut out).await.expect("receive");
        out
    });
    let sender = tokio::spawn(async move {
        send_message(&mut tx_end, pid(RECEIVER_PID), &message)
            .await
            .expect("send");
    });

    let (out, sent) = timeout(Duration::from_secs(5), async {
        tokio::join!(receiver, sender)
    })
    .await
    .expect("exchange timed out");
    sent.expect("sender task panicked");
    out.expect("receiver task panicked")
}

// ---------------------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------------------

#[tokio::test]
async fn round_trip_delivers_exact_bytes() {
    assert_eq!(exchange(b"hello, world").await, b"hello, world");
}

#[tokio::test]
async fn round_trip_single_byte() {
    assert_eq!(exchange(b"A").await, b"A");
}

#[tokio::test]
async fn round_trip_binary_bytes() {
    // Every non-NUL byte value survives the trip.
    let message: Vec<u8> = (1u8..=255).collect();
    assert_eq!(exchange(&message).await, message);
}

#[tokio::test]
async fn empty_message_emits_nothing() {
    // Only the sentinel travels: the receiver completes with zero output.
    assert_eq!(exchange(b"").await, b"");
}

#[tokio::test]
async fn explicit_nul_message_emits_nothing() {
    // A message consisting of the sentinel byte itself: the receiver detects
    // completion on the first byte and emits nothing.  The sender's trailing
    // terminator is reassembled as a second, also-empty message.
    let (mut tx_end, mut rx_end) = pair(pid(SENDER_PID), pid(RECEIVER_PID));

    let receiver = tokio::spawn(async move {
        let mut out = Vec::new();
        receive_message(&mut rx_end, &mut out).await.expect("first");
        receive_message(&mut rx_end, &mut out).await.expect("second");
        out
    });
    let sender = tokio::spawn(async move {
        send_message(&mut tx_end, pid(RECEIVER_PID), b"\x00")
            .await
            .expect("send");
    });

    let (out, sent) = timeout(Duration::from_secs(5), async {
        tokio::join!(receiver, sender)
    })
    .await
    .expect("timed out");
    sent.unwrap();
    assert_eq!(out.unwrap(), b"");
}

// ---------------------------------------------------------------------------
// Sequential messages — no state leakage
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sequential_messages_produce_clean_copies() {
    let (mut tx_end, mut rx_end) = pair(pid(SENDER_PID), pid(RECEIVER_PID));

    let receiver = tokio::spawn(async move {
        let mut first = Vec::new();
        receive_message(&mut rx_end, &mut first).await.expect("first");
        let mut second = Vec::new();
        receive_message(&mut rx_end, &mut second).await.expect("second");
        (first, second)
    });
    let sender = tokio::spawn(async move {
        send_message(&mut tx_end, pid(RECEIVER_PID), b"once")
            .await
            .expect("send once");
        send_message(&mut tx_end, pid(RECEIVER_PID), b"once")
            .await
            .expect("send twice");
    });

    let (received, sent) = timeout(Duration::from_secs(5), async {
        tokio::join!(receiver, sender)
    })
    .await
    .expect("timed out");
    sent.unwrap();
    let (first, second) = received.unwrap();
    assert_eq!(first, b"once");
    assert_eq!(second, b"once");
}

// ---------------------------------------------------------------------------
// Lockstep and completion invariants (instrumented transport)
// ---------------------------------------------------------------------------

/// What the sender-side transport saw, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Traffic {
    Sent(Pulse),
    Received(Pulse),
}

/// Transport wrapper that records every pulse crossing the sender's edge.
struct Recording {
    inner: LoopbackTransport,
    log: Arc<Mutex<Vec<Traffic>>>,
}

impl Transport for Recording {
    async fn send(&self, peer: Pid, pulse: Pulse) -> Result<(), TransportError> {
        self.log.lock().unwrap().push(Traffic::Sent(pulse));
        self.inner.send(peer, pulse).await
    }

    async fn recv(&mut self) -> Result<Event, TransportError> {
        let ev = self.inner.recv().await?;
        self.log.lock().unwrap().push(Traffic::Received(ev.pulse));
        Ok(ev)
    }
}

#[tokio::test]
async fn sender_never_outruns_the_acks() {
    const MESSAGE: &[u8] = b"hi";
    let (tx_end, mut rx_end) = pair(pid(SENDER_PID), pid(RECEIVER_PID));
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut recording = Recording {
        inner: tx_end,
        log: Arc::clone(&log),
    };

    let receiver = tokio::spawn(async move {
        let mut out = Vec::new();
        receive_message(&mut rx_end, &mut out).await.expect("receive");
        out
    });
    let sender = tokio::spawn(async move {
        send_message(&mut recording, pid(RECEIVER_PID), MESSAGE)
            .await
            .expect("send");
    });

    let (out, sent) = timeout(Duration::from_secs(5), async {
        tokio::join!(receiver, sender)
    })
    .await
    .expect("timed out");
    sent.unwrap();
    assert_eq!(out.unwrap(), MESSAGE);

    let log = log.lock().unwrap();
    let bits_expected = (MESSAGE.len() + 1) * 8;

    // Strict alternation: bit, its ACK, next bit, … then one COMPLETE.
    assert_eq!(log.len(), bits_expected * 2 + 1);
    for chunk in log[..bits_expected * 2].chunks(2) {
        assert!(matches!(chunk[0], Traffic::Sent(_)), "bit expected: {chunk:?}");
        assert_eq!(
            chunk[1],
            Traffic::Received(Pulse::Usr2),
            "each bit must be ACKed before the next goes out"
        );
    }

    // Exactly one COMPLETE, strictly last, strictly after the terminator.
    let completes = log
        .iter()
        .filter(|t| **t == Traffic::Received(Pulse::Usr1))
        .count();
    assert_eq!(completes, 1);
    assert_eq!(*log.last().unwrap(), Traffic::Received(Pulse::Usr1));

    // 8·(len+1) bits on the wire, terminator included.
    let bits_sent = log.iter().filter(|t| matches!(t, Traffic::Sent(_))).count();
    assert_eq!(bits_sent, bits_expected);
}
