//! Entry point for `sigwire`.
//!
//! Parses CLI arguments and dispatches into either **serve** (receiver) or
//! **send** mode.  All actual protocol work is delegated to library modules;
//! `main.rs` owns only process setup (logging, argument parsing, exit codes).

use std::io;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use sigwire::session;
use sigwire::transport::{Pid, SignalTransport};

/// Byte transport between two processes over payload-less POSIX signals.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Run the receiving side: print our PID, then reassemble inbound
    /// messages to stdout forever.
    Serve,
    /// Send a message to a receiver identified by its PID.
    Send {
        /// Target process id (as printed by `sigwire serve`).
        pid: Pid,
        /// The message to transmit.
        message: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::init();

    let cli = Cli::parse();

    match cli.mode {
        Mode::Serve => {
            // The printed PID is the out-of-band rendezvous: it is the only
            // way a sender learns whom to target.
            println!("Receiver PID: {}", Pid::current());
            let mut transport = match SignalTransport::bind() {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("sigwire: {e}");
                    return ExitCode::FAILURE;
                }
            };
            // Serve loops forever; only a transport or output failure returns.
            if let Err(e) = session::serve(&mut transport, &mut io::stdout()).await {
                eprintln!("sigwire: {e}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Mode::Send { pid, message } => {
            // The sender needs its own subscription to observe ACKs.
            let mut transport = match SignalTransport::bind() {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("sigwire: {e}");
                    return ExitCode::FAILURE;
                }
            };
            match session::send_message(&mut transport, pid, message.as_bytes()).await {
                Ok(()) => {
                    println!("Message delivered to PID {pid}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("sigwire: {e}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
