//! # switchbridge-adapter-relay
//!
//! Drives a GCE X220 two-relay board attached over USB-serial (FTDI,
//! usually `/dev/ttyUSB0`).
//!
//! ## How it works
//!
//! The board has one serial line and no notion of sessions, so every
//! exchange (status read or switch command) is a short open, talk, close
//! cycle performed while holding an exclusive advisory lock on
//! `/var/lock/ttyUSB0.lock`. Each relay is exposed to the engine as its
//! own [`RelayChannel`]; all channels share one [`RelayBoard`].
//!
//! The [`cgi`] module holds the semantics of the `power-switch-cgi`
//! program, and [`emulator`] provides an in-memory board.
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `switchbridge-app` and
//! `switchbridge-domain`.

mod board;
pub mod cgi;
mod config;
pub mod emulator;
mod error;
mod guard;
pub mod protocol;
mod transport;

pub use board::{RelayBoard, RelayChannel};
pub use config::RelayConfig;
pub use error::RelayError;
pub use guard::{TransportGuard, TransportLease};
pub use transport::{SerialPortTransport, SerialTransport};
