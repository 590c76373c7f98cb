//! In-memory X220 board for tests and dry runs.
//!
//! Behaves like the real board on the wire: answers `?` with an 8-byte
//! status frame, applies `S<relay><state>` commands silently, and times out
//! reads when it has nothing to say. It also records every byte written,
//! tagged with the session (open port) that wrote it, so tests can check
//! that exchanges never overlap.

use std::collections::{HashSet, VecDeque};
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use switchbridge_domain::device::RelayIndex;

use crate::error::RelayError;
use crate::protocol::{COMMAND_LEN, STATUS_REQUEST, encode_status};
use crate::transport::SerialTransport;

#[derive(Debug)]
struct BoardState {
    relays: [bool; RelayIndex::COUNT],
    chunk_size: usize,
    byte_delay: Duration,
    unplugged: bool,
    muted: bool,
    active_sessions: usize,
    max_concurrent_sessions: usize,
    sessions: Vec<Vec<u8>>,
    wire: Vec<(usize, u8)>,
}

/// Shared handle on an emulated board; clones see the same board.
#[derive(Debug, Clone)]
pub struct X220Emulator {
    state: Arc<Mutex<BoardState>>,
}

impl X220Emulator {
    /// A board whose relays start in `relays`.
    #[must_use]
    pub fn new(relays: [bool; RelayIndex::COUNT]) -> Self {
        Self {
            state: Arc::new(Mutex::new(BoardState {
                relays,
                chunk_size: usize::MAX,
                byte_delay: Duration::ZERO,
                unplugged: false,
                muted: false,
                active_sessions: 0,
                max_concurrent_sessions: 0,
                sessions: Vec::new(),
                wire: Vec::new(),
            })),
        }
    }

    /// Hand replies over at most `chunk_size` bytes per read.
    #[must_use]
    pub fn with_chunk_size(self, chunk_size: usize) -> Self {
        self.lock().chunk_size = chunk_size.max(1);
        self
    }

    /// Take `delay` to swallow each written byte.
    #[must_use]
    pub fn with_byte_delay(self, delay: Duration) -> Self {
        self.lock().byte_delay = delay;
        self
    }

    /// Make every subsequent open fail, as if the board was unplugged.
    pub fn unplug(&self) {
        self.lock().unplugged = true;
    }

    /// Stop answering status requests.
    pub fn mute(&self) {
        self.lock().muted = true;
    }

    /// Current relay positions.
    #[must_use]
    pub fn relays(&self) -> [bool; RelayIndex::COUNT] {
        self.lock().relays
    }

    /// Bytes written, one entry per session, in opening order.
    #[must_use]
    pub fn transcript(&self) -> Vec<Vec<u8>> {
        self.lock().sessions.clone()
    }

    /// Highest number of ports that were open at the same time.
    #[must_use]
    pub fn max_concurrent_sessions(&self) -> usize {
        self.lock().max_concurrent_sessions
    }

    /// Whether the bytes of two sessions ever mixed on the wire.
    #[must_use]
    pub fn wire_interleaved(&self) -> bool {
        let state = self.lock();
        let mut finished = HashSet::new();
        let mut current = None;
        for &(session, _) in &state.wire {
            if current != Some(session) {
                if finished.contains(&session) {
                    return true;
                }
                if let Some(previous) = current {
                    finished.insert(previous);
                }
                current = Some(session);
            }
        }
        false
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SerialTransport for X220Emulator {
    type Port = EmulatorPort;

    fn open(&self) -> Result<EmulatorPort, RelayError> {
        let mut state = self.lock();
        if state.unplugged {
            return Err(RelayError::Open(serialport::Error::new(
                serialport::ErrorKind::NoDevice,
                "emulated board unplugged",
            )));
        }
        state.active_sessions += 1;
        state.max_concurrent_sessions = state.max_concurrent_sessions.max(state.active_sessions);
        let session = state.sessions.len();
        state.sessions.push(Vec::new());
        Ok(EmulatorPort {
            state: Arc::clone(&self.state),
            session,
            chunk_size: state.chunk_size,
            byte_delay: state.byte_delay,
            pending: VecDeque::new(),
            command: Vec::with_capacity(COMMAND_LEN),
        })
    }
}

/// An open port on the emulated board.
#[derive(Debug)]
pub struct EmulatorPort {
    state: Arc<Mutex<BoardState>>,
    session: usize,
    chunk_size: usize,
    byte_delay: Duration,
    pending: VecDeque<u8>,
    command: Vec<u8>,
}

impl EmulatorPort {
    fn lock(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn accept(&mut self, byte: u8) {
        if !self.byte_delay.is_zero() {
            std::thread::sleep(self.byte_delay);
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.wire.push((self.session, byte));
        state.sessions[self.session].push(byte);

        if self.command.is_empty() {
            match byte {
                STATUS_REQUEST if !state.muted => {
                    self.pending.extend(encode_status(state.relays));
                }
                b'S' => self.command.push(byte),
                _ => {}
            }
            return;
        }

        self.command.push(byte);
        if self.command.len() == COMMAND_LEN {
            let relay = self.command[1]
                .checked_sub(b'0')
                .and_then(RelayIndex::new);
            match (relay, self.command[2]) {
                (Some(relay), b'0') => state.relays[relay.slot()] = false,
                (Some(relay), b'1') => state.relays[relay.slot()] = true,
                _ => {}
            }
            self.command.clear();
        }
    }
}

impl Write for EmulatorPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &byte in buf {
            self.accept(byte);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for EmulatorPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "operation timed out"));
        }
        let count = self.chunk_size.min(buf.len()).min(self.pending.len());
        for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }
}

impl Drop for EmulatorPort {
    fn drop(&mut self) {
        self.lock().active_sessions -= 1;
    }
}
