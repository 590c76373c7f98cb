//! X220 relay board wire protocol.
//!
//! The board speaks a tiny ASCII protocol at 9600 8N1:
//!
//! | Direction | Bytes | Meaning |
//! |-----------|-------|---------|
//! | host → board | `?` | status request |
//! | board → host | `s1X_s2Y_` | relay 1 is `X`, relay 2 is `Y` (`0`/`1`), `_` is padding |
//! | host → board | `S` relay state | switch relay (`1`/`2`) to state (`0`/`1`) |
//!
//! Commands are not acknowledged.

use switchbridge_domain::device::RelayIndex;
use switchbridge_domain::state::PowerState;

/// Status request byte (`0x3F`).
pub const STATUS_REQUEST: u8 = b'?';

/// Length of one status record.
pub const RECORD_LEN: usize = 4;

/// Length of the status reply: one record per relay.
pub const STATUS_FRAME_LEN: usize = RECORD_LEN * RelayIndex::COUNT;

/// Length of a switch command.
pub const COMMAND_LEN: usize = 3;

/// Decode a status reply into one state per relay.
///
/// A record whose marker is not `s` followed by the relay's own digit, or
/// whose state byte is neither `0` nor `1`, leaves that relay unknown.
#[must_use]
pub fn decode_status(frame: &[u8; STATUS_FRAME_LEN]) -> [PowerState; RelayIndex::COUNT] {
    let mut states = [PowerState::Unknown; RelayIndex::COUNT];
    for (relay, record) in RelayIndex::all().into_iter().zip(frame.chunks_exact(RECORD_LEN)) {
        states[relay.slot()] = decode_record(relay, record);
    }
    states
}

fn decode_record(relay: RelayIndex, record: &[u8]) -> PowerState {
    match record {
        [b's', digit, state, _] if *digit == relay_digit(relay) => match state {
            b'0' => PowerState::Off,
            b'1' => PowerState::On,
            _ => PowerState::Unknown,
        },
        _ => PowerState::Unknown,
    }
}

/// Encode the command switching `relay` on or off.
#[must_use]
pub fn encode_command(relay: RelayIndex, on: bool) -> [u8; COMMAND_LEN] {
    [b'S', relay_digit(relay), if on { b'1' } else { b'0' }]
}

/// Encode a status frame the way the board does.
#[must_use]
pub fn encode_status(states: [bool; RelayIndex::COUNT]) -> [u8; STATUS_FRAME_LEN] {
    let mut frame = [b' '; STATUS_FRAME_LEN];
    for (relay, record) in RelayIndex::all()
        .into_iter()
        .zip(frame.chunks_exact_mut(RECORD_LEN))
    {
        record[0] = b's';
        record[1] = relay_digit(relay);
        record[2] = if states[relay.slot()] { b'1' } else { b'0' };
    }
    frame
}

fn relay_digit(relay: RelayIndex) -> u8 {
    b'0' + relay.number()
}
