//! Relay CGI semantics: `?sid=<relay>&state=get|on|off` against a board.
//!
//! Every request starts with a status read. `get` reports it; `on` and
//! `off` only write when the relay is not already there.
//!
//! | Request | Board | Reply |
//! |---------|-------|-------|
//! | `sid=1&state=get` | relay 1 on | `{"sid":1,"state":"on"}` |
//! | `sid=1&state=get` | no answer | `{"sid":1,"state":null}` |
//! | `sid=2&state=on` | relay 2 on | `{"sid":2,"state":"on","changed":false}` |
//! | `sid=2&state=on` | relay 2 off | `{"sid":2,"state":"on","changed":true}` |
//! | `sid=2&state=on` | write failed | `{"sid":2,"state":null,"changed":true}` |

use std::borrow::Cow;

use serde::Serialize;

use switchbridge_domain::device::RelayIndex;
use switchbridge_domain::state::PowerState;

use crate::board::RelayBoard;
use crate::transport::SerialTransport;

/// What the client wants done with the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CgiAction {
    Get,
    On,
    Off,
}

/// A validated CGI request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CgiRequest {
    pub relay: RelayIndex,
    pub action: CgiAction,
}

/// Why a query string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CgiRequestError {
    #[error("missing sid parameter")]
    MissingSid,
    #[error("invalid sid {0:?}, expected 1 or 2")]
    InvalidSid(String),
    #[error("missing state parameter")]
    MissingState,
    #[error("invalid state {0:?}, expected get, on or off")]
    InvalidState(String),
}

impl CgiRequest {
    /// Parse a raw `QUERY_STRING`. The first occurrence of each parameter
    /// wins; `state` is case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns a [`CgiRequestError`] naming the missing or invalid
    /// parameter.
    pub fn from_query(query: &str) -> Result<Self, CgiRequestError> {
        let sid = query_value(query, "sid").ok_or(CgiRequestError::MissingSid)?;
        let relay = sid
            .parse::<u8>()
            .ok()
            .and_then(RelayIndex::new)
            .ok_or_else(|| CgiRequestError::InvalidSid(sid.to_string()))?;

        let state = query_value(query, "state").ok_or(CgiRequestError::MissingState)?;
        let action = match state.to_ascii_lowercase().as_str() {
            "get" => CgiAction::Get,
            "on" => CgiAction::On,
            "off" => CgiAction::Off,
            _ => return Err(CgiRequestError::InvalidState(state.to_string())),
        };

        Ok(Self { relay, action })
    }
}

fn query_value<'a>(query: &'a str, name: &str) -> Option<Cow<'a, str>> {
    query
        .split('&')
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| decode_component(value))
}

fn decode_component(value: &str) -> Cow<'_, str> {
    let spaced: Cow<'_, str> = if value.contains('+') {
        Cow::Owned(value.replace('+', " "))
    } else {
        Cow::Borrowed(value)
    };
    let decoded = urlencoding::decode(&spaced).map(Cow::into_owned);
    match decoded {
        Ok(decoded) => Cow::Owned(decoded),
        Err(_) => spaced,
    }
}

/// JSON reply of the relay CGI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CgiResponse {
    pub sid: u8,
    /// `null` when the board's answer was not definite.
    pub state: Option<PowerState>,
    /// Present for `on`/`off` only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed: Option<bool>,
}

/// Serve one request against the board.
///
/// A failed status read counts as both relays unknown, which means an
/// `on`/`off` request always attempts the write in that case.
pub async fn handle<T: SerialTransport>(board: &RelayBoard<T>, request: CgiRequest) -> CgiResponse {
    let sid = request.relay.number();
    let current = match board.read_status().await {
        Ok(states) => states[request.relay.slot()],
        Err(err) => {
            tracing::warn!(error = %err, "relay board status unavailable");
            PowerState::Unknown
        }
    };

    let desired = match request.action {
        CgiAction::Get => {
            return CgiResponse {
                sid,
                state: current.is_known().then_some(current),
                changed: None,
            };
        }
        CgiAction::On => true,
        CgiAction::Off => false,
    };

    let target = PowerState::from(desired);
    if current == target {
        return CgiResponse {
            sid,
            state: Some(target),
            changed: Some(false),
        };
    }

    match board.write_relay(request.relay, desired).await {
        Ok(()) => CgiResponse {
            sid,
            state: Some(target),
            changed: Some(true),
        },
        Err(err) => {
            tracing::warn!(error = %err, relay = sid, "relay command failed");
            CgiResponse {
                sid,
                state: None,
                changed: Some(true),
            }
        }
    }
}
