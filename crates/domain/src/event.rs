//! Events: immutable records of what happened to a device.
//!
//! Reconciliation publishes an event whenever the cached state of a device
//! moves, or when a read came back without a definite answer. Commands
//! publish one event per attempt, successful or not.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{DeviceId, EventId};
use crate::state::PowerState;

/// UTC timestamp attached to every event.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// A poll observed a definite value that differs from the cache.
    StateChanged { from: PowerState, to: PowerState },
    /// A poll returned no definite value; the cache was left alone.
    ReadUnknown {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// A command reached the device. `realized` is what the device
    /// reported back, which may be [`PowerState::Unknown`].
    CommandApplied {
        desired: PowerState,
        realized: PowerState,
    },
    /// A command failed or timed out before the device confirmed it.
    CommandFailed { desired: PowerState, reason: String },
}

/// An event about one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub device_id: DeviceId,
    pub timestamp: Timestamp,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    /// Create an event stamped with a fresh id and the current time.
    #[must_use]
    pub fn new(device_id: DeviceId, kind: EventKind) -> Self {
        Self {
            id: EventId::new(),
            device_id,
            timestamp: now(),
            kind,
        }
    }
}
