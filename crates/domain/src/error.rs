//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts via `#[from]`.
//! Topology errors are fatal at startup; device errors are always contained
//! inside the loop or command call that produced them.

use std::fmt;
use std::time::Duration;

/// Boxed error used to carry adapter-specific sources across the port boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error for application services.
#[derive(Debug, thiserror::Error)]
pub enum SwitchBridgeError {
    #[error("invalid topology")]
    Topology(#[from] TopologyError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("device error")]
    Device(#[from] DeviceError),
}

/// A lookup by identifier matched nothing.
#[derive(Debug, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Location of a descriptor inside the outlet list, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutletPosition {
    /// Index of the top-level element.
    pub element: usize,
    /// Index inside a nested group, when the descriptor is grouped.
    pub member: Option<usize>,
}

impl fmt::Display for OutletPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.member {
            Some(member) => write!(f, "element {}, member {member}", self.element),
            None => write!(f, "element {}", self.element),
        }
    }
}

/// Validation failure while loading the outlet topology.
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("topology document is not valid JSON")]
    Parse(#[source] serde_json::Error),

    #[error("topology root is not an object")]
    RootNotObject,

    #[error("no key {key} in topology")]
    MissingOutletList { key: &'static str },

    #[error("value {key} is not an array")]
    OutletListNotArray { key: &'static str },

    #[error("{key} array is empty")]
    EmptyOutletList { key: &'static str },

    #[error("{position} of the outlet list is not an object")]
    NotAnObject { position: OutletPosition },

    #[error("{position} of the outlet list is an empty group")]
    EmptyGroup { position: OutletPosition },

    #[error("no key {field} in {position}")]
    MissingField {
        position: OutletPosition,
        field: &'static str,
    },

    #[error("wrong type for {field} in {position}, expected {expected}")]
    WrongFieldType {
        position: OutletPosition,
        field: &'static str,
        expected: &'static str,
    },

    #[error("invalid value {value:?} for {field} in {position}")]
    InvalidField {
        position: OutletPosition,
        field: &'static str,
        value: String,
    },

    #[error("server section is not an object")]
    ServerNotObject,

    #[error("wrong type for server.{field}, expected {expected}")]
    ServerFieldType {
        field: &'static str,
        expected: &'static str,
    },
}

/// Failure of a single hardware read or write.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The supervisory deadline elapsed before the operation reported back.
    #[error("{operation} timed out after {}ms", .deadline.as_millis())]
    Timeout {
        operation: &'static str,
        deadline: Duration,
    },

    /// The device answered with something we could not decode.
    #[error("protocol error: {0}")]
    Protocol(#[source] BoxError),

    /// Opening, reading or writing the transport failed.
    #[error("hardware I/O error: {0}")]
    HardwareIo(#[source] BoxError),

    /// The worker stopped (panicked or was dropped) without a result.
    #[error("{operation} worker ended without reporting a result")]
    WorkerLost { operation: &'static str },
}

impl DeviceError {
    /// Whether the failure points at the hardware itself (unplugged board,
    /// unreachable host) rather than a slow or confused peer.
    #[must_use]
    pub fn is_hardware(&self) -> bool {
        matches!(self, Self::HardwareIo(_) | Self::WorkerLost { .. })
    }

    /// Whether the failure is a deadline expiry.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
