//! Timing policy for the engine.

use std::time::Duration;

/// Cadence and deadlines applied to every device.
///
/// None of these values are dictated by the hardware; they are polling and
/// patience policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnginePolicy {
    /// Time between two reads of the same device.
    pub poll_interval: Duration,
    /// Supervisory deadline for one full read or write cycle, lock wait
    /// included.
    pub io_deadline: Duration,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            io_deadline: Duration::from_secs(5),
        }
    }
}
