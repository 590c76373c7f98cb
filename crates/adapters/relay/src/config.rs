//! Relay board configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Where the board is attached and how patient to be with it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Serial device node of the board.
    pub device: String,
    /// Lock file shared with every other program driving the same port.
    pub lock_path: PathBuf,
    /// Line speed; the X220 talks 9600 8N1.
    pub baud_rate: u32,
    /// How long to wait for the lock, in milliseconds.
    pub lock_timeout_ms: u64,
    /// Deadline for one serial exchange, in milliseconds.
    pub io_timeout_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyUSB0".to_string(),
            lock_path: PathBuf::from("/var/lock/ttyUSB0.lock"),
            baud_rate: 9600,
            lock_timeout_ms: 2000,
            io_timeout_ms: 5000,
        }
    }
}

impl RelayConfig {
    #[must_use]
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    #[must_use]
    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}
