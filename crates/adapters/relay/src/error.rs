//! Relay adapter error types.

use switchbridge_domain::error::DeviceError;

/// Errors specific to the relay board adapter.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The serial device could not be opened or configured.
    #[error("failed to open serial port")]
    Open(#[from] serialport::Error),

    /// Reading from or writing to the open port failed.
    #[error("serial I/O failed")]
    Io(#[from] std::io::Error),

    /// The lock file could not be opened or locked.
    #[error("failed to lock {path}")]
    Lock {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl RelayError {
    /// Convert into a [`DeviceError`] for propagation across the port
    /// boundary. Unrecognised status records decode to unknown instead of
    /// failing, so every relay error is a hardware error.
    #[must_use]
    pub fn into_domain(self) -> DeviceError {
        DeviceError::HardwareIo(Box::new(self))
    }
}

impl From<RelayError> for DeviceError {
    fn from(err: RelayError) -> Self {
        err.into_domain()
    }
}
