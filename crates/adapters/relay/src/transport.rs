//! Serial transport: how the board's port gets opened.

use std::io::{Read, Write};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, StopBits};

use crate::error::RelayError;

/// Something that can open a byte stream to the relay board.
///
/// Every exchange opens a fresh port and closes it when done, so the
/// port is never held between operations.
pub trait SerialTransport: Send + Sync + 'static {
    type Port: Read + Write + Send;

    /// Open the port.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Open`] when the device cannot be opened.
    fn open(&self) -> Result<Self::Port, RelayError>;
}

/// A real serial device, opened 8N1 with no flow control.
#[derive(Debug, Clone)]
pub struct SerialPortTransport {
    path: String,
    baud_rate: u32,
    timeout: Duration,
}

impl SerialPortTransport {
    /// `timeout` bounds each individual read or write on the port.
    #[must_use]
    pub fn new(path: impl Into<String>, baud_rate: u32, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            baud_rate,
            timeout,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl SerialTransport for SerialPortTransport {
    type Port = Box<dyn serialport::SerialPort>;

    fn open(&self) -> Result<Self::Port, RelayError> {
        let port = serialport::new(&self.path, self.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(self.timeout)
            .open()?;
        tracing::trace!(path = %self.path, baud_rate = self.baud_rate, "serial port opened");
        Ok(port)
    }
}
