//! Relay board driver and per-relay switch adapter.

use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;

use switchbridge_app::guarded;
use switchbridge_app::ports::SwitchAdapter;
use switchbridge_domain::device::RelayIndex;
use switchbridge_domain::error::DeviceError;
use switchbridge_domain::state::PowerState;

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::guard::TransportGuard;
use crate::protocol::{STATUS_FRAME_LEN, STATUS_REQUEST, decode_status, encode_command};
use crate::transport::{SerialPortTransport, SerialTransport};

/// One X220 board behind a shared serial transport.
///
/// Every exchange takes the transport lease first, then opens the port,
/// talks, closes the port and finally releases the lease. Both steps are
/// bounded by their own deadline.
pub struct RelayBoard<T> {
    transport: Arc<T>,
    guard: TransportGuard,
    lock_deadline: Duration,
    io_deadline: Duration,
}

impl RelayBoard<SerialPortTransport> {
    /// Board on a real serial device, as configured.
    #[must_use]
    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(
            SerialPortTransport::new(&config.device, config.baud_rate, config.io_timeout()),
            TransportGuard::new(&config.lock_path),
            config.lock_timeout(),
            config.io_timeout(),
        )
    }
}

impl<T: SerialTransport> RelayBoard<T> {
    #[must_use]
    pub fn new(
        transport: T,
        guard: TransportGuard,
        lock_deadline: Duration,
        io_deadline: Duration,
    ) -> Self {
        Self {
            transport: Arc::new(transport),
            guard,
            lock_deadline,
            io_deadline,
        }
    }

    /// Ask the board for the state of both relays.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Timeout`] if the lock or the exchange takes
    /// too long, or [`DeviceError::HardwareIo`] if the port fails.
    pub async fn read_status(&self) -> Result<[PowerState; RelayIndex::COUNT], DeviceError> {
        let lease = self.guard.acquire(self.lock_deadline).await?;
        let transport = Arc::clone(&self.transport);
        let states = guarded::run_blocking("serial read", self.io_deadline, move || {
            let _lease = lease;
            let mut port = transport.open()?;
            port.write_all(&[STATUS_REQUEST]).map_err(RelayError::Io)?;
            port.flush().map_err(RelayError::Io)?;
            // the port may hand the frame over in several pieces
            let mut frame = [0u8; STATUS_FRAME_LEN];
            port.read_exact(&mut frame).map_err(RelayError::Io)?;
            Ok(decode_status(&frame))
        })
        .await?;
        tracing::debug!(relay1 = %states[0], relay2 = %states[1], "relay board status");
        Ok(states)
    }

    /// Switch one relay. The board does not acknowledge, so success only
    /// means the command left the port.
    ///
    /// # Errors
    ///
    /// Same as [`read_status`](Self::read_status).
    pub async fn write_relay(&self, relay: RelayIndex, on: bool) -> Result<(), DeviceError> {
        let lease = self.guard.acquire(self.lock_deadline).await?;
        let transport = Arc::clone(&self.transport);
        guarded::run_blocking("serial write", self.io_deadline, move || {
            let _lease = lease;
            let mut port = transport.open()?;
            port.write_all(&encode_command(relay, on))
                .map_err(RelayError::Io)?;
            port.flush().map_err(RelayError::Io)?;
            Ok(())
        })
        .await?;
        tracing::debug!(%relay, on, "relay command sent");
        Ok(())
    }
}

/// One relay of a shared board, as a [`SwitchAdapter`].
pub struct RelayChannel<T> {
    board: Arc<RelayBoard<T>>,
    relay: RelayIndex,
}

impl<T> RelayChannel<T> {
    #[must_use]
    pub fn new(board: Arc<RelayBoard<T>>, relay: RelayIndex) -> Self {
        Self { board, relay }
    }

    #[must_use]
    pub fn relay(&self) -> RelayIndex {
        self.relay
    }
}

impl<T: SerialTransport> SwitchAdapter for RelayChannel<T> {
    async fn read(&self) -> Result<PowerState, DeviceError> {
        let states = self.board.read_status().await?;
        Ok(states[self.relay.slot()])
    }

    /// Reports `desired` once the command was sent; callers wanting
    /// confirmation read again.
    async fn write(&self, desired: bool) -> Result<PowerState, DeviceError> {
        self.board.write_relay(self.relay, desired).await?;
        Ok(PowerState::from(desired))
    }
}
