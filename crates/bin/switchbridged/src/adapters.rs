//! Adapter selection: one [`OutletAdapter`] per configured device.

use std::sync::Arc;

use switchbridge_adapter_relay::{RelayBoard, RelayChannel, SerialPortTransport, SerialTransport};
use switchbridge_adapter_virtual::{SimulationConfig, VirtualOutlet};
use switchbridge_adapter_web::{RemoteRelayOutlet, TasmotaOutlet, WebClient, WebError};
use switchbridge_app::ports::SwitchAdapter;
use switchbridge_domain::device::{Addressing, Device};
use switchbridge_domain::error::DeviceError;
use switchbridge_domain::state::PowerState;

use crate::config::Config;

/// Every kind of outlet the daemon can drive.
pub enum OutletAdapter<T = SerialPortTransport> {
    Tasmota(TasmotaOutlet),
    RemoteRelay(RemoteRelayOutlet),
    Relay(RelayChannel<T>),
    Virtual(VirtualOutlet),
}

impl<T: SerialTransport> SwitchAdapter for OutletAdapter<T> {
    async fn read(&self) -> Result<PowerState, DeviceError> {
        match self {
            Self::Tasmota(outlet) => outlet.read().await,
            Self::RemoteRelay(outlet) => outlet.read().await,
            Self::Relay(channel) => channel.read().await,
            Self::Virtual(outlet) => outlet.read().await,
        }
    }

    async fn write(&self, desired: bool) -> Result<PowerState, DeviceError> {
        match self {
            Self::Tasmota(outlet) => outlet.write(desired).await,
            Self::RemoteRelay(outlet) => outlet.write(desired).await,
            Self::Relay(channel) => channel.write(desired).await,
            Self::Virtual(outlet) => outlet.write(desired).await,
        }
    }
}

/// Builds adapters, sharing one HTTP client and one relay board between
/// all devices.
pub struct OutletFactory<T = SerialPortTransport> {
    web: WebClient,
    cgi_path: String,
    board: Arc<RelayBoard<T>>,
    simulation: Option<SimulationConfig>,
}

impl OutletFactory<SerialPortTransport> {
    /// Factory for the configured hardware, or for virtual outlets when
    /// simulation is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`WebError::Client`] if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, WebError> {
        let factory = Self::new(
            WebClient::from_config(&config.web)?,
            config.web.cgi_path.clone(),
            Arc::new(RelayBoard::from_config(&config.serial)),
        );
        Ok(if config.simulation.enabled {
            factory.simulated(config.simulation.clone())
        } else {
            factory
        })
    }
}

impl<T: SerialTransport> OutletFactory<T> {
    #[must_use]
    pub fn new(web: WebClient, cgi_path: String, board: Arc<RelayBoard<T>>) -> Self {
        Self {
            web,
            cgi_path,
            board,
            simulation: None,
        }
    }

    /// Back every device by a virtual outlet instead.
    #[must_use]
    pub fn simulated(mut self, simulation: SimulationConfig) -> Self {
        self.simulation = Some(simulation);
        self
    }

    #[must_use]
    pub fn build(&self, device: &Device) -> OutletAdapter<T> {
        if let Some(simulation) = &self.simulation {
            tracing::debug!(device_id = %device.id, "simulating outlet");
            return OutletAdapter::Virtual(
                VirtualOutlet::new(simulation.initially_on).with_faults(simulation.faults()),
            );
        }
        match &device.addressing {
            Addressing::Http { host, power_label } => OutletAdapter::Tasmota(TasmotaOutlet::new(
                self.web.clone(),
                host.clone(),
                power_label.clone(),
            )),
            Addressing::RemoteRelay { host, relay } => {
                OutletAdapter::RemoteRelay(RemoteRelayOutlet::new(
                    self.web.clone(),
                    host.clone(),
                    self.cgi_path.clone(),
                    *relay,
                ))
            }
            Addressing::Serial { relay } => {
                OutletAdapter::Relay(RelayChannel::new(Arc::clone(&self.board), *relay))
            }
        }
    }
}
