//! Relay board reached through a remote `power-switch-cgi` endpoint.

use serde::Deserialize;

use switchbridge_app::ports::SwitchAdapter;
use switchbridge_domain::device::RelayIndex;
use switchbridge_domain::error::DeviceError;
use switchbridge_domain::state::PowerState;

use crate::client::WebClient;
use crate::error::WebError;

/// Reply of the relay CGI: `{"sid":1,"state":"on"|"off"|null,"changed":bool}`.
#[derive(Debug, Deserialize)]
struct CgiReply {
    #[serde(default)]
    state: Option<String>,
}

/// One relay of a board served by a remote CGI.
#[derive(Debug, Clone)]
pub struct RemoteRelayOutlet {
    client: WebClient,
    host: String,
    cgi_path: String,
    relay: RelayIndex,
}

impl RemoteRelayOutlet {
    #[must_use]
    pub fn new(
        client: WebClient,
        host: impl Into<String>,
        cgi_path: impl Into<String>,
        relay: RelayIndex,
    ) -> Self {
        Self {
            client,
            host: host.into(),
            cgi_path: cgi_path.into(),
            relay,
        }
    }

    fn url(&self, action: &str) -> String {
        format!(
            "http://{}{}?sid={}&state={action}",
            self.host, self.cgi_path, self.relay
        )
    }

    async fn request(&self, action: &str) -> Result<PowerState, DeviceError> {
        let body = self.client.get_json(&self.url(action)).await?;
        let reply: CgiReply = serde_json::from_value(body).map_err(WebError::Decode)?;
        Ok(match reply.state.as_deref() {
            Some("on") => PowerState::On,
            Some("off") => PowerState::Off,
            _ => PowerState::Unknown,
        })
    }
}

impl SwitchAdapter for RemoteRelayOutlet {
    async fn read(&self) -> Result<PowerState, DeviceError> {
        self.request("get").await
    }

    /// A `null` state in the reply means the remote write failed or timed
    /// out, and fails the command.
    async fn write(&self, desired: bool) -> Result<PowerState, DeviceError> {
        match self.request(if desired { "on" } else { "off" }).await? {
            PowerState::Unknown => Err(WebError::Unconfirmed {
                relay: self.relay.number(),
            }
            .into_domain()),
            realized => Ok(realized),
        }
    }
}
