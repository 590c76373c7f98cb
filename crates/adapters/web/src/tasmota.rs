//! Tasmota plug driven through its `/cm?cmnd=` web command API.

use serde_json::Value;

use switchbridge_app::ports::SwitchAdapter;
use switchbridge_domain::error::DeviceError;
use switchbridge_domain::state::PowerState;

use crate::client::WebClient;

/// One power channel of a Tasmota device.
///
/// `GET /cm?cmnd=POWER1` answers `{"POWER1":"ON"}`; `GET
/// /cm?cmnd=POWER1%20Off` switches and answers the same shape with the
/// state the plug ended up in.
#[derive(Debug, Clone)]
pub struct TasmotaOutlet {
    client: WebClient,
    host: String,
    power_label: String,
}

impl TasmotaOutlet {
    #[must_use]
    pub fn new(client: WebClient, host: impl Into<String>, power_label: impl Into<String>) -> Self {
        Self {
            client,
            host: host.into(),
            power_label: power_label.into(),
        }
    }

    fn command_url(&self, argument: Option<&str>) -> String {
        let label = urlencoding::encode(&self.power_label);
        match argument {
            Some(argument) => format!("http://{}/cm?cmnd={label}%20{argument}", self.host),
            None => format!("http://{}/cm?cmnd={label}", self.host),
        }
    }

    async fn command(&self, argument: Option<&str>) -> Result<PowerState, DeviceError> {
        let reply = self.client.get_json(&self.command_url(argument)).await?;
        let state = power_state(&reply, &self.power_label);
        if !state.is_known() {
            tracing::debug!(host = %self.host, label = %self.power_label, %reply, "no power state in reply");
        }
        Ok(state)
    }
}

impl SwitchAdapter for TasmotaOutlet {
    async fn read(&self) -> Result<PowerState, DeviceError> {
        self.command(None).await
    }

    async fn write(&self, desired: bool) -> Result<PowerState, DeviceError> {
        self.command(Some(if desired { "On" } else { "Off" })).await
    }
}

/// Extract the state of `label` from a command reply.
///
/// Tasmota echoes labels upper-cased, so an exact key is tried first and
/// then a case-insensitive one. Only `"ON"` and `"OFF"` are definite.
pub(crate) fn power_state(reply: &Value, label: &str) -> PowerState {
    let Some(fields) = reply.as_object() else {
        return PowerState::Unknown;
    };
    let value = fields.get(label).or_else(|| {
        fields
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(label))
            .map(|(_, value)| value)
    });
    match value.and_then(Value::as_str) {
        Some("ON") => PowerState::On,
        Some("OFF") => PowerState::Off,
        _ => PowerState::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::test_server::{FakeTasmota, serve};

    fn outlet(host: String, label: &str) -> TasmotaOutlet {
        TasmotaOutlet::new(WebClient::new(Duration::from_secs(2)).unwrap(), host, label)
    }

    #[test]
    fn should_read_exact_label() {
        assert_eq!(power_state(&json!({"POWER": "ON"}), "POWER"), PowerState::On);
        assert_eq!(power_state(&json!({"POWER2": "OFF"}), "POWER2"), PowerState::Off);
    }

    #[test]
    fn should_fall_back_to_case_insensitive_label() {
        assert_eq!(power_state(&json!({"POWER1": "ON"}), "Power1"), PowerState::On);
    }

    #[test]
    fn should_treat_anything_else_as_unknown() {
        assert_eq!(power_state(&json!({"POWER": "TOGGLE"}), "POWER"), PowerState::Unknown);
        assert_eq!(power_state(&json!({"POWER": 1}), "POWER"), PowerState::Unknown);
        assert_eq!(power_state(&json!({"Command": "Unknown"}), "POWER"), PowerState::Unknown);
        assert_eq!(power_state(&json!(["ON"]), "POWER"), PowerState::Unknown);
    }

    #[test]
    fn should_encode_command_urls() {
        let outlet = outlet("192.168.111.118".to_string(), "POWER2");
        assert_eq!(
            outlet.command_url(None),
            "http://192.168.111.118/cm?cmnd=POWER2"
        );
        assert_eq!(
            outlet.command_url(Some("On")),
            "http://192.168.111.118/cm?cmnd=POWER2%20On"
        );
    }

    #[tokio::test]
    async fn should_read_and_switch_plug() {
        let plug = FakeTasmota::new(&[("POWER1", false), ("POWER2", true)]);
        let host = serve(plug.router()).await;
        let first = outlet(host.clone(), "Power1");
        let second = outlet(host, "POWER2");

        assert_eq!(first.read().await.unwrap(), PowerState::Off);
        assert_eq!(second.read().await.unwrap(), PowerState::On);

        assert_eq!(first.write(true).await.unwrap(), PowerState::On);
        assert!(plug.is_on("POWER1"));
        assert_eq!(first.read().await.unwrap(), PowerState::On);
    }

    #[tokio::test]
    async fn should_report_what_plug_answers_after_ignored_command() {
        let plug = FakeTasmota::new(&[("POWER", false)]).ignoring_commands();
        let host = serve(plug.router()).await;

        let realized = outlet(host, "POWER").write(true).await.unwrap();

        assert_eq!(realized, PowerState::Off);
    }

    #[tokio::test]
    async fn should_return_unknown_for_missing_label() {
        let plug = FakeTasmota::new(&[("POWER1", true)]);
        let host = serve(plug.router()).await;

        assert_eq!(outlet(host, "POWER3").read().await.unwrap(), PowerState::Unknown);
    }

    #[tokio::test]
    async fn should_fail_with_protocol_error_on_garbage_body() {
        let host = serve(crate::test_server::garbage_router()).await;

        let err = outlet(host, "POWER").read().await.unwrap_err();

        assert!(matches!(err, DeviceError::Protocol(_)));
    }

    #[tokio::test]
    async fn should_time_out_on_stalled_plug() {
        let host = serve(crate::test_server::stalled_router()).await;
        let outlet = TasmotaOutlet::new(
            WebClient::new(Duration::from_millis(100)).unwrap(),
            host,
            "POWER",
        );

        let err = outlet.read().await.unwrap_err();

        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn should_fail_with_hardware_error_when_unreachable() {
        let err = outlet("127.0.0.1:1".to_string(), "POWER")
            .read()
            .await
            .unwrap_err();

        assert!(err.is_hardware());
    }
}
