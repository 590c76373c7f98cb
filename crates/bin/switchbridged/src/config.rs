//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `switchbridge.toml` in the working directory, or the file named
//! by `SWITCHBRIDGE_CONFIG`. Every field has a default so the file is
//! optional. Environment variables take precedence over file values.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use switchbridge_adapter_relay::RelayConfig;
use switchbridge_adapter_virtual::SimulationConfig;
use switchbridge_adapter_web::WebConfig;
use switchbridge_app::policy::EnginePolicy;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the outlet topology lives.
    pub topology: TopologyConfig,
    /// HTTP listener settings.
    pub http: HttpConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Reconciliation cadence.
    pub polling: PollingConfig,
    /// Locally attached relay board.
    pub serial: RelayConfig,
    /// HTTP-controlled outlets.
    pub web: WebConfig,
    /// Simulated outlets.
    pub simulation: SimulationConfig,
}

/// Topology document location.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    pub path: PathBuf,
}

/// HTTP listener configuration. The port comes from the topology.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Reconciliation loop timing.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
    /// Supervisory deadline of one read or write.
    pub io_timeout_ms: u64,
}

impl Config {
    /// Load configuration from the config file (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("SWITCHBRIDGE_CONFIG").unwrap_or_else(|_| "switchbridge.toml".to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("SWITCHBRIDGE_TOPOLOGY") {
            self.topology.path = PathBuf::from(val);
        }
        if let Some(val) = var("SWITCHBRIDGE_HOST") {
            self.http.host = val;
        }
        if let Some(interval) = var("SWITCHBRIDGE_POLL_MS").and_then(|val| val.parse().ok()) {
            self.polling.interval_ms = interval;
        }
        if let Some(val) = var("SWITCHBRIDGE_SERIAL_DEVICE") {
            self.serial.device = val;
        }
        if let Some(val) = var("SWITCHBRIDGE_LOCK_PATH") {
            self.serial.lock_path = PathBuf::from(val);
        }
        if let Some(val) = var("SWITCHBRIDGE_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            ("polling.interval_ms", self.polling.interval_ms),
            ("polling.io_timeout_ms", self.polling.io_timeout_ms),
            ("serial.lock_timeout_ms", self.serial.lock_timeout_ms),
            ("serial.io_timeout_ms", self.serial.io_timeout_ms),
            ("web.request_timeout_secs", self.web.request_timeout_secs),
        ];
        if let Some((name, _)) = durations.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Validation(format!("{name} must be non-zero")));
        }
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::Validation(
                "serial.baud_rate must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Timing policy of the engine.
    #[must_use]
    pub fn engine_policy(&self) -> EnginePolicy {
        EnginePolicy {
            poll_interval: Duration::from_millis(self.polling.interval_ms),
            io_deadline: Duration::from_millis(self.polling.io_timeout_ms),
        }
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self, port: u16) -> String {
        format!("{}:{port}", self.http.host)
    }
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/etc/homekit-tasmota-gw/config.json"),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "switchbridged=info,switchbridge=info,tower_http=info".to_string(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        let policy = EnginePolicy::default();
        Self {
            interval_ms: u64::try_from(policy.poll_interval.as_millis()).unwrap_or(1000),
            io_timeout_ms: u64::try_from(policy.io_deadline.as_millis()).unwrap_or(5000),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn overrides(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(
            config.topology.path,
            PathBuf::from("/etc/homekit-tasmota-gw/config.json")
        );
        assert_eq!(config.http.host, "0.0.0.0");
        assert_eq!(config.engine_policy(), EnginePolicy::default());
        assert_eq!(config.serial.device, "/dev/ttyUSB0");
        assert!(!config.simulation.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [topology]
            path = '/tmp/outlets.json'

            [http]
            host = '127.0.0.1'

            [logging]
            filter = 'debug'

            [polling]
            interval_ms = 250
            io_timeout_ms = 1500

            [serial]
            device = '/dev/ttyUSB1'
            lock_path = '/tmp/ttyUSB1.lock'
            baud_rate = 19200
            lock_timeout_ms = 500

            [web]
            request_timeout_secs = 3

            [simulation]
            enabled = true
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.topology.path, PathBuf::from("/tmp/outlets.json"));
        assert_eq!(config.bind_addr(8080), "127.0.0.1:8080");
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(
            config.engine_policy(),
            EnginePolicy {
                poll_interval: Duration::from_millis(250),
                io_deadline: Duration::from_millis(1500),
            }
        );
        assert_eq!(config.serial.baud_rate, 19200);
        assert_eq!(config.serial.lock_timeout(), Duration::from_millis(500));
        assert_eq!(config.web.request_timeout(), Duration::from_secs(3));
        assert!(config.simulation.enabled);
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let config: Config = toml::from_str("[polling]\ninterval_ms = 2000").unwrap();
        assert_eq!(config.polling.interval_ms, 2000);
        assert_eq!(config.polling.io_timeout_ms, 5000);
        assert_eq!(config.web.cgi_path, "/cgi-bin/power-switch-cgi");
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.http.host, "0.0.0.0");
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("switchbridge.toml");
        std::fs::write(&path, "invalid {{{").unwrap();

        let err = Config::from_file(path.to_str().unwrap()).unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn should_let_environment_override_file() {
        let mut config = Config::default();
        config.apply_overrides(overrides(&[
            ("SWITCHBRIDGE_TOPOLOGY", "/srv/outlets.json"),
            ("SWITCHBRIDGE_HOST", "127.0.0.1"),
            ("SWITCHBRIDGE_POLL_MS", "750"),
            ("SWITCHBRIDGE_SERIAL_DEVICE", "/dev/ttyACM0"),
            ("SWITCHBRIDGE_LOCK_PATH", "/run/lock/ttyACM0.lock"),
            ("SWITCHBRIDGE_LOG", "warn"),
        ]));

        assert_eq!(config.topology.path, PathBuf::from("/srv/outlets.json"));
        assert_eq!(config.http.host, "127.0.0.1");
        assert_eq!(config.polling.interval_ms, 750);
        assert_eq!(config.serial.device, "/dev/ttyACM0");
        assert_eq!(
            config.serial.lock_path,
            PathBuf::from("/run/lock/ttyACM0.lock")
        );
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn should_prefer_rust_log_over_own_variable() {
        let mut config = Config::default();
        config.apply_overrides(overrides(&[
            ("SWITCHBRIDGE_LOG", "warn"),
            ("RUST_LOG", "trace"),
        ]));
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_ignore_unparsable_poll_override() {
        let mut config = Config::default();
        config.apply_overrides(overrides(&[("SWITCHBRIDGE_POLL_MS", "soon")]));
        assert_eq!(config.polling.interval_ms, 1000);
    }

    #[test]
    fn should_reject_zero_durations() {
        let mut config = Config::default();
        config.polling.interval_ms = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: polling.interval_ms must be non-zero"
        );

        let mut config = Config::default();
        config.serial.lock_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_zero_baud_rate() {
        let mut config = Config::default();
        config.serial.baud_rate = 0;
        assert!(config.validate().is_err());
    }
}
