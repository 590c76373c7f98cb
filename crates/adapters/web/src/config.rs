//! HTTP outlet configuration.

use std::time::Duration;

use serde::Deserialize;

/// Settings shared by every HTTP-controlled outlet.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Connect plus read timeout of one request, in seconds.
    pub request_timeout_secs: u64,
    /// Path of the relay CGI on remote relay hosts.
    pub cgi_path: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            cgi_path: "/cgi-bin/power-switch-cgi".to_string(),
        }
    }
}

impl WebConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
