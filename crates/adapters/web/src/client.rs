//! Shared HTTP client for outlet requests.

use std::time::Duration;

use serde_json::Value;

use crate::config::WebConfig;
use crate::error::WebError;

/// A `reqwest` client with a fixed per-request timeout.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Debug, Clone)]
pub struct WebClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl WebClient {
    /// Build a client whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`WebError::Client`] if the underlying client cannot be
    /// built.
    pub fn new(timeout: Duration) -> Result<Self, WebError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(WebError::Client)?;
        Ok(Self { http, timeout })
    }

    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn from_config(config: &WebConfig) -> Result<Self, WebError> {
        Self::new(config.request_timeout())
    }

    /// GET `url` and decode the body as JSON.
    pub(crate) async fn get_json(&self, url: &str) -> Result<Value, WebError> {
        tracing::trace!(url, "GET");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| WebError::from_reqwest(err, self.timeout))?;
        let status = response.status();
        if !status.is_success() {
            return Err(WebError::Status(status));
        }
        let body = response
            .bytes()
            .await
            .map_err(|err| WebError::from_reqwest(err, self.timeout))?;
        serde_json::from_slice(&body).map_err(WebError::Decode)
    }
}
