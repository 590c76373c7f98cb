//! HTTP adapter error types.

use std::time::Duration;

use switchbridge_domain::error::DeviceError;

/// Errors specific to the HTTP outlet adapters.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    /// Connecting, sending or receiving failed.
    #[error("HTTP request failed")]
    Request(#[source] reqwest::Error),

    /// The client gave up waiting.
    #[error("HTTP request timed out after {}s", .deadline.as_secs())]
    Timeout { deadline: Duration },

    /// The outlet answered with a non-success status.
    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),

    /// The body was not the JSON we expected.
    #[error("malformed JSON reply")]
    Decode(#[source] serde_json::Error),

    /// A remote relay could not confirm that a command took effect.
    #[error("remote relay {relay} did not confirm the command")]
    Unconfirmed { relay: u8 },
}

impl WebError {
    pub(crate) fn from_reqwest(err: reqwest::Error, deadline: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout { deadline }
        } else {
            Self::Request(err)
        }
    }

    /// Convert into a [`DeviceError`] for propagation across the port
    /// boundary.
    #[must_use]
    pub fn into_domain(self) -> DeviceError {
        match self {
            Self::Timeout { deadline } => DeviceError::Timeout {
                operation: "http request",
                deadline,
            },
            Self::Status(_) | Self::Decode(_) => DeviceError::Protocol(Box::new(self)),
            Self::Client(_) | Self::Request(_) | Self::Unconfirmed { .. } => {
                DeviceError::HardwareIo(Box::new(self))
            }
        }
    }
}

impl From<WebError> for DeviceError {
    fn from(err: WebError) -> Self {
        err.into_domain()
    }
}
