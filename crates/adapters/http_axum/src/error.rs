//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use switchbridge_domain::error::{DeviceError, SwitchBridgeError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`SwitchBridgeError`] to an HTTP response with appropriate status code.
pub struct ApiError(SwitchBridgeError);

impl From<SwitchBridgeError> for ApiError {
    fn from(err: SwitchBridgeError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            SwitchBridgeError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            SwitchBridgeError::Device(err @ DeviceError::Timeout { .. }) => {
                (StatusCode::GATEWAY_TIMEOUT, err.to_string())
            }
            SwitchBridgeError::Device(err) => (StatusCode::BAD_GATEWAY, err.to_string()),
            SwitchBridgeError::Topology(err) => {
                tracing::error!(error = %err, "topology error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
