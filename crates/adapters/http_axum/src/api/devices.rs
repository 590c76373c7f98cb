//! JSON handlers for devices and their states.

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use switchbridge_app::ports::{EventPublisher, SwitchAdapter};
use switchbridge_app::switch_table::SwitchSlot;
use switchbridge_domain::device::Device;
use switchbridge_domain::error::SwitchBridgeError;
use switchbridge_domain::id::DeviceId;
use switchbridge_domain::state::PowerState;

use crate::error::ApiError;
use crate::state::AppState;

/// A device with its last known state.
#[derive(Debug, Serialize)]
pub struct DeviceView {
    #[serde(flatten)]
    pub device: Device,
    pub display_name: String,
    pub state: PowerState,
}

impl<A> From<&SwitchSlot<A>> for DeviceView {
    fn from(slot: &SwitchSlot<A>) -> Self {
        Self {
            device: slot.device().clone(),
            display_name: slot.device().display_name(),
            state: slot.state(),
        }
    }
}

/// Request body for driving a device.
#[derive(Debug, Deserialize)]
pub struct SetStateRequest {
    pub on: bool,
}

/// Outcome of a command.
#[derive(Debug, Serialize)]
pub struct SetStateResponse {
    pub id: DeviceId,
    pub desired: PowerState,
    /// What the device reported back.
    pub state: PowerState,
}

/// `GET /api/devices`
pub async fn list<A, P>(State(state): State<AppState<A, P>>) -> Json<Vec<DeviceView>>
where
    A: SwitchAdapter + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    Json(state.table.iter().map(DeviceView::from).collect())
}

/// `GET /api/devices/{id}`
pub async fn get<A, P>(
    State(state): State<AppState<A, P>>,
    Path(id): Path<DeviceId>,
) -> Result<Json<DeviceView>, ApiError>
where
    A: SwitchAdapter + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let slot = state.table.slot(id).map_err(SwitchBridgeError::from)?;
    Ok(Json(DeviceView::from(slot)))
}

/// `PUT /api/devices/{id}/state`
pub async fn set_state<A, P>(
    State(state): State<AppState<A, P>>,
    Path(id): Path<DeviceId>,
    Json(req): Json<SetStateRequest>,
) -> Result<Json<SetStateResponse>, ApiError>
where
    A: SwitchAdapter + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let realized = state.command_service.set_desired(id, req.on).await?;
    Ok(Json(SetStateResponse {
        id,
        desired: PowerState::from(req.on),
        state: realized,
    }))
}
