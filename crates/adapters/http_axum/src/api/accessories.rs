//! JSON handler listing accessories: one per device group.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use switchbridge_app::ports::{EventPublisher, SwitchAdapter};
use switchbridge_domain::id::{DeviceId, GroupId};
use switchbridge_domain::state::PowerState;

use crate::state::AppState;

/// One accessory as the accessory layer publishes it.
#[derive(Debug, Serialize)]
pub struct AccessoryView {
    pub group_id: GroupId,
    pub name: String,
    pub serial_number: String,
    pub members: Vec<MemberView>,
}

/// One service of an accessory, in group order.
#[derive(Debug, Serialize)]
pub struct MemberView {
    pub id: DeviceId,
    pub name: String,
    pub state: PowerState,
}

/// `GET /api/accessories`
pub async fn list<A, P>(State(state): State<AppState<A, P>>) -> Json<Vec<AccessoryView>>
where
    A: SwitchAdapter + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let accessories = state
        .topology
        .accessories()
        .map(|accessory| AccessoryView {
            group_id: accessory.group_id,
            name: accessory.name(),
            serial_number: accessory.serial_number(),
            members: accessory
                .members
                .iter()
                .map(|device| MemberView {
                    id: device.id,
                    name: device.display_name(),
                    state: state.table.state(device.id).unwrap_or_default(),
                })
                .collect(),
        })
        .collect();
    Json(accessories)
}
