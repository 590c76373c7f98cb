//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod accessories;
#[allow(clippy::missing_errors_doc)]
pub mod devices;
pub mod sse;

use axum::Router;
use axum::routing::{get, put};

use switchbridge_app::ports::{EventPublisher, SwitchAdapter};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<A, P>() -> Router<AppState<A, P>>
where
    A: SwitchAdapter + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    Router::new()
        .route("/devices", get(devices::list::<A, P>))
        .route("/devices/{id}", get(devices::get::<A, P>))
        .route("/devices/{id}/state", put(devices::set_state::<A, P>))
        .route("/accessories", get(accessories::list::<A, P>))
        .route("/events/stream", get(sse::stream::<A, P>))
}
