//! Shared application state for axum handlers.

use std::sync::Arc;

use switchbridge_app::event_bus::InProcessEventBus;
use switchbridge_app::ports::{EventPublisher, SwitchAdapter};
use switchbridge_app::services::command_service::CommandService;
use switchbridge_app::switch_table::SwitchTable;
use switchbridge_domain::topology::Topology;

/// Application state shared across all axum handlers.
///
/// Generic over the switch adapter and event publisher to avoid dynamic
/// dispatch. `Clone` is implemented manually so only the `Arc` wrappers are
/// cloned.
pub struct AppState<A, P> {
    /// Loaded topology, for accessory grouping.
    pub topology: Arc<Topology>,
    /// Devices with their cached states.
    pub table: Arc<SwitchTable<A>>,
    /// Dispatcher for accessory-issued commands.
    pub command_service: Arc<CommandService<A, P>>,
    /// Bus feeding the SSE stream.
    pub event_bus: Arc<InProcessEventBus>,
}

impl<A, P> Clone for AppState<A, P> {
    fn clone(&self) -> Self {
        Self {
            topology: Arc::clone(&self.topology),
            table: Arc::clone(&self.table),
            command_service: Arc::clone(&self.command_service),
            event_bus: Arc::clone(&self.event_bus),
        }
    }
}

impl<A, P> AppState<A, P>
where
    A: SwitchAdapter + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    /// Create a new application state from pre-wrapped `Arc`s, shared with
    /// the reconciliation loops.
    pub fn new(
        topology: Arc<Topology>,
        table: Arc<SwitchTable<A>>,
        command_service: Arc<CommandService<A, P>>,
        event_bus: Arc<InProcessEventBus>,
    ) -> Self {
        Self {
            topology,
            table,
            command_service,
            event_bus,
        }
    }
}
