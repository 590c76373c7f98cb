//! Engine assembly: table, services and router over one topology.

use std::sync::Arc;

use axum::Router;

use switchbridge_adapter_http_axum::router;
use switchbridge_adapter_http_axum::state::AppState;
use switchbridge_app::event_bus::InProcessEventBus;
use switchbridge_app::policy::EnginePolicy;
use switchbridge_app::ports::SwitchAdapter;
use switchbridge_app::services::command_service::CommandService;
use switchbridge_app::services::reconciliation_service::{
    ReconciliationHandle, ReconciliationService,
};
use switchbridge_app::switch_table::SwitchTable;
use switchbridge_domain::device::Device;
use switchbridge_domain::topology::Topology;

const EVENT_BUS_CAPACITY: usize = 256;

type Bus = Arc<InProcessEventBus>;

/// The wired engine, ready to start.
pub struct Engine<A> {
    topology: Arc<Topology>,
    table: Arc<SwitchTable<A>>,
    event_bus: Bus,
    commands: Arc<CommandService<A, Bus>>,
    reconciliation: Arc<ReconciliationService<A, Bus>>,
}

impl<A: SwitchAdapter + 'static> Engine<A> {
    /// Wire one adapter per device of `topology`.
    pub fn new(
        topology: Topology,
        policy: EnginePolicy,
        mut adapter_for: impl FnMut(&Device) -> A,
    ) -> Self {
        let table = Arc::new(SwitchTable::new(
            topology
                .devices()
                .iter()
                .map(|device| (device.clone(), adapter_for(device))),
        ));
        let event_bus = Arc::new(InProcessEventBus::new(EVENT_BUS_CAPACITY));
        let commands = Arc::new(CommandService::new(
            Arc::clone(&table),
            Arc::clone(&event_bus),
            policy,
        ));
        let reconciliation = Arc::new(ReconciliationService::new(
            Arc::clone(&table),
            Arc::clone(&event_bus),
            policy,
        ));
        Self {
            topology: Arc::new(topology),
            table,
            event_bus,
            commands,
            reconciliation,
        }
    }

    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    #[must_use]
    pub fn table(&self) -> &Arc<SwitchTable<A>> {
        &self.table
    }

    #[must_use]
    pub fn event_bus(&self) -> &Bus {
        &self.event_bus
    }

    /// Start one reconciliation loop per device.
    #[must_use]
    pub fn start(&self) -> ReconciliationHandle {
        Arc::clone(&self.reconciliation).spawn()
    }

    /// Accessory-facing HTTP API over this engine.
    #[must_use]
    pub fn router(&self) -> Router {
        router::build(AppState::new(
            Arc::clone(&self.topology),
            Arc::clone(&self.table),
            Arc::clone(&self.commands),
            Arc::clone(&self.event_bus),
        ))
    }
}
