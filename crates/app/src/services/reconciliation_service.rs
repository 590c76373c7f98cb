//! Reconciliation service: keep every cached state aligned with hardware.
//!
//! One loop per device reads ground truth at the poll interval. A definite
//! reading that differs from the cache replaces it and is announced as
//! [`EventKind::StateChanged`]. A reading without a definite value, or a
//! failed read, leaves the cache alone and is announced as
//! [`EventKind::ReadUnknown`] for diagnostics.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use switchbridge_domain::error::{DeviceError, SwitchBridgeError};
use switchbridge_domain::event::{Event, EventKind};
use switchbridge_domain::id::DeviceId;
use switchbridge_domain::state::PowerState;

use crate::guarded;
use crate::policy::EnginePolicy;
use crate::ports::{EventPublisher, SwitchAdapter};
use crate::switch_table::SwitchTable;

/// Application service running the per-device polling loops.
pub struct ReconciliationService<A, P> {
    table: Arc<SwitchTable<A>>,
    publisher: P,
    policy: EnginePolicy,
}

impl<A, P> ReconciliationService<A, P>
where
    A: SwitchAdapter + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    /// Create a new service over the given table.
    pub fn new(table: Arc<SwitchTable<A>>, publisher: P, policy: EnginePolicy) -> Self {
        Self {
            table,
            publisher,
            policy,
        }
    }

    /// Read one device once and fold the reading into its cached state.
    ///
    /// Returns the reading, which is [`PowerState::Unknown`] when the read
    /// failed or timed out.
    ///
    /// # Errors
    ///
    /// Returns [`SwitchBridgeError::NotFound`] if the device does not
    /// exist. Hardware failures are never returned; they are logged and
    /// published.
    pub async fn reconcile_once(&self, id: DeviceId) -> Result<PowerState, SwitchBridgeError> {
        let slot = self.table.slot(id)?;
        let adapter = Arc::clone(slot.adapter());
        let reading = guarded::run("read", self.policy.io_deadline, async move {
            adapter.read().await
        })
        .await;

        match reading {
            Ok(state) if state.is_known() => {
                let previous = slot.cell().swap(state);
                if previous != state {
                    tracing::info!(
                        device_id = %id,
                        from = %previous,
                        to = %state,
                        "device state changed"
                    );
                    self.emit(
                        id,
                        EventKind::StateChanged {
                            from: previous,
                            to: state,
                        },
                    )
                    .await;
                } else {
                    tracing::trace!(device_id = %id, state = %state, "device state unchanged");
                }
                Ok(state)
            }
            Ok(_) => {
                tracing::debug!(device_id = %id, "device answered without a definite state");
                self.emit(id, EventKind::ReadUnknown { reason: None }).await;
                Ok(PowerState::Unknown)
            }
            Err(err) => {
                log_read_failure(id, &err);
                self.emit(
                    id,
                    EventKind::ReadUnknown {
                        reason: Some(err.to_string()),
                    },
                )
                .await;
                Ok(PowerState::Unknown)
            }
        }
    }

    /// Spawn one independent polling loop per device.
    ///
    /// The first read happens immediately. A slow read delays the next tick
    /// of that device only.
    pub fn spawn(self: Arc<Self>) -> ReconciliationHandle {
        let tasks = self
            .table
            .ids()
            .into_iter()
            .map(|id| {
                let service = Arc::clone(&self);
                tokio::spawn(async move { service.run_loop(id).await })
            })
            .collect();
        tracing::info!(
            devices = self.table.len(),
            interval_ms = u64::try_from(self.policy.poll_interval.as_millis()).unwrap_or(u64::MAX),
            "reconciliation loops started"
        );
        ReconciliationHandle { tasks }
    }

    async fn run_loop(&self, id: DeviceId) {
        let mut ticker = tokio::time::interval(self.policy.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(err) = self.reconcile_once(id).await {
                tracing::error!(device_id = %id, error = %err, "stopping reconciliation loop");
                return;
            }
        }
    }

    async fn emit(&self, id: DeviceId, kind: EventKind) {
        if let Err(err) = self.publisher.publish(Event::new(id, kind)).await {
            tracing::warn!(device_id = %id, error = %err, "failed to publish event");
        }
    }
}

fn log_read_failure(id: DeviceId, err: &DeviceError) {
    if err.is_hardware() {
        tracing::warn!(device_id = %id, error = %err, "device read failed");
    } else {
        tracing::debug!(device_id = %id, error = %err, "device read gave no answer");
    }
}

/// The running reconciliation loops.
///
/// Loops never end on their own; [`shutdown`](Self::shutdown) aborts them.
pub struct ReconciliationHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl ReconciliationHandle {
    /// Number of running loops.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Abort every loop and wait for them to wind down.
    pub async fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
        for task in self.tasks {
            let _ = task.await;
        }
        tracing::info!("reconciliation loops stopped");
    }
}
