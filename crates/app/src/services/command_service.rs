//! Command service: apply accessory-issued on/off requests to hardware.

use std::sync::Arc;

use switchbridge_domain::error::SwitchBridgeError;
use switchbridge_domain::event::{Event, EventKind};
use switchbridge_domain::id::DeviceId;
use switchbridge_domain::state::PowerState;

use crate::guarded;
use crate::policy::EnginePolicy;
use crate::ports::{EventPublisher, SwitchAdapter};
use crate::switch_table::SwitchTable;

/// Application service dispatching desired states to devices.
pub struct CommandService<A, P> {
    table: Arc<SwitchTable<A>>,
    publisher: P,
    policy: EnginePolicy,
}

impl<A, P> CommandService<A, P>
where
    A: SwitchAdapter + 'static,
    P: EventPublisher + Send + Sync,
{
    /// Create a new service over the given table.
    pub fn new(table: Arc<SwitchTable<A>>, publisher: P, policy: EnginePolicy) -> Self {
        Self {
            table,
            publisher,
            policy,
        }
    }

    /// Drive a device to `on` and return the state it reports afterwards.
    ///
    /// The write is always issued, even when the cache already holds the
    /// desired value, since the cache may be stale. On success the cache
    /// takes the realized value (unless the device could not say). On
    /// failure the cache is left alone; the next reconciliation corrects it.
    ///
    /// # Errors
    ///
    /// Returns [`SwitchBridgeError::NotFound`] if the device does not exist,
    /// or [`SwitchBridgeError::Device`] if the write failed or timed out.
    #[tracing::instrument(skip(self))]
    pub async fn set_desired(&self, id: DeviceId, on: bool) -> Result<PowerState, SwitchBridgeError> {
        let slot = self.table.slot(id)?;
        let desired = PowerState::from(on);
        let adapter = Arc::clone(slot.adapter());

        let outcome = guarded::run("write", self.policy.io_deadline, async move {
            adapter.write(on).await
        })
        .await;

        match outcome {
            Ok(realized) => {
                if realized.is_known() {
                    let previous = slot.cell().swap(realized);
                    if previous != realized {
                        tracing::info!(from = %previous, to = %realized, "device state changed by command");
                    }
                }
                if realized != desired {
                    tracing::warn!(%desired, %realized, "device did not reach the desired state");
                }
                self.emit(id, EventKind::CommandApplied { desired, realized })
                    .await;
                Ok(realized)
            }
            Err(err) => {
                tracing::warn!(error = %err, "command failed");
                self.emit(
                    id,
                    EventKind::CommandFailed {
                        desired,
                        reason: err.to_string(),
                    },
                )
                .await;
                Err(err.into())
            }
        }
    }

    async fn emit(&self, id: DeviceId, kind: EventKind) {
        if let Err(err) = self.publisher.publish(Event::new(id, kind)).await {
            tracing::warn!(device_id = %id, error = %err, "failed to publish event");
        }
    }
}
