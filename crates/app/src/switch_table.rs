//! Switch table: every device with its adapter and cached state.
//!
//! Built once from the loaded topology and shared (behind an `Arc`) by the
//! reconciliation loops, the command service and the accessory-facing
//! readers. Only the cached state inside each slot ever changes.

use std::sync::Arc;

use switchbridge_domain::device::Device;
use switchbridge_domain::error::NotFoundError;
use switchbridge_domain::id::DeviceId;
use switchbridge_domain::state::{PowerState, StateCell};

/// One device, the adapter driving it and its last known state.
pub struct SwitchSlot<A> {
    device: Device,
    adapter: Arc<A>,
    state: StateCell,
}

impl<A> SwitchSlot<A> {
    #[must_use]
    pub fn device(&self) -> &Device {
        &self.device
    }

    #[must_use]
    pub fn adapter(&self) -> &Arc<A> {
        &self.adapter
    }

    /// Last known state of the device.
    #[must_use]
    pub fn state(&self) -> PowerState {
        self.state.load()
    }

    pub(crate) fn cell(&self) -> &StateCell {
        &self.state
    }
}

/// Point-in-time copy of one slot, for readers outside the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchSnapshot {
    pub device: Device,
    pub state: PowerState,
}

/// Id-ordered table of switch slots.
pub struct SwitchTable<A> {
    slots: Vec<SwitchSlot<A>>,
}

impl<A> SwitchTable<A> {
    /// Build the table; every state starts as [`PowerState::Unknown`].
    ///
    /// Entries are sorted by device id so lookups can binary search.
    pub fn new(entries: impl IntoIterator<Item = (Device, A)>) -> Self {
        let mut slots: Vec<SwitchSlot<A>> = entries
            .into_iter()
            .map(|(device, adapter)| SwitchSlot {
                device,
                adapter: Arc::new(adapter),
                state: StateCell::default(),
            })
            .collect();
        slots.sort_by_key(|slot| slot.device.id);
        Self { slots }
    }

    /// Find the slot of a device.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] if no device has this id.
    pub fn slot(&self, id: DeviceId) -> Result<&SwitchSlot<A>, NotFoundError> {
        self.slots
            .binary_search_by_key(&id, |slot| slot.device.id)
            .map(|index| &self.slots[index])
            .map_err(|_| NotFoundError {
                entity: "Device",
                id: id.to_string(),
            })
    }

    /// Cached state of a device.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] if no device has this id.
    pub fn state(&self, id: DeviceId) -> Result<PowerState, NotFoundError> {
        self.slot(id).map(SwitchSlot::state)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SwitchSlot<A>> {
        self.slots.iter()
    }

    #[must_use]
    pub fn ids(&self) -> Vec<DeviceId> {
        self.slots.iter().map(|slot| slot.device.id).collect()
    }

    /// Copy out every device with its current state.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SwitchSnapshot> {
        self.slots
            .iter()
            .map(|slot| SwitchSnapshot {
                device: slot.device.clone(),
                state: slot.state(),
            })
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
