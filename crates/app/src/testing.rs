//! Test doubles shared by the service tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use switchbridge_domain::device::{Addressing, Device, DeviceKind, GroupPlacement};
use switchbridge_domain::error::DeviceError;
use switchbridge_domain::id::{DeviceId, GroupId};
use switchbridge_domain::state::PowerState;

use crate::ports::SwitchAdapter;

pub(crate) fn http_device(id: u32, group: u32) -> Device {
    Device {
        id: DeviceId::new(id),
        group: GroupPlacement {
            group_id: GroupId::new(group),
            position: 0,
            size: 1,
        },
        kind: DeviceKind::Switch,
        name: None,
        addressing: Addressing::Http {
            host: format!("plug-{id}"),
            power_label: "POWER".to_string(),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Behaviour {
    Healthy,
    /// Never answers.
    Hang,
    /// Fails every call with a hardware error.
    Broken,
    /// Answers reads without a definite value.
    Confused,
    /// Accepts writes without changing state.
    Stubborn,
}

/// Outlet whose ground truth lives in memory.
pub(crate) struct StubSwitch {
    truth: Mutex<PowerState>,
    behaviour: Mutex<Behaviour>,
    writes: AtomicUsize,
}

impl StubSwitch {
    pub(crate) fn new(truth: PowerState) -> Self {
        Self {
            truth: Mutex::new(truth),
            behaviour: Mutex::new(Behaviour::Healthy),
            writes: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_behaviour(truth: PowerState, behaviour: Behaviour) -> Self {
        let stub = Self::new(truth);
        stub.set_behaviour(behaviour);
        stub
    }

    pub(crate) fn set_truth(&self, state: PowerState) {
        *self.truth.lock().unwrap() = state;
    }

    pub(crate) fn truth(&self) -> PowerState {
        *self.truth.lock().unwrap()
    }

    pub(crate) fn set_behaviour(&self, behaviour: Behaviour) {
        *self.behaviour.lock().unwrap() = behaviour;
    }

    pub(crate) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn behaviour(&self) -> Behaviour {
        *self.behaviour.lock().unwrap()
    }
}

fn unplugged() -> DeviceError {
    DeviceError::HardwareIo(Box::new(std::io::Error::new(
        std::io::ErrorKind::NotConnected,
        "unplugged",
    )))
}

impl SwitchAdapter for StubSwitch {
    async fn read(&self) -> Result<PowerState, DeviceError> {
        match self.behaviour() {
            Behaviour::Hang => std::future::pending().await,
            Behaviour::Broken => Err(unplugged()),
            Behaviour::Confused => Ok(PowerState::Unknown),
            Behaviour::Healthy | Behaviour::Stubborn => Ok(self.truth()),
        }
    }

    async fn write(&self, desired: bool) -> Result<PowerState, DeviceError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        match self.behaviour() {
            Behaviour::Hang => std::future::pending().await,
            Behaviour::Broken => Err(unplugged()),
            Behaviour::Stubborn => Ok(self.truth()),
            Behaviour::Healthy | Behaviour::Confused => {
                self.set_truth(PowerState::from(desired));
                Ok(self.truth())
            }
        }
    }
}
