//! The simulated outlet.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use switchbridge_app::ports::SwitchAdapter;
use switchbridge_domain::error::DeviceError;
use switchbridge_domain::state::PowerState;

/// Misbehaviour to inject into a [`VirtualOutlet`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Faults {
    pub latency: Duration,
    pub hang: bool,
    pub fail_reads: bool,
    pub fail_writes: bool,
    pub reject_writes: bool,
}

/// In-memory outlet implementing [`SwitchAdapter`].
#[derive(Debug, Default)]
pub struct VirtualOutlet {
    on: AtomicBool,
    faults: Mutex<Faults>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl VirtualOutlet {
    #[must_use]
    pub fn new(on: bool) -> Self {
        Self {
            on: AtomicBool::new(on),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_faults(self, faults: Faults) -> Self {
        self.set_faults(faults);
        self
    }

    pub fn set_faults(&self, faults: Faults) {
        *self.faults.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = faults;
    }

    /// Flip the outlet by hand, behind the engine's back.
    pub fn set_on(&self, on: bool) {
        self.on.store(on, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn faults(&self) -> Faults {
        *self.faults.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    async fn misbehave(&self) -> Faults {
        let faults = self.faults();
        if !faults.latency.is_zero() {
            tokio::time::sleep(faults.latency).await;
        }
        if faults.hang {
            std::future::pending::<()>().await;
        }
        faults
    }

    fn state(&self) -> PowerState {
        PowerState::from(self.is_on())
    }
}

impl SwitchAdapter for VirtualOutlet {
    async fn read(&self) -> Result<PowerState, DeviceError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let faults = self.misbehave().await;
        if faults.fail_reads {
            return Err(unplugged());
        }
        Ok(self.state())
    }

    async fn write(&self, desired: bool) -> Result<PowerState, DeviceError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let faults = self.misbehave().await;
        if faults.fail_writes {
            return Err(unplugged());
        }
        if faults.reject_writes {
            tracing::debug!(desired, "virtual outlet ignoring command");
        } else {
            self.set_on(desired);
        }
        Ok(self.state())
    }
}

fn unplugged() -> DeviceError {
    DeviceError::HardwareIo(Box::new(std::io::Error::new(
        std::io::ErrorKind::NotConnected,
        "virtual outlet unplugged",
    )))
}
