//! Switch port: the capability every outlet transport implements.
//!
//! An adapter talks to exactly one outlet. It reports what the hardware
//! says and never caches anything itself; caching is the engine's job.

use std::future::Future;
use std::sync::Arc;

use switchbridge_domain::error::DeviceError;
use switchbridge_domain::state::PowerState;

/// Read and drive one physical outlet.
///
/// Implementations do not need their own supervisory timeout: the engine
/// wraps every call in [`guarded::run`](crate::guarded::run). They should
/// still bound their own I/O where the transport allows it.
pub trait SwitchAdapter: Send + Sync {
    /// Read the outlet's ground truth.
    ///
    /// A reply that does not say on or off is [`PowerState::Unknown`],
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`DeviceError`] when the transport fails or the reply
    /// cannot be decoded at all.
    fn read(&self) -> impl Future<Output = Result<PowerState, DeviceError>> + Send;

    /// Drive the outlet to `desired` and report the state it ended up in.
    ///
    /// The realized state comes from the device when the transport answers
    /// with one; it may differ from `desired` if the device ignored the
    /// command.
    ///
    /// # Errors
    ///
    /// Returns a [`DeviceError`] when the command could not be delivered.
    fn write(&self, desired: bool)
    -> impl Future<Output = Result<PowerState, DeviceError>> + Send;
}

impl<T: SwitchAdapter> SwitchAdapter for Arc<T> {
    fn read(&self) -> impl Future<Output = Result<PowerState, DeviceError>> + Send {
        (**self).read()
    }

    fn write(&self, desired: bool) -> impl Future<Output = Result<PowerState, DeviceError>> + Send {
        (**self).write(desired)
    }
}
