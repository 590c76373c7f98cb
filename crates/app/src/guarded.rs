//! Timeout-guarded operation runner.
//!
//! Every hardware call goes through [`run`] or [`run_blocking`]. The
//! operation is moved onto its own task and its outcome is delivered
//! through a [`oneshot`] slot while the caller waits on a deadline.
//!
//! When the deadline wins, the caller gets [`DeviceError::Timeout`] and
//! walks away. The worker is not killed: it keeps running until the
//! operation returns, then finds the slot closed and drops its result on
//! its own side. Anything the result owns (a lock lease, an open port) is
//! therefore released by the worker, never by the caller, and a late
//! result can never overwrite one that was already reported.

use std::future::Future;
use std::time::Duration;

use tokio::sync::oneshot;

use switchbridge_domain::error::DeviceError;

/// Run an async operation on its own task, bounded by `deadline`.
///
/// # Errors
///
/// Returns [`DeviceError::Timeout`] when the deadline elapses first,
/// [`DeviceError::WorkerLost`] when the task ends without delivering a
/// result (it panicked), or whatever error the operation itself produced.
pub async fn run<F, T>(operation: &'static str, deadline: Duration, work: F) -> Result<T, DeviceError>
where
    F: Future<Output = Result<T, DeviceError>> + Send + 'static,
    T: Send + 'static,
{
    let (slot, outcome) = oneshot::channel();
    tokio::spawn(async move {
        let result = work.await;
        deliver(operation, slot, result);
    });
    settle(operation, deadline, outcome).await
}

/// Run a blocking operation on the blocking pool, bounded by `deadline`.
///
/// Used for calls with no native timeout at all, such as talking to a
/// serial port.
///
/// # Errors
///
/// Same as [`run`].
pub async fn run_blocking<F, T>(
    operation: &'static str,
    deadline: Duration,
    work: F,
) -> Result<T, DeviceError>
where
    F: FnOnce() -> Result<T, DeviceError> + Send + 'static,
    T: Send + 'static,
{
    let (slot, outcome) = oneshot::channel();
    tokio::task::spawn_blocking(move || {
        let result = work();
        deliver(operation, slot, result);
    });
    settle(operation, deadline, outcome).await
}

fn deliver<T>(
    operation: &'static str,
    slot: oneshot::Sender<Result<T, DeviceError>>,
    result: Result<T, DeviceError>,
) {
    if let Err(late) = slot.send(result) {
        tracing::debug!(
            operation,
            succeeded = late.is_ok(),
            "discarding result delivered after the deadline"
        );
        drop(late);
    }
}

async fn settle<T>(
    operation: &'static str,
    deadline: Duration,
    outcome: oneshot::Receiver<Result<T, DeviceError>>,
) -> Result<T, DeviceError> {
    match tokio::time::timeout(deadline, outcome).await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(DeviceError::WorkerLost { operation }),
        Err(_) => {
            tracing::debug!(
                operation,
                deadline_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
                "abandoning operation"
            );
            Err(DeviceError::Timeout {
                operation,
                deadline,
            })
        }
    }
}
