//! Exclusive transport guard.
//!
//! The serial port has no notion of a session: a status request from a
//! poll and a command from a client would interleave on the wire. Every
//! exchange therefore holds an exclusive advisory lock on a well-known
//! lock file, which also keeps other processes (another daemon, the CGI
//! program, a terminal) off the port.

use std::fs::{File, OpenOptions, TryLockError};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::Instant;

use switchbridge_app::guarded;
use switchbridge_domain::error::DeviceError;

use crate::error::RelayError;

/// Pause between two attempts on a lock held by someone else.
const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Hands out exclusive leases on the serial transport.
#[derive(Debug, Clone)]
pub struct TransportGuard {
    path: PathBuf,
}

impl TransportGuard {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for exclusive ownership, at most `deadline`.
    ///
    /// The lock is polled without blocking, on a task of its own under
    /// [`guarded::run`]. That task gives up at the same deadline, so a
    /// timed-out attempt owns nothing and leaves nothing parked on the
    /// lock. Should the task win the lock just as the caller gives up, it
    /// drops the lease and releases it itself.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Timeout`] when the lock is still held by
    /// someone else at the deadline, or [`DeviceError::HardwareIo`] when
    /// the lock file cannot be opened or locked.
    pub async fn acquire(&self, deadline: Duration) -> Result<TransportLease, DeviceError> {
        let path = self.path.clone();
        guarded::run("lock", deadline, async move {
            TransportLease::lock(path, deadline).await
        })
        .await
    }
}

/// Exclusive ownership of the serial transport.
///
/// Released when dropped, on every path.
#[derive(Debug)]
pub struct TransportLease {
    file: File,
    path: PathBuf,
}

impl TransportLease {
    async fn lock(path: PathBuf, deadline: Duration) -> Result<Self, DeviceError> {
        let expires = Instant::now() + deadline;
        let shown = path.display().to_string();
        let lock_error = move |source| {
            RelayError::Lock {
                path: shown.clone(),
                source,
            }
            .into_domain()
        };
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(&lock_error)?;
        loop {
            match file.try_lock() {
                Ok(()) => {
                    tracing::trace!(path = %path.display(), "transport lock acquired");
                    return Ok(Self { file, path });
                }
                Err(TryLockError::WouldBlock) => {}
                Err(TryLockError::Error(source)) => return Err(lock_error(source)),
            }
            let now = Instant::now();
            if now >= expires {
                return Err(DeviceError::Timeout {
                    operation: "lock",
                    deadline,
                });
            }
            tokio::time::sleep(RETRY_INTERVAL.min(expires - now)).await;
        }
    }
}

impl Drop for TransportLease {
    fn drop(&mut self) {
        if let Err(err) = self.file.unlock() {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to release transport lock");
        } else {
            tracing::trace!(path = %self.path.display(), "transport lock released");
        }
    }
}
