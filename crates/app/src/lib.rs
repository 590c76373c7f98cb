//! # switchbridge-app
//!
//! Application layer: the reconciliation engine and its **port definitions**.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `SwitchAdapter`: read ground truth from an outlet, drive it on or off
//!   - `EventPublisher`: hand events to whoever listens upward
//! - Provide the **guarded runner** that bounds every hardware call by a
//!   deadline without killing the worker
//! - Hold the per-device cached state in a [`SwitchTable`](switch_table::SwitchTable)
//! - Run one **reconciliation loop** per device and dispatch **commands**
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `switchbridge-domain` only (plus `tokio` for tasks, timers
//! and channels). Never imports adapter crates.

pub mod event_bus;
pub mod guarded;
pub mod policy;
pub mod ports;
pub mod services;
pub mod switch_table;

#[cfg(test)]
pub(crate) mod testing;
