//! # switchbridge-adapter-virtual
//!
//! Simulated outlets for dry runs and tests.
//!
//! A [`VirtualOutlet`] keeps its on/off state in memory and obeys every
//! command, unless told otherwise through [`Faults`]:
//!
//! | Fault | Behaviour |
//! |-------|-----------|
//! | `latency` | every call sleeps first |
//! | `hang` | every call never returns |
//! | `fail_reads` | reads fail with a hardware error |
//! | `fail_writes` | writes fail with a hardware error |
//! | `reject_writes` | writes succeed but leave the state alone |
//!
//! ## Dependency rule
//!
//! Depends on `switchbridge-app` (port traits) and `switchbridge-domain` only.

mod config;
mod outlet;

pub use config::SimulationConfig;
pub use outlet::{Faults, VirtualOutlet};
