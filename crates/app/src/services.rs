//! Application services: the engine's use-cases.
//!
//! Each service accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete
//! transports. Both services share one [`SwitchTable`](crate::switch_table::SwitchTable).

pub mod command_service;
pub mod reconciliation_service;
