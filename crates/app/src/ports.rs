//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the engine and the outside world. They
//! live here so that both the services and the adapters can depend on them
//! without creating circular dependencies.

pub mod event_bus;
pub mod switch;

pub use event_bus::EventPublisher;
pub use switch::SwitchAdapter;
