//! Event bus port: publish device events to interested subscribers.

use std::future::Future;

use switchbridge_domain::error::SwitchBridgeError;
use switchbridge_domain::event::Event;

/// Publishes device events to interested subscribers.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: Event)
    -> impl Future<Output = Result<(), SwitchBridgeError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(
        &self,
        event: Event,
    ) -> impl Future<Output = Result<(), SwitchBridgeError>> + Send {
        (**self).publish(event)
    }
}
