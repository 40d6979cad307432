//! Order lifecycle events.
//!
//! The order flow publishes an event after every committed change. Subscribers (notifications, mostly) run on their own
//! tasks, so a slow or failing subscriber never holds up or rolls back the change that triggered it.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
