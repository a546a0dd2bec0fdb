//! Order status events.
//!
//! Two independent fan-out mechanisms live here:
//! * [`EventBroadcaster`] is the live, per-order registry of [`StatusSink`]s. Every status change for an order is
//!   pushed synchronously to every sink currently subscribed to that order (e.g. an open SSE connection).
//! * [`EventHooks`] are process-level async handlers (e.g. "log every settled payment") that are fed through a
//!   bounded channel by [`EventProducers`], off the request path.
mod broadcaster;
mod channel;
mod event_types;
mod hooks;
mod sinks;

pub use broadcaster::{EventBroadcaster, SinkError, StatusSink, Subscription};
pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
pub use sinks::ChannelSink;
