//! Per-order publish/subscribe registry for live payment status updates.
//!
//! The broadcaster is an explicit object. Construct one at start-up, wrap it in an `Arc`, and hand it to everything
//! that needs to publish or subscribe.
//!
//! Registry entries are created on the first [`EventBroadcaster::subscribe`] for an order and removed as soon as the
//! last [`Subscription`] for that order is released. Publishing to an order nobody is watching never allocates an
//! entry.
//!
//! The registry lock is only held while reading or mutating the sink sets, never while delivering. A publish works
//! on a snapshot of the sinks taken at the start of the call: a sink that subscribes during the delivery loop may miss
//! that one event, but will see every later one, and a sink that unsubscribes before a publish starts is never
//! delivered to.
use std::{
    collections::HashMap,
    fmt::Debug,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
        Mutex,
        MutexGuard,
        PoisonError,
        Weak,
    },
};

use log::*;
use thiserror::Error;

use crate::{
    db_types::{OrderId, OrderStatusType},
    events::{PaymentMeta, StatusEvent},
    helpers::normalize_status,
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SinkError {
    #[error("The sink has been closed")]
    Closed,
    #[error("Could not deliver event. {0}")]
    DeliveryFailed(String),
}

/// Anything that can receive status events for an order, e.g. a server-sent-events connection.
///
/// `deliver` must not block. A sink that returns an error is closed and dropped from the registry.
pub trait StatusSink: Send + Sync {
    fn deliver(&self, event: &StatusEvent) -> Result<(), SinkError>;

    fn close(&self);
}

type SinkId = u64;
type SinkSet = HashMap<SinkId, Arc<dyn StatusSink>>;
type Registry = HashMap<OrderId, SinkSet>;

pub struct EventBroadcaster {
    registry: Arc<Mutex<Registry>>,
    next_id: AtomicU64,
}

impl Debug for EventBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EventBroadcaster ({} orders watched)", lock(&self.registry).len())
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self { registry: Arc::new(Mutex::new(HashMap::new())), next_id: AtomicU64::new(1) }
    }

    /// Register `sink` for events on `order_id`. The sink stays registered until the returned [`Subscription`] is
    /// unsubscribed or dropped, or until a delivery to it fails.
    pub fn subscribe(&self, order_id: &OrderId, sink: Arc<dyn StatusSink>) -> Subscription {
        let sink_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let watchers = {
            let mut registry = lock(&self.registry);
            let sinks = registry.entry(order_id.clone()).or_default();
            sinks.insert(sink_id, sink);
            sinks.len()
        };
        debug!("📡️ Sink {sink_id} subscribed to order {order_id}. {watchers} watcher(s) now");
        Subscription {
            order_id: order_id.clone(),
            sink_id,
            registry: Arc::downgrade(&self.registry),
            active: AtomicBool::new(true),
        }
    }

    /// Normalise `raw_status` and publish it to every sink watching `order_id`.
    ///
    /// The event is always returned, whether or not anyone is listening, so callers can relay it synchronously.
    pub fn publish(&self, order_id: &OrderId, raw_status: &str, meta: PaymentMeta) -> StatusEvent {
        self.publish_status(order_id, normalize_status(raw_status), meta)
    }

    /// Publish an already canonical status. See [`Self::publish`].
    pub fn publish_status(&self, order_id: &OrderId, status: OrderStatusType, meta: PaymentMeta) -> StatusEvent {
        let event = StatusEvent::new(order_id.clone(), status, meta);
        let sinks = self.sinks_for(order_id);
        if sinks.is_empty() {
            trace!("📡️ No subscribers for order {order_id}. Event for status {status} not delivered");
            return event;
        }
        let mut failed = Vec::new();
        for (sink_id, sink) in &sinks {
            if let Err(e) = sink.deliver(&event) {
                warn!("📡️ Could not deliver {status} to sink {sink_id} on order {order_id}. Closing it. {e}");
                sink.close();
                failed.push(*sink_id);
            }
        }
        if !failed.is_empty() {
            let mut registry = lock(&self.registry);
            for sink_id in failed {
                remove_sink(&mut registry, order_id, sink_id);
            }
        }
        trace!("📡️ Status {status} for order {order_id} published to {} sink(s)", sinks.len());
        event
    }

    /// The number of sinks currently subscribed to `order_id`.
    pub fn subscriber_count(&self, order_id: &OrderId) -> usize {
        lock(&self.registry).get(order_id).map(|s| s.len()).unwrap_or(0)
    }

    /// The number of orders that have at least one subscriber.
    pub fn active_orders(&self) -> usize {
        lock(&self.registry).len()
    }

    fn sinks_for(&self, order_id: &OrderId) -> Vec<(SinkId, Arc<dyn StatusSink>)> {
        lock(&self.registry)
            .get(order_id)
            .map(|sinks| sinks.iter().map(|(id, s)| (*id, Arc::clone(s))).collect())
            .unwrap_or_default()
    }
}

/// Releases a sink's slot in the [`EventBroadcaster`].
///
/// Calling [`Subscription::unsubscribe`] more than once is harmless. Dropping the subscription unsubscribes too, so
/// tying it to the lifetime of a connection's response stream is enough to clean up when the client goes away.
#[derive(Debug)]
pub struct Subscription {
    order_id: OrderId,
    sink_id: SinkId,
    registry: Weak<Mutex<Registry>>,
    active: AtomicBool,
}

impl Subscription {
    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        // The broadcaster may already be gone at shutdown
        if let Some(registry) = self.registry.upgrade() {
            let mut registry = lock(&registry);
            remove_sink(&mut registry, &self.order_id, self.sink_id);
        }
        debug!("📡️ Sink {} unsubscribed from order {}", self.sink_id, self.order_id);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

fn remove_sink(registry: &mut Registry, order_id: &OrderId, sink_id: SinkId) {
    if let Some(sinks) = registry.get_mut(order_id) {
        sinks.remove(&sink_id);
        if sinks.is_empty() {
            registry.remove(order_id);
            trace!("📡️ Last watcher of order {order_id} has left");
        }
    }
}

// Nothing panics while holding the lock, but if it ever did, the registry is still structurally valid.
fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}
