use std::{fmt::Debug, sync::Arc};

use log::*;

use crate::{
    db::traits::{OrderStatusStore, RefundManagement, StoreError},
    db_types::{NewRefundRequest, OrderId, OrderStatusType, PaymentStatus, StatusUpdate},
    events::{EventBroadcaster, EventProducers, PaymentMeta, StatusChangedEvent, StatusSink, Subscription},
    helpers::{initial_status_for_method, normalize_status},
    status_api::{
        errors::{PaymentStatusError, MIN_REFUND_REASON_LEN},
        status_objects::{RefundResult, StatusUpdateResult},
    },
};

/// `OrderStatusApi` owns the write path for order payment status: normalise, persist, then broadcast.
pub struct OrderStatusApi<B> {
    db: B,
    broadcaster: Arc<EventBroadcaster>,
    producers: EventProducers,
}

impl<B> Debug for OrderStatusApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderStatusApi ({:?})", self.broadcaster)
    }
}

impl<B> OrderStatusApi<B> {
    pub fn new(db: B, broadcaster: Arc<EventBroadcaster>) -> Self {
        Self { db, broadcaster, producers: EventProducers::default() }
    }

    /// Attach the producers for the async event hooks. Without them, no hooks are notified.
    pub fn with_producers(mut self, producers: EventProducers) -> Self {
        self.producers = producers;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }

    pub fn broadcaster(&self) -> &Arc<EventBroadcaster> {
        &self.broadcaster
    }

    /// Start receiving live status events for `order_id`. This does not send a snapshot; read one with
    /// [`Self::fetch_status`] after subscribing so that nothing published in between is missed.
    pub fn subscribe(&self, order_id: &OrderId, sink: Arc<dyn StatusSink>) -> Subscription {
        self.broadcaster.subscribe(order_id, sink)
    }
}

impl<B> OrderStatusApi<B>
where B: OrderStatusStore
{
    /// Record a new payment status for an order and push it to everyone watching that order.
    ///
    /// `raw_status` may be anything a provider reports. It is normalised exactly once. Provider fields in `meta` that
    /// are `None` leave the stored values untouched. The broadcast event carries the persisted canonical status, and
    /// the provider fields exactly as given in `meta`.
    ///
    /// If the store write fails, nothing is broadcast and the store's error is returned.
    pub async fn update_status(
        &self,
        order_id: &OrderId,
        raw_status: &str,
        meta: PaymentMeta,
    ) -> Result<StatusUpdateResult, PaymentStatusError> {
        let status = normalize_status(raw_status);
        trace!("🔄️ Order {order_id}: raw status '{raw_status}' normalised to {status}");
        let update = StatusUpdate::new(order_id.clone(), status)
            .with_provider(meta.payment_provider.clone())
            .with_reference(meta.payment_reference.clone());
        let payment = self.db.write_status(&update).await.map_err(|e| {
            warn!("🔄️ Could not persist status {status} for order {order_id}. Nothing will be broadcast. {e}");
            e
        })?;
        let event = self.broadcaster.publish_status(order_id, payment.status, meta);
        debug!("🔄️ Order {order_id} payment status is now {}", payment.status);
        self.call_status_changed_hook(&payment);
        Ok(StatusUpdateResult { persisted_status: payment.status, payment, event })
    }

    /// Register the initial payment status of a freshly checked-out order. Instant-settlement methods (cards, wallets)
    /// start out successful, everything else starts out pending.
    ///
    /// An order can only be opened once. Checking out an order that already has a status record is an error and
    /// leaves the record untouched.
    pub async fn open_order(
        &self,
        order_id: &OrderId,
        payment_method: &str,
    ) -> Result<StatusUpdateResult, PaymentStatusError> {
        if let Some(existing) = self.db.fetch_status(order_id).await? {
            debug!("🔄️ Order {order_id} is already {}. Not opening it again", existing.status);
            return Err(PaymentStatusError::OrderExists(order_id.clone()));
        }
        let method = payment_method.trim().to_lowercase();
        let method = if method.is_empty() { "unknown".to_string() } else { method };
        let status = initial_status_for_method(&method);
        info!("🔄️ New order {order_id} paid with {method} starts as {status}");
        self.update_status(order_id, status.as_str(), PaymentMeta::provider(method)).await
    }

    pub async fn fetch_status(&self, order_id: &OrderId) -> Result<Option<PaymentStatus>, PaymentStatusError> {
        Ok(self.db.fetch_status(order_id).await?)
    }

    pub async fn fetch_status_by_reference(&self, reference: &str) -> Result<Option<PaymentStatus>, PaymentStatusError> {
        Ok(self.db.fetch_status_by_reference(reference).await?)
    }

    // Never waits on the hook queue. The write has already happened and the caller must get its answer.
    fn call_status_changed_hook(&self, payment: &PaymentStatus) {
        for emitter in &self.producers.status_changed_producer {
            trace!("🔄️ Notifying status changed hook subscribers");
            emitter.try_publish_event(StatusChangedEvent::new(payment.clone()));
        }
    }
}

impl<B> OrderStatusApi<B>
where B: OrderStatusStore + RefundManagement
{
    /// A customer asks for their money back.
    ///
    /// Only successful payments can be refunded, and only once per order. The request is recorded, and the order
    /// moves to `refunded`, keeping its current provider (or "refund" if none was recorded) and reference.
    pub async fn request_refund(&self, order_id: &OrderId, reason: &str) -> Result<RefundResult, PaymentStatusError> {
        let reason = reason.trim();
        if reason.chars().count() < MIN_REFUND_REASON_LEN {
            return Err(PaymentStatusError::InvalidRefundReason);
        }
        let current =
            self.db.fetch_status(order_id).await?.ok_or_else(|| PaymentStatusError::OrderNotFound(order_id.clone()))?;
        if current.status != OrderStatusType::Successful {
            debug!("🔄️ Refund for order {order_id} refused. Status is {}", current.status);
            return Err(PaymentStatusError::NotRefundable(order_id.clone(), current.status));
        }
        if self.db.fetch_refund_for_order(order_id).await?.is_some() {
            return Err(PaymentStatusError::RefundAlreadyRequested(order_id.clone()));
        }
        let refund = match self.db.insert_refund_request(&NewRefundRequest::new(order_id.clone(), reason)).await {
            Ok(refund) => refund,
            // Lost a race with a concurrent request for the same order
            Err(StoreError::Duplicate(_)) => return Err(PaymentStatusError::RefundAlreadyRequested(order_id.clone())),
            Err(e) => return Err(e.into()),
        };
        info!("🔄️ Refund #{} requested for order {order_id}", refund.id);
        let meta = PaymentMeta {
            payment_provider: Some(current.payment_provider.unwrap_or_else(|| "refund".to_string())),
            payment_reference: current.payment_reference,
        };
        let update = self.update_status(order_id, OrderStatusType::Refunded.as_str(), meta).await?;
        Ok(RefundResult { refund, update })
    }
}
