use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{OrderId, OrderStatusType, PaymentStatus};

/// Optional provider metadata attached to a status change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMeta {
    pub payment_provider: Option<String>,
    pub payment_reference: Option<String>,
}

impl PaymentMeta {
    pub fn new<P: Into<String>, R: Into<String>>(provider: P, reference: R) -> Self {
        Self { payment_provider: Some(provider.into()), payment_reference: Some(reference.into()) }
    }

    pub fn provider<P: Into<String>>(provider: P) -> Self {
        Self { payment_provider: Some(provider.into()), payment_reference: None }
    }

    pub fn with_reference<R: Into<String>>(mut self, reference: Option<R>) -> Self {
        self.payment_reference = reference.map(Into::into);
        self
    }
}

/// The message delivered to every live subscriber of an order when its payment status changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub order_id: OrderId,
    pub status: OrderStatusType,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
}

impl StatusEvent {
    pub fn new(order_id: OrderId, status: OrderStatusType, meta: PaymentMeta) -> Self {
        Self {
            order_id,
            status,
            timestamp: Utc::now(),
            payment_provider: meta.payment_provider,
            payment_reference: meta.payment_reference,
        }
    }
}

/// Handed to the `on_status_changed` hook after a status write has been persisted. Unlike [`StatusEvent`], this
/// carries the full stored record, including sticky provider fields that the triggering call did not set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChangedEvent {
    pub payment: PaymentStatus,
}

impl StatusChangedEvent {
    pub fn new(payment: PaymentStatus) -> Self {
        Self { payment }
    }
}
