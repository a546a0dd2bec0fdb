use serde::{Deserialize, Serialize};

use crate::{
    db_types::{OrderStatusType, PaymentStatus, RefundRequest},
    events::StatusEvent,
};

/// The outcome of a successful status write.
///
/// `event` is exactly what was broadcast to live subscribers. Callers can relay it synchronously too, e.g. in an HTTP
/// response body. `payment` is the record as stored, including provider fields kept from earlier writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateResult {
    pub persisted_status: OrderStatusType,
    pub payment: PaymentStatus,
    pub event: StatusEvent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundResult {
    pub refund: RefundRequest,
    pub update: StatusUpdateResult,
}
