use thiserror::Error;

use crate::{
    db::traits::StoreError,
    db_types::{OrderId, OrderStatusType},
};

/// The minimum length of a (trimmed) refund reason.
pub const MIN_REFUND_REASON_LEN: usize = 5;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaymentStatusError {
    /// The store failed. Passed through as is.
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {0} has already been checked out")]
    OrderExists(OrderId),
    #[error("Only successful payments can be refunded. Order {0} is {1}")]
    NotRefundable(OrderId, OrderStatusType),
    #[error("A refund has already been requested for order {0}")]
    RefundAlreadyRequested(OrderId),
    #[error("A refund reason is required (min {MIN_REFUND_REASON_LEN} characters)")]
    InvalidRefundReason,
}
