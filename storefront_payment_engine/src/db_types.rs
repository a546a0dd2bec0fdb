use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
/// The canonical payment status of an order.
///
/// There is deliberately no transition graph between these values. Any status may be written over any other, since
/// provider retries and manual corrections rely on unconditional overwrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// The payment has not settled yet. Also the fallback for any status we do not recognise.
    #[default]
    Pending,
    /// The payment was received in full.
    Successful,
    /// The payment failed, was declined, cancelled or expired.
    Failed,
    /// A previously successful payment has been refunded.
    Refunded,
}

impl OrderStatusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatusType::Pending => "pending",
            OrderStatusType::Successful => "successful",
            OrderStatusType::Failed => "failed",
            OrderStatusType::Refunded => "refunded",
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to pending");
            OrderStatusType::Pending
        })
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

/// Strict parsing of the canonical names only. Use [`crate::helpers::normalize_status`] for provider input.
impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "successful" => Ok(Self::Successful),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------        OrderId        ---------------------------------------------------------
/// An opaque, stable order identifier. It is the partition key for both persistence and broadcasting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<i64> for OrderId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------     PaymentStatus     ---------------------------------------------------------
/// The persisted payment state of an order.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatus {
    pub order_id: OrderId,
    pub status: OrderStatusType,
    pub payment_provider: Option<String>,
    pub payment_reference: Option<String>,
    #[serde(rename = "paymentStatusUpdatedAt")]
    pub status_updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------     StatusUpdate      ---------------------------------------------------------
/// A single write against the order status store.
///
/// `payment_provider` and `payment_reference` are sticky: `None` leaves the stored value alone, `Some` overwrites it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub order_id: OrderId,
    pub status: OrderStatusType,
    pub payment_provider: Option<String>,
    pub payment_reference: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl StatusUpdate {
    pub fn new(order_id: OrderId, status: OrderStatusType) -> Self {
        Self { order_id, status, payment_provider: None, payment_reference: None, updated_at: Utc::now() }
    }

    pub fn with_provider<S: Into<String>>(mut self, provider: Option<S>) -> Self {
        self.payment_provider = provider.map(Into::into);
        self
    }

    pub fn with_reference<S: Into<String>>(mut self, reference: Option<S>) -> Self {
        self.payment_reference = reference.map(Into::into);
        self
    }
}

//--------------------------------------     RefundRequest     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    pub id: i64,
    pub order_id: OrderId,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRefundRequest {
    pub order_id: OrderId,
    pub reason: String,
}

impl NewRefundRequest {
    pub fn new<S: Into<String>>(order_id: OrderId, reason: S) -> Self {
        Self { order_id, reason: reason.into() }
    }
}
