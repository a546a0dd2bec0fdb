use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_payment_engine::db_types::{OrderId, OrderStatusType, PaymentStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

/// The payment status of an order as shown to browsers. This is also the first frame of every status stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub order_id: OrderId,
    pub status: OrderStatusType,
    pub payment_provider: Option<String>,
    pub payment_reference: Option<String>,
    pub payment_status_updated_at: DateTime<Utc>,
}

impl From<PaymentStatus> for StatusSnapshot {
    fn from(p: PaymentStatus) -> Self {
        Self {
            order_id: p.order_id,
            status: p.status,
            payment_provider: p.payment_provider,
            payment_reference: p.payment_reference,
            payment_status_updated_at: p.status_updated_at,
        }
    }
}

/// Manual override of an order's payment status. `status` may be any provider dialect; it is normalised.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOverrideParams {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment_provider: Option<String>,
    #[serde(default)]
    pub payment_reference: Option<String>,
}

/// The outcome of a status change made on behalf of staff or a payment provider, with the record as now stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangeResult {
    pub success: bool,
    pub order: StatusSnapshot,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutParams {
    #[serde(default)]
    pub payment_method: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefundParams {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetsConfirmParams {
    pub order_id: OrderId,
    #[serde(default)]
    pub txn: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockPayParams {
    pub order_id: OrderId,
    #[serde(default)]
    pub txn_retrieval_ref: Option<String>,
}

/// Sent by the checkout page once NETS has issued a QR code for the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetsQrIssuedParams {
    pub order_id: OrderId,
    #[serde(default)]
    pub txn_retrieval_ref: Option<String>,
}

/// Sent once PayPal has created an order for the checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaypalCreatedParams {
    pub order_id: OrderId,
    #[serde(default)]
    pub paypal_order_id: Option<String>,
}

/// The result of capturing a PayPal order. `status` is the capture status PayPal reported, e.g. `COMPLETED`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaypalCapturedParams {
    pub order_id: OrderId,
    #[serde(default)]
    pub paypal_order_id: Option<String>,
    #[serde(default)]
    pub capture_id: Option<String>,
    #[serde(default)]
    pub status: String,
}
