//! Maps whatever a payment provider reports onto one of the four canonical [`OrderStatusType`] values.
//!
//! Providers are inconsistent about naming ("COMPLETED", "paid", "canceled", "cancelled", ...), so every inbound
//! status goes through [`normalize_status`] exactly once before it is persisted or broadcast. The mapping is total:
//! anything unrecognised is treated as still settling, i.e. `pending`.
use crate::db_types::OrderStatusType;

const SUCCESSFUL: [&str; 4] = ["successful", "success", "paid", "completed"];
const FAILED: [&str; 6] = ["failed", "error", "cancelled", "canceled", "declined", "expired"];
const REFUNDED: [&str; 2] = ["refunded", "refund"];

/// Payment methods that settle at checkout time, so new orders paid this way start out `successful`.
pub const INSTANT_SETTLEMENT_METHODS: [&str; 4] = ["applepay", "paynow", "visa", "mastercard"];

/// Normalise a raw, provider-reported status string. Never fails.
pub fn normalize_status(raw: &str) -> OrderStatusType {
    let value = raw.trim().to_lowercase();
    let value = value.as_str();
    if SUCCESSFUL.contains(&value) {
        OrderStatusType::Successful
    } else if FAILED.contains(&value) {
        OrderStatusType::Failed
    } else if REFUNDED.contains(&value) {
        OrderStatusType::Refunded
    } else {
        // "pending", "processing", "created" and everything we don't recognise
        OrderStatusType::Pending
    }
}

/// The status a brand-new order gets at checkout, given the customer's chosen payment method.
pub fn initial_status_for_method(method: &str) -> OrderStatusType {
    let method = method.trim().to_lowercase();
    if INSTANT_SETTLEMENT_METHODS.contains(&method.as_str()) {
        OrderStatusType::Successful
    } else {
        OrderStatusType::Pending
    }
}
