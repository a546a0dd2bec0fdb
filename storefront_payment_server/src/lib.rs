//! # Storefront payment server
//! This crate hosts the HTTP surface of the storefront payment-status service. It is responsible for:
//! * Receiving payment status changes from providers (NETS webhooks and confirmations, PayPal outcomes), customers
//!   (checkout and refunds) and staff (manual overrides), and passing them to the [`storefront_payment_engine::OrderStatusApi`].
//! * Streaming live status changes for an order to browsers as server-sent events.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/sse/order-status/{order_id}`: A `text/event-stream` of payment status events for an order.
//! * `/api/orders/{order_id}/payment-status`: Read (GET) or override (POST, admin only) an order's payment status.
//! * `/api/orders/{order_id}/checkout`: Register the initial payment status for a new order.
//! * `/api/orders/{order_id}/refund`: Request a refund for a successfully paid order.
//! * `/api/nets/webhook`: The NETS payment callback.
//! * `/api/nets/qr-issued`: Records the NETS transaction reference once a QR code has been issued.
//! * `/api/paypal/created` and `/api/paypal/captured`: PayPal order creation and capture outcomes.
//! * `/nets-qr/confirm` and `/nets/mock-pay`: Manual and simulated NETS QR confirmations.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod sse;

#[cfg(test)]
mod endpoint_tests;
