//! # Storefront payment engine public API
//!
//! [`order_status_api::OrderStatusApi`] is the single entry point for changing an order's payment status. Every
//! payment flow goes through it: provider webhooks, manual confirmation, mock payments, admin overrides, refunds,
//! and checkout itself.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements the storage traits, and the
//! application's one [`EventBroadcaster`](crate::events::EventBroadcaster):
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use storefront_payment_engine::{events::{EventBroadcaster, PaymentMeta}, OrderStatusApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/storefront.db", 5).await?;
//! let broadcaster = Arc::new(EventBroadcaster::new());
//! let api = OrderStatusApi::new(db, Arc::clone(&broadcaster));
//! let result = api.update_status(&order_id, "COMPLETED", PaymentMeta::new("nets", "ABC123")).await?;
//! ```

pub mod errors;
pub mod order_status_api;
pub mod status_objects;
