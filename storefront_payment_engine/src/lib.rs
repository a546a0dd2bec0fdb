//! Storefront Payment Engine
//!
//! This library contains the order payment-status lifecycle of the storefront, and the machinery that pushes status
//! changes to anyone watching an order in real time. It is transport-agnostic: the HTTP layer lives in
//! `storefront_payment_server`.
//!
//! The library is divided into these sections:
//! 1. Status normalisation ([`mod@helpers`]). Payment providers report their status in many dialects. Every inbound
//!    status is mapped onto one of the four canonical [`db_types::OrderStatusType`] values before anything else happens.
//! 2. Storage ([`mod@db`]). The engine depends on the [`OrderStatusStore`] and [`RefundManagement`] traits. SQLite is
//!    the supported backend.
//! 3. Events ([`mod@events`]). The [`events::EventBroadcaster`] is the per-order publish/subscribe registry that feeds
//!    live viewers (e.g. server-sent-event streams). Async [`events::EventHooks`] let the host application react to
//!    status changes off the request path.
//! 4. The public API ([`OrderStatusApi`]). This is the single write path for payment status: normalise, persist,
//!    broadcast.
mod db;

pub mod db_types;
pub mod events;
pub mod helpers;
pub mod status_api;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use db::traits::{OrderStatusStore, RefundManagement, StoreError};
pub use status_api::{
    errors::PaymentStatusError,
    order_status_api::OrderStatusApi,
    status_objects::{RefundResult, StatusUpdateResult},
};
