//! #  Storage contracts for the payment status engine.
//!
//! The engine never talks to a database directly. It depends on these traits, and backends (currently SQLite)
//! implement them.
//!
//! * [`OrderStatusStore`] is the durable record of each order's canonical payment status, provider and reference.
//!   Its write path owns the "sticky provider fields" rule and advances `status_updated_at` on every write.
//! * [`RefundManagement`] records customer refund requests. There is at most one per order.
mod errors;
mod order_status_store;
mod refund_management;

pub use errors::StoreError;
pub use order_status_store::OrderStatusStore;
pub use refund_management::RefundManagement;
