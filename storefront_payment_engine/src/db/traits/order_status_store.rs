use crate::{
    db_types::{OrderId, PaymentStatus, StatusUpdate},
    db::traits::StoreError,
};

/// Durable storage for order payment status.
#[allow(async_fn_in_trait)]
pub trait OrderStatusStore {
    /// Persist a status change and return the record as stored.
    ///
    /// * `status` always overwrites the stored status. There is no compare-and-swap, so concurrent writers for the
    ///   same order resolve as last-writer-wins.
    /// * `payment_provider` and `payment_reference` only overwrite the stored values when they are `Some`.
    /// * `status_updated_at` is set to `update.updated_at` even if the status did not change.
    ///
    /// Writing to an order that has no record yet creates it. This is how checkout registers a new order.
    async fn write_status(&self, update: &StatusUpdate) -> Result<PaymentStatus, StoreError>;

    async fn fetch_status(&self, order_id: &OrderId) -> Result<Option<PaymentStatus>, StoreError>;

    /// Look an order up by the provider's transaction reference, as sent back in provider callbacks.
    async fn fetch_status_by_reference(&self, reference: &str) -> Result<Option<PaymentStatus>, StoreError>;
}
