use crate::{
    db::traits::StoreError,
    db_types::{NewRefundRequest, OrderId, RefundRequest},
};

#[allow(async_fn_in_trait)]
pub trait RefundManagement {
    async fn fetch_refund_for_order(&self, order_id: &OrderId) -> Result<Option<RefundRequest>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] if the order already has a refund request.
    async fn insert_refund_request(&self, request: &NewRefundRequest) -> Result<RefundRequest, StoreError>;
}
