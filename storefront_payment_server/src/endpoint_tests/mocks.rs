use chrono::Utc;
use mockall::mock;
use storefront_payment_engine::{
    db_types::{NewRefundRequest, OrderId, OrderStatusType, PaymentStatus, RefundRequest, StatusUpdate},
    OrderStatusStore,
    RefundManagement,
    StoreError,
};

mock! {
    pub Store {}
    impl OrderStatusStore for Store {
        async fn write_status(&self, update: &StatusUpdate) -> Result<PaymentStatus, StoreError>;
        async fn fetch_status(&self, order_id: &OrderId) -> Result<Option<PaymentStatus>, StoreError>;
        async fn fetch_status_by_reference(&self, reference: &str) -> Result<Option<PaymentStatus>, StoreError>;
    }
    impl RefundManagement for Store {
        async fn fetch_refund_for_order(&self, order_id: &OrderId) -> Result<Option<RefundRequest>, StoreError>;
        async fn insert_refund_request(&self, request: &NewRefundRequest) -> Result<RefundRequest, StoreError>;
    }
}

pub fn stored(order_id: &str, status: OrderStatusType, provider: Option<&str>, reference: Option<&str>) -> PaymentStatus {
    PaymentStatus {
        order_id: OrderId::from(order_id),
        status,
        payment_provider: provider.map(String::from),
        payment_reference: reference.map(String::from),
        status_updated_at: Utc::now(),
        created_at: Utc::now(),
    }
}

/// What the real store returns for a write over `prior`: provider fields are sticky.
pub fn written_over(prior: Option<PaymentStatus>, update: &StatusUpdate) -> PaymentStatus {
    let prior_provider = prior.as_ref().and_then(|p| p.payment_provider.clone());
    let prior_reference = prior.as_ref().and_then(|p| p.payment_reference.clone());
    PaymentStatus {
        order_id: update.order_id.clone(),
        status: update.status,
        payment_provider: update.payment_provider.clone().or(prior_provider),
        payment_reference: update.payment_reference.clone().or(prior_reference),
        status_updated_at: update.updated_at,
        created_at: prior.map(|p| p.created_at).unwrap_or(update.updated_at),
    }
}
