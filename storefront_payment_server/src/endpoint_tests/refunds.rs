use actix_web::{http::StatusCode, test::TestRequest};
use chrono::Utc;
use serde_json::{json, Value};
use storefront_payment_engine::{
    db_types::{NewRefundRequest, OrderStatusType, RefundRequest, StatusUpdate},
    StoreError,
};

use super::{
    helpers::{api_with, send, TEST_ADMIN_TOKEN},
    mocks::{stored, written_over, MockStore},
};

fn refund_request(order_id: &str, reason: &str) -> TestRequest {
    TestRequest::post().uri(&format!("/api/orders/{order_id}/refund")).set_json(json!({ "reason": reason }))
}

#[actix_web::test]
async fn refund_successful_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    let paid = stored("8", OrderStatusType::Successful, Some("paypal"), Some("CAP-8"));
    let prior = paid.clone();
    store.expect_fetch_status().returning(move |_| Ok(Some(paid.clone())));
    store.expect_fetch_refund_for_order().returning(|_| Ok(None));
    store.expect_insert_refund_request().withf(|r: &NewRefundRequest| r.reason == "Arrived broken").times(1).returning(
        |r| Ok(RefundRequest { id: 1, order_id: r.order_id.clone(), reason: r.reason.clone(), created_at: Utc::now() }),
    );
    store
        .expect_write_status()
        .withf(|u: &StatusUpdate| u.status == OrderStatusType::Refunded && u.payment_provider.as_deref() == Some("paypal"))
        .times(1)
        .returning(move |u| Ok(written_over(Some(prior.clone()), u)));
    let (api, _) = api_with(store);
    let res = send(refund_request("8", "  Arrived broken "), api, TEST_ADMIN_TOKEN).await;
    assert_eq!(res.status, StatusCode::OK);
    let body: Value = serde_json::from_str(&res.body).unwrap();
    assert_eq!(body["refund"]["reason"], "Arrived broken");
    assert_eq!(body["update"]["persistedStatus"], "refunded");
    assert_eq!(body["update"]["event"]["paymentReference"], "CAP-8");
}

#[actix_web::test]
async fn refund_pending_order_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_status().returning(|id| Ok(Some(stored(id.as_str(), OrderStatusType::Pending, None, None))));
    store.expect_write_status().never();
    let (api, _) = api_with(store);
    let res = send(refund_request("3", "Changed my mind"), api, TEST_ADMIN_TOKEN).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body.contains("Only successful payments can be refunded"));
}

#[actix_web::test]
async fn refund_needs_a_reason() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_status().never();
    let (api, _) = api_with(store);
    let res = send(refund_request("3", "no"), api, TEST_ADMIN_TOKEN).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn refund_of_unknown_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_status().returning(|_| Ok(None));
    let (api, _) = api_with(store);
    let res = send(refund_request("77", "Never arrived"), api, TEST_ADMIN_TOKEN).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn store_failure_is_a_server_error() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_status().returning(|_| Err(StoreError::DatabaseError("database is locked".into())));
    let (api, _) = api_with(store);
    let res = send(refund_request("5", "Never arrived"), api, TEST_ADMIN_TOKEN).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(res.body.contains("database is locked"));
}
