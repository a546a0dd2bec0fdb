use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::{json, Value};
use storefront_payment_engine::db_types::{OrderStatusType, StatusUpdate};

use super::{
    helpers::{api_with, send, TEST_ADMIN_TOKEN},
    mocks::{stored, written_over, MockStore},
};
use crate::routes::MOCK_NETS_REFERENCE;

fn store_with_pending_nets_order(expected: OrderStatusType, reference: &'static str) -> MockStore {
    let mut store = MockStore::new();
    let pending = stored("42", OrderStatusType::Pending, Some("nets"), Some("ABC123"));
    let prior = pending.clone();
    store
        .expect_fetch_status_by_reference()
        .returning(move |r| Ok((r == "ABC123").then(|| pending.clone())));
    store
        .expect_write_status()
        .withf(move |u: &StatusUpdate| {
            u.order_id.as_str() == "42" &&
                u.status == expected &&
                u.payment_provider.as_deref() == Some("nets") &&
                u.payment_reference.as_deref() == Some(reference)
        })
        .times(1)
        .returning(move |u| Ok(written_over(Some(prior.clone()), u)));
    store
}

#[actix_web::test]
async fn webhook_completes_payment() {
    let _ = env_logger::try_init().ok();
    let store = store_with_pending_nets_order(OrderStatusType::Successful, "ABC123");
    let (api, _) = api_with(store);
    let req = TestRequest::post()
        .uri("/api/nets/webhook")
        .set_json(json!({"txn_retrieval_ref": "ABC123", "response_code": "00"}));
    let res = send(req, api, TEST_ADMIN_TOKEN).await;
    assert_eq!(res.status, StatusCode::OK);
    let body: Value = serde_json::from_str(&res.body).unwrap();
    assert_eq!(body["success"], true);
}

#[actix_web::test]
async fn webhook_fields_from_query_string() {
    let _ = env_logger::try_init().ok();
    let store = store_with_pending_nets_order(OrderStatusType::Failed, "ABC123");
    let (api, _) = api_with(store);
    let req = TestRequest::post().uri("/api/nets/webhook?txnId=ABC123&txn_status=declined");
    let res = send(req, api, TEST_ADMIN_TOKEN).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[actix_web::test]
async fn webhook_form_body() {
    let _ = env_logger::try_init().ok();
    let store = store_with_pending_nets_order(OrderStatusType::Successful, "ABC123");
    let (api, _) = api_with(store);
    let req = TestRequest::post()
        .uri("/api/nets/webhook")
        .insert_header(("content-type", "application/x-www-form-urlencoded"))
        .set_payload("reference=ABC123&txnStatus=2");
    let res = send(req, api, TEST_ADMIN_TOKEN).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[actix_web::test]
async fn webhook_without_reference() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_status_by_reference().never();
    store.expect_write_status().never();
    let (api, _) = api_with(store);
    let req = TestRequest::post().uri("/api/nets/webhook").set_json(json!({"response_code": "00"}));
    let res = send(req, api, TEST_ADMIN_TOKEN).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body.contains("txn_retrieval_ref is required"));
}

#[actix_web::test]
async fn webhook_for_unknown_reference() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_status_by_reference().returning(|_| Ok(None));
    store.expect_write_status().never();
    let (api, _) = api_with(store);
    let req = TestRequest::post().uri("/api/nets/webhook").set_json(json!({"txn_retrieval_ref": "NOPE"}));
    let res = send(req, api, TEST_ADMIN_TOKEN).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn manual_confirm_keeps_the_stored_reference() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    let pending = stored("42", OrderStatusType::Pending, Some("nets"), Some("ABC123"));
    let prior = pending.clone();
    store.expect_fetch_status().returning(move |_| Ok(Some(pending.clone())));
    store
        .expect_write_status()
        .withf(|u: &StatusUpdate| {
            u.status == OrderStatusType::Successful && u.payment_reference.as_deref() == Some("ABC123")
        })
        .times(1)
        .returning(move |u| Ok(written_over(Some(prior.clone()), u)));
    let (api, _) = api_with(store);
    let res = send(TestRequest::get().uri("/nets-qr/confirm?orderId=42"), api, TEST_ADMIN_TOKEN).await;
    assert_eq!(res.status, StatusCode::OK);
    let body: Value = serde_json::from_str(&res.body).unwrap();
    assert_eq!(body["status"], "successful");
    assert_eq!(body["paymentReference"], "ABC123");
}

#[actix_web::test]
async fn manual_confirm_of_unknown_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_status().returning(|_| Ok(None));
    store.expect_write_status().never();
    let (api, _) = api_with(store);
    let res = send(TestRequest::get().uri("/nets-qr/confirm?orderId=1&txn=T1"), api, TEST_ADMIN_TOKEN).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn mock_pay_falls_back_to_the_mock_reference() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_status().returning(|id| Ok(Some(stored(id.as_str(), OrderStatusType::Pending, None, None))));
    store
        .expect_write_status()
        .withf(|u: &StatusUpdate| {
            u.status == OrderStatusType::Successful && u.payment_reference.as_deref() == Some(MOCK_NETS_REFERENCE)
        })
        .times(1)
        .returning(|u| Ok(written_over(None, u)));
    let (api, _) = api_with(store);
    let req = TestRequest::post().uri("/nets/mock-pay").set_json(json!({"orderId": "55", "txnRetrievalRef": ""}));
    let res = send(req, api, TEST_ADMIN_TOKEN).await;
    assert_eq!(res.status, StatusCode::OK);
    let body: Value = serde_json::from_str(&res.body).unwrap();
    assert_eq!(body["paymentProvider"], "nets");
    assert_eq!(body["paymentReference"], MOCK_NETS_REFERENCE);
}

#[actix_web::test]
async fn mock_pay_prefers_the_supplied_reference() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store
        .expect_fetch_status()
        .returning(|id| Ok(Some(stored(id.as_str(), OrderStatusType::Pending, Some("nets"), Some("OLD")))));
    store
        .expect_write_status()
        .withf(|u: &StatusUpdate| u.payment_reference.as_deref() == Some("NEW"))
        .times(1)
        .returning(|u| Ok(written_over(None, u)));
    let (api, _) = api_with(store);
    let req = TestRequest::post().uri("/nets/mock-pay").set_json(json!({"orderId": "56", "txnRetrievalRef": "NEW"}));
    let res = send(req, api, TEST_ADMIN_TOKEN).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[actix_web::test]
async fn qr_issued_records_the_transaction_reference() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store
        .expect_fetch_status()
        .returning(|id| Ok(Some(stored(id.as_str(), OrderStatusType::Pending, Some("nets"), None))));
    store
        .expect_write_status()
        .withf(|u: &StatusUpdate| {
            u.order_id.as_str() == "60" &&
                u.status == OrderStatusType::Pending &&
                u.payment_provider.as_deref() == Some("nets") &&
                u.payment_reference.as_deref() == Some("TXN-60")
        })
        .times(1)
        .returning(|u| Ok(written_over(None, u)));
    let (api, _) = api_with(store);
    let req = TestRequest::post().uri("/api/nets/qr-issued").set_json(json!({"orderId": "60", "txnRetrievalRef": "TXN-60"}));
    let res = send(req, api, TEST_ADMIN_TOKEN).await;
    assert_eq!(res.status, StatusCode::OK);
    let body: Value = serde_json::from_str(&res.body).unwrap();
    assert_eq!(body["status"], "pending");
    assert_eq!(body["paymentReference"], "TXN-60");
}

#[actix_web::test]
async fn qr_issued_for_unknown_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_status().returning(|_| Ok(None));
    store.expect_write_status().never();
    let (api, _) = api_with(store);
    let req = TestRequest::post().uri("/api/nets/qr-issued").set_json(json!({"orderId": "61", "txnRetrievalRef": "TXN-61"}));
    let res = send(req, api, TEST_ADMIN_TOKEN).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}
