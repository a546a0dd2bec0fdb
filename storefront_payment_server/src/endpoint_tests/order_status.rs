use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::{json, Value};
use storefront_payment_engine::db_types::{OrderStatusType, StatusUpdate};

use super::{
    helpers::{api_with, send, TEST_ADMIN_TOKEN},
    mocks::{stored, written_over, MockStore},
};

#[actix_web::test]
async fn fetch_payment_status() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store
        .expect_fetch_status()
        .returning(|id| Ok(Some(stored(id.as_str(), OrderStatusType::Pending, Some("nets"), Some("ABC123")))));
    let (api, _) = api_with(store);
    let res = send(TestRequest::get().uri("/api/orders/42/payment-status"), api, TEST_ADMIN_TOKEN).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.headers.get("content-type").unwrap(), "application/json");
    let body: Value = serde_json::from_str(&res.body).unwrap();
    assert_eq!(body["orderId"], "42");
    assert_eq!(body["status"], "pending");
    assert_eq!(body["paymentProvider"], "nets");
    assert_eq!(body["paymentReference"], "ABC123");
}

#[actix_web::test]
async fn fetch_payment_status_of_unknown_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_status().returning(|_| Ok(None));
    let (api, _) = api_with(store);
    let res = send(TestRequest::get().uri("/api/orders/404/payment-status"), api, TEST_ADMIN_TOKEN).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_str(&res.body).unwrap();
    assert!(body["error"].as_str().unwrap().contains("#404"));
}

fn override_request(token: Option<&str>, body: Value) -> TestRequest {
    let req = TestRequest::post().uri("/api/orders/9/payment-status").set_json(body);
    match token {
        Some(t) => req.insert_header(("X-Admin-Token", t)),
        None => req,
    }
}

#[actix_web::test]
async fn override_without_token_is_forbidden() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_write_status().never();
    let (api, _) = api_with(store);
    let res = send(override_request(None, json!({"status": "refunded"})), api, TEST_ADMIN_TOKEN).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn override_with_wrong_token_is_forbidden() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_write_status().never();
    let (api, _) = api_with(store);
    let res = send(override_request(Some("guess"), json!({"status": "refunded"})), api, TEST_ADMIN_TOKEN).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert!(res.body.contains("Invalid admin token"));
}

#[actix_web::test]
async fn override_is_disabled_without_a_configured_token() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_write_status().never();
    let (api, _) = api_with(store);
    let res = send(override_request(Some(""), json!({"status": "refunded"})), api, "").await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn override_requires_a_status() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_write_status().never();
    let (api, _) = api_with(store);
    let res = send(override_request(Some(TEST_ADMIN_TOKEN), json!({"status": "  "})), api, TEST_ADMIN_TOKEN).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body, r#"{"error":"Could not read request body: status is required"}"#);
}

#[actix_web::test]
async fn override_keeps_stored_provider_fields() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store
        .expect_fetch_status()
        .returning(|_| Ok(Some(stored("9", OrderStatusType::Successful, Some("nets"), Some("T9")))));
    store
        .expect_write_status()
        .withf(|u: &StatusUpdate| {
            u.status == OrderStatusType::Refunded && u.payment_provider.is_none() && u.payment_reference.is_none()
        })
        .times(1)
        .returning(|u| Ok(written_over(Some(stored("9", OrderStatusType::Successful, Some("nets"), Some("T9"))), u)));
    let (api, _) = api_with(store);
    let body = json!({"status": "REFUNDED", "paymentProvider": "", "paymentReference": null});
    let res = send(override_request(Some(TEST_ADMIN_TOKEN), body), api, TEST_ADMIN_TOKEN).await;
    assert_eq!(res.status, StatusCode::OK);
    let body: Value = serde_json::from_str(&res.body).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["order"]["status"], "refunded");
    assert_eq!(body["order"]["paymentProvider"], "nets");
    assert_eq!(body["order"]["paymentReference"], "T9");
}

#[actix_web::test]
async fn override_of_unknown_order_is_not_found() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_status().returning(|_| Ok(None));
    store.expect_write_status().never();
    let (api, _) = api_with(store);
    let res = send(override_request(Some(TEST_ADMIN_TOKEN), json!({"status": "paid"})), api, TEST_ADMIN_TOKEN).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_str(&res.body).unwrap();
    assert!(body["error"].as_str().unwrap().contains("#9"));
}

#[actix_web::test]
async fn checkout_with_card_settles_immediately() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_status().returning(|_| Ok(None));
    store
        .expect_write_status()
        .withf(|u: &StatusUpdate| u.status == OrderStatusType::Successful && u.payment_provider.as_deref() == Some("visa"))
        .times(1)
        .returning(|u| Ok(written_over(None, u)));
    let (api, _) = api_with(store);
    let req = TestRequest::post().uri("/api/orders/100/checkout").set_json(json!({"paymentMethod": "Visa"}));
    let res = send(req, api, TEST_ADMIN_TOKEN).await;
    assert_eq!(res.status, StatusCode::OK);
    let body: Value = serde_json::from_str(&res.body).unwrap();
    assert_eq!(body["status"], "successful");
}

#[actix_web::test]
async fn checkout_with_qr_starts_pending() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_status().returning(|_| Ok(None));
    store
        .expect_write_status()
        .withf(|u: &StatusUpdate| u.status == OrderStatusType::Pending && u.payment_provider.as_deref() == Some("nets"))
        .times(1)
        .returning(|u| Ok(written_over(None, u)));
    let (api, _) = api_with(store);
    let req = TestRequest::post().uri("/api/orders/101/checkout").set_json(json!({"paymentMethod": "nets"}));
    let res = send(req, api, TEST_ADMIN_TOKEN).await;
    assert_eq!(res.status, StatusCode::OK);
    let body: Value = serde_json::from_str(&res.body).unwrap();
    assert_eq!(body["status"], "pending");
}

#[actix_web::test]
async fn checkout_of_a_paid_order_is_a_conflict() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store
        .expect_fetch_status()
        .returning(|id| Ok(Some(stored(id.as_str(), OrderStatusType::Successful, Some("paypal"), Some("CAP-5")))));
    store.expect_write_status().never();
    let (api, _) = api_with(store);
    let req = TestRequest::post().uri("/api/orders/5/checkout").set_json(json!({"paymentMethod": "nets"}));
    let res = send(req, api, TEST_ADMIN_TOKEN).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    let body: Value = serde_json::from_str(&res.body).unwrap();
    assert!(body["error"].as_str().unwrap().contains("already been checked out"));
}

#[actix_web::test]
async fn malformed_json_gets_a_json_error() {
    let _ = env_logger::try_init().ok();
    let (api, _) = api_with(MockStore::new());
    let req = TestRequest::post()
        .uri("/api/orders/1/checkout")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json");
    let res = send(req, api, TEST_ADMIN_TOKEN).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&res.body).unwrap();
    assert!(body["error"].is_string());
}
