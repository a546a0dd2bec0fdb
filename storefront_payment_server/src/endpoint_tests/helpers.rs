use std::{future::poll_fn, sync::Arc};

use actix_web::{
    body::{to_bytes, MessageBody},
    http::{header::HeaderMap, StatusCode},
    test,
    test::TestRequest,
    web,
    App,
};
use log::debug;
use sfp_common::Secret;
use storefront_payment_engine::{events::EventBroadcaster, OrderStatusApi};

use super::mocks::MockStore;
use crate::{config::ServerOptions, middleware::AdminToken, server::configure_routes};

pub const TEST_ADMIN_TOKEN: &str = "correct-horse-battery-staple";

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

pub fn api_with(store: MockStore) -> (OrderStatusApi<MockStore>, Arc<EventBroadcaster>) {
    let broadcaster = Arc::new(EventBroadcaster::new());
    (OrderStatusApi::new(store, Arc::clone(&broadcaster)), broadcaster)
}

/// Sends `req` through an app with every route registered, backed by `api`. Errors raised by middleware are rendered
/// the same way the HTTP dispatcher would render them.
pub async fn send(req: TestRequest, api: OrderStatusApi<MockStore>, admin_token: &str) -> TestResponse {
    let app = App::new()
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(ServerOptions::default()))
        .app_data(web::Data::new(AdminToken(Secret::new(admin_token.to_string()))))
        .configure(configure_routes::<MockStore>);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let headers = res.headers().clone();
            let body = test::read_body(res).await;
            TestResponse { status, headers, body: String::from_utf8_lossy(&body).into_owned() }
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let headers = res.headers().clone();
            let body = to_bytes(res.into_body()).await.unwrap_or_default();
            TestResponse { status, headers, body: String::from_utf8_lossy(&body).into_owned() }
        },
    }
}

/// Opens a status stream and returns the status, content type and first `frames` chunks of the body. The stream
/// itself never ends, so the body is never read to completion.
pub async fn open_stream(
    path: &str,
    api: web::Data<OrderStatusApi<MockStore>>,
    frames: usize,
    on_open: impl FnOnce(),
) -> (StatusCode, Option<String>, Vec<String>) {
    let app = App::new()
        .app_data(api)
        .app_data(web::Data::new(ServerOptions::default()))
        .app_data(web::Data::new(AdminToken::default()))
        .configure(configure_routes::<MockStore>);
    let service = test::init_service(app).await;
    let res = test::call_service(&service, TestRequest::get().uri(path).to_request()).await;
    let status = res.status();
    let content_type =
        res.headers().get("content-type").and_then(|v| v.to_str().ok()).map(String::from);
    if !status.is_success() {
        return (status, content_type, vec![]);
    }
    on_open();
    let mut body = Box::pin(res.into_body());
    let mut chunks = Vec::with_capacity(frames);
    while chunks.len() < frames {
        match poll_fn(|cx| body.as_mut().poll_next(cx)).await {
            Some(Ok(bytes)) => chunks.push(String::from_utf8_lossy(&bytes).into_owned()),
            Some(Err(_)) | None => break,
        }
    }
    (status, content_type, chunks)
}
