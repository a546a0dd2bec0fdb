//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every handler here is async, and the only thing that waits is the
//! database.
use std::sync::Arc;

use actix_web::{get, http::header::CONTENT_TYPE, web, HttpRequest, HttpResponse, Responder};
use log::*;
use storefront_payment_engine::{
    db_types::{OrderId, OrderStatusType},
    events::{ChannelSink, PaymentMeta},
    helpers::normalize_status,
    OrderStatusApi,
    OrderStatusStore,
    RefundManagement,
};

use crate::{
    config::ServerOptions,
    data_objects::{
        CheckoutParams,
        JsonResponse,
        MockPayParams,
        NetsConfirmParams,
        NetsQrIssuedParams,
        PaypalCapturedParams,
        PaypalCreatedParams,
        RefundParams,
        StatusChangeResult,
        StatusOverrideParams,
        StatusSnapshot,
    },
    errors::ServerError,
    helpers::{non_empty, NetsNotification},
    sse::StatusEventStream,
};

/// The reference recorded by the mock NETS flow when neither the request nor the order supplies one.
pub const MOCK_NETS_REFERENCE: &str = "MOCK_NETS_SCAN";

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:path),+ where requires admin) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AdminTokenMiddlewareFactory::new());
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

async fn fetch_snapshot<B: OrderStatusStore>(
    api: &OrderStatusApi<B>,
    order_id: &OrderId,
) -> Result<StatusSnapshot, ServerError> {
    let status = api.fetch_status(order_id).await?;
    status.map(StatusSnapshot::from).ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id} not found")))
}

//----------------------------------------------   Status stream  ----------------------------------------------------
route!(order_status_stream => Get "/sse/order-status/{order_id}" impl OrderStatusStore);
/// Route handler for the live payment status stream of an order.
///
/// Responds with `text/event-stream`. The first frame is the stored status snapshot. Every later status change for
/// the order follows as it happens. Unknown orders get a 404 and no stream.
pub async fn order_status_stream<B: OrderStatusStore>(
    path: web::Path<OrderId>,
    api: web::Data<OrderStatusApi<B>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ Opening status stream for order {order_id}");
    // Subscribe before reading the snapshot, so that nothing written in between is lost
    let (sink, events) = ChannelSink::new();
    let subscription = api.subscribe(&order_id, Arc::new(sink));
    let snapshot = fetch_snapshot(api.as_ref(), &order_id).await?;
    let stream = StatusEventStream::new(snapshot, events, subscription, options.sse_heartbeat);
    Ok(stream.into_response())
}

//----------------------------------------------   Payment status  ----------------------------------------------------
route!(payment_status => Get "/orders/{order_id}/payment-status" impl OrderStatusStore);
pub async fn payment_status<B: OrderStatusStore>(
    path: web::Path<OrderId>,
    api: web::Data<OrderStatusApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    trace!("💻️ GET payment status for order {order_id}");
    let snapshot = fetch_snapshot(api.as_ref(), &order_id).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

route!(update_payment_status => Post "/orders/{order_id}/payment-status" impl OrderStatusStore where requires admin);
/// Manual payment status override for staff. Any status dialect is accepted and normalised. Omitted provider fields
/// keep their stored values. Only orders that have been checked out can be overridden.
pub async fn update_payment_status<B: OrderStatusStore>(
    path: web::Path<OrderId>,
    body: web::Json<StatusOverrideParams>,
    api: web::Data<OrderStatusApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let params = body.into_inner();
    let status = non_empty(params.status).ok_or_else(|| ServerError::InvalidRequestBody("status is required".into()))?;
    fetch_snapshot(api.as_ref(), &order_id).await?;
    info!("💻️ Admin override of payment status for order {order_id} to '{status}'");
    let meta = PaymentMeta {
        payment_provider: non_empty(params.payment_provider),
        payment_reference: non_empty(params.payment_reference),
    };
    let result = api.update_status(&order_id, &status, meta).await?;
    Ok(HttpResponse::Ok().json(StatusChangeResult { success: true, order: result.payment.into() }))
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout => Post "/orders/{order_id}/checkout" impl OrderStatusStore);
/// Registers the initial payment status of a freshly placed order, based on how the customer chose to pay.
pub async fn checkout<B: OrderStatusStore>(
    path: web::Path<OrderId>,
    body: web::Json<CheckoutParams>,
    api: web::Data<OrderStatusApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let params = body.into_inner();
    debug!("💻️ Checkout for order {order_id} with {}", params.payment_method);
    let result = api.open_order(&order_id, &params.payment_method).await?;
    Ok(HttpResponse::Ok().json(StatusSnapshot::from(result.payment)))
}

//----------------------------------------------   Refunds  ----------------------------------------------------
route!(request_refund => Post "/orders/{order_id}/refund" impl OrderStatusStore, RefundManagement);
pub async fn request_refund<B: OrderStatusStore + RefundManagement>(
    path: web::Path<OrderId>,
    body: web::Json<RefundParams>,
    api: web::Data<OrderStatusApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ Refund requested for order {order_id}");
    let result = api.request_refund(&order_id, &body.reason).await.map_err(|e| {
        debug!("💻️ Refund for order {order_id} was not accepted. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------   NETS  ----------------------------------------------------
route!(nets_webhook => Post "/nets/webhook" impl OrderStatusStore);
/// The NETS payment callback.
///
/// The transaction reference may arrive in the query string or in the body (JSON or form encoded). The order is found
/// through the reference it was checked out with, and marked successful or failed.
pub async fn nets_webhook<B: OrderStatusStore>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<OrderStatusApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let content_type = req.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or_default();
    let notification = NetsNotification::from_parts(req.query_string(), content_type, body.as_ref())?;
    let reference = notification.reference().ok_or_else(|| {
        warn!("💻️ NETS notification without a transaction reference. Ignoring it.");
        ServerError::InvalidRequestBody("txn_retrieval_ref is required".into())
    })?;
    let order = api.fetch_status_by_reference(reference).await?.ok_or_else(|| {
        warn!("💻️ NETS notification for unknown reference {reference}");
        ServerError::NoRecordFound(format!("No order found for reference {reference}"))
    })?;
    let status = notification.outcome();
    info!("💻️ NETS reports {status} for order {} ({reference})", order.order_id);
    api.update_status(&order.order_id, status.as_str(), PaymentMeta::new("nets", reference)).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Order {} is {status}", order.order_id))))
}

route!(nets_confirm => Get "/nets-qr/confirm" impl OrderStatusStore);
/// Manual confirmation of a NETS QR payment. Marks the order as paid.
pub async fn nets_confirm<B: OrderStatusStore>(
    query: web::Query<NetsConfirmParams>,
    api: web::Data<OrderStatusApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let params = query.into_inner();
    let current = fetch_snapshot(api.as_ref(), &params.order_id).await?;
    let reference = non_empty(params.txn).or(current.payment_reference);
    debug!("💻️ Manual NETS confirmation for order {}", params.order_id);
    let meta = PaymentMeta::provider("nets").with_reference(reference);
    let result = api.update_status(&params.order_id, OrderStatusType::Successful.as_str(), meta).await?;
    Ok(HttpResponse::Ok().json(StatusSnapshot::from(result.payment)))
}

route!(nets_mock_pay => Post "/nets/mock-pay" impl OrderStatusStore);
/// Simulates a customer scanning the NETS QR code and paying.
pub async fn nets_mock_pay<B: OrderStatusStore>(
    body: web::Json<MockPayParams>,
    api: web::Data<OrderStatusApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let params = body.into_inner();
    let current = fetch_snapshot(api.as_ref(), &params.order_id).await?;
    let reference = non_empty(params.txn_retrieval_ref)
        .or(current.payment_reference)
        .unwrap_or_else(|| MOCK_NETS_REFERENCE.to_string());
    debug!("💻️ Mock NETS payment for order {} ({reference})", params.order_id);
    let meta = PaymentMeta::new("nets", reference);
    let result = api.update_status(&params.order_id, OrderStatusType::Successful.as_str(), meta).await?;
    Ok(HttpResponse::Ok().json(StatusSnapshot::from(result.payment)))
}

route!(nets_qr_issued => Post "/nets/qr-issued" impl OrderStatusStore);
/// NETS has issued a QR code for the order. The order waits for the customer to scan it, and the NETS transaction
/// reference is recorded so that the webhook can find the order later.
pub async fn nets_qr_issued<B: OrderStatusStore>(
    body: web::Json<NetsQrIssuedParams>,
    api: web::Data<OrderStatusApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let params = body.into_inner();
    fetch_snapshot(api.as_ref(), &params.order_id).await?;
    let meta = PaymentMeta::provider("nets").with_reference(non_empty(params.txn_retrieval_ref));
    debug!("💻️ NETS QR issued for order {} ({:?})", params.order_id, meta.payment_reference);
    let result = api.update_status(&params.order_id, OrderStatusType::Pending.as_str(), meta).await?;
    Ok(HttpResponse::Ok().json(StatusSnapshot::from(result.payment)))
}

//----------------------------------------------   PayPal  ----------------------------------------------------
route!(paypal_created => Post "/paypal/created" impl OrderStatusStore);
/// PayPal has created an order for the checkout. The order waits for capture, referenced by the PayPal order id.
pub async fn paypal_created<B: OrderStatusStore>(
    body: web::Json<PaypalCreatedParams>,
    api: web::Data<OrderStatusApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let params = body.into_inner();
    let paypal_order_id = non_empty(params.paypal_order_id)
        .ok_or_else(|| ServerError::InvalidRequestBody("paypalOrderId is required".into()))?;
    fetch_snapshot(api.as_ref(), &params.order_id).await?;
    debug!("💻️ PayPal order {paypal_order_id} created for order {}", params.order_id);
    let meta = PaymentMeta::new("paypal", paypal_order_id);
    let result = api.update_status(&params.order_id, OrderStatusType::Pending.as_str(), meta).await?;
    Ok(HttpResponse::Ok().json(StatusSnapshot::from(result.payment)))
}

route!(paypal_captured => Post "/paypal/captured" impl OrderStatusStore);
/// The outcome of capturing a PayPal order.
///
/// A completed capture marks the order successful, referenced by the capture id (or the PayPal order id if PayPal did
/// not return one). Any other outcome marks it failed, referenced by the PayPal order id, and the response is a 400.
pub async fn paypal_captured<B: OrderStatusStore>(
    body: web::Json<PaypalCapturedParams>,
    api: web::Data<OrderStatusApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let params = body.into_inner();
    let paypal_order_id = non_empty(params.paypal_order_id)
        .ok_or_else(|| ServerError::InvalidRequestBody("paypalOrderId is required".into()))?;
    fetch_snapshot(api.as_ref(), &params.order_id).await?;
    let completed = normalize_status(&params.status) == OrderStatusType::Successful;
    let (status, reference) = if completed {
        (OrderStatusType::Successful, non_empty(params.capture_id).unwrap_or_else(|| paypal_order_id.clone()))
    } else {
        (OrderStatusType::Failed, paypal_order_id.clone())
    };
    info!("💻️ PayPal capture of {paypal_order_id} for order {} is {status}", params.order_id);
    let result = api.update_status(&params.order_id, status.as_str(), PaymentMeta::new("paypal", reference)).await?;
    let body = StatusChangeResult { success: completed, order: result.payment.into() };
    if completed {
        Ok(HttpResponse::Ok().json(body))
    } else {
        Ok(HttpResponse::BadRequest().json(body))
    }
}
