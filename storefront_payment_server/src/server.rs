use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, web::ServiceConfig, App, HttpServer};
use log::*;
use storefront_payment_engine::{
    db_types::OrderStatusType,
    events::{EventBroadcaster, EventHandlers, EventHooks, EventProducers},
    OrderStatusApi,
    OrderStatusStore,
    RefundManagement,
    SqliteDatabase,
};

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    middleware::AdminToken,
    routes::{
        health,
        CheckoutRoute,
        NetsConfirmRoute,
        NetsMockPayRoute,
        NetsQrIssuedRoute,
        NetsWebhookRoute,
        OrderStatusStreamRoute,
        PaymentStatusRoute,
        PaypalCapturedRoute,
        PaypalCreatedRoute,
        RequestRefundRoute,
        UpdatePaymentStatusRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25).await?;
    db.migrate().await?;
    // One broadcaster for the whole process, shared by every worker
    let broadcaster = Arc::new(EventBroadcaster::new());
    let handlers = EventHandlers::new(config.event_buffer_size, create_event_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, broadcaster, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    broadcaster: Arc<EventBroadcaster>,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let options = ServerOptions::from_config(&config);
    let admin_token = AdminToken(config.admin_token.clone());
    let srv = HttpServer::new(move || {
        let status_api = OrderStatusApi::new(db.clone(), Arc::clone(&broadcaster)).with_producers(producers.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("sfp::access_log"))
            .app_data(web::Data::new(status_api))
            .app_data(web::Data::new(options))
            .app_data(web::Data::new(admin_token.clone()))
            .configure(configure_routes::<SqliteDatabase>)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers every route against a backend `B`. The caller provides the `OrderStatusApi<B>`, [`ServerOptions`] and
/// [`AdminToken`] app data.
pub fn configure_routes<B>(cfg: &mut ServiceConfig)
where B: OrderStatusStore + RefundManagement + 'static {
    let json_config = web::JsonConfig::default()
        .error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into());
    let api_scope = web::scope("/api")
        .service(PaymentStatusRoute::<B>::new())
        .service(UpdatePaymentStatusRoute::<B>::new())
        .service(CheckoutRoute::<B>::new())
        .service(RequestRefundRoute::<B>::new())
        .service(NetsWebhookRoute::<B>::new())
        .service(NetsQrIssuedRoute::<B>::new())
        .service(PaypalCreatedRoute::<B>::new())
        .service(PaypalCapturedRoute::<B>::new());
    cfg.app_data(json_config)
        .service(health)
        .service(OrderStatusStreamRoute::<B>::new())
        .service(api_scope)
        .service(NetsConfirmRoute::<B>::new())
        .service(NetsMockPayRoute::<B>::new());
}

fn create_event_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_status_changed(|ev| {
        Box::pin(async move {
            let p = ev.payment;
            let provider = p.payment_provider.as_deref().unwrap_or("unknown provider");
            match p.status {
                OrderStatusType::Successful => info!("🪝️ Order {} has been paid via {provider}", p.order_id),
                OrderStatusType::Refunded => info!("🪝️ Order {} has been refunded", p.order_id),
                OrderStatusType::Failed => warn!("🪝️ Payment for order {} via {provider} failed", p.order_id),
                OrderStatusType::Pending => debug!("🪝️ Order {} is awaiting payment", p.order_id),
            }
        })
    });
    hooks
}
